//! Expansion of config bodies and feature groups into the features of one config.

use crate::accumulator::{ConfigAccumulator, FeatureEntry};
use crate::error::ProvisioningError;
use crate::layout::{Layout, Scope};
use fpm_domain::spec::{
    ConfigSpec, FeatureConfig, FeatureFilter, FeatureGroupConfig, FeatureRef, FeatureSpec,
    GroupItem, IncludedFeature, SpecRef,
};
use fpm_domain::{IdParams, ResolvedFeatureId, ResolvedSpecId};
use indexmap::IndexMap;
use std::slice;
use tracing::trace;

/// A filter together with the scope its entries were written in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FilterLevel<'a> {
    pub(crate) filter: &'a FeatureFilter,
    pub(crate) scope: Scope,
}

/// What the active filters decide for one feature.
enum Admission<'a> {
    Excluded,
    Included(Option<&'a IncludedFeature>),
}

/// Items still to expand at one nesting level.
#[derive(Debug)]
struct Frame<'a> {
    scope: Scope,
    items: slice::Iter<'a, GroupItem>,
    parent: Option<ResolvedFeatureId>,
    /// Label of the group being expanded and whether it pushed a filter.
    group: Option<(String, bool)>,
}

/// Walks config items depth-first and collects the admitted features.
#[derive(Debug)]
pub(crate) struct ConfigExpander<'a, 'l> {
    layout: &'l Layout<'a>,
    acc: ConfigAccumulator<'a>,
    filters: Vec<FilterLevel<'a>>,
    groups: Vec<(usize, &'a str)>,
}

impl<'a, 'l> ConfigExpander<'a, 'l> {
    pub(crate) fn new(layout: &'l Layout<'a>) -> Self {
        Self { layout, acc: ConfigAccumulator::default(), filters: Vec::new(), groups: Vec::new() }
    }

    /// Expands one contribution to the config. `filter` applies to everything in its body.
    pub(crate) fn expand_config(
        &mut self,
        spec: &'a ConfigSpec,
        scope: Scope,
        filter: Option<FilterLevel<'a>>,
    ) -> Result<(), ProvisioningError> {
        let pushed = match filter {
            Some(level) => self.push_filter(level.filter, level.scope)?,
            None => false,
        };
        let result = self.expand_items(scope, spec.items(), None);
        if pushed {
            self.filters.pop();
        }
        result
    }

    pub(crate) fn finish(self) -> ConfigAccumulator<'a> {
        self.acc
    }

    /// Activates a filter once every origin it names resolves in `scope`.
    fn push_filter(&mut self, filter: &'a FeatureFilter, scope: Scope) -> Result<bool, ProvisioningError> {
        if filter.is_pass_through() {
            return Ok(false);
        }
        let origins = filter
            .included_specs()
            .chain(filter.excluded_specs())
            .chain(filter.excluded_groups())
            .map(SpecRef::origin)
            .chain(filter.included_features().map(|f| f.feature().origin()))
            .chain(filter.excluded_features().map(FeatureRef::origin));
        for origin in origins.flatten() {
            self.layout.resolve_origin(scope, origin)?;
        }
        self.filters.push(FilterLevel { filter, scope });
        Ok(true)
    }

    /// Depth-first walk over `items` and everything nested below them, driven by an explicit
    /// frame stack.
    fn expand_items(
        &mut self,
        scope: Scope,
        items: &'a [GroupItem],
        parent: Option<ResolvedFeatureId>,
    ) -> Result<(), ProvisioningError> {
        let (filters, groups) = (self.filters.len(), self.groups.len());
        let mut stack = vec![Frame { scope, items: items.iter(), parent, group: None }];

        while let Some(frame) = stack.last_mut() {
            let Some(item) = frame.items.next() else {
                if let Some(frame) = stack.pop()
                    && let Some((_, pushed)) = frame.group
                {
                    if pushed {
                        self.filters.pop();
                    }
                    self.groups.pop();
                }
                continue;
            };
            let next = match item {
                GroupItem::Feature(feature) => {
                    self.process_feature(frame.scope, feature, frame.parent.as_ref())
                },
                GroupItem::Group(group) => self.expand_group(frame.scope, group, frame.parent.as_ref()),
            };
            match next {
                Ok(Some(frame)) => stack.push(frame),
                Ok(None) => {},
                Err(e) => {
                    self.filters.truncate(filters);
                    self.groups.truncate(groups);
                    let wrapped = stack
                        .iter()
                        .rev()
                        .filter_map(|frame| frame.group.as_ref())
                        .fold(e, |e, (label, _)| e.in_group(label.clone()));
                    return Err(wrapped);
                },
            }
        }
        Ok(())
    }

    /// Opens a group reference. `None` when the filters exclude the group.
    fn expand_group(
        &mut self,
        scope: Scope,
        config: &'a FeatureGroupConfig,
        parent: Option<&ResolvedFeatureId>,
    ) -> Result<Option<Frame<'a>>, ProvisioningError> {
        let (index, group) = self.layout.find_group(scope, config.group())?;
        if self.is_group_excluded(index, group.name())? {
            trace!(group = %config.group(), "Feature group excluded by filter");
            return Ok(None);
        }

        let label = format!("{}#{}", self.layout.entry(index).gav(), group.name());
        if let Some(position) = self.groups.iter().position(|&(i, name)| i == index && name == group.name())
        {
            let mut path: Vec<String> = self.groups[position..]
                .iter()
                .map(|&(i, name)| format!("{}#{name}", self.layout.entry(i).gav()))
                .collect();
            path.push(label.clone());
            return Err(ProvisioningError::CyclicFeatureGroup { path: path.join(" -> ") }.in_group(label));
        }

        let pushed = self.push_filter(config.feature_filter(), scope).map_err(|e| e.in_group(label.clone()))?;
        self.groups.push((index, group.name()));
        Ok(Some(Frame {
            scope: Scope::Pack(index),
            items: group.items().iter(),
            parent: parent.cloned(),
            group: Some((label, pushed)),
        }))
    }

    fn is_group_excluded(&self, index: usize, name: &str) -> Result<bool, ProvisioningError> {
        for level in &self.filters {
            for excluded in level.filter.excluded_groups().filter(|excluded| excluded.name() == name) {
                match self.layout.find_group(level.scope, excluded) {
                    Ok((i, _)) if i == index => return Ok(true),
                    Ok(_) | Err(ProvisioningError::FeatureGroupNotFound { .. }) => {},
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(false)
    }

    /// Collects one feature config; its nested items come back as the next frame.
    fn process_feature(
        &mut self,
        scope: Scope,
        config: &'a FeatureConfig,
        parent: Option<&ResolvedFeatureId>,
    ) -> Result<Option<Frame<'a>>, ProvisioningError> {
        let id = self.init_feature(scope, config, parent).map_err(|e| e.in_feature(config.to_string()))?;
        let Some(id) = id else {
            return Ok(None);
        };
        if config.items().is_empty() {
            return Ok(None);
        }
        let nested_scope = self.layout.qualify(scope, config.spec().origin())?;
        Ok(Some(Frame { scope: nested_scope, items: config.items().iter(), parent: Some(id), group: None }))
    }

    /// Collects one feature config. `None` when the filters exclude it.
    fn init_feature(
        &mut self,
        scope: Scope,
        config: &'a FeatureConfig,
        parent: Option<&ResolvedFeatureId>,
    ) -> Result<Option<ResolvedFeatureId>, ProvisioningError> {
        let (fp, spec) = self.layout.find_spec_ref(scope, config.spec())?;
        let spec_id = ResolvedSpecId::new(self.layout.entry(fp).gav().clone(), spec.name());
        if let Some(unknown) = config.params().keys().find(|name| !spec.has_param(name)) {
            return Err(ProvisioningError::UnknownParameter { spec: spec_id, param: unknown.clone() });
        }

        let mut params = config.params().clone();
        if let Some(parent) = parent {
            self.init_parent_params(fp, &spec_id, spec, config, parent, &mut params)
                .map_err(|e| e.in_foreign_key_init(config.to_string()))?;
        }

        let mut id_params = IdParams::new();
        for param in spec.id_params() {
            let value = match params.get(param.name()) {
                Some(value) => value.clone(),
                None => {
                    let default = param.default_value().ok_or_else(|| {
                        ProvisioningError::UnsetRequiredParameter {
                            feature: spec_id.to_string(),
                            param: param.name().to_owned(),
                        }
                    })?;
                    params.insert(param.name().to_owned(), default.to_owned());
                    default.to_owned()
                },
            };
            id_params.insert(param.name().to_owned(), value);
        }
        let id = ResolvedFeatureId::new(spec_id, id_params)?;

        let overrides = match self.admission(&id)? {
            Admission::Excluded => {
                trace!(feature = %id, "Feature excluded by filter");
                return Ok(None);
            },
            Admission::Included(overrides) => overrides,
        };
        if let Some(included) = overrides {
            apply_overrides(&id, spec, included, &mut params)?;
        }

        self.acc.merge(FeatureEntry { id: id.clone(), spec, fp, params })?;
        Ok(Some(id))
    }

    /// Copies the parent's id into the parameters mapped by the parent reference.
    fn init_parent_params(
        &self,
        fp: usize,
        spec_id: &ResolvedSpecId,
        spec: &'a FeatureSpec,
        config: &FeatureConfig,
        parent: &ResolvedFeatureId,
        params: &mut IndexMap<String, String>,
    ) -> Result<(), ProvisioningError> {
        let not_found = || ProvisioningError::ParentReferenceNotFound {
            spec: spec_id.clone(),
            parent: parent.spec_id().clone(),
            reference: config.parent_ref_name().map(ToOwned::to_owned),
        };
        let reference = match config.parent_ref_name() {
            Some(name) => spec.reference(name),
            None => spec.parent_reference().or_else(|| spec.reference(parent.spec_id().name())),
        }
        .ok_or_else(not_found)?;

        let (target_fp, target) =
            self.layout.find_spec(Scope::Pack(fp), reference.origin(), reference.feature())?;
        if self.layout.entry(target_fp).gav() != parent.gav() || target.name() != parent.spec_id().name()
        {
            return Err(not_found());
        }

        let mapping: Vec<(&str, &str)> = if reference.mappings().is_empty() {
            parent.params().keys().map(|name| (name.as_str(), name.as_str())).collect()
        } else {
            reference.mappings().iter().map(|(local, target)| (local.as_str(), target.as_str())).collect()
        };
        for (local, target) in mapping {
            let Some(value) = parent.param(target) else {
                continue;
            };
            if !spec.has_param(local) {
                return Err(ProvisioningError::UnknownParameter {
                    spec: spec_id.clone(),
                    param: local.to_owned(),
                });
            }
            match params.get(local) {
                Some(first) if first != value => {
                    return Err(ProvisioningError::IdParamForeignKeyInitConflict {
                        spec: spec_id.clone(),
                        param: local.to_owned(),
                        first: first.clone(),
                        second: value.to_owned(),
                    });
                },
                Some(_) => {},
                None => {
                    params.insert(local.to_owned(), value.to_owned());
                },
            }
        }
        Ok(())
    }

    /// The innermost filter with an opinion decides; without one the feature is included.
    fn admission(&self, id: &ResolvedFeatureId) -> Result<Admission<'a>, ProvisioningError> {
        for level in self.filters.iter().rev() {
            let filter = level.filter;
            for feature in filter.excluded_features() {
                if self.matches_feature(level.scope, feature, id)? {
                    return Ok(Admission::Excluded);
                }
            }
            for included in filter.included_features() {
                if self.matches_feature(level.scope, included.feature(), id)? {
                    return Ok(Admission::Included(Some(included)));
                }
            }
            for spec in filter.excluded_specs() {
                if self.matches_spec(level.scope, spec, id.spec_id())? {
                    return Ok(Admission::Excluded);
                }
            }
            for spec in filter.included_specs() {
                if self.matches_spec(level.scope, spec, id.spec_id())? {
                    return Ok(Admission::Included(None));
                }
            }
            if !filter.inherits_features() {
                return Ok(Admission::Excluded);
            }
        }
        Ok(Admission::Included(None))
    }

    fn matches_feature(
        &self,
        scope: Scope,
        feature: &FeatureRef,
        id: &ResolvedFeatureId,
    ) -> Result<bool, ProvisioningError> {
        if feature.id().spec() != id.spec_id().name() || feature.id().params() != id.params() {
            return Ok(false);
        }
        self.resolves_to(scope, feature.origin(), feature.id().spec(), id.spec_id())
    }

    fn matches_spec(
        &self,
        scope: Scope,
        spec: &SpecRef,
        spec_id: &ResolvedSpecId,
    ) -> Result<bool, ProvisioningError> {
        if spec.name() != spec_id.name() {
            return Ok(false);
        }
        self.resolves_to(scope, spec.origin(), spec.name(), spec_id)
    }

    /// Whether `name` looked up from `scope` is the spec of `spec_id`. A name no feature-pack
    /// in reach defines matches nothing.
    fn resolves_to(
        &self,
        scope: Scope,
        origin: Option<&str>,
        name: &str,
        spec_id: &ResolvedSpecId,
    ) -> Result<bool, ProvisioningError> {
        match self.layout.find_spec(scope, origin, name) {
            Ok((i, _)) => Ok(self.layout.entry(i).gav() == spec_id.gav()),
            Err(ProvisioningError::SpecNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn apply_overrides(
    id: &ResolvedFeatureId,
    spec: &FeatureSpec,
    included: &IncludedFeature,
    params: &mut IndexMap<String, String>,
) -> Result<(), ProvisioningError> {
    for (name, value) in included.params() {
        let Some(param) = spec.param(name) else {
            return Err(ProvisioningError::UnknownParameter {
                spec: id.spec_id().clone(),
                param: name.clone(),
            });
        };
        if param.is_id()
            && let Some(first) = id.param(name).filter(|first| *first != value.as_str())
        {
            return Err(ProvisioningError::IdParamForeignKeyInitConflict {
                spec: id.spec_id().clone(),
                param: name.clone(),
                first: first.to_owned(),
                second: value.clone(),
            });
        }
        params.insert(name.clone(), value.clone());
    }
    Ok(())
}
