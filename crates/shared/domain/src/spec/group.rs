use crate::error::{DescriptionError, require_non_empty};
use crate::ids::FeatureId;
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// A spec or group name, optionally qualified by a dependency alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecRef {
    origin: Option<String>,
    name: String,
}

impl SpecRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { origin: None, name: name.into() }
    }

    pub fn qualified(origin: impl Into<String>, name: impl Into<String>) -> Self {
        Self { origin: Some(origin.into()), name: name.into() }
    }

    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SpecRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{origin}#{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A feature id, optionally qualified by a dependency alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureRef {
    origin: Option<String>,
    id: FeatureId,
}

impl FeatureRef {
    pub const fn new(id: FeatureId) -> Self {
        Self { origin: None, id }
    }

    pub fn qualified(origin: impl Into<String>, id: FeatureId) -> Self {
        Self { origin: Some(origin.into()), id }
    }

    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    #[must_use]
    pub const fn id(&self) -> &FeatureId {
        &self.id
    }
}

impl From<FeatureId> for FeatureRef {
    fn from(id: FeatureId) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for FeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{origin}#{}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// An explicitly included feature and the parameter values it overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFeature {
    feature: FeatureRef,
    params: IndexMap<String, String>,
}

impl IncludedFeature {
    #[must_use]
    pub const fn feature(&self) -> &FeatureRef {
        &self.feature
    }

    #[must_use]
    pub const fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }
}

/// Include/exclude rules applied to the features reached through a group reference
/// or an included config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFilter {
    inherit_features: bool,
    included_specs: IndexSet<SpecRef>,
    excluded_specs: IndexSet<SpecRef>,
    included_features: IndexMap<FeatureRef, IncludedFeature>,
    excluded_features: IndexSet<FeatureRef>,
    excluded_groups: IndexSet<SpecRef>,
}

impl Default for FeatureFilter {
    fn default() -> Self {
        Self {
            inherit_features: true,
            included_specs: IndexSet::new(),
            excluded_specs: IndexSet::new(),
            included_features: IndexMap::new(),
            excluded_features: IndexSet::new(),
            excluded_groups: IndexSet::new(),
        }
    }
}

impl FeatureFilter {
    pub fn builder() -> FeatureFilterBuilder {
        FeatureFilterBuilder { filter: Self::default(), duplicates: Vec::new() }
    }

    #[must_use]
    pub const fn inherits_features(&self) -> bool {
        self.inherit_features
    }

    pub fn included_specs(&self) -> impl Iterator<Item = &SpecRef> {
        self.included_specs.iter()
    }

    pub fn excluded_specs(&self) -> impl Iterator<Item = &SpecRef> {
        self.excluded_specs.iter()
    }

    pub fn included_features(&self) -> impl Iterator<Item = &IncludedFeature> {
        self.included_features.values()
    }

    pub fn excluded_features(&self) -> impl Iterator<Item = &FeatureRef> {
        self.excluded_features.iter()
    }

    pub fn excluded_groups(&self) -> impl Iterator<Item = &SpecRef> {
        self.excluded_groups.iter()
    }

    /// `true` when the filter lets every feature through unchanged.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.inherit_features
            && self.included_specs.is_empty()
            && self.excluded_specs.is_empty()
            && self.included_features.is_empty()
            && self.excluded_features.is_empty()
            && self.excluded_groups.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FeatureFilterBuilder {
    filter: FeatureFilter,
    duplicates: Vec<String>,
}

impl FeatureFilterBuilder {
    /// When `false`, only explicitly included specs and features pass.
    #[must_use = "The builder must be built to produce a filter."]
    pub const fn inherit_features(mut self, inherit: bool) -> Self {
        self.filter.inherit_features = inherit;
        self
    }

    #[must_use = "The builder must be built to produce a filter."]
    pub fn include_spec(mut self, spec: SpecRef) -> Self {
        if !self.filter.included_specs.insert(spec.clone()) {
            self.duplicates.push(format!("spec {spec} is included twice"));
        }
        self
    }

    #[must_use = "The builder must be built to produce a filter."]
    pub fn exclude_spec(mut self, spec: SpecRef) -> Self {
        if !self.filter.excluded_specs.insert(spec.clone()) {
            self.duplicates.push(format!("spec {spec} is excluded twice"));
        }
        self
    }

    #[must_use = "The builder must be built to produce a filter."]
    pub fn include_feature(self, feature: impl Into<FeatureRef>) -> Self {
        self.include_feature_with(feature, IndexMap::new())
    }

    /// Includes a feature and overrides some of its parameters.
    #[must_use = "The builder must be built to produce a filter."]
    pub fn include_feature_with(
        mut self,
        feature: impl Into<FeatureRef>,
        params: IndexMap<String, String>,
    ) -> Self {
        let feature = feature.into();
        let included = IncludedFeature { feature: feature.clone(), params };
        if self.filter.included_features.insert(feature.clone(), included).is_some() {
            self.duplicates.push(format!("feature {feature} is included twice"));
        }
        self
    }

    #[must_use = "The builder must be built to produce a filter."]
    pub fn exclude_feature(mut self, feature: impl Into<FeatureRef>) -> Self {
        let feature = feature.into();
        if !self.filter.excluded_features.insert(feature.clone()) {
            self.duplicates.push(format!("feature {feature} is excluded twice"));
        }
        self
    }

    /// Skips nested references to this group anywhere below the filter.
    #[must_use = "The builder must be built to produce a filter."]
    pub fn exclude_group(mut self, group: SpecRef) -> Self {
        if !self.filter.excluded_groups.insert(group.clone()) {
            self.duplicates.push(format!("group {group} is excluded twice"));
        }
        self
    }

    /// # Errors
    /// Returns [`DescriptionError::Duplicate`] for repeated rules and
    /// [`DescriptionError::Conflict`] for a spec or feature both included and excluded.
    pub fn build(self) -> Result<FeatureFilter, DescriptionError> {
        if let Some(duplicate) = self.duplicates.into_iter().next() {
            return Err(DescriptionError::duplicate(duplicate));
        }
        let filter = self.filter;
        if let Some(spec) = filter.included_specs.iter().find(|s| filter.excluded_specs.contains(*s))
        {
            return Err(DescriptionError::conflict(format!(
                "Spec {spec} has been both included and excluded"
            )));
        }
        if let Some(feature) =
            filter.included_features.keys().find(|f| filter.excluded_features.contains(*f))
        {
            return Err(DescriptionError::conflict(format!(
                "Feature {feature} has been both included and excluded"
            )));
        }
        Ok(filter)
    }
}

/// One entry of a feature group body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupItem {
    Feature(FeatureConfig),
    Group(FeatureGroupConfig),
}

impl From<FeatureConfig> for GroupItem {
    fn from(value: FeatureConfig) -> Self {
        Self::Feature(value)
    }
}

impl From<FeatureGroupConfig> for GroupItem {
    fn from(value: FeatureGroupConfig) -> Self {
        Self::Group(value)
    }
}

/// A feature instance inside a group or config body.
///
/// Nested items are children of this feature: their parent reference is initialized
/// from this feature's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureConfig {
    spec: SpecRef,
    params: IndexMap<String, String>,
    parent_ref: Option<String>,
    items: Vec<GroupItem>,
}

impl FeatureConfig {
    pub fn new(spec: impl Into<String>) -> Self {
        Self { spec: SpecRef::new(spec), params: IndexMap::new(), parent_ref: None, items: Vec::new() }
    }

    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.spec.origin = Some(origin.into());
        self
    }

    /// Sets a parameter; a later call for the same name replaces the value.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Names the reference initialized from the enclosing feature.
    #[must_use]
    pub fn parent_ref(mut self, reference: impl Into<String>) -> Self {
        self.parent_ref = Some(reference.into());
        self
    }

    #[must_use]
    pub fn feature(mut self, child: Self) -> Self {
        self.items.push(GroupItem::Feature(child));
        self
    }

    #[must_use]
    pub fn group(mut self, group: FeatureGroupConfig) -> Self {
        self.items.push(GroupItem::Group(group));
        self
    }

    #[must_use]
    pub const fn spec(&self) -> &SpecRef {
        &self.spec
    }

    #[must_use]
    pub const fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    #[must_use]
    pub fn parent_ref_name(&self) -> Option<&str> {
        self.parent_ref.as_deref()
    }

    #[must_use]
    pub fn items(&self) -> &[GroupItem] {
        &self.items
    }
}

impl fmt::Display for FeatureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.spec)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { ' ' } else { ',' };
            write!(f, "{sep}{name}={value}")?;
        }
        f.write_str("]")
    }
}

/// A reference to a named feature group, with the filter applied to its features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGroupConfig {
    group: SpecRef,
    filter: FeatureFilter,
}

impl FeatureGroupConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { group: SpecRef::new(name), filter: FeatureFilter::default() }
    }

    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.group.origin = Some(origin.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FeatureFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn group(&self) -> &SpecRef {
        &self.group
    }

    #[must_use]
    pub const fn feature_filter(&self) -> &FeatureFilter {
        &self.filter
    }
}

/// A named, reusable set of feature configs and nested group references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGroupSpec {
    name: String,
    items: Vec<GroupItem>,
}

impl FeatureGroupSpec {
    pub fn builder(name: impl Into<String>) -> FeatureGroupSpecBuilder {
        FeatureGroupSpecBuilder { name: name.into(), items: Vec::new() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn items(&self) -> &[GroupItem] {
        &self.items
    }
}

#[derive(Debug, Clone)]
pub struct FeatureGroupSpecBuilder {
    name: String,
    items: Vec<GroupItem>,
}

impl FeatureGroupSpecBuilder {
    #[must_use = "The builder must be built to produce a feature group."]
    pub fn feature(mut self, feature: FeatureConfig) -> Self {
        self.items.push(GroupItem::Feature(feature));
        self
    }

    #[must_use = "The builder must be built to produce a feature group."]
    pub fn group(mut self, group: FeatureGroupConfig) -> Self {
        self.items.push(GroupItem::Group(group));
        self
    }

    #[must_use = "The builder must be built to produce a feature group."]
    pub fn item(mut self, item: impl Into<GroupItem>) -> Self {
        self.items.push(item.into());
        self
    }

    /// # Errors
    /// Returns [`DescriptionError`] for an empty group name.
    pub fn build(self) -> Result<FeatureGroupSpec, DescriptionError> {
        require_non_empty(&self.name, "Feature group name")?;
        Ok(FeatureGroupSpec { name: self.name, items: self.items })
    }
}
