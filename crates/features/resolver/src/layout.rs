//! Ordering of the feature-packs taking part in a provisioning run and name lookups across
//! them.

use crate::error::ProvisioningError;
use crate::repository::FeaturePackRepository;
use fpm_domain::spec::{FeatureGroupSpec, FeaturePackDependency, FeaturePackSpec, FeatureSpec, SpecRef};
use fpm_domain::{FeaturePackConfig, Gav, ProvisioningConfig};
use fxhash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Namespace in which unqualified spec and group names are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Scope {
    /// Installation-level configs: every requested feature-pack, aliases from the request.
    Installation,
    /// A feature-pack by layout index: itself, then its dependencies.
    Pack(usize),
}

#[derive(Debug)]
pub(crate) struct LayoutEntry<'a> {
    pub(crate) spec: &'a FeaturePackSpec,
    /// Configurations leading to this feature-pack, outermost first.
    pub(crate) chain: Vec<&'a FeaturePackConfig>,
    pub(crate) top_level: bool,
    /// The feature-pack whose dependency declaration introduced this one.
    pub(crate) parent: Option<usize>,
    /// Dependencies in declaration order, by layout index.
    pub(crate) deps: Vec<(usize, &'a FeaturePackDependency)>,
}

impl LayoutEntry<'_> {
    pub(crate) fn gav(&self) -> &Gav {
        self.spec.gav()
    }
}

/// Feature-packs in depth-first pre-order starting from the request.
#[derive(Debug)]
pub(crate) struct Layout<'a> {
    request: &'a ProvisioningConfig,
    entries: Vec<LayoutEntry<'a>>,
    by_artifact: FxHashMap<String, usize>,
    top_level: Vec<usize>,
    post_order: Vec<usize>,
    search: Vec<Vec<usize>>,
    installation_search: Vec<usize>,
}

impl<'a> Layout<'a> {
    /// Resolves every requested feature-pack and its dependencies.
    ///
    /// # Errors
    /// [`ProvisioningError::FeaturePackNotFound`], [`ProvisioningError::VersionConflict`] or
    /// [`ProvisioningError::CyclicFeaturePackDependency`].
    pub(crate) fn build<R>(
        repository: &'a R,
        request: &'a ProvisioningConfig,
    ) -> Result<Self, ProvisioningError>
    where
        R: FeaturePackRepository + ?Sized,
    {
        let mut requested = FxHashMap::default();
        let mut ordered = Vec::new();
        for config in request.feature_packs() {
            let spec = repository
                .feature_pack(config.gav())
                .ok_or_else(|| ProvisioningError::FeaturePackNotFound { gav: config.gav().clone() })?;
            requested.insert(spec.gav().to_ga_string(), (config, spec));
            ordered.push((config, spec));
        }

        let mut walker = Walker {
            repository,
            requested: &requested,
            entries: Vec::new(),
            by_artifact: FxHashMap::default(),
            path: Vec::new(),
            post_order: Vec::new(),
        };
        for (config, spec) in ordered {
            if !walker.by_artifact.contains_key(&spec.gav().to_ga_string()) {
                walker.visit(spec, vec![config], None)?;
            }
        }

        let Walker { entries, by_artifact, post_order, .. } = walker;
        let top_level: Vec<usize> = request
            .feature_packs()
            .filter_map(|config| by_artifact.get(&config.gav().to_ga_string()).copied())
            .collect();

        let search: Vec<Vec<usize>> =
            (0..entries.len()).map(|i| search_order(&entries, &[i])).collect();
        let installation_search = search_order(&entries, &top_level);

        Ok(Self {
            request,
            entries,
            by_artifact,
            top_level,
            post_order,
            search,
            installation_search,
        })
    }

    pub(crate) fn entries(&self) -> &[LayoutEntry<'a>] {
        &self.entries
    }

    pub(crate) fn entry(&self, index: usize) -> &LayoutEntry<'a> {
        &self.entries[index]
    }

    pub(crate) fn request(&self) -> &'a ProvisioningConfig {
        self.request
    }

    /// Layout index of whichever version of the artifact was chosen.
    pub(crate) fn index_of(&self, gav: &Gav) -> Option<usize> {
        self.by_artifact.get(&gav.to_ga_string()).copied()
    }

    /// Requested feature-packs, in request order.
    pub(crate) fn top_level(&self) -> &[usize] {
        &self.top_level
    }

    /// Dependencies before the feature-packs depending on them.
    pub(crate) fn post_order(&self) -> &[usize] {
        &self.post_order
    }

    pub(crate) fn describe(&self, scope: Scope) -> String {
        match scope {
            Scope::Installation => "the installation".to_owned(),
            Scope::Pack(index) => self.entries[index].gav().to_string(),
        }
    }

    /// Resolves a dependency alias declared by the scope.
    pub(crate) fn resolve_origin(&self, scope: Scope, origin: &str) -> Result<usize, ProvisioningError> {
        let index = match scope {
            Scope::Installation => self.request.origin(origin).and_then(|gav| self.index_of(gav)),
            Scope::Pack(i) => self.entries[i]
                .deps
                .iter()
                .find(|(_, dep)| dep.origin() == Some(origin))
                .map(|(j, _)| *j),
        };
        index.ok_or_else(|| ProvisioningError::UnknownOrigin {
            origin: origin.to_owned(),
            scope: self.describe(scope),
        })
    }

    /// The scope named by an optional origin, relative to `scope`.
    pub(crate) fn qualify(&self, scope: Scope, origin: Option<&str>) -> Result<Scope, ProvisioningError> {
        origin.map_or(Ok(scope), |origin| self.resolve_origin(scope, origin).map(Scope::Pack))
    }

    fn search(&self, scope: Scope) -> &[usize] {
        match scope {
            Scope::Installation => &self.installation_search,
            Scope::Pack(index) => &self.search[index],
        }
    }

    /// Finds a feature spec: the origin's feature-pack (or the scope) first, then its
    /// dependencies depth-first.
    pub(crate) fn find_spec(
        &self,
        scope: Scope,
        origin: Option<&str>,
        name: &str,
    ) -> Result<(usize, &'a FeatureSpec), ProvisioningError> {
        let start = self.qualify(scope, origin)?;
        self.search(start)
            .iter()
            .find_map(|&i| self.entries[i].spec.feature_spec(name).map(|spec| (i, spec)))
            .ok_or_else(|| ProvisioningError::SpecNotFound {
                spec: display_ref(origin, name),
                scope: self.describe(start),
            })
    }

    pub(crate) fn find_spec_ref(
        &self,
        scope: Scope,
        spec: &SpecRef,
    ) -> Result<(usize, &'a FeatureSpec), ProvisioningError> {
        self.find_spec(scope, spec.origin(), spec.name())
    }

    pub(crate) fn find_group(
        &self,
        scope: Scope,
        group: &SpecRef,
    ) -> Result<(usize, &'a FeatureGroupSpec), ProvisioningError> {
        let start = self.qualify(scope, group.origin())?;
        self.search(start)
            .iter()
            .find_map(|&i| self.entries[i].spec.feature_group(group.name()).map(|g| (i, g)))
            .ok_or_else(|| ProvisioningError::FeatureGroupNotFound {
                group: group.to_string(),
                scope: self.describe(start),
            })
    }
}

fn display_ref(origin: Option<&str>, name: &str) -> String {
    origin.map_or_else(|| name.to_owned(), |origin| format!("{origin}#{name}"))
}

/// `roots` followed by their dependencies, depth-first in declaration order.
fn search_order(entries: &[LayoutEntry<'_>], roots: &[usize]) -> Vec<usize> {
    let mut seen = FxHashSet::default();
    let mut order = Vec::new();
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(index) = stack.pop() {
        if !seen.insert(index) {
            continue;
        }
        order.push(index);
        stack.extend(entries[index].deps.iter().rev().map(|(dep, _)| *dep));
    }
    order
}

struct Walker<'a, 'w, R: ?Sized> {
    repository: &'a R,
    requested: &'w FxHashMap<String, (&'a FeaturePackConfig, &'a FeaturePackSpec)>,
    entries: Vec<LayoutEntry<'a>>,
    by_artifact: FxHashMap<String, usize>,
    path: Vec<usize>,
    post_order: Vec<usize>,
}

impl<'a, R: FeaturePackRepository + ?Sized> Walker<'a, '_, R> {
    fn visit(
        &mut self,
        spec: &'a FeaturePackSpec,
        chain: Vec<&'a FeaturePackConfig>,
        parent: Option<usize>,
    ) -> Result<usize, ProvisioningError> {
        let index = self.entries.len();
        let top_level = parent.is_none();
        debug!(gav = %spec.gav(), top_level, "Feature-pack added to layout");
        self.entries.push(LayoutEntry { spec, chain, top_level, parent, deps: Vec::new() });
        self.by_artifact.insert(spec.gav().to_ga_string(), index);
        self.path.push(index);

        for dep in spec.dependencies() {
            let artifact = dep.gav().to_ga_string();
            let target = if let Some(&known) = self.by_artifact.get(&artifact) {
                self.check_revisit(known, dep)?;
                known
            } else if let Some(&(config, dep_spec)) = self.requested.get(&artifact) {
                self.visit(dep_spec, vec![config], None)?
            } else {
                let dep_spec = self
                    .repository
                    .feature_pack(dep.gav())
                    .ok_or_else(|| ProvisioningError::FeaturePackNotFound { gav: dep.gav().clone() })?;
                let mut chain = self.entries[index].chain.clone();
                chain.push(dep.config());
                self.visit(dep_spec, chain, Some(index))?
            };
            self.entries[index].deps.push((target, dep));
        }

        self.path.pop();
        self.post_order.push(index);
        Ok(index)
    }

    fn check_revisit(&self, known: usize, dep: &FeaturePackDependency) -> Result<(), ProvisioningError> {
        if let Some(position) = self.path.iter().position(|&i| i == known) {
            let mut path: Vec<String> =
                self.path[position..].iter().map(|&i| self.entries[i].gav().to_string()).collect();
            path.push(self.entries[known].gav().to_string());
            return Err(ProvisioningError::CyclicFeaturePackDependency { path: path.join(" -> ") });
        }
        let chosen = self.entries[known].gav();
        let wanted = dep.gav();
        if !wanted.is_latest() && wanted != chosen && !self.entries[known].top_level {
            return Err(ProvisioningError::VersionConflict {
                artifact: wanted.to_ga_string(),
                first: chosen.version().to_owned(),
                second: wanted.version().to_owned(),
            });
        }
        Ok(())
    }
}
