//! Package selection across the layout.

use crate::error::ProvisioningError;
use crate::layout::{Layout, Scope};
use fpm_domain::FeaturePackConfig;
use fpm_domain::spec::PackageDependencySpec;
use fxhash::FxHashSet;
use indexmap::IndexSet;
use tracing::trace;

/// Picks packages for every feature-pack of the layout.
///
/// Returns one ordered package set per layout entry.
pub(crate) fn resolve_packages(layout: &Layout<'_>) -> Result<Vec<IndexSet<String>>, ProvisioningError> {
    let mut resolver = PackageResolver {
        layout,
        excluded: effective_exclusions(layout),
        included: vec![IndexSet::new(); layout.entries().len()],
    };

    for &index in layout.top_level() {
        let config = layout.entry(index).chain[0];
        resolver.apply(index, config, true)?;
    }
    for entry in layout.entries() {
        for (target, dep) in &entry.deps {
            if !layout.entry(*target).top_level {
                resolver.apply(*target, dep.config(), false)?;
            }
        }
    }
    Ok(resolver.included)
}

/// Packages excluded by any configuration reaching a feature-pack, minus those the request
/// includes explicitly.
fn effective_exclusions(layout: &Layout<'_>) -> Vec<FxHashSet<String>> {
    let mut excluded = vec![FxHashSet::default(); layout.entries().len()];
    for &index in layout.top_level() {
        let config = layout.entry(index).chain[0];
        excluded[index].extend(config.excluded_packages().map(str::to_owned));
    }
    for entry in layout.entries() {
        for (target, dep) in &entry.deps {
            if !layout.entry(*target).top_level {
                excluded[*target].extend(dep.config().excluded_packages().map(str::to_owned));
            }
        }
    }
    for &index in layout.top_level() {
        for name in layout.entry(index).chain[0].included_packages() {
            excluded[index].remove(name);
        }
    }
    excluded
}

struct PackageResolver<'l, 'a> {
    layout: &'l Layout<'a>,
    excluded: Vec<FxHashSet<String>>,
    included: Vec<IndexSet<String>>,
}

impl PackageResolver<'_, '_> {
    fn apply(&mut self, index: usize, config: &FeaturePackConfig, explicit: bool) -> Result<(), ProvisioningError> {
        let spec = self.layout.entry(index).spec;
        if config.inherits_packages() {
            for name in spec.default_packages() {
                if !self.excluded[index].contains(name) {
                    self.include(index, name)?;
                }
            }
        }
        for name in config.included_packages() {
            if explicit || !self.excluded[index].contains(name) {
                self.include(index, name)?;
            }
        }
        Ok(())
    }

    fn include(&mut self, index: usize, name: &str) -> Result<(), ProvisioningError> {
        let entry = self.layout.entry(index);
        if self.included[index].contains(name) {
            return Ok(());
        }
        let package = entry.spec.package(name).ok_or_else(|| ProvisioningError::PackageNotFound {
            package: name.to_owned(),
            gav: entry.gav().clone(),
        })?;
        trace!(gav = %entry.gav(), package = name, "Package included");
        self.included[index].insert(name.to_owned());

        let required_by = format!("{}#{name}", entry.gav());
        for dep in package.local_dependencies() {
            self.follow(index, dep, &required_by)?;
        }
        for (origin, deps) in package.external_dependencies() {
            let target = self.layout.resolve_origin(Scope::Pack(index), origin)?;
            for dep in deps {
                self.follow(target, dep, &required_by)?;
            }
        }
        Ok(())
    }

    fn follow(
        &mut self,
        index: usize,
        dep: &PackageDependencySpec,
        required_by: &str,
    ) -> Result<(), ProvisioningError> {
        if self.excluded[index].contains(dep.name()) {
            if dep.is_optional() {
                return Ok(());
            }
            return Err(ProvisioningError::RequiredPackageExcluded {
                package: dep.name().to_owned(),
                gav: self.layout.entry(index).gav().clone(),
                required_by: required_by.to_owned(),
            });
        }
        self.include(index, dep.name())
    }
}
