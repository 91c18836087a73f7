use crate::customize::FeaturePackConfig;
use crate::error::{DescriptionError, DescriptionErrorExt};
use crate::gav::Gav;
use crate::spec::{ConfigSpec, FeatureGroupSpec, FeatureSpec, PackageSpec};
use indexmap::{IndexMap, IndexSet};

/// A dependency of a feature-pack on another feature-pack, optionally under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePackDependency {
    origin: Option<String>,
    config: FeaturePackConfig,
}

impl FeaturePackDependency {
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    #[must_use]
    pub const fn config(&self) -> &FeaturePackConfig {
        &self.config
    }

    #[must_use]
    pub const fn gav(&self) -> &Gav {
        self.config.gav()
    }
}

/// Everything a feature-pack ships: packages, feature specs, groups and configs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePackSpec {
    gav: Gav,
    dependencies: Vec<FeaturePackDependency>,
    default_packages: IndexSet<String>,
    packages: IndexMap<String, PackageSpec>,
    feature_specs: IndexMap<String, FeatureSpec>,
    groups: IndexMap<String, FeatureGroupSpec>,
    configs: Vec<ConfigSpec>,
}

impl FeaturePackSpec {
    pub fn builder(gav: Gav) -> FeaturePackSpecBuilder {
        FeaturePackSpecBuilder {
            gav,
            dependencies: Vec::new(),
            default_packages: Vec::new(),
            packages: Vec::new(),
            feature_specs: Vec::new(),
            groups: Vec::new(),
            configs: Vec::new(),
        }
    }

    #[must_use]
    pub const fn gav(&self) -> &Gav {
        &self.gav
    }

    /// Dependencies in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[FeaturePackDependency] {
        &self.dependencies
    }

    /// The dependency declared under `origin`.
    #[must_use]
    pub fn dependency(&self, origin: &str) -> Option<&FeaturePackDependency> {
        self.dependencies.iter().find(|dep| dep.origin() == Some(origin))
    }

    /// The dependency on any version of the artifact behind `gav`.
    #[must_use]
    pub fn dependency_on(&self, gav: &Gav) -> Option<&FeaturePackDependency> {
        self.dependencies.iter().find(|dep| dep.gav().same_artifact(gav))
    }

    pub fn default_packages(&self) -> impl Iterator<Item = &str> {
        self.default_packages.iter().map(String::as_str)
    }

    #[must_use]
    pub fn package(&self, name: &str) -> Option<&PackageSpec> {
        self.packages.get(name)
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageSpec> {
        self.packages.values()
    }

    #[must_use]
    pub fn has_packages(&self) -> bool {
        !self.packages.is_empty()
    }

    #[must_use]
    pub fn feature_spec(&self, name: &str) -> Option<&FeatureSpec> {
        self.feature_specs.get(name)
    }

    pub fn feature_specs(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.feature_specs.values()
    }

    #[must_use]
    pub fn feature_group(&self, name: &str) -> Option<&FeatureGroupSpec> {
        self.groups.get(name)
    }

    pub fn feature_groups(&self) -> impl Iterator<Item = &FeatureGroupSpec> {
        self.groups.values()
    }

    /// Configs defined by the feature-pack, in declaration order.
    #[must_use]
    pub fn configs(&self) -> &[ConfigSpec] {
        &self.configs
    }
}

#[derive(Debug, Clone)]
pub struct FeaturePackSpecBuilder {
    gav: Gav,
    dependencies: Vec<FeaturePackDependency>,
    default_packages: Vec<String>,
    packages: Vec<PackageSpec>,
    feature_specs: Vec<FeatureSpec>,
    groups: Vec<FeatureGroupSpec>,
    configs: Vec<ConfigSpec>,
}

impl FeaturePackSpecBuilder {
    #[must_use = "The builder must be built to produce a feature-pack spec."]
    pub fn dependency(mut self, config: FeaturePackConfig) -> Self {
        self.dependencies.push(FeaturePackDependency { origin: None, config });
        self
    }

    /// Adds a dependency that specs, groups and packages can refer to as `origin`.
    #[must_use = "The builder must be built to produce a feature-pack spec."]
    pub fn dependency_as(mut self, origin: impl Into<String>, config: FeaturePackConfig) -> Self {
        self.dependencies.push(FeaturePackDependency { origin: Some(origin.into()), config });
        self
    }

    #[must_use = "The builder must be built to produce a feature-pack spec."]
    pub fn package(mut self, package: PackageSpec) -> Self {
        self.packages.push(package);
        self
    }

    /// Adds a package and marks it as installed by default.
    #[must_use = "The builder must be built to produce a feature-pack spec."]
    pub fn default_package(mut self, package: PackageSpec) -> Self {
        self.default_packages.push(package.name().to_owned());
        self.packages.push(package);
        self
    }

    /// Marks an already added (or later added) package as installed by default.
    #[must_use = "The builder must be built to produce a feature-pack spec."]
    pub fn mark_default(mut self, name: impl Into<String>) -> Self {
        self.default_packages.push(name.into());
        self
    }

    #[must_use = "The builder must be built to produce a feature-pack spec."]
    pub fn feature_spec(mut self, spec: FeatureSpec) -> Self {
        self.feature_specs.push(spec);
        self
    }

    #[must_use = "The builder must be built to produce a feature-pack spec."]
    pub fn feature_group(mut self, group: FeatureGroupSpec) -> Self {
        self.groups.push(group);
        self
    }

    #[must_use = "The builder must be built to produce a feature-pack spec."]
    pub fn config(mut self, config: ConfigSpec) -> Self {
        self.configs.push(config);
        self
    }

    /// # Errors
    /// Returns [`DescriptionError`] for duplicate definitions, packages depending on
    /// undefined packages, and origins that do not name a declared dependency.
    pub fn build(self) -> Result<FeaturePackSpec, DescriptionError> {
        let context = format!("in feature-pack {}", self.gav);
        self.assemble().context(context)
    }

    fn assemble(self) -> Result<FeaturePackSpec, DescriptionError> {
        let gav = self.gav;

        let mut aliases = IndexSet::new();
        for (i, dep) in self.dependencies.iter().enumerate() {
            if dep.gav().same_artifact(&gav) {
                return Err(DescriptionError::invalid_reference(format!(
                    "Feature-pack cannot depend on itself ({})",
                    dep.gav()
                )));
            }
            if self.dependencies[..i].iter().any(|prev| prev.gav().same_artifact(dep.gav())) {
                return Err(DescriptionError::duplicate(format!(
                    "Dependency on {} is declared more than once",
                    dep.gav().to_ga_string()
                )));
            }
            if let Some(origin) = dep.origin()
                && !aliases.insert(origin)
            {
                return Err(DescriptionError::duplicate(format!(
                    "Dependency origin {origin} is used more than once"
                )));
            }
        }

        let mut packages = IndexMap::with_capacity(self.packages.len());
        for package in self.packages {
            let name = package.name().to_owned();
            if packages.insert(name.clone(), package).is_some() {
                return Err(DescriptionError::duplicate(format!("Package {name} is defined twice")));
            }
        }
        for package in packages.values() {
            for dep in package.local_dependencies() {
                if !packages.contains_key(dep.name()) {
                    return Err(unresolved(format!(
                        "Package {} depends on undefined package {}",
                        package.name(),
                        dep.name()
                    )));
                }
            }
            for origin in package.external_origins() {
                if !aliases.contains(origin) {
                    return Err(unresolved(format!(
                        "Package {} depends on packages of unknown origin {origin}",
                        package.name()
                    )));
                }
            }
        }

        let mut default_packages = IndexSet::with_capacity(self.default_packages.len());
        for name in self.default_packages {
            if !packages.contains_key(&name) {
                return Err(unresolved(format!("Default package {name} is not defined")));
            }
            default_packages.insert(name);
        }

        let mut feature_specs = IndexMap::with_capacity(self.feature_specs.len());
        for spec in self.feature_specs {
            for reference in spec.references() {
                if let Some(origin) = reference.origin()
                    && !aliases.contains(origin)
                {
                    return Err(DescriptionError::invalid_reference(format!(
                        "Reference {} of spec {} uses unknown origin {origin}",
                        reference.name(),
                        spec.name()
                    )));
                }
            }
            let name = spec.name().to_owned();
            if feature_specs.insert(name.clone(), spec).is_some() {
                return Err(DescriptionError::duplicate(format!(
                    "Feature spec {name} is defined twice"
                )));
            }
        }

        let mut groups = IndexMap::with_capacity(self.groups.len());
        for group in self.groups {
            let name = group.name().to_owned();
            if groups.insert(name.clone(), group).is_some() {
                return Err(DescriptionError::duplicate(format!(
                    "Feature group {name} is defined twice"
                )));
            }
        }

        for (i, config) in self.configs.iter().enumerate() {
            let id = config.id();
            if !id.is_anonymous() && self.configs[..i].iter().any(|prev| prev.id() == id) {
                return Err(DescriptionError::duplicate(format!("Config {id} is defined twice")));
            }
        }

        Ok(FeaturePackSpec {
            gav,
            dependencies: self.dependencies,
            default_packages,
            packages,
            feature_specs,
            groups,
            configs: self.configs,
        })
    }
}

fn unresolved(message: String) -> DescriptionError {
    DescriptionError::UnresolvedDependency { message: message.into(), context: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{FeatureParameterSpec, FeatureReferenceSpec, PackageDependencySpec};

    fn gav(artifact: &str) -> Gav {
        Gav::new("org.example", artifact, "1.0").expect("valid gav")
    }

    #[test]
    fn builds_a_feature_pack() -> Result<(), DescriptionError> {
        let fp = FeaturePackSpec::builder(gav("fp1"))
            .dependency_as("dep", FeaturePackConfig::for_gav(gav("fp2")))
            .default_package(
                PackageSpec::builder("p1")
                    .dependency(PackageDependencySpec::required("p2"))
                    .external_dependency("dep", PackageDependencySpec::optional("x"))
                    .build()?,
            )
            .package(PackageSpec::new("p2")?)
            .feature_spec(
                FeatureSpec::builder("specA").param(FeatureParameterSpec::id("name")).build()?,
            )
            .build()?;

        assert_eq!(fp.default_packages().collect::<Vec<_>>(), vec!["p1"]);
        assert!(fp.package("p2").is_some());
        assert_eq!(fp.dependency("dep").map(FeaturePackDependency::gav), Some(&gav("fp2")));
        assert!(fp.dependency_on(&Gav::latest("org.example", "fp2")?).is_some());
        assert!(fp.feature_spec("specA").is_some());
        Ok(())
    }

    #[test]
    fn rejects_undefined_local_package_dependency() -> Result<(), DescriptionError> {
        let err = FeaturePackSpec::builder(gav("fp1"))
            .package(
                PackageSpec::builder("p1")
                    .dependency(PackageDependencySpec::optional("missing"))
                    .build()?,
            )
            .build()
            .expect_err("unresolved dependency expected");
        assert!(matches!(err, DescriptionError::UnresolvedDependency { .. }));
        assert!(err.to_string().contains("in feature-pack org.example:fp1:1.0"));
        Ok(())
    }

    #[test]
    fn rejects_unknown_origins() -> Result<(), DescriptionError> {
        let result = FeaturePackSpec::builder(gav("fp1"))
            .package(
                PackageSpec::builder("p1")
                    .external_dependency("nowhere", PackageDependencySpec::required("p"))
                    .build()?,
            )
            .build();
        assert!(matches!(result, Err(DescriptionError::UnresolvedDependency { .. })));

        let result = FeaturePackSpec::builder(gav("fp1"))
            .feature_spec(
                FeatureSpec::builder("specB")
                    .param(FeatureParameterSpec::id("b"))
                    .param(FeatureParameterSpec::required("a"))
                    .reference(FeatureReferenceSpec::builder("specA").origin("nowhere").build()?)
                    .build()?,
            )
            .build();
        assert!(matches!(result, Err(DescriptionError::InvalidReference { .. })));
        Ok(())
    }

    #[test]
    fn rejects_duplicates() -> Result<(), DescriptionError> {
        let result = FeaturePackSpec::builder(gav("fp1"))
            .package(PackageSpec::new("p1")?)
            .package(PackageSpec::new("p1")?)
            .build();
        assert!(matches!(result, Err(DescriptionError::Duplicate { .. })));

        let result = FeaturePackSpec::builder(gav("fp1"))
            .dependency(FeaturePackConfig::for_gav(gav("fp2")))
            .dependency(FeaturePackConfig::for_gav(gav("fp2")))
            .build();
        assert!(matches!(result, Err(DescriptionError::Duplicate { .. })));

        let config = ConfigSpec::builder().model("m").name("c").build()?;
        let result = FeaturePackSpec::builder(gav("fp1"))
            .config(config.clone())
            .config(config)
            .build();
        assert!(matches!(result, Err(DescriptionError::Duplicate { .. })));
        Ok(())
    }
}
