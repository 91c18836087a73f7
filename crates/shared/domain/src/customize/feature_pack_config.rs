use crate::customize::{ConfigCustomizations, ConfigCustomizationsBuilder};
use crate::error::{DescriptionError, DescriptionErrorExt, require_non_empty};
use crate::gav::Gav;
use indexmap::IndexSet;

/// How a feature-pack is installed: which packages and which configs it contributes.
///
/// Used both at the top of a provisioning descriptor and for dependencies declared by a
/// feature-pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePackConfig {
    gav: Gav,
    configs: ConfigCustomizations,
    inherit_packages: bool,
    included_packages: IndexSet<String>,
    excluded_packages: IndexSet<String>,
}

impl FeaturePackConfig {
    /// A configuration inheriting every default package and config.
    pub fn for_gav(gav: Gav) -> Self {
        Self {
            gav,
            configs: ConfigCustomizations::default(),
            inherit_packages: true,
            included_packages: IndexSet::new(),
            excluded_packages: IndexSet::new(),
        }
    }

    pub fn builder(gav: Gav) -> FeaturePackConfigBuilder {
        FeaturePackConfigBuilder {
            inner: Self::for_gav(gav),
            configs: None,
            duplicates: Vec::new(),
        }
    }

    #[must_use]
    pub const fn gav(&self) -> &Gav {
        &self.gav
    }

    #[must_use]
    pub const fn customizations(&self) -> &ConfigCustomizations {
        &self.configs
    }

    #[must_use]
    pub const fn inherits_packages(&self) -> bool {
        self.inherit_packages
    }

    pub fn included_packages(&self) -> impl Iterator<Item = &str> {
        self.included_packages.iter().map(String::as_str)
    }

    pub fn excluded_packages(&self) -> impl Iterator<Item = &str> {
        self.excluded_packages.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_package_included(&self, name: &str) -> bool {
        self.included_packages.contains(name)
    }

    #[must_use]
    pub fn is_package_excluded(&self, name: &str) -> bool {
        self.excluded_packages.contains(name)
    }

    /// Same configuration for another version of the feature-pack.
    #[must_use]
    pub fn with_gav(&self, gav: Gav) -> Self {
        Self { gav, ..self.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct FeaturePackConfigBuilder {
    inner: FeaturePackConfig,
    configs: Option<ConfigCustomizationsBuilder>,
    duplicates: Vec<String>,
}

impl FeaturePackConfigBuilder {
    #[must_use = "The builder must be built to produce a feature-pack config."]
    pub const fn inherit_packages(mut self, inherit: bool) -> Self {
        self.inner.inherit_packages = inherit;
        self
    }

    #[must_use = "The builder must be built to produce a feature-pack config."]
    pub fn include_package(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.inner.included_packages.insert(name.clone()) {
            self.duplicates.push(format!("Package {name} has already been included"));
        }
        self
    }

    #[must_use = "The builder must be built to produce a feature-pack config."]
    pub fn exclude_package(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.inner.excluded_packages.insert(name.clone()) {
            self.duplicates.push(format!("Package {name} has already been excluded"));
        }
        self
    }

    /// Config customizations of this feature-pack.
    #[must_use = "The builder must be built to produce a feature-pack config."]
    pub fn configs(mut self, configs: ConfigCustomizationsBuilder) -> Self {
        self.configs = Some(configs);
        self
    }

    /// # Errors
    /// Returns [`DescriptionError`] for duplicate or conflicting package rules and for
    /// invalid config customizations, with the feature-pack named in the context.
    pub fn build(self) -> Result<FeaturePackConfig, DescriptionError> {
        let mut inner = self.inner;
        let context = format!("in the configuration of {}", inner.gav);

        if let Some(duplicate) = self.duplicates.into_iter().next() {
            return Err(DescriptionError::duplicate(duplicate)).context(context);
        }
        for name in &inner.included_packages {
            require_non_empty(name, "Package name").context(context.clone())?;
            if inner.excluded_packages.contains(name) {
                return Err(DescriptionError::conflict(format!(
                    "Package {name} has been both included and excluded"
                )))
                .context(context);
            }
        }
        if let Some(configs) = self.configs {
            inner.configs = configs.build().context(context)?;
        }
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gav() -> Gav {
        Gav::new("org.example", "fp1", "1.0").expect("valid gav")
    }

    #[test]
    fn defaults_inherit_everything() {
        let config = FeaturePackConfig::for_gav(gav());
        assert!(config.inherits_packages());
        assert!(config.customizations().inherits_configs());
        assert!(config.customizations().inherits_model_only_configs());
        assert!(config.customizations().defined_configs().is_empty());
    }

    #[test]
    fn rejects_package_included_and_excluded() {
        let err = FeaturePackConfig::builder(gav())
            .include_package("p1")
            .exclude_package("p1")
            .build()
            .expect_err("conflict expected");
        assert!(matches!(err, DescriptionError::Conflict { .. }));
        assert!(err.to_string().contains("org.example:fp1:1.0"));
    }

    #[test]
    fn config_errors_carry_the_feature_pack() {
        let err = FeaturePackConfig::builder(gav())
            .configs(ConfigCustomizations::builder().include_model("m").exclude_model("m", true))
            .build()
            .expect_err("conflict expected");
        assert!(err.to_string().contains("in the configuration of org.example:fp1:1.0"));
    }
}
