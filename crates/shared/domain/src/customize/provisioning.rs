use crate::customize::{ConfigCustomizations, ConfigCustomizationsBuilder, FeaturePackConfig};
use crate::error::{DescriptionError, DescriptionErrorExt, require_non_empty};
use crate::gav::Gav;
use indexmap::IndexMap;

/// The installation request: feature-packs to install plus installation-level configs.
///
/// Feature-packs may be registered under an origin alias so that installation-level
/// configs can qualify spec and group names with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningConfig {
    feature_packs: IndexMap<Gav, FeaturePackConfig>,
    origins: IndexMap<String, Gav>,
    configs: ConfigCustomizations,
}

impl ProvisioningConfig {
    pub fn builder() -> ProvisioningConfigBuilder {
        ProvisioningConfigBuilder { feature_packs: Vec::new(), configs: None }
    }

    /// Feature-packs in the order they were requested.
    pub fn feature_packs(&self) -> impl Iterator<Item = &FeaturePackConfig> {
        self.feature_packs.values()
    }

    #[must_use]
    pub fn feature_pack(&self, gav: &Gav) -> Option<&FeaturePackConfig> {
        self.feature_packs.get(gav)
    }

    /// The requested configuration for any version of the artifact behind `gav`.
    #[must_use]
    pub fn feature_pack_for_artifact(&self, gav: &Gav) -> Option<&FeaturePackConfig> {
        self.feature_packs.values().find(|fp| fp.gav().same_artifact(gav))
    }

    #[must_use]
    pub fn has_feature_packs(&self) -> bool {
        !self.feature_packs.is_empty()
    }

    pub fn origins(&self) -> impl Iterator<Item = (&str, &Gav)> {
        self.origins.iter().map(|(alias, gav)| (alias.as_str(), gav))
    }

    #[must_use]
    pub fn origin(&self, alias: &str) -> Option<&Gav> {
        self.origins.get(alias)
    }

    /// Installation-level config customizations, outermost in every config chain.
    #[must_use]
    pub const fn customizations(&self) -> &ConfigCustomizations {
        &self.configs
    }
}

#[derive(Debug, Clone)]
pub struct ProvisioningConfigBuilder {
    feature_packs: Vec<(Option<String>, FeaturePackConfig)>,
    configs: Option<ConfigCustomizationsBuilder>,
}

impl ProvisioningConfigBuilder {
    #[must_use = "The builder must be built to produce a provisioning config."]
    pub fn feature_pack(mut self, config: FeaturePackConfig) -> Self {
        self.feature_packs.push((None, config));
        self
    }

    /// Adds a feature-pack addressable as `origin` from installation-level configs.
    #[must_use = "The builder must be built to produce a provisioning config."]
    pub fn feature_pack_as(mut self, origin: impl Into<String>, config: FeaturePackConfig) -> Self {
        self.feature_packs.push((Some(origin.into()), config));
        self
    }

    #[must_use = "The builder must be built to produce a provisioning config."]
    pub fn configs(mut self, configs: ConfigCustomizationsBuilder) -> Self {
        self.configs = Some(configs);
        self
    }

    /// # Errors
    /// Returns [`DescriptionError::Duplicate`] when an artifact or an origin is listed twice,
    /// and any error raised by the installation-level customizations.
    pub fn build(self) -> Result<ProvisioningConfig, DescriptionError> {
        let mut feature_packs: IndexMap<Gav, FeaturePackConfig> =
            IndexMap::with_capacity(self.feature_packs.len());
        let mut origins = IndexMap::new();

        for (origin, config) in self.feature_packs {
            let gav = config.gav().clone();
            if feature_packs.keys().any(|known| known.same_artifact(&gav)) {
                return Err(DescriptionError::duplicate(format!(
                    "Feature-pack {} is listed more than once",
                    gav.to_ga_string()
                )));
            }
            if let Some(origin) = origin {
                require_non_empty(&origin, "Feature-pack origin")?;
                if origins.insert(origin.clone(), gav.clone()).is_some() {
                    return Err(DescriptionError::duplicate(format!(
                        "Origin {origin} is assigned to more than one feature-pack"
                    )));
                }
            }
            feature_packs.insert(gav, config);
        }

        let configs = match self.configs {
            Some(configs) => configs.build().context("in the installation configs")?,
            None => ConfigCustomizations::default(),
        };

        Ok(ProvisioningConfig { feature_packs, origins, configs })
    }
}
