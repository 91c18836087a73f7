//! Read-only output of a provisioning run.

use crate::error::DescriptionError;
use crate::gav::Gav;
use crate::ids::{ConfigId, ResolvedFeatureId, ResolvedSpecId};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// A resolved feature: its identity plus every parameter value it ends up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedFeature {
    id: ResolvedFeatureId,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    params: IndexMap<String, String>,
}

impl ProvisionedFeature {
    /// Starts a feature whose parameter map is seeded with the id parameters.
    pub fn builder(id: ResolvedFeatureId) -> ProvisionedFeatureBuilder {
        let params = id.params().clone();
        ProvisionedFeatureBuilder { id, params }
    }

    #[must_use]
    pub const fn id(&self) -> &ResolvedFeatureId {
        &self.id
    }

    #[must_use]
    pub const fn spec_id(&self) -> &ResolvedSpecId {
        self.id.spec_id()
    }

    #[must_use]
    pub const fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionedFeatureBuilder {
    id: ResolvedFeatureId,
    params: IndexMap<String, String>,
}

impl ProvisionedFeatureBuilder {
    /// Sets a parameter, replacing an earlier value under the same name.
    #[must_use = "The builder must be built to produce a provisioned feature."]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Reorders parameters: names in `order` first, the rest keep their relative order.
    #[must_use = "The builder must be built to produce a provisioned feature."]
    pub fn order_params<'a>(mut self, order: impl IntoIterator<Item = &'a str>) -> Self {
        let mut ordered = IndexMap::with_capacity(self.params.len());
        for name in order {
            if let Some((key, value)) = self.params.shift_remove_entry(name) {
                ordered.insert(key, value);
            }
        }
        ordered.extend(self.params);
        self.params = ordered;
        self
    }

    #[must_use]
    pub fn build(self) -> ProvisionedFeature {
        ProvisionedFeature { id: self.id, params: self.params }
    }
}

/// A resolved config: identity, merged properties and features in resolution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedConfig {
    #[serde(flatten)]
    id: ConfigId,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    properties: IndexMap<String, String>,
    #[serde(default)]
    features: Vec<ProvisionedFeature>,
}

impl ProvisionedConfig {
    pub fn builder(id: ConfigId) -> ProvisionedConfigBuilder {
        ProvisionedConfigBuilder { id, properties: IndexMap::new(), features: Vec::new() }
    }

    #[must_use]
    pub const fn id(&self) -> &ConfigId {
        &self.id
    }

    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.id.model()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.id.name()
    }

    #[must_use]
    pub const fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    #[must_use]
    pub fn features(&self) -> &[ProvisionedFeature] {
        &self.features
    }

    #[must_use]
    pub fn feature(&self, id: &ResolvedFeatureId) -> Option<&ProvisionedFeature> {
        self.features.iter().find(|f| f.id() == id)
    }

    #[must_use]
    pub fn has_features(&self) -> bool {
        !self.features.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionedConfigBuilder {
    id: ConfigId,
    properties: IndexMap<String, String>,
    features: Vec<ProvisionedFeature>,
}

impl ProvisionedConfigBuilder {
    /// Sets a property unless a value is already present.
    #[must_use = "The builder must be built to produce a provisioned config."]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.entry(name.into()).or_insert_with(|| value.into());
        self
    }

    #[must_use = "The builder must be built to produce a provisioned config."]
    pub fn feature(mut self, feature: ProvisionedFeature) -> Self {
        self.features.push(feature);
        self
    }

    /// # Errors
    /// Returns [`DescriptionError::Duplicate`] when a feature id occurs twice.
    pub fn build(self) -> Result<ProvisionedConfig, DescriptionError> {
        let mut seen = IndexSet::with_capacity(self.features.len());
        for feature in &self.features {
            if !seen.insert(feature.id()) {
                return Err(DescriptionError::duplicate(format!(
                    "Feature {} occurs twice in config {}",
                    feature.id(),
                    self.id
                )));
            }
        }
        Ok(ProvisionedConfig { id: self.id, properties: self.properties, features: self.features })
    }
}

/// An installed feature-pack and the packages picked from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedFeaturePack {
    gav: Gav,
    #[serde(default)]
    packages: IndexSet<String>,
}

impl ProvisionedFeaturePack {
    pub fn builder(gav: Gav) -> ProvisionedFeaturePackBuilder {
        ProvisionedFeaturePackBuilder { gav, packages: IndexSet::new() }
    }

    #[must_use]
    pub const fn gav(&self) -> &Gav {
        &self.gav
    }

    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }

    #[must_use]
    pub fn has_package(&self, name: &str) -> bool {
        self.packages.contains(name)
    }

    #[must_use]
    pub fn has_packages(&self) -> bool {
        !self.packages.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionedFeaturePackBuilder {
    gav: Gav,
    packages: IndexSet<String>,
}

impl ProvisionedFeaturePackBuilder {
    #[must_use = "The builder must be built to produce a provisioned feature-pack."]
    pub fn package(mut self, name: impl Into<String>) -> Self {
        self.packages.insert(name.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ProvisionedFeaturePack {
        ProvisionedFeaturePack { gav: self.gav, packages: self.packages }
    }
}

/// The result of a provisioning run: feature-packs and configs, both in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProvisionedState {
    #[serde(default)]
    feature_packs: Vec<ProvisionedFeaturePack>,
    #[serde(default)]
    configs: Vec<ProvisionedConfig>,
}

impl ProvisionedState {
    pub fn builder() -> ProvisionedStateBuilder {
        ProvisionedStateBuilder { feature_packs: Vec::new(), configs: Vec::new() }
    }

    #[must_use]
    pub fn feature_packs(&self) -> &[ProvisionedFeaturePack] {
        &self.feature_packs
    }

    #[must_use]
    pub fn feature_pack(&self, gav: &Gav) -> Option<&ProvisionedFeaturePack> {
        self.feature_packs.iter().find(|fp| fp.gav() == gav)
    }

    #[must_use]
    pub fn configs(&self) -> &[ProvisionedConfig] {
        &self.configs
    }

    #[must_use]
    pub fn config(&self, id: &ConfigId) -> Option<&ProvisionedConfig> {
        self.configs.iter().find(|c| c.id() == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feature_packs.is_empty() && self.configs.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionedStateBuilder {
    feature_packs: Vec<ProvisionedFeaturePack>,
    configs: Vec<ProvisionedConfig>,
}

impl ProvisionedStateBuilder {
    #[must_use = "The builder must be built to produce a provisioned state."]
    pub fn feature_pack(mut self, feature_pack: ProvisionedFeaturePack) -> Self {
        self.feature_packs.push(feature_pack);
        self
    }

    #[must_use = "The builder must be built to produce a provisioned state."]
    pub fn config(mut self, config: ProvisionedConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// # Errors
    /// Returns [`DescriptionError::Duplicate`] for a repeated feature-pack or a repeated
    /// non-anonymous config id.
    pub fn build(self) -> Result<ProvisionedState, DescriptionError> {
        for (i, fp) in self.feature_packs.iter().enumerate() {
            if self.feature_packs[..i].iter().any(|prev| prev.gav() == fp.gav()) {
                return Err(DescriptionError::duplicate(format!(
                    "Feature-pack {} is provisioned twice",
                    fp.gav()
                )));
            }
        }
        for (i, config) in self.configs.iter().enumerate() {
            let id = config.id();
            if !id.is_anonymous() && self.configs[..i].iter().any(|prev| prev.id() == id) {
                return Err(DescriptionError::duplicate(format!(
                    "Config {id} is provisioned twice"
                )));
            }
        }
        Ok(ProvisionedState { feature_packs: self.feature_packs, configs: self.configs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(name: &str) -> Result<ProvisionedFeature, DescriptionError> {
        let gav = Gav::new("org.example", "fp1", "1.0")?;
        let id = ResolvedFeatureId::create(ResolvedSpecId::new(gav, "specA"), "name", name)?;
        Ok(ProvisionedFeature::builder(id).param("p1", "v1").build())
    }

    #[test]
    fn feature_starts_with_id_params() -> Result<(), DescriptionError> {
        let feature = feature("a1")?;
        assert_eq!(feature.param("name"), Some("a1"));
        assert_eq!(feature.param("p1"), Some("v1"));
        Ok(())
    }

    #[test]
    fn orders_params_by_declaration() -> Result<(), DescriptionError> {
        let gav = Gav::new("org.example", "fp1", "1.0")?;
        let id = ResolvedFeatureId::create(ResolvedSpecId::new(gav, "specA"), "name", "a")?;
        let feature = ProvisionedFeature::builder(id)
            .param("z", "1")
            .param("b", "2")
            .order_params(["b", "name", "z"])
            .build();
        let names: Vec<&str> = feature.params().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["b", "name", "z"]);
        Ok(())
    }

    #[test]
    fn config_rejects_duplicate_features() -> Result<(), DescriptionError> {
        let result = ProvisionedConfig::builder(ConfigId::named("c"))
            .feature(feature("a1")?)
            .feature(feature("a1")?)
            .build();
        assert!(matches!(result, Err(DescriptionError::Duplicate { .. })));
        Ok(())
    }

    #[test]
    fn state_rejects_duplicate_named_configs_but_not_anonymous() -> Result<(), DescriptionError> {
        let anonymous = ProvisionedConfig::builder(ConfigId::anonymous()).build()?;
        let state = ProvisionedState::builder()
            .config(anonymous.clone())
            .config(anonymous)
            .build()?;
        assert_eq!(state.configs().len(), 2);

        let named = ProvisionedConfig::builder(ConfigId::of("m", "c")).build()?;
        let result = ProvisionedState::builder().config(named.clone()).config(named).build();
        assert!(matches!(result, Err(DescriptionError::Duplicate { .. })));
        Ok(())
    }

    #[test]
    fn state_survives_json() -> Result<(), Box<dyn std::error::Error>> {
        let gav = Gav::new("org.example", "fp1", "1.0")?;
        let state = ProvisionedState::builder()
            .feature_pack(ProvisionedFeaturePack::builder(gav).package("p1").build())
            .config(
                ProvisionedConfig::builder(ConfigId::of("m", "c"))
                    .property("prop", "value")
                    .feature(feature("a1")?)
                    .build()?,
            )
            .build()?;

        let json = serde_json::to_string(&state)?;
        let back: ProvisionedState = serde_json::from_str(&json)?;
        assert_eq!(back, state);
        Ok(())
    }
}
