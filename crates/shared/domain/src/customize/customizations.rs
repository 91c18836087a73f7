use crate::error::DescriptionError;
use crate::ids::ConfigId;
use crate::spec::{ConfigSpec, FeatureFilter};
use indexmap::{IndexMap, IndexSet};

/// A config selected by id, with the filter applied to its top-level features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedConfig {
    id: ConfigId,
    filter: FeatureFilter,
}

impl IncludedConfig {
    pub fn new(id: ConfigId) -> Self {
        Self { id, filter: FeatureFilter::default() }
    }

    pub const fn with_filter(id: ConfigId, filter: FeatureFilter) -> Self {
        Self { id, filter }
    }

    #[must_use]
    pub const fn id(&self) -> &ConfigId {
        &self.id
    }

    #[must_use]
    pub const fn filter(&self) -> &FeatureFilter {
        &self.filter
    }
}

/// Outcome of evaluating one [`ConfigCustomizations`] level for a candidate config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigDecision<'a> {
    /// Excluded by name or by model.
    Excluded,
    /// Included by name (with its filter) or by model (`None`).
    Included(Option<&'a IncludedConfig>),
    /// No explicit rule applies; carries the inheritance flag for the config's kind.
    Inherited(bool),
}

/// Which configs are taken from a feature-pack and which are defined locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCustomizations {
    inherit_configs: bool,
    inherit_model_only_configs: bool,
    included_models: IndexSet<String>,
    excluded_models: IndexMap<String, bool>,
    included_configs: IndexMap<ConfigId, IncludedConfig>,
    excluded_configs: IndexSet<ConfigId>,
    defined_configs: Vec<ConfigSpec>,
}

impl Default for ConfigCustomizations {
    fn default() -> Self {
        Self {
            inherit_configs: true,
            inherit_model_only_configs: true,
            included_models: IndexSet::new(),
            excluded_models: IndexMap::new(),
            included_configs: IndexMap::new(),
            excluded_configs: IndexSet::new(),
            defined_configs: Vec::new(),
        }
    }
}

impl ConfigCustomizations {
    pub fn builder() -> ConfigCustomizationsBuilder {
        ConfigCustomizationsBuilder { inner: Self::default(), problems: Vec::new() }
    }

    #[must_use]
    pub const fn inherits_configs(&self) -> bool {
        self.inherit_configs
    }

    #[must_use]
    pub const fn inherits_model_only_configs(&self) -> bool {
        self.inherit_model_only_configs
    }

    #[must_use]
    pub fn is_model_included(&self, model: &str) -> bool {
        self.included_models.contains(model)
    }

    /// `Some(named_configs_only)` when the model is excluded.
    #[must_use]
    pub fn model_exclusion(&self, model: &str) -> Option<bool> {
        self.excluded_models.get(model).copied()
    }

    /// `true` when the config's model exclusion applies to this particular config.
    #[must_use]
    pub fn is_config_model_excluded(&self, id: &ConfigId) -> bool {
        id.model()
            .and_then(|model| self.model_exclusion(model))
            .is_some_and(|named_only| !named_only || id.name().is_some())
    }

    #[must_use]
    pub fn included_config(&self, id: &ConfigId) -> Option<&IncludedConfig> {
        self.included_configs.get(id)
    }

    #[must_use]
    pub fn is_config_excluded(&self, id: &ConfigId) -> bool {
        self.excluded_configs.contains(id)
    }

    pub fn included_configs(&self) -> impl Iterator<Item = &IncludedConfig> {
        self.included_configs.values()
    }

    /// Configs defined by this customization, in declaration order.
    #[must_use]
    pub fn defined_configs(&self) -> &[ConfigSpec] {
        &self.defined_configs
    }

    /// Applies the precedence rules of a single customization level: exclusion by name,
    /// inclusion by name, model exclusion, model inclusion, then inheritance.
    #[must_use]
    pub fn decide(&self, id: &ConfigId) -> ConfigDecision<'_> {
        if id.is_anonymous() {
            return ConfigDecision::Inherited(self.inherit_configs);
        }
        if self.is_config_excluded(id) {
            return ConfigDecision::Excluded;
        }
        if let Some(included) = self.included_config(id) {
            return ConfigDecision::Included(Some(included));
        }
        if self.is_config_model_excluded(id) {
            return ConfigDecision::Excluded;
        }
        if id.model().is_some_and(|model| self.is_model_included(model)) {
            return ConfigDecision::Included(None);
        }
        ConfigDecision::Inherited(if id.is_model_only() {
            self.inherit_model_only_configs
        } else {
            self.inherit_configs
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConfigCustomizationsBuilder {
    inner: ConfigCustomizations,
    problems: Vec<DescriptionError>,
}

impl ConfigCustomizationsBuilder {
    #[must_use = "The builder must be built to produce customizations."]
    pub const fn inherit_configs(mut self, inherit: bool) -> Self {
        self.inner.inherit_configs = inherit;
        self
    }

    #[must_use = "The builder must be built to produce customizations."]
    pub const fn inherit_model_only_configs(mut self, inherit: bool) -> Self {
        self.inner.inherit_model_only_configs = inherit;
        self
    }

    #[must_use = "The builder must be built to produce customizations."]
    pub fn include_model(mut self, model: impl Into<String>) -> Self {
        self.inner.included_models.insert(model.into());
        self
    }

    /// Excludes a model. With `named_configs_only` the model-only config stays eligible.
    #[must_use = "The builder must be built to produce customizations."]
    pub fn exclude_model(mut self, model: impl Into<String>, named_configs_only: bool) -> Self {
        self.inner.excluded_models.insert(model.into(), named_configs_only);
        self
    }

    #[must_use = "The builder must be built to produce customizations."]
    pub fn include_config(mut self, config: IncludedConfig) -> Self {
        if config.id().is_anonymous() {
            self.problems.push(DescriptionError::missing(
                "An anonymous config cannot be included by id",
            ));
        } else if self.inner.included_configs.contains_key(config.id()) {
            self.problems.push(DescriptionError::duplicate(format!(
                "Config {} has already been included",
                config.id()
            )));
        } else {
            self.inner.included_configs.insert(config.id().clone(), config);
        }
        self
    }

    #[must_use = "The builder must be built to produce customizations."]
    pub fn include_default_config(self, model: impl Into<String>, name: impl Into<String>) -> Self {
        self.include_config(IncludedConfig::new(ConfigId::of(model, name)))
    }

    #[must_use = "The builder must be built to produce customizations."]
    pub fn exclude_config(mut self, id: ConfigId) -> Self {
        if id.name().is_none() {
            self.problems.push(DescriptionError::missing(format!(
                "Only named configs can be excluded by id, got {id}"
            )));
        } else {
            self.inner.excluded_configs.insert(id);
        }
        self
    }

    #[must_use = "The builder must be built to produce customizations."]
    pub fn exclude_default_config(self, model: impl Into<String>, name: impl Into<String>) -> Self {
        self.exclude_config(ConfigId::of(model, name))
    }

    #[must_use = "The builder must be built to produce customizations."]
    pub fn define_config(mut self, config: ConfigSpec) -> Self {
        let id = config.id();
        if !id.is_anonymous() && self.inner.defined_configs.iter().any(|c| c.id() == id) {
            self.problems.push(DescriptionError::duplicate(format!(
                "Config model with id {id} has already been defined"
            )));
        } else {
            self.inner.defined_configs.push(config);
        }
        self
    }

    /// # Errors
    /// Returns the first recorded problem, or [`DescriptionError::Conflict`] when a model or
    /// config is both included and excluded.
    pub fn build(self) -> Result<ConfigCustomizations, DescriptionError> {
        if let Some(problem) = self.problems.into_iter().next() {
            return Err(problem);
        }
        let inner = self.inner;
        if let Some(model) =
            inner.included_models.iter().find(|m| inner.excluded_models.contains_key(*m))
        {
            return Err(DescriptionError::conflict(format!(
                "Model {model} has been both included and excluded"
            )));
        }
        if let Some(id) = inner.included_configs.keys().find(|id| inner.excluded_configs.contains(*id))
        {
            return Err(DescriptionError::conflict(format!(
                "Config {id} has been both included and excluded"
            )));
        }
        Ok(inner)
    }
}
