use crate::error::{DescriptionError, require_non_empty};
use crate::ids::ConfigId;
use crate::spec::group::{FeatureConfig, FeatureGroupConfig, GroupItem};
use indexmap::IndexMap;

/// A configuration: identity, properties and the features and groups it is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSpec {
    id: ConfigId,
    props: IndexMap<String, String>,
    items: Vec<GroupItem>,
    reset_origin: bool,
}

impl ConfigSpec {
    pub fn builder() -> ConfigSpecBuilder {
        ConfigSpecBuilder {
            model: None,
            name: None,
            props: Vec::new(),
            items: Vec::new(),
            reset_origin: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &ConfigId {
        &self.id
    }

    #[must_use]
    pub const fn properties(&self) -> &IndexMap<String, String> {
        &self.props
    }

    #[must_use]
    pub fn items(&self) -> &[GroupItem] {
        &self.items
    }

    /// `true` when unqualified names resolve in the feature-pack that owns the definition
    /// rather than in the origin context inherited from the caller.
    #[must_use]
    pub const fn resets_origin(&self) -> bool {
        self.reset_origin
    }
}

#[derive(Debug, Clone)]
pub struct ConfigSpecBuilder {
    model: Option<String>,
    name: Option<String>,
    props: Vec<(String, String)>,
    items: Vec<GroupItem>,
    reset_origin: bool,
}

impl ConfigSpecBuilder {
    #[must_use = "The builder must be built to produce a config spec."]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use = "The builder must be built to produce a config spec."]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use = "The builder must be built to produce a config spec."]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.push((name.into(), value.into()));
        self
    }

    #[must_use = "The builder must be built to produce a config spec."]
    pub const fn reset_origin(mut self, reset: bool) -> Self {
        self.reset_origin = reset;
        self
    }

    #[must_use = "The builder must be built to produce a config spec."]
    pub fn feature(mut self, feature: FeatureConfig) -> Self {
        self.items.push(GroupItem::Feature(feature));
        self
    }

    #[must_use = "The builder must be built to produce a config spec."]
    pub fn group(mut self, group: FeatureGroupConfig) -> Self {
        self.items.push(GroupItem::Group(group));
        self
    }

    #[must_use = "The builder must be built to produce a config spec."]
    pub fn item(mut self, item: impl Into<GroupItem>) -> Self {
        self.items.push(item.into());
        self
    }

    /// # Errors
    /// Returns [`DescriptionError`] for blank model/name values or duplicate properties.
    pub fn build(self) -> Result<ConfigSpec, DescriptionError> {
        if let Some(model) = &self.model {
            require_non_empty(model, "Config model")?;
        }
        if let Some(name) = &self.name {
            require_non_empty(name, "Config name")?;
        }
        let id = ConfigId::new(self.model, self.name);

        let mut props = IndexMap::with_capacity(self.props.len());
        for (name, value) in self.props {
            require_non_empty(&name, "Config property name")?;
            if props.contains_key(&name) {
                return Err(DescriptionError::duplicate(format!(
                    "Property {name} is defined twice for config {id}"
                )));
            }
            props.insert(name, value);
        }

        Ok(ConfigSpec { id, props, items: self.items, reset_origin: self.reset_origin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_anonymous_and_named_configs() -> Result<(), DescriptionError> {
        let anonymous = ConfigSpec::builder().feature(FeatureConfig::new("specA")).build()?;
        assert!(anonymous.id().is_anonymous());
        assert_eq!(anonymous.items().len(), 1);

        let named = ConfigSpec::builder()
            .model("standalone")
            .name("standalone.xml")
            .property("config-name", "standalone.xml")
            .build()?;
        assert_eq!(named.id(), &ConfigId::of("standalone", "standalone.xml"));
        assert_eq!(named.properties().get("config-name").map(String::as_str), Some("standalone.xml"));
        Ok(())
    }

    #[test]
    fn rejects_duplicate_property() {
        let result = ConfigSpec::builder().name("c").property("a", "1").property("a", "2").build();
        assert!(matches!(result, Err(DescriptionError::Duplicate { .. })));
    }
}
