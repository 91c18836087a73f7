//! Serde shapes of the TOML documents and their conversion into domain descriptions.
//!
//! A `feature-pack.toml` looks like:
//!
//! ```toml
//! gav = "org.example:fp1:1.0"
//!
//! [[dependencies]]
//! gav = "org.example:fp2:1.0"
//! origin = "fp2"
//!
//! [[packages]]
//! name = "p1"
//! default = true
//! dependencies = [{ name = "p2", origin = "fp2", optional = true }]
//!
//! [[specs]]
//! name = "specA"
//! params = [{ name = "name", id = true }, { name = "list", type = "list", default = "[]" }]
//! provides = ["cap.$name"]
//!
//! [[configs]]
//! model = "host"
//! name = "main"
//! items = [{ spec = "specA", params = { name = "a" } }, { group = "base", origin = "fp2" }]
//! ```

use fpm_domain::customize::{
    ConfigCustomizations, ConfigCustomizationsBuilder, FeaturePackConfig, IncludedConfig,
    ProvisioningConfig,
};
use fpm_domain::spec::{
    ConfigSpec, FeatureConfig, FeatureFilter, FeatureGroupConfig, FeatureGroupSpec,
    FeatureParameterSpec, FeaturePackSpec, FeatureRef, FeatureReferenceSpec, FeatureSpec,
    GroupItem, PackageDependencySpec, PackageSpec, ParamType, SpecRef,
};
use fpm_domain::{ConfigId, DescriptionError, DescriptionErrorExt, FeatureId, Gav};
use indexmap::IndexMap;
use serde::Deserialize;

const fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct FeaturePackDocument {
    gav: Gav,
    #[serde(default)]
    dependencies: Vec<FeaturePackConfigDocument>,
    #[serde(default)]
    packages: Vec<PackageDocument>,
    #[serde(default)]
    specs: Vec<SpecDocument>,
    #[serde(default)]
    groups: Vec<GroupDocument>,
    #[serde(default)]
    configs: Vec<ConfigDocument>,
}

impl FeaturePackDocument {
    pub(crate) const fn gav(&self) -> &Gav {
        &self.gav
    }

    pub(crate) fn into_spec(self) -> Result<FeaturePackSpec, DescriptionError> {
        let mut builder = FeaturePackSpec::builder(self.gav);

        for dependency in self.dependencies {
            let (origin, config) = dependency.into_config()?;
            builder = match origin {
                Some(origin) => builder.dependency_as(origin, config),
                None => builder.dependency(config),
            };
        }
        for package in self.packages {
            let default = package.default;
            let package = package.into_spec()?;
            builder =
                if default { builder.default_package(package) } else { builder.package(package) };
        }
        for spec in self.specs {
            builder = builder.feature_spec(spec.into_spec()?);
        }
        for group in self.groups {
            builder = builder.feature_group(group.into_spec()?);
        }
        for config in self.configs {
            builder = builder.config(config.into_spec(false)?);
        }
        builder.build()
    }
}

/// A provisioning descriptor: the feature-packs to install and installation-level configs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct DescriptorDocument {
    #[serde(default)]
    feature_packs: Vec<FeaturePackConfigDocument>,
    configs: Option<CustomizationsDocument>,
}

impl DescriptorDocument {
    pub(crate) fn into_config(self) -> Result<ProvisioningConfig, DescriptionError> {
        let mut builder = ProvisioningConfig::builder();
        for feature_pack in self.feature_packs {
            let (origin, config) = feature_pack.into_config()?;
            builder = match origin {
                Some(origin) => builder.feature_pack_as(origin, config),
                None => builder.feature_pack(config),
            };
        }
        if let Some(configs) = self.configs {
            builder = builder.configs(configs.into_builder()?);
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FeaturePackConfigDocument {
    gav: Gav,
    origin: Option<String>,
    #[serde(default = "yes")]
    inherit_packages: bool,
    #[serde(default)]
    include_packages: Vec<String>,
    #[serde(default)]
    exclude_packages: Vec<String>,
    configs: Option<CustomizationsDocument>,
}

impl FeaturePackConfigDocument {
    fn into_config(self) -> Result<(Option<String>, FeaturePackConfig), DescriptionError> {
        let mut builder =
            FeaturePackConfig::builder(self.gav).inherit_packages(self.inherit_packages);
        for package in self.include_packages {
            builder = builder.include_package(package);
        }
        for package in self.exclude_packages {
            builder = builder.exclude_package(package);
        }
        if let Some(configs) = self.configs {
            builder = builder.configs(configs.into_builder()?);
        }
        Ok((self.origin, builder.build()?))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CustomizationsDocument {
    #[serde(default = "yes")]
    inherit: bool,
    #[serde(default = "yes")]
    inherit_model_only: bool,
    #[serde(default)]
    include_models: Vec<String>,
    #[serde(default)]
    exclude_models: Vec<ModelExclusionDocument>,
    #[serde(default)]
    include: Vec<IncludedConfigDocument>,
    #[serde(default)]
    exclude: Vec<ConfigRefDocument>,
    #[serde(default)]
    define: Vec<ConfigDocument>,
}

impl CustomizationsDocument {
    fn into_builder(self) -> Result<ConfigCustomizationsBuilder, DescriptionError> {
        let mut builder = ConfigCustomizations::builder()
            .inherit_configs(self.inherit)
            .inherit_model_only_configs(self.inherit_model_only);
        for model in self.include_models {
            builder = builder.include_model(model);
        }
        for exclusion in self.exclude_models {
            builder = match exclusion {
                ModelExclusionDocument::Model(model) => builder.exclude_model(model, false),
                ModelExclusionDocument::Detailed(ModelExclusionTable { model, named_only }) => {
                    builder.exclude_model(model, named_only)
                },
            };
        }
        for included in self.include {
            let id = ConfigId::new(included.model, Some(included.name));
            let config = match included.filter {
                Some(filter) => IncludedConfig::with_filter(id, filter.into_filter()?),
                None => IncludedConfig::new(id),
            };
            builder = builder.include_config(config);
        }
        for excluded in self.exclude {
            builder = builder.exclude_config(ConfigId::new(excluded.model, Some(excluded.name)));
        }
        for config in self.define {
            builder = builder.define_config(config.into_spec(true)?);
        }
        Ok(builder)
    }
}

/// `"model"` excludes every config of the model; the table form can keep the model-only one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelExclusionDocument {
    Model(String),
    Detailed(ModelExclusionTable),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ModelExclusionTable {
    model: String,
    #[serde(default)]
    named_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct IncludedConfigDocument {
    model: Option<String>,
    name: String,
    filter: Option<FilterDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigRefDocument {
    model: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PackageDocument {
    name: String,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    dependencies: Vec<PackageDependencyDocument>,
    #[serde(default)]
    params: Vec<PackageParamDocument>,
}

impl PackageDocument {
    fn into_spec(self) -> Result<PackageSpec, DescriptionError> {
        let mut builder = PackageSpec::builder(self.name);
        for dependency in self.dependencies {
            let spec = if dependency.optional {
                PackageDependencySpec::optional(dependency.name)
            } else {
                PackageDependencySpec::required(dependency.name)
            };
            builder = match dependency.origin {
                Some(origin) => builder.external_dependency(origin, spec),
                None => builder.dependency(spec),
            };
        }
        for param in self.params {
            builder = builder.param(param.name, param.default);
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PackageDependencyDocument {
    name: String,
    origin: Option<String>,
    #[serde(default)]
    optional: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PackageParamDocument {
    name: String,
    default: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct SpecDocument {
    name: String,
    #[serde(default)]
    params: Vec<ParamDocument>,
    #[serde(default)]
    references: Vec<ReferenceDocument>,
    #[serde(default)]
    provides: Vec<String>,
    #[serde(default)]
    requires: Vec<RequirementDocument>,
}

impl SpecDocument {
    fn into_spec(self) -> Result<FeatureSpec, DescriptionError> {
        let context = format!("in feature spec {}", self.name);
        let mut builder = FeatureSpec::builder(self.name);
        for param in self.params {
            builder = builder.param(param.into_spec().context(context.clone())?);
        }
        for reference in self.references {
            builder = builder.reference(reference.into_spec().context(context.clone())?);
        }
        for pattern in self.provides {
            builder = builder.provides(pattern);
        }
        for requirement in self.requires {
            builder = match requirement {
                RequirementDocument::Capability(pattern) => builder.requires(pattern),
                RequirementDocument::Detailed(RequirementTable { capability, optional: true }) => {
                    builder.requires_optional(capability)
                },
                RequirementDocument::Detailed(RequirementTable { capability, optional: false }) => {
                    builder.requires(capability)
                },
            };
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ParamDocument {
    name: String,
    #[serde(default)]
    id: bool,
    #[serde(default)]
    nillable: bool,
    default: Option<String>,
    #[serde(default, rename = "type")]
    kind: ParamType,
}

impl ParamDocument {
    fn into_spec(self) -> Result<FeatureParameterSpec, DescriptionError> {
        if self.id && self.nillable {
            return Err(DescriptionError::Conflict {
                message: format!("Parameter {} cannot be both an id and nillable", self.name).into(),
                context: None,
            });
        }
        let spec = if self.id {
            FeatureParameterSpec::id(self.name)
        } else if self.nillable {
            FeatureParameterSpec::nillable(self.name)
        } else {
            FeatureParameterSpec::required(self.name)
        };
        let spec = match self.default {
            Some(value) => spec.with_default(value),
            None => spec,
        };
        Ok(spec.with_type(self.kind))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ReferenceDocument {
    feature: String,
    name: Option<String>,
    origin: Option<String>,
    #[serde(default)]
    nillable: bool,
    #[serde(default)]
    parent: bool,
    #[serde(default)]
    mappings: IndexMap<String, String>,
}

impl ReferenceDocument {
    fn into_spec(self) -> Result<FeatureReferenceSpec, DescriptionError> {
        let mut builder = FeatureReferenceSpec::builder(self.feature).nillable(self.nillable);
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(origin) = self.origin {
            builder = builder.origin(origin);
        }
        if self.parent {
            builder = builder.parent_ref();
        }
        for (local, target) in self.mappings {
            builder = builder.map_param(local, target);
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RequirementDocument {
    Capability(String),
    Detailed(RequirementTable),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RequirementTable {
    capability: String,
    #[serde(default)]
    optional: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct GroupDocument {
    name: String,
    #[serde(default)]
    items: Vec<ItemDocument>,
}

impl GroupDocument {
    fn into_spec(self) -> Result<FeatureGroupSpec, DescriptionError> {
        let context = format!("in feature group {}", self.name);
        let mut builder = FeatureGroupSpec::builder(self.name);
        for item in self.items {
            builder = builder.item(item.into_item().context(context.clone())?);
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigDocument {
    model: Option<String>,
    name: Option<String>,
    #[serde(default)]
    props: IndexMap<String, String>,
    reset_origin: Option<bool>,
    #[serde(default)]
    items: Vec<ItemDocument>,
}

impl ConfigDocument {
    /// Configs defined by customizations resolve in their declaring feature-pack unless
    /// `reset-origin = false` says otherwise.
    fn into_spec(self, defined: bool) -> Result<ConfigSpec, DescriptionError> {
        let mut builder = ConfigSpec::builder().reset_origin(self.reset_origin.unwrap_or(defined));
        if let Some(model) = self.model {
            builder = builder.model(model);
        }
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        for (name, value) in self.props {
            builder = builder.property(name, value);
        }
        for item in self.items {
            builder = builder.item(item.into_item()?);
        }
        builder.build()
    }
}

/// A group or config body entry: a feature when it names a `spec`, a group reference when
/// it names a `group`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemDocument {
    Feature(FeatureItemDocument),
    Group(GroupItemDocument),
}

impl ItemDocument {
    fn into_item(self) -> Result<GroupItem, DescriptionError> {
        match self {
            Self::Feature(feature) => Ok(GroupItem::Feature(feature.into_config()?)),
            Self::Group(group) => Ok(GroupItem::Group(group.into_config()?)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FeatureItemDocument {
    spec: String,
    origin: Option<String>,
    #[serde(default)]
    params: IndexMap<String, String>,
    parent_ref: Option<String>,
    #[serde(default)]
    items: Vec<ItemDocument>,
}

impl FeatureItemDocument {
    fn into_config(self) -> Result<FeatureConfig, DescriptionError> {
        let mut config = FeatureConfig::new(self.spec);
        if let Some(origin) = self.origin {
            config = config.origin(origin);
        }
        for (name, value) in self.params {
            config = config.param(name, value);
        }
        if let Some(reference) = self.parent_ref {
            config = config.parent_ref(reference);
        }
        for item in self.items {
            config = match item.into_item()? {
                GroupItem::Feature(child) => config.feature(child),
                GroupItem::Group(group) => config.group(group),
            };
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct GroupItemDocument {
    group: String,
    origin: Option<String>,
    filter: Option<FilterDocument>,
}

impl GroupItemDocument {
    fn into_config(self) -> Result<FeatureGroupConfig, DescriptionError> {
        let mut config = FeatureGroupConfig::new(self.group);
        if let Some(origin) = self.origin {
            config = config.origin(origin);
        }
        if let Some(filter) = self.filter {
            config = config.filter(filter.into_filter()?);
        }
        Ok(config)
    }
}

/// Spec and group names may be qualified as `origin#name`, feature ids as
/// `origin#spec:param=value`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FilterDocument {
    #[serde(default = "yes")]
    inherit_features: bool,
    #[serde(default)]
    include_specs: Vec<String>,
    #[serde(default)]
    exclude_specs: Vec<String>,
    #[serde(default)]
    include_features: Vec<IncludedFeatureDocument>,
    #[serde(default)]
    exclude_features: Vec<String>,
    #[serde(default)]
    exclude_groups: Vec<String>,
}

impl FilterDocument {
    fn into_filter(self) -> Result<FeatureFilter, DescriptionError> {
        let mut builder = FeatureFilter::builder().inherit_features(self.inherit_features);
        for spec in &self.include_specs {
            builder = builder.include_spec(spec_ref(spec));
        }
        for spec in &self.exclude_specs {
            builder = builder.exclude_spec(spec_ref(spec));
        }
        for included in self.include_features {
            builder = match included {
                IncludedFeatureDocument::Id(id) => builder.include_feature(feature_ref(&id)?),
                IncludedFeatureDocument::Detailed(IncludedFeatureTable { feature, params }) => {
                    builder.include_feature_with(feature_ref(&feature)?, params)
                },
            };
        }
        for feature in &self.exclude_features {
            builder = builder.exclude_feature(feature_ref(feature)?);
        }
        for group in &self.exclude_groups {
            builder = builder.exclude_group(spec_ref(group));
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IncludedFeatureDocument {
    Id(String),
    Detailed(IncludedFeatureTable),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct IncludedFeatureTable {
    feature: String,
    #[serde(default)]
    params: IndexMap<String, String>,
}

fn spec_ref(value: &str) -> SpecRef {
    match value.split_once('#') {
        Some((origin, name)) => SpecRef::qualified(origin, name),
        None => SpecRef::new(value),
    }
}

fn feature_ref(value: &str) -> Result<FeatureRef, DescriptionError> {
    match value.split_once('#') {
        Some((origin, id)) => Ok(FeatureRef::qualified(origin, id.parse::<FeatureId>()?)),
        None => Ok(FeatureRef::new(value.parse()?)),
    }
}
