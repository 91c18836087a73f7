use crate::capability::CapabilitySpec;
use crate::error::{DescriptionError, require_non_empty};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declared type of a feature parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    Scalar,
    /// Bracketed list value, see [`crate::param::parse_list`].
    List,
}

/// A parameter declared by a [`FeatureSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureParameterSpec {
    name: String,
    id: bool,
    nillable: bool,
    default: Option<String>,
    kind: ParamType,
}

impl FeatureParameterSpec {
    /// An id-composing parameter.
    pub fn id(name: impl Into<String>) -> Self {
        Self { name: name.into(), id: true, nillable: false, default: None, kind: ParamType::Scalar }
    }

    /// A non-nillable parameter without default.
    pub fn required(name: impl Into<String>) -> Self {
        Self { id: false, ..Self::id(name) }
    }

    pub fn nillable(name: impl Into<String>) -> Self {
        Self { nillable: true, ..Self::required(name) }
    }

    /// A parameter that falls back to `value` when unset.
    pub fn defaulted(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { default: Some(value.into()), ..Self::required(name) }
    }

    #[must_use = "The parameter spec must be passed to a FeatureSpec builder."]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use = "The parameter spec must be passed to a FeatureSpec builder."]
    pub const fn with_type(mut self, kind: ParamType) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_id(&self) -> bool {
        self.id
    }

    #[must_use]
    pub const fn is_nillable(&self) -> bool {
        self.nillable
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    #[must_use]
    pub const fn kind(&self) -> ParamType {
        self.kind
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.kind == ParamType::List
    }
}

/// A foreign-key style reference from one feature spec to another.
///
/// With no explicit mapping, each id parameter of the target spec is taken from the
/// local parameter of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureReferenceSpec {
    name: String,
    feature: String,
    origin: Option<String>,
    nillable: bool,
    parent_ref: bool,
    mappings: IndexMap<String, String>,
}

impl FeatureReferenceSpec {
    /// Starts a reference to spec `feature`. The reference is named after the target
    /// unless [`FeatureReferenceSpecBuilder::name`] is called.
    pub fn builder(feature: impl Into<String>) -> FeatureReferenceSpecBuilder {
        FeatureReferenceSpecBuilder {
            name: None,
            feature: feature.into(),
            origin: None,
            nillable: false,
            parent_ref: false,
            mappings: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the target spec.
    #[must_use]
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Dependency alias qualifying the target spec.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    #[must_use]
    pub const fn is_nillable(&self) -> bool {
        self.nillable
    }

    #[must_use]
    pub const fn is_parent_ref(&self) -> bool {
        self.parent_ref
    }

    /// Local parameter → target id parameter.
    #[must_use]
    pub const fn mappings(&self) -> &IndexMap<String, String> {
        &self.mappings
    }
}

#[derive(Debug, Clone)]
pub struct FeatureReferenceSpecBuilder {
    name: Option<String>,
    feature: String,
    origin: Option<String>,
    nillable: bool,
    parent_ref: bool,
    mappings: Vec<(String, String)>,
}

impl FeatureReferenceSpecBuilder {
    #[must_use = "The builder must be built to produce a reference spec."]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use = "The builder must be built to produce a reference spec."]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[must_use = "The builder must be built to produce a reference spec."]
    pub const fn nillable(mut self, nillable: bool) -> Self {
        self.nillable = nillable;
        self
    }

    /// Marks this reference as the one initialized from the enclosing feature when nested.
    #[must_use = "The builder must be built to produce a reference spec."]
    pub const fn parent_ref(mut self) -> Self {
        self.parent_ref = true;
        self
    }

    #[must_use = "The builder must be built to produce a reference spec."]
    pub fn map_param(mut self, local: impl Into<String>, target: impl Into<String>) -> Self {
        self.mappings.push((local.into(), target.into()));
        self
    }

    /// # Errors
    /// Returns [`DescriptionError`] for empty names or a local/target parameter mapped twice.
    pub fn build(self) -> Result<FeatureReferenceSpec, DescriptionError> {
        require_non_empty(&self.feature, "Referenced feature spec name")?;
        let name = self.name.unwrap_or_else(|| self.feature.clone());
        require_non_empty(&name, "Reference name")?;

        let mut mappings = IndexMap::with_capacity(self.mappings.len());
        for (local, target) in self.mappings {
            require_non_empty(&local, "Mapped local parameter")?;
            require_non_empty(&target, "Mapped target parameter")?;
            if mappings.values().any(|existing| existing == &target) {
                return Err(DescriptionError::duplicate(format!(
                    "Target parameter {target} is mapped twice in reference {name}"
                )));
            }
            if mappings.insert(local.clone(), target).is_some() {
                return Err(DescriptionError::duplicate(format!(
                    "Local parameter {local} is mapped twice in reference {name}"
                )));
            }
        }

        Ok(FeatureReferenceSpec {
            name,
            feature: self.feature,
            origin: self.origin,
            nillable: self.nillable,
            parent_ref: self.parent_ref,
            mappings,
        })
    }
}

/// Schema of a feature: parameters, references and capability contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    name: String,
    params: IndexMap<String, FeatureParameterSpec>,
    id_params: Vec<String>,
    refs: IndexMap<String, FeatureReferenceSpec>,
    ref_params: IndexMap<String, (String, String)>,
    provides: Vec<CapabilitySpec>,
    requires: Vec<CapabilitySpec>,
}

impl FeatureSpec {
    pub fn builder(name: impl Into<String>) -> FeatureSpecBuilder {
        FeatureSpecBuilder {
            name: name.into(),
            params: Vec::new(),
            refs: Vec::new(),
            provides: Vec::new(),
            requires: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &FeatureParameterSpec> {
        self.params.values()
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&FeatureParameterSpec> {
        self.params.get(name)
    }

    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Id-composing parameters in declaration order.
    pub fn id_params(&self) -> impl Iterator<Item = &FeatureParameterSpec> {
        self.id_params.iter().filter_map(|name| self.params.get(name))
    }

    pub fn references(&self) -> impl Iterator<Item = &FeatureReferenceSpec> {
        self.refs.values()
    }

    #[must_use]
    pub fn reference(&self, name: &str) -> Option<&FeatureReferenceSpec> {
        self.refs.get(name)
    }

    /// The reference explicitly marked as parent reference, if any.
    #[must_use]
    pub fn parent_reference(&self) -> Option<&FeatureReferenceSpec> {
        self.refs.values().find(|r| r.is_parent_ref())
    }

    /// The reference and target parameter an explicitly mapped local parameter feeds.
    #[must_use]
    pub fn ref_param(&self, local: &str) -> Option<(&FeatureReferenceSpec, &str)> {
        let (reference, target) = self.ref_params.get(local)?;
        self.refs.get(reference).map(|r| (r, target.as_str()))
    }

    #[must_use]
    pub fn provides(&self) -> &[CapabilitySpec] {
        &self.provides
    }

    #[must_use]
    pub fn requires(&self) -> &[CapabilitySpec] {
        &self.requires
    }
}

#[derive(Debug, Clone)]
pub struct FeatureSpecBuilder {
    name: String,
    params: Vec<FeatureParameterSpec>,
    refs: Vec<FeatureReferenceSpec>,
    provides: Vec<String>,
    requires: Vec<(String, bool)>,
}

impl FeatureSpecBuilder {
    #[must_use = "The builder must be built to produce a feature spec."]
    pub fn param(mut self, param: FeatureParameterSpec) -> Self {
        self.params.push(param);
        self
    }

    #[must_use = "The builder must be built to produce a feature spec."]
    pub fn reference(mut self, reference: FeatureReferenceSpec) -> Self {
        self.refs.push(reference);
        self
    }

    #[must_use = "The builder must be built to produce a feature spec."]
    pub fn provides(mut self, pattern: impl Into<String>) -> Self {
        self.provides.push(pattern.into());
        self
    }

    #[must_use = "The builder must be built to produce a feature spec."]
    pub fn requires(mut self, pattern: impl Into<String>) -> Self {
        self.requires.push((pattern.into(), false));
        self
    }

    #[must_use = "The builder must be built to produce a feature spec."]
    pub fn requires_optional(mut self, pattern: impl Into<String>) -> Self {
        self.requires.push((pattern.into(), true));
        self
    }

    /// Validates and freezes the spec.
    ///
    /// # Errors
    /// Returns [`DescriptionError`] when the spec has no id parameter, declares a parameter
    /// or reference twice, maps an undeclared or already mapped local parameter, declares
    /// more than one parent reference, or a capability pattern is malformed or names an
    /// undeclared parameter.
    pub fn build(self) -> Result<FeatureSpec, DescriptionError> {
        require_non_empty(&self.name, "Feature spec name")?;
        let spec = self.name;

        let mut params = IndexMap::with_capacity(self.params.len());
        for param in self.params {
            require_non_empty(param.name(), "Parameter name")?;
            let name = param.name.clone();
            if params.insert(name.clone(), param).is_some() {
                return Err(DescriptionError::duplicate(format!(
                    "Duplicate parameter {name} for feature spec {spec}"
                )));
            }
        }

        let id_params: Vec<String> =
            params.values().filter(|p| p.is_id()).map(|p| p.name.clone()).collect();
        if id_params.is_empty() {
            return Err(DescriptionError::missing(format!(
                "Feature spec {spec} does not declare an id parameter"
            )));
        }

        let mut refs = IndexMap::with_capacity(self.refs.len());
        let mut ref_params = IndexMap::new();
        for reference in self.refs {
            for (local, target) in reference.mappings() {
                if !params.contains_key(local) {
                    return Err(DescriptionError::invalid_reference(format!(
                        "Reference {} of feature spec {spec} maps undeclared parameter {local}",
                        reference.name()
                    )));
                }
                if ref_params
                    .insert(local.clone(), (reference.name.clone(), target.clone()))
                    .is_some()
                {
                    return Err(DescriptionError::invalid_reference(format!(
                        "Parameter {local} of feature spec {spec} is mapped by more than one reference"
                    )));
                }
            }
            let name = reference.name.clone();
            if refs.insert(name.clone(), reference).is_some() {
                return Err(DescriptionError::duplicate(format!(
                    "Duplicate reference {name} for feature spec {spec}"
                )));
            }
        }
        if refs.values().filter(|r| r.is_parent_ref()).count() > 1 {
            return Err(DescriptionError::invalid_reference(format!(
                "Feature spec {spec} declares more than one parent reference"
            )));
        }

        let provides = self
            .provides
            .iter()
            .map(|pattern| checked_capability(&spec, &params, pattern, false))
            .collect::<Result<Vec<_>, _>>()?;
        let requires = self
            .requires
            .iter()
            .map(|(pattern, optional)| checked_capability(&spec, &params, pattern, *optional))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeatureSpec { name: spec, params, id_params, refs, ref_params, provides, requires })
    }
}

fn checked_capability(
    spec: &str,
    params: &IndexMap<String, FeatureParameterSpec>,
    pattern: &str,
    optional: bool,
) -> Result<CapabilitySpec, DescriptionError> {
    let capability =
        if optional { CapabilitySpec::optional(pattern)? } else { CapabilitySpec::parse(pattern)? };
    if let Some(unknown) = capability.params().find(|name| !params.contains_key(*name)) {
        return Err(DescriptionError::invalid_reference(format!(
            "Capability {pattern} of feature spec {spec} refers to undeclared parameter {unknown}"
        )));
    }
    Ok(capability)
}
