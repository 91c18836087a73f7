//! Identities of features, specs and configs.

use crate::error::DescriptionError;
use crate::gav::Gav;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

const FEATURE_ID_FORMAT: &str =
    "The string does not follow format spec_name:param_name=value(,param_name=value)*";

/// Ordered id-parameter map shared by [`FeatureId`] and [`ResolvedFeatureId`].
pub type IdParams = IndexMap<String, String>;

/// Identity of a feature within one spec namespace: spec name plus id parameters.
///
/// Equality and hashing ignore parameter order; display keeps insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureId {
    spec: String,
    params: IdParams,
}

impl FeatureId {
    /// # Errors
    /// Returns [`DescriptionError`] for an empty spec name or an empty parameter map.
    pub fn new(spec: impl Into<String>, params: IdParams) -> Result<Self, DescriptionError> {
        let spec = spec.into();
        if spec.trim().is_empty() {
            return Err(DescriptionError::malformed("Feature spec name is missing"));
        }
        if params.is_empty() {
            return Err(DescriptionError::malformed(format!(
                "ID parameters are missing for spec {spec}"
            )));
        }
        Ok(Self { spec, params })
    }

    /// Single-parameter id, the common case.
    ///
    /// # Errors
    /// See [`FeatureId::new`].
    pub fn create(
        spec: impl Into<String>,
        param: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, DescriptionError> {
        let mut params = IdParams::new();
        params.insert(param.into(), value.into());
        Self::new(spec, params)
    }

    #[must_use]
    pub fn spec(&self) -> &str {
        &self.spec
    }

    #[must_use]
    pub const fn params(&self) -> &IdParams {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

impl Hash for FeatureId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.spec.hash(state);
        hash_params(&self.params, state);
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.spec)?;
        write_params(&self.params, f)
    }
}

impl FromStr for FeatureId {
    type Err = DescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((spec, rest)) = s.split_once(':') else {
            return Err(malformed_id(s));
        };
        if spec.is_empty() {
            return Err(malformed_id(s));
        }
        if rest.is_empty() {
            return Err(DescriptionError::malformed(format!("ID parameters are missing in '{s}'")));
        }

        let mut params = IdParams::new();
        for pair in rest.split(',') {
            let Some((name, value)) = pair.split_once('=') else {
                return Err(malformed_id(s));
            };
            if name.is_empty() {
                return Err(malformed_id(s));
            }
            if params.insert(name.to_owned(), value.to_owned()).is_some() {
                return Err(DescriptionError::Duplicate {
                    message: format!("ID parameter '{name}'").into(),
                    context: Some(s.to_owned().into()),
                });
            }
        }
        Self::new(spec, params)
    }
}

impl TryFrom<String> for FeatureId {
    type Error = DescriptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeatureId> for String {
    fn from(value: FeatureId) -> Self {
        value.to_string()
    }
}

fn malformed_id(s: &str) -> DescriptionError {
    DescriptionError::Malformed { message: FEATURE_ID_FORMAT.into(), context: Some(s.to_owned().into()) }
}

/// A spec name qualified by the feature-pack that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolvedSpecId {
    gav: Gav,
    name: String,
}

impl ResolvedSpecId {
    pub fn new(gav: Gav, name: impl Into<String>) -> Self {
        Self { gav, name: name.into() }
    }

    #[must_use]
    pub const fn gav(&self) -> &Gav {
        &self.gav
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResolvedSpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.gav, self.name)
    }
}

impl FromStr for ResolvedSpecId {
    type Err = DescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((gav, name)) = s.split_once('#') else {
            return Err(DescriptionError::malformed(format!(
                "'{s}' does not follow format groupId:artifactId:version#spec"
            )));
        };
        if name.is_empty() {
            return Err(DescriptionError::malformed(format!("Spec name is missing in '{s}'")));
        }
        Ok(Self::new(gav.parse()?, name))
    }
}

/// Globally unique feature identity: [`ResolvedSpecId`] plus id parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFeatureId {
    #[serde(flatten)]
    spec_id: ResolvedSpecId,
    params: IdParams,
}

impl ResolvedFeatureId {
    /// # Errors
    /// Returns [`DescriptionError`] when `params` is empty.
    pub fn new(spec_id: ResolvedSpecId, params: IdParams) -> Result<Self, DescriptionError> {
        if params.is_empty() {
            return Err(DescriptionError::malformed(format!(
                "ID parameters are missing for {spec_id}"
            )));
        }
        Ok(Self { spec_id, params })
    }

    /// # Errors
    /// See [`ResolvedFeatureId::new`].
    pub fn create(
        spec_id: ResolvedSpecId,
        param: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, DescriptionError> {
        let mut params = IdParams::new();
        params.insert(param.into(), value.into());
        Self::new(spec_id, params)
    }

    #[must_use]
    pub const fn spec_id(&self) -> &ResolvedSpecId {
        &self.spec_id
    }

    #[must_use]
    pub const fn gav(&self) -> &Gav {
        self.spec_id.gav()
    }

    #[must_use]
    pub const fn params(&self) -> &IdParams {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The unqualified form of this id.
    #[must_use]
    pub fn to_feature_id(&self) -> FeatureId {
        FeatureId { spec: self.spec_id.name.clone(), params: self.params.clone() }
    }
}

impl Hash for ResolvedFeatureId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.spec_id.hash(state);
        hash_params(&self.params, state);
    }
}

impl fmt::Display for ResolvedFeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.spec_id)?;
        write_params(&self.params, f)
    }
}

impl FromStr for ResolvedFeatureId {
    type Err = DescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((gav, id)) = s.split_once('#') else {
            return Err(DescriptionError::malformed(format!(
                "'{s}' does not follow format groupId:artifactId:version#{FEATURE_ID_FORMAT}"
            )));
        };
        let id: FeatureId = id.parse()?;
        Ok(Self { spec_id: ResolvedSpecId::new(gav.parse()?, id.spec), params: id.params })
    }
}

/// Identity of a config: optional model plus optional name.
///
/// Both absent makes an anonymous config, which is never merged with another one and
/// cannot be addressed by customizations. A model without a name is the model-only
/// config holding defaults for every named config of that model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl ConfigId {
    pub fn new(model: Option<String>, name: Option<String>) -> Self {
        Self { model, name }
    }

    /// A named config of a model.
    pub fn of(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self { model: Some(model.into()), name: Some(name.into()) }
    }

    /// A named config outside any model.
    pub fn named(name: impl Into<String>) -> Self {
        Self { model: None, name: Some(name.into()) }
    }

    pub fn model_only(model: impl Into<String>) -> Self {
        Self { model: Some(model.into()), name: None }
    }

    #[must_use]
    pub const fn anonymous() -> Self {
        Self { model: None, name: None }
    }

    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.model.is_none() && self.name.is_none()
    }

    #[must_use]
    pub const fn is_model_only(&self) -> bool {
        self.model.is_some() && self.name.is_none()
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.model, &self.name) {
            (Some(model), Some(name)) => write!(f, "model {model} named {name}"),
            (Some(model), None) => write!(f, "model {model}"),
            (None, Some(name)) => write!(f, "named {name}"),
            (None, None) => f.write_str("anonymous"),
        }
    }
}

fn hash_params<H: Hasher>(params: &IdParams, state: &mut H) {
    let mut pairs: Vec<(&String, &String)> = params.iter().collect();
    pairs.sort_unstable();
    pairs.hash(state);
}

fn write_params(params: &IdParams, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (name, value)) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{name}={value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn gav() -> Gav {
        Gav::new("org.jboss.pm.test", "fp1", "1.0.0.Final").expect("valid gav")
    }

    #[test]
    fn parses_single_and_multiple_params() -> Result<(), DescriptionError> {
        let id: FeatureId = "specA:name=a".parse()?;
        assert_eq!(id, FeatureId::create("specA", "name", "a")?);

        let id: FeatureId = "specB:p1=v1,p2=v2".parse()?;
        assert_eq!(id.param("p1"), Some("v1"));
        assert_eq!(id.param("p2"), Some("v2"));
        assert_eq!(id.to_string(), "specB:p1=v1,p2=v2");
        Ok(())
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in ["specA", ":name=a", "specA:", "specA:name", "specA:=a", "specA:a=1,b"] {
            assert!(bad.parse::<FeatureId>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn rejects_repeated_params() {
        let err = "spec:a=1,a=2".parse::<FeatureId>().unwrap_err();
        assert!(matches!(err, DescriptionError::Duplicate { .. }), "{err}");
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn equality_and_hash_ignore_param_order() -> Result<(), DescriptionError> {
        let a: FeatureId = "spec:x=1,y=2".parse()?;
        let b: FeatureId = "spec:y=2,x=1".parse()?;
        assert_eq!(a, b);
        let set: HashSet<FeatureId> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
        Ok(())
    }

    #[test]
    fn resolved_ids_display_with_coordinates() -> Result<(), DescriptionError> {
        let id = ResolvedFeatureId::create(ResolvedSpecId::new(gav(), "specB"), "name", "b")?;
        assert_eq!(id.to_string(), "org.jboss.pm.test:fp1:1.0.0.Final#specB:name=b");
        assert_eq!(id.to_string().parse::<ResolvedFeatureId>()?, id);
        assert_eq!(id.to_feature_id().to_string(), "specB:name=b");
        Ok(())
    }

    #[test]
    fn config_id_kinds() {
        assert!(ConfigId::anonymous().is_anonymous());
        assert!(ConfigId::model_only("host").is_model_only());
        assert!(!ConfigId::of("host", "main").is_model_only());
        assert_eq!(ConfigId::named("config1").to_string(), "named config1");
    }
}
