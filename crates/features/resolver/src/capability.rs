//! Concrete capabilities and the providers registered for them.

use crate::error::ProvisioningError;
use fpm_domain::param::parse_list;
use fpm_domain::spec::FeatureSpec;
use fpm_domain::{CapabilitySegment, CapabilitySpec};
use indexmap::IndexMap;

/// Expands a capability pattern against a feature's parameter values.
///
/// List parameters contribute each of their elements; the result is the Cartesian product in
/// left-to-right, outer-to-inner order. An unset parameter or an empty list yields nothing.
///
/// # Errors
/// [`ProvisioningError::Description`] when a list parameter holds a malformed value.
pub fn expand_capability(
    capability: &CapabilitySpec,
    spec: &FeatureSpec,
    params: &IndexMap<String, String>,
) -> Result<Vec<String>, ProvisioningError> {
    let mut expanded = vec![String::new()];
    for (position, segment) in capability.segments().iter().enumerate() {
        let values = match segment {
            CapabilitySegment::Literal(literal) => vec![literal.clone()],
            CapabilitySegment::Param(name) => {
                let Some(value) = params.get(name) else {
                    return Ok(Vec::new());
                };
                if spec.param(name).is_some_and(|p| p.is_list()) {
                    parse_list(value)?
                } else {
                    vec![value.clone()]
                }
            },
        };
        if values.is_empty() {
            return Ok(Vec::new());
        }
        expanded = expanded
            .iter()
            .flat_map(|prefix| {
                values.iter().map(move |value| {
                    if position == 0 { value.clone() } else { format!("{prefix}.{value}") }
                })
            })
            .collect();
    }
    Ok(expanded)
}

/// Concrete capability → providers, both in registration order.
#[derive(Debug, Clone)]
pub struct CapabilityIndex<K> {
    providers: IndexMap<String, Vec<K>>,
}

impl<K> Default for CapabilityIndex<K> {
    fn default() -> Self {
        Self { providers: IndexMap::new() }
    }
}

impl<K: PartialEq> CapabilityIndex<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` for a concrete capability; a repeated registration is ignored.
    pub fn provide(&mut self, capability: impl Into<String>, provider: K) {
        let providers = self.providers.entry(capability.into()).or_default();
        if !providers.contains(&provider) {
            providers.push(provider);
        }
    }

    #[must_use]
    pub fn providers(&self, capability: &str) -> &[K] {
        self.providers.get(capability).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_provided(&self, capability: &str) -> bool {
        !self.providers(capability).is_empty()
    }
}
