//! Features collected for one config before references are resolved.

use crate::error::ProvisioningError;
use fpm_domain::ResolvedFeatureId;
use fpm_domain::spec::FeatureSpec;
use indexmap::IndexMap;
use indexmap::map::Entry;

/// A feature as collected during expansion.
#[derive(Debug, Clone)]
pub(crate) struct FeatureEntry<'a> {
    pub(crate) id: ResolvedFeatureId,
    pub(crate) spec: &'a FeatureSpec,
    /// Layout index of the feature-pack declaring the spec.
    pub(crate) fp: usize,
    pub(crate) params: IndexMap<String, String>,
}

/// Features in first-encountered order, keyed by id.
#[derive(Debug, Default)]
pub(crate) struct ConfigAccumulator<'a> {
    features: IndexMap<ResolvedFeatureId, FeatureEntry<'a>>,
}

impl<'a> ConfigAccumulator<'a> {
    /// Adds a feature or merges it into the feature already collected under its id.
    ///
    /// Merging adds parameters that are not set yet; a parameter already set to another value
    /// is an [`ProvisioningError::IdParamForeignKeyInitConflict`].
    pub(crate) fn merge(&mut self, entry: FeatureEntry<'a>) -> Result<(), ProvisioningError> {
        match self.features.entry(entry.id.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
            },
            Entry::Occupied(occupied) => {
                let existing = occupied.into_mut();
                for (name, value) in entry.params {
                    match existing.params.get(&name) {
                        Some(first) if *first != value => {
                            return Err(ProvisioningError::IdParamForeignKeyInitConflict {
                                spec: existing.id.spec_id().clone(),
                                param: name,
                                first: first.clone(),
                                second: value,
                            });
                        },
                        Some(_) => {},
                        None => {
                            existing.params.insert(name, value);
                        },
                    }
                }
            },
        }
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.features.len()
    }

    pub(crate) fn into_entries(self) -> Vec<FeatureEntry<'a>> {
        self.features.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpm_domain::spec::FeatureParameterSpec;
    use fpm_domain::{Gav, ResolvedSpecId};

    fn spec() -> FeatureSpec {
        FeatureSpec::builder("specA")
            .param(FeatureParameterSpec::id("name"))
            .param(FeatureParameterSpec::nillable("p1"))
            .param(FeatureParameterSpec::nillable("p2"))
            .build()
            .unwrap()
    }

    fn entry<'a>(spec: &'a FeatureSpec, params: &[(&str, &str)]) -> FeatureEntry<'a> {
        let gav = Gav::new("org.example", "fp1", "1.0").unwrap();
        let id = ResolvedFeatureId::create(ResolvedSpecId::new(gav, "specA"), "name", "a").unwrap();
        let params = params.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        FeatureEntry { id, spec, fp: 0, params }
    }

    #[test]
    fn merges_missing_params_into_the_first_occurrence() {
        let spec = spec();
        let mut acc = ConfigAccumulator::default();
        acc.merge(entry(&spec, &[("name", "a"), ("p1", "1")])).unwrap();
        acc.merge(entry(&spec, &[("name", "a"), ("p1", "1"), ("p2", "2")])).unwrap();

        assert_eq!(acc.len(), 1);
        let merged = acc.into_entries().remove(0);
        assert_eq!(merged.params.get("p2").map(String::as_str), Some("2"));
    }

    #[test]
    fn different_values_conflict_and_first_wins() {
        let spec = spec();
        let mut acc = ConfigAccumulator::default();
        acc.merge(entry(&spec, &[("p1", "1")])).unwrap();
        let err = acc.merge(entry(&spec, &[("p1", "2")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter p1 of org.example:fp1:1.0#specA has already been initialized to 1, new value 2"
        );
    }
}
