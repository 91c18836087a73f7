use fpm_domain::Gav;
use fpm_domain::spec::FeaturePackSpec;
use indexmap::IndexMap;

/// Source of feature-pack descriptions.
pub trait FeaturePackRepository {
    /// Looks up a feature-pack. A [`fpm_domain::LATEST`] version resolves to whatever the
    /// repository considers current for the artifact.
    fn feature_pack(&self, gav: &Gav) -> Option<&FeaturePackSpec>;
}

impl<R: FeaturePackRepository + ?Sized> FeaturePackRepository for &R {
    fn feature_pack(&self, gav: &Gav) -> Option<&FeaturePackSpec> {
        (**self).feature_pack(gav)
    }
}

/// Repository backed by an insertion-ordered map.
///
/// The current version of an artifact is the one inserted last.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    feature_packs: IndexMap<Gav, FeaturePackSpec>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a feature-pack, returning the description it replaces.
    pub fn insert(&mut self, spec: FeaturePackSpec) -> Option<FeaturePackSpec> {
        self.feature_packs.insert(spec.gav().clone(), spec)
    }

    #[must_use = "The repository is returned with the feature-pack added."]
    pub fn with(mut self, spec: FeaturePackSpec) -> Self {
        self.insert(spec);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.feature_packs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feature_packs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeaturePackSpec> {
        self.feature_packs.values()
    }
}

impl FeaturePackRepository for InMemoryRepository {
    fn feature_pack(&self, gav: &Gav) -> Option<&FeaturePackSpec> {
        if gav.is_latest() {
            return self.feature_packs.values().rev().find(|fp| fp.gav().same_artifact(gav));
        }
        self.feature_packs.get(gav)
    }
}

impl FromIterator<FeaturePackSpec> for InMemoryRepository {
    fn from_iter<I: IntoIterator<Item = FeaturePackSpec>>(iter: I) -> Self {
        let mut repository = Self::new();
        for spec in iter {
            repository.insert(spec);
        }
        repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(version: &str) -> FeaturePackSpec {
        FeaturePackSpec::builder(Gav::new("org.example", "fp1", version).unwrap()).build().unwrap()
    }

    #[test]
    fn latest_is_the_last_inserted_version() {
        let repository: InMemoryRepository = [fp("1.0"), fp("2.0"), fp("1.5")].into_iter().collect();
        let latest = repository.feature_pack(&Gav::latest("org.example", "fp1").unwrap()).unwrap();
        assert_eq!(latest.gav().version(), "1.5");

        let exact = repository.feature_pack(&Gav::new("org.example", "fp1", "2.0").unwrap());
        assert!(exact.is_some());
        assert!(repository.feature_pack(&Gav::new("org.example", "fp1", "3.0").unwrap()).is_none());
    }
}
