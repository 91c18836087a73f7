use fpm_domain::{DescriptionError, Gav, ResolvedFeatureId, ResolvedSpecId};
use std::borrow::Cow;

/// Broad classification of a [`ProvisioningError`], taken from its innermost cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid or inconsistent descriptions.
    Description,
    /// Something named by a description cannot be found or satisfied.
    Reference,
    /// Two sources disagree on a value.
    Conflict,
    /// Wrapper context added while building a config. Only returned for wrappers.
    ConfigBuild,
    /// The set of feature-packs cannot be laid out.
    Layout,
}

/// Errors raised while resolving a provisioning request.
///
/// Wrapping variants (`ConfigBuild`, `GroupProcessing`, `FeatureProcessing`,
/// `ForeignKeyInit`) name the step that failed and chain the cause through
/// [`std::error::Error::source`].
#[fpm_derive::fpm_error]
pub enum ProvisioningError {
    #[error("Invalid description{}: {source}", format_context(.context))]
    Description { source: DescriptionError, context: Option<Cow<'static, str>> },

    #[error("Feature-pack {gav} was not found in the repository")]
    FeaturePackNotFound { gav: Gav },

    #[error("Cyclic feature-pack dependency: {path}")]
    CyclicFeaturePackDependency { path: String },

    /// Two versions of one artifact are reachable and neither was requested explicitly.
    #[error("Feature-pack {artifact} is required in version {first} and in version {second}")]
    VersionConflict { artifact: String, first: String, second: String },

    #[error("Failed to locate feature spec {spec} in {scope}")]
    SpecNotFound { spec: String, scope: String },

    #[error("Failed to locate feature group {group} in {scope}")]
    FeatureGroupNotFound { group: String, scope: String },

    #[error("Origin {origin} is not declared by {scope}")]
    UnknownOrigin { origin: String, scope: String },

    #[error("Failed to locate a reference of {spec} to parent feature spec {parent}{}", named(.reference))]
    ParentReferenceNotFound { spec: ResolvedSpecId, parent: ResolvedSpecId, reference: Option<String> },

    #[error("Feature spec {spec} does not define parameter {param}")]
    UnknownParameter { spec: ResolvedSpecId, param: String },

    #[error("Required parameter {param} of {feature} is not set")]
    UnsetRequiredParameter { feature: String, param: String },

    #[error("{feature} references unresolved feature {target} via {reference}")]
    UnsatisfiedReference { feature: ResolvedFeatureId, reference: String, target: ResolvedFeatureId },

    #[error("Reference {reference} of {feature} cannot be resolved: parameter {param} is not set")]
    NonNillableReferenceUnset { feature: ResolvedFeatureId, reference: String, param: String },

    #[error("No provider found for capability {capability} required by {required_by} as {pattern}")]
    CapabilityProviderNotFound { capability: String, required_by: ResolvedFeatureId, pattern: String },

    #[error("Cyclic feature group dependency: {path}")]
    CyclicFeatureGroup { path: String },

    #[error("Package {package} was not found in feature-pack {gav}")]
    PackageNotFound { package: String, gav: Gav },

    #[error("Package {package} of {gav} is excluded but required by {required_by}")]
    RequiredPackageExcluded { package: String, gav: Gav, required_by: String },

    #[error("Parameter {param} of {spec} has already been initialized to {first}, new value {second}")]
    IdParamForeignKeyInitConflict { spec: ResolvedSpecId, param: String, first: String, second: String },

    #[error("Failed to build config {config}")]
    #[nested]
    ConfigBuild { config: String, source: Box<ProvisioningError> },

    #[error("Failed to process feature group {group}")]
    #[nested]
    GroupProcessing { group: String, source: Box<ProvisioningError> },

    #[error("Failed to process feature config {feature}")]
    #[nested]
    FeatureProcessing { feature: String, source: Box<ProvisioningError> },

    #[error("Failed to initialize foreign key parameters of {feature}")]
    #[nested]
    ForeignKeyInit { feature: String, source: Box<ProvisioningError> },

    #[error("Internal resolver error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn named(reference: &Option<String>) -> String {
    reference.as_ref().map_or_else(String::new, |r| format!(" named {r}"))
}

impl ProvisioningError {
    /// The innermost error of a wrapper chain, or `self` for a leaf.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Some(inner) = current.wrapped() {
            current = inner;
        }
        current
    }

    /// The error wrapped by a wrapper variant.
    #[must_use]
    pub fn wrapped(&self) -> Option<&Self> {
        match self {
            Self::ConfigBuild { source, .. }
            | Self::GroupProcessing { source, .. }
            | Self::FeatureProcessing { source, .. }
            | Self::ForeignKeyInit { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Category of this level of the chain; use [`Self::root_cause`] first to classify the
    /// underlying failure.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Description { .. } | Self::Internal { .. } => ErrorCategory::Description,
            Self::FeaturePackNotFound { .. }
            | Self::CyclicFeaturePackDependency { .. }
            | Self::VersionConflict { .. } => ErrorCategory::Layout,
            Self::IdParamForeignKeyInitConflict { .. } => ErrorCategory::Conflict,
            Self::ConfigBuild { .. }
            | Self::GroupProcessing { .. }
            | Self::FeatureProcessing { .. }
            | Self::ForeignKeyInit { .. } => ErrorCategory::ConfigBuild,
            Self::SpecNotFound { .. }
            | Self::FeatureGroupNotFound { .. }
            | Self::UnknownOrigin { .. }
            | Self::ParentReferenceNotFound { .. }
            | Self::UnknownParameter { .. }
            | Self::UnsetRequiredParameter { .. }
            | Self::UnsatisfiedReference { .. }
            | Self::NonNillableReferenceUnset { .. }
            | Self::CapabilityProviderNotFound { .. }
            | Self::CyclicFeatureGroup { .. }
            | Self::PackageNotFound { .. }
            | Self::RequiredPackageExcluded { .. } => ErrorCategory::Reference,
        }
    }

    /// Wraps `self` as the cause of a config build failure.
    pub(crate) fn in_config(self, config: impl Into<String>) -> Self {
        Self::ConfigBuild { config: config.into(), source: Box::new(self) }
    }

    pub(crate) fn in_group(self, group: impl Into<String>) -> Self {
        Self::GroupProcessing { group: group.into(), source: Box::new(self) }
    }

    pub(crate) fn in_feature(self, feature: impl Into<String>) -> Self {
        Self::FeatureProcessing { feature: feature.into(), source: Box::new(self) }
    }

    pub(crate) fn in_foreign_key_init(self, feature: impl Into<String>) -> Self {
        Self::ForeignKeyInit { feature: feature.into(), source: Box::new(self) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn spec_id() -> ResolvedSpecId {
        ResolvedSpecId::new(Gav::new("org.example", "fp1", "1.0").unwrap(), "specC")
    }

    #[test]
    fn root_cause_walks_the_whole_chain() {
        let leaf = ProvisioningError::IdParamForeignKeyInitConflict {
            spec: spec_id(),
            param: "a".into(),
            first: "a2".into(),
            second: "a1".into(),
        };
        let err = leaf
            .in_foreign_key_init("[specC a=a2,id=c1]")
            .in_feature("[specC a=a2,id=c1]")
            .in_group("org.example:fp1:1.0#groupC")
            .in_config("model1 named config1");

        assert_eq!(err.category(), ErrorCategory::ConfigBuild);
        assert_eq!(err.root_cause().category(), ErrorCategory::Conflict);
        assert_eq!(err.to_string(), "Failed to build config model1 named config1");

        let group = err.source().unwrap();
        assert_eq!(group.to_string(), "Failed to process feature group org.example:fp1:1.0#groupC");
        assert_eq!(
            err.root_cause().to_string(),
            "Parameter a of org.example:fp1:1.0#specC has already been initialized to a2, new value a1"
        );
    }

    #[test]
    fn description_errors_convert() {
        let result: std::result::Result<(), DescriptionError> =
            "nope".parse::<fpm_domain::FeatureId>().map(|_| ());
        let err = result.context("reading group").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Description);
        assert!(err.to_string().starts_with("Invalid description (reading group)"));
        assert!(std::ptr::eq(err.root_cause(), &err));
    }
}
