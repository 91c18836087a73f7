//! Definitions shipped inside feature-packs.

mod config;
mod feature;
mod feature_pack;
mod group;
mod package;

pub use config::{ConfigSpec, ConfigSpecBuilder};
pub use feature::{
    FeatureParameterSpec, FeatureReferenceSpec, FeatureReferenceSpecBuilder, FeatureSpec,
    FeatureSpecBuilder, ParamType,
};
pub use feature_pack::{FeaturePackDependency, FeaturePackSpec, FeaturePackSpecBuilder};
pub use group::{
    FeatureConfig, FeatureFilter, FeatureFilterBuilder, FeatureGroupConfig, FeatureGroupSpec,
    FeatureGroupSpecBuilder, FeatureRef, GroupItem, IncludedFeature, SpecRef,
};
pub use package::{PackageDependencySpec, PackageParameter, PackageSpec, PackageSpecBuilder};
