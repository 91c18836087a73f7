use fpm_domain::spec::{
    ConfigSpec, FeatureConfig, FeatureGroupConfig, FeatureGroupSpec, FeatureParameterSpec,
    FeaturePackSpec, FeatureReferenceSpec, FeatureSpec, PackageDependencySpec, PackageSpec,
};
use fpm_domain::{
    ConfigCustomizations, ConfigDecision, ConfigId, DescriptionError, FeatureId, FeaturePackConfig,
    Gav, ProvisioningConfig,
};

fn gav(artifact: &str) -> Gav {
    Gav::new("org.example", artifact, "1.0.0.Final").expect("valid gav")
}

#[test]
fn feature_pack_with_everything_builds() -> Result<(), DescriptionError> {
    let fp = FeaturePackSpec::builder(gav("fp1"))
        .dependency_as("fp2-dep", FeaturePackConfig::for_gav(gav("fp2")))
        .default_package(
            PackageSpec::builder("p1")
                .external_dependency("fp2-dep", PackageDependencySpec::required("p1"))
                .build()?,
        )
        .feature_spec(
            FeatureSpec::builder("specA")
                .param(FeatureParameterSpec::id("a"))
                .param(FeatureParameterSpec::defaulted("p1", "spec"))
                .provides("cap.$a")
                .build()?,
        )
        .feature_spec(
            FeatureSpec::builder("specB")
                .param(FeatureParameterSpec::id("b"))
                .param(FeatureParameterSpec::required("a"))
                .reference(FeatureReferenceSpec::builder("specA").build()?)
                .requires("cap.$a")
                .build()?,
        )
        .feature_group(
            FeatureGroupSpec::builder("group1")
                .feature(FeatureConfig::new("specA").param("a", "a1"))
                .build()?,
        )
        .config(
            ConfigSpec::builder()
                .model("model1")
                .name("config1")
                .group(FeatureGroupConfig::new("group1"))
                .feature(FeatureConfig::new("specB").param("b", "b1").param("a", "a1"))
                .build()?,
        )
        .build()?;

    assert_eq!(fp.feature_specs().count(), 2);
    assert_eq!(fp.configs()[0].id(), &ConfigId::of("model1", "config1"));
    assert_eq!(fp.dependency("fp2-dep").map(|d| d.gav().artifact_id()), Some("fp2"));
    Ok(())
}

#[test]
fn provisioning_config_carries_customizations() -> Result<(), DescriptionError> {
    let config = ProvisioningConfig::builder()
        .feature_pack(
            FeaturePackConfig::builder(gav("fp1"))
                .inherit_packages(false)
                .include_package("p2")
                .configs(
                    ConfigCustomizations::builder()
                        .inherit_configs(false)
                        .include_default_config("model1", "config1"),
                )
                .build()?,
        )
        .configs(ConfigCustomizations::builder().exclude_model("model2", true))
        .build()?;

    let fp = config.feature_pack(&gav("fp1")).expect("requested feature-pack");
    assert!(!fp.inherits_packages());
    assert!(fp.is_package_included("p2"));
    assert!(matches!(
        fp.customizations().decide(&ConfigId::of("model1", "config1")),
        ConfigDecision::Included(Some(_))
    ));
    assert_eq!(
        config.customizations().decide(&ConfigId::of("model2", "any")),
        ConfigDecision::Excluded
    );
    Ok(())
}

#[test]
fn feature_id_text_form_is_stable() -> Result<(), DescriptionError> {
    let id: FeatureId = "specA:name=a1,p=v".parse()?;
    assert_eq!(id.to_string(), "specA:name=a1,p=v");
    assert_eq!(id.param("p"), Some("v"));
    Ok(())
}
