mod fixtures;

use fixtures::{DESCRIPTOR, repository, write};
use fpm_domain::{ConfigId, Gav};
use fpm_layout::{
    LayoutError, StateFile, load_descriptor, load_repository, parse_descriptor,
    parse_feature_pack,
};
use fpm_resolver::{FeaturePackRepository, Provisioner};
use tempfile::TempDir;

fn gav(artifact: &str, version: &str) -> Gav {
    Gav::new("org.example", artifact, version).unwrap()
}

#[test]
fn test_repository_is_discovered_at_any_depth() {
    let dir = repository();
    write(dir.path(), "notes/README.toml", "not = 'a feature-pack'");

    let repository = load_repository(dir.path()).unwrap();

    assert_eq!(repository.len(), 2);
    let fp1 = repository.feature_pack(&gav("fp1", "1.0")).unwrap();
    assert_eq!(fp1.dependency("fp2").map(|d| d.gav()), Some(&gav("fp2", "1.0")));
    assert!(fp1.feature_spec("App").is_some());
    assert_eq!(fp1.configs().len(), 1);
}

#[test]
fn test_descriptor_and_repository_provision_together() {
    let dir = repository();
    write(dir.path(), "provisioning.toml", DESCRIPTOR);

    let repository = load_repository(dir.path()).unwrap();
    let descriptor = load_descriptor(dir.path().join("provisioning.toml")).unwrap();
    let state = Provisioner::new(&repository).provision(&descriptor).unwrap();

    let fp1 = state.feature_pack(&gav("fp1", "1.0")).unwrap();
    assert!(fp1.has_package("app"));
    let fp2 = state.feature_pack(&gav("fp2", "1.0")).unwrap();
    assert!(fp2.has_package("base"));
    assert!(!fp2.has_package("docs"));

    let config = state.config(&ConfigId::of("server", "main")).unwrap();
    assert_eq!(config.properties().get("kind").map(String::as_str), Some("full"));
    let features: Vec<String> = config.features().iter().map(|f| f.id().to_string()).collect();
    assert_eq!(
        features,
        vec![
            "org.example:fp2:1.0#Host:name=h1".to_owned(),
            "org.example:fp1:1.0#App:name=app".to_owned(),
        ]
    );
    let app = &config.features()[1];
    assert_eq!(app.param("ports"), Some("[]"));
}

#[test]
fn test_state_file_round_trip() {
    let dir = repository();
    let install = TempDir::new().unwrap();
    let repository = load_repository(dir.path()).unwrap();
    let state = Provisioner::new(&repository).provision(&parse_descriptor(DESCRIPTOR).unwrap()).unwrap();

    let file = StateFile::for_installation(install.path());
    assert!(!file.exists());
    file.write(&state).unwrap();
    assert_eq!(file.read().unwrap(), state);

    // A second write replaces the first and leaves no temporary files behind.
    file.write(&state).unwrap();
    let entries: Vec<_> =
        std::fs::read_dir(install.path().join(".fpm")).unwrap().flatten().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(file.read().unwrap(), state);
}

#[test]
fn test_failed_state_write_leaves_no_temporary_file() {
    let dir = repository();
    let repository = load_repository(dir.path()).unwrap();
    let state = Provisioner::new(&repository).provision(&parse_descriptor(DESCRIPTOR).unwrap()).unwrap();

    let out = TempDir::new().unwrap();
    let target = out.path().join("state.json");
    std::fs::create_dir(&target).unwrap();
    write(&target, "keep", "");

    let err = StateFile::at(&target).write(&state).unwrap_err();
    assert!(matches!(err, LayoutError::Io { .. }), "{err}");
    let entries: Vec<_> = std::fs::read_dir(out.path()).unwrap().flatten().map(|e| e.file_name()).collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("state.json")]);
}

#[test]
fn test_latest_version_is_the_highest() {
    let dir = TempDir::new().unwrap();
    for version in ["1.9", "1.10", "1.2"] {
        write(
            dir.path(),
            &format!("fp2/{version}/feature-pack.toml"),
            &fixtures::FP2.replace("org.example:fp2:1.0", &format!("org.example:fp2:{version}")),
        );
    }

    let repository = load_repository(dir.path()).unwrap();
    assert_eq!(repository.len(), 3);
    let latest: Gav = "org.example:fp2".parse().unwrap();
    assert_eq!(repository.feature_pack(&latest).map(|fp| fp.gav()), Some(&gav("fp2", "1.10")));
}

#[test]
fn test_duplicate_feature_pack_is_rejected() {
    let dir = repository();
    write(dir.path(), "copy/feature-pack.toml", fixtures::FP2);

    let err = load_repository(dir.path()).unwrap_err();
    assert!(matches!(err, LayoutError::DuplicateFeaturePack { .. }), "{err}");
    assert!(err.to_string().contains("org.example:fp2:1.0"));
}

#[test]
fn test_malformed_documents_name_their_path() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "fp/feature-pack.toml", "gav = \"org.example:fp:1.0\"\nunknown = 1\n");

    let err = load_repository(dir.path()).unwrap_err();
    assert!(matches!(err, LayoutError::Toml { .. }), "{err}");
    assert!(err.to_string().contains("feature-pack.toml"));
}

#[test]
fn test_invalid_descriptions_are_reported() {
    let err = parse_feature_pack(
        r#"
        gav = "org.example:fp:1.0"
        [[packages]]
        name = "p1"
        dependencies = [{ name = "missing" }]
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, LayoutError::Description { .. }), "{err}");
}

#[test]
fn test_missing_inputs() {
    let dir = TempDir::new().unwrap();

    let err = load_repository(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, LayoutError::DirectoryNotFound { .. }));

    let err = load_descriptor(dir.path().join("provisioning.toml")).unwrap_err();
    assert!(matches!(err, LayoutError::FileNotFound { .. }));

    let err = StateFile::at(dir.path().join("state.json")).read().unwrap_err();
    assert!(matches!(err, LayoutError::FileNotFound { .. }));
}

#[test]
fn test_descriptor_customizations() {
    let descriptor = parse_descriptor(
        r#"
        [[feature-packs]]
        gav = "org.example:fp1:1.0"
        origin = "fp1"
        inherit-packages = false
        include-packages = ["app"]

        [feature-packs.configs]
        inherit = false
        exclude-models = [{ model = "server", named-only = true }, "other"]

        [configs]
        define = [{ model = "server", name = "extra", items = [{ spec = "App", origin = "fp1", params = { name = "x", host = "h1" } }] }]
        "#,
    )
    .unwrap();

    let fp1 = descriptor.feature_pack(&gav("fp1", "1.0")).unwrap();
    assert!(!fp1.inherits_packages());
    assert!(fp1.is_package_included("app"));
    let configs = fp1.customizations();
    assert!(!configs.inherits_configs());
    assert_eq!(configs.model_exclusion("server"), Some(true));
    assert_eq!(configs.model_exclusion("other"), Some(false));

    assert_eq!(descriptor.origin("fp1"), Some(&gav("fp1", "1.0")));
    let defined = descriptor.customizations().defined_configs();
    assert_eq!(defined.len(), 1);
    assert!(defined[0].resets_origin());
}
