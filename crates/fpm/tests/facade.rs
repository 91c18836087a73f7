use fpm::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_enabled_features() {
    assert!(fpm::features::is_enabled("resolver"));
    assert_eq!(fpm::features::is_enabled("layout"), cfg!(feature = "layout"));
    assert!(!fpm::features::is_enabled("network"));
}

#[cfg(feature = "layout")]
#[test]
fn test_provision_from_files() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("repo/fp1")).unwrap();
    fs::write(
        dir.path().join("repo/fp1/feature-pack.toml"),
        r#"
        gav = "org.example:fp1:1.0"

        [[packages]]
        name = "p1"
        default = true

        [[specs]]
        name = "specA"
        params = [{ name = "name", id = true }]

        [[configs]]
        name = "main"
        items = [{ spec = "specA", params = { name = "a" } }]
        "#,
    )
    .unwrap();
    fs::write(
        dir.path().join("provisioning.toml"),
        "[[feature-packs]]\ngav = \"org.example:fp1\"\n",
    )
    .unwrap();

    let state: ProvisionedState =
        fpm::provision_from_files(dir.path().join("repo"), dir.path().join("provisioning.toml"))
            .unwrap();

    assert_eq!(state.feature_packs().len(), 1);
    let config = state.config(&ConfigId::named("main")).unwrap();
    assert_eq!(config.features().len(), 1);
}

#[cfg(feature = "layout")]
#[test]
fn test_missing_repository_is_a_layout_error() {
    let dir = TempDir::new().unwrap();
    let err = fpm::provision_from_files(dir.path().join("repo"), dir.path().join("p.toml"))
        .unwrap_err();
    assert!(matches!(err, fpm::Error::Layout { .. }));
}
