use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const FEATURE_PACK: &str = r#"
gav = "org.example:fp1:1.0"

[[packages]]
name = "p1"
default = true

[[specs]]
name = "specA"
params = [{ name = "name", id = true }, { name = "port", default = "8080" }]

[[configs]]
name = "main"
items = [{ spec = "specA", params = { name = "a" } }]
"#;

const DESCRIPTOR: &str = "[[feature-packs]]\ngav = \"org.example:fp1:1.0\"\n";

#[allow(deprecated)]
fn fpm(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fpm").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn workspace(descriptor: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("repo/fp1")).unwrap();
    fs::write(dir.path().join("repo/fp1/feature-pack.toml"), FEATURE_PACK).unwrap();
    fs::write(dir.path().join("provisioning.toml"), descriptor).unwrap();
    dir
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    fpm(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("provision"))
        .stdout(predicate::str::contains("describe"))
        .stdout(predicate::str::contains("state"));
}

#[test]
fn test_provision_then_inspect_state() {
    let dir = workspace(DESCRIPTOR);

    fpm(dir.path())
        .args(["provision", "provisioning.toml", "--repo", "repo", "--install-dir", "server"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Provisioned 1 feature-pack(s) and 1 config(s)"));

    assert!(dir.path().join("server/.fpm/provisioned.json").is_file());

    fpm(dir.path())
        .args(["state", "server/.fpm/provisioned.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("feature-pack org.example:fp1:1.0 [p1]"))
        .stdout(predicate::str::contains("config named main: 1 feature(s)"));
}

#[test]
fn test_settings_come_from_file_and_environment() {
    let dir = workspace(DESCRIPTOR);
    fs::write(dir.path().join("fpm.toml"), "repository = \"repo\"\n").unwrap();

    fpm(dir.path())
        .env("FPM__INSTALL_DIR", "from-env")
        .args(["provision", "provisioning.toml"])
        .assert()
        .success();

    assert!(dir.path().join("from-env/.fpm/provisioned.json").is_file());
}

#[test]
fn test_describe_prints_features() {
    let dir = workspace(DESCRIPTOR);

    fpm(dir.path())
        .args(["describe", "provisioning.toml", "--repo", "repo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config named main\n"))
        .stdout(predicate::str::contains("  org.example:fp1:1.0\n    specA\n      name=a, port=8080\n"));
}

#[test]
fn test_resolution_failure_prints_the_cause_chain() {
    let dir = workspace(
        r#"
        [[feature-packs]]
        gav = "org.example:fp1:1.0"

        [configs]
        define = [{ name = "broken", items = [{ spec = "missing", origin = "fp1" }] }]
        "#,
    );

    fpm(dir.path())
        .args(["provision", "provisioning.toml", "--repo", "repo", "--install-dir", "server"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to provision provisioning.toml"))
        .stderr(predicate::str::contains("Caused by"));

    assert!(!dir.path().join("server/.fpm/provisioned.json").exists());
}

#[test]
fn test_missing_feature_pack_fails() {
    let dir = workspace("[[feature-packs]]\ngav = \"org.example:nope:1.0\"\n");

    fpm(dir.path())
        .args(["provision", "provisioning.toml", "--repo", "repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("org.example:nope:1.0 was not found in the repository"));
}

#[test]
fn test_explicit_settings_file_must_exist() {
    let dir = TempDir::new().unwrap();

    fpm(dir.path())
        .args(["--settings", "missing.toml", "state", "state.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Settings are malformed"));
}
