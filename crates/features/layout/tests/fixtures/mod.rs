#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const FP1: &str = r#"
gav = "org.example:fp1:1.0"

[[dependencies]]
gav = "org.example:fp2:1.0"
origin = "fp2"

[[packages]]
name = "app"
default = true
dependencies = [{ name = "base", origin = "fp2" }]

[[specs]]
name = "App"
params = [{ name = "name", id = true }, { name = "host" }, { name = "ports", type = "list", default = "[]" }]
requires = ["host.$host"]

[[configs]]
model = "server"
name = "main"
props = { kind = "full" }
items = [
    { group = "hosts", origin = "fp2", filter = { exclude-features = ["fp2#Host:name=h2"] } },
    { spec = "App", params = { name = "app", host = "h1" } },
]
"#;

pub const FP2: &str = r#"
gav = "org.example:fp2:1.0"

[[packages]]
name = "base"
default = true

[[packages]]
name = "docs"

[[specs]]
name = "Host"
params = [{ name = "name", id = true }]
provides = ["host.$name"]

[[groups]]
name = "hosts"
items = [
    { spec = "Host", params = { name = "h1" } },
    { spec = "Host", params = { name = "h2" } },
]
"#;

pub const DESCRIPTOR: &str = r#"
[[feature-packs]]
gav = "org.example:fp1:1.0"
"#;

/// Writes `content` to `relative` below `root`, creating parent directories.
///
/// # Panics
/// Panics when the file cannot be written.
pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A repository directory holding fp1 and fp2 at different depths.
///
/// # Panics
/// Panics when the directory cannot be created.
#[must_use]
pub fn repository() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "org/example/fp1/1.0/feature-pack.toml", FP1);
    write(dir.path(), "fp2/feature-pack.toml", FP2);
    dir
}
