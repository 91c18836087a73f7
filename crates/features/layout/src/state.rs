//! Persistence of a [`ProvisionedState`] as pretty-printed JSON.

use crate::error::{LayoutError, LayoutErrorExt, Result};
use fpm_domain::ProvisionedState;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Directory of an installation holding provisioning metadata.
pub const STATE_DIR: &str = ".fpm";

/// File name of the persisted state inside [`STATE_DIR`].
pub const STATE_FILE: &str = "provisioned.json";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Location of a persisted [`ProvisionedState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// The default state file of an installation: `<install_dir>/.fpm/provisioned.json`.
    pub fn for_installation(install_dir: impl AsRef<Path>) -> Self {
        Self { path: install_dir.as_ref().join(STATE_DIR).join(STATE_FILE) }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the state back.
    ///
    /// # Errors
    /// Returns [`LayoutError::FileNotFound`] when nothing has been written yet, and
    /// [`LayoutError::Json`] when the file does not hold a state.
    pub fn read(&self) -> Result<ProvisionedState> {
        if !self.exists() {
            return Err(LayoutError::FileNotFound {
                message: self.path.display().to_string().into(),
                context: Some("provisioned state".into()),
            });
        }
        let text = fs::read_to_string(&self.path)
            .context(format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&text).context(self.path.display().to_string())
    }

    /// Writes the state atomically.
    ///
    /// The JSON is written to a unique temporary file next to the target, synced, then
    /// renamed over the target, so readers never observe a partial file.
    ///
    /// # Errors
    /// Returns [`LayoutError::Io`] when the directory cannot be created or the file cannot
    /// be written or swapped in.
    pub fn write(&self, state: &ProvisionedState) -> Result<()> {
        let target = &self.path;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create {}", parent.display()))?;
        }

        let mut json = serde_json::to_vec_pretty(state).context("Failed to encode state")?;
        json.push(b'\n');

        let temp = unique_tmp_path(target);
        let written = write_synced(&temp, &json).and_then(|()| swap(&temp, target));
        if written.is_err() {
            remove_leftover(&temp);
        }
        written?;

        if let Some(parent) = target.parent() {
            sync_dir(parent);
        }

        debug!(path = %target.display(), "State saved atomically");
        Ok(())
    }
}

fn write_synced(temp: &Path, json: &[u8]) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp)
        .context(format!("Temp creation failed: {}", temp.display()))?;
    file.write_all(json).context("Write failed")?;
    file.sync_all().context("Sync failed")?;
    Ok(())
}

fn swap(temp: &Path, target: &Path) -> Result<()> {
    match fs::rename(temp, target) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(target)
                .context(format!("Failed to replace existing file: {}", target.display()))?;
            fs::rename(temp, target).context(format!(
                "Atomic swap failed: {} -> {}",
                temp.display(),
                target.display()
            ))
        },
        Err(err) => Err(LayoutError::Io {
            source: err,
            context: Some(format!("Atomic swap failed: {} -> {}", temp.display(), target.display()).into()),
        }),
    }
}

fn remove_leftover(temp: &Path) {
    match fs::remove_file(temp) {
        Ok(()) => debug!(path = %temp.display(), "Temporary state file removed"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
        Err(err) => warn!(path = %temp.display(), error = %err, "Temporary state file left behind"),
    }
}

fn sync_dir(path: &Path) {
    match fs::File::open(path) {
        Ok(dir) => {
            if let Err(err) = dir.sync_all() {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

fn unique_tmp_path(target: &Path) -> PathBuf {
    let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or(STATE_FILE);
    target.with_file_name(format!("{file_name}.fpmtmp.{}.{counter}", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installation_state_lives_under_the_metadata_dir() {
        let file = StateFile::for_installation("/opt/server");
        assert_eq!(file.path(), Path::new("/opt/server/.fpm/provisioned.json"));
    }

    #[test]
    fn temp_names_are_unique_siblings() {
        let target = Path::new("/opt/server/.fpm/provisioned.json");
        let first = unique_tmp_path(target);
        let second = unique_tmp_path(target);
        assert_ne!(first, second);
        assert_eq!(first.parent(), target.parent());
        assert!(first.to_string_lossy().contains("provisioned.json.fpmtmp."));
    }
}
