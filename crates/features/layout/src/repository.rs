//! Discovery of `feature-pack.toml` documents under a repository directory.

use crate::document::FeaturePackDocument;
use crate::error::{LayoutError, LayoutErrorExt, Result};
use fpm_domain::Gav;
use fpm_domain::spec::FeaturePackSpec;
use fpm_resolver::InMemoryRepository;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

/// File name of a feature-pack description inside a repository directory.
pub const FEATURE_PACK_FILE: &str = "feature-pack.toml";

/// Loads every [`FEATURE_PACK_FILE`] found below `root`, at any depth.
///
/// When several versions of one artifact are present, the highest one is the repository's
/// current version. Versions compare segment by segment (split on `.` and `-`), numerically
/// where both segments are numbers, so `1.10` is newer than `1.9`.
///
/// # Errors
/// Returns [`LayoutError::DirectoryNotFound`] when `root` is not a directory,
/// [`LayoutError::DuplicateFeaturePack`] when two documents describe the same GAV and any
/// read, parse or description error with the offending path in its context.
#[instrument(skip_all, fields(root = %root.as_ref().display()))]
pub fn load_repository(root: impl AsRef<Path>) -> Result<InMemoryRepository> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(LayoutError::DirectoryNotFound {
            message: root.display().to_string().into(),
            context: Some("feature-pack repository".into()),
        });
    }

    let mut loaded = Vec::new();
    let mut sources: IndexMap<Gav, PathBuf> = IndexMap::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.context(format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() || entry.file_name() != FEATURE_PACK_FILE {
            continue;
        }
        let path = entry.path();
        let document: FeaturePackDocument = read_document(path)?;

        if let Some(first) = sources.get(document.gav()) {
            return Err(LayoutError::DuplicateFeaturePack {
                message: format!(
                    "{} is described by {} and {}",
                    document.gav(),
                    first.display(),
                    path.display()
                )
                .into(),
                context: None,
            });
        }
        sources.insert(document.gav().clone(), path.to_path_buf());

        let spec = document.into_spec().context(path.display().to_string())?;
        debug!(gav = %spec.gav(), path = %path.display(), "Feature-pack loaded");
        loaded.push(spec);
    }

    loaded.sort_by(|a, b| compare_versions(a.gav().version(), b.gav().version()));
    let repository: InMemoryRepository = loaded.into_iter().collect();

    info!(feature_packs = repository.len(), "Repository loaded");
    Ok(repository)
}

/// Parses a single feature-pack description.
///
/// # Errors
/// Returns [`LayoutError::Toml`] for malformed documents and [`LayoutError::Description`]
/// for documents describing an invalid feature-pack.
pub fn parse_feature_pack(text: &str) -> Result<FeaturePackSpec> {
    let document: FeaturePackDocument = toml::from_str(text)?;
    Ok(document.into_spec()?)
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split(['.', '-']);
    let mut right = b.split(['.', '-']);
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => match (l.parse::<u64>(), r.parse::<u64>()) {
                (Ok(l), Ok(r)) => l.cmp(&r),
                _ => l.cmp(r),
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    toml::from_str(&text).context(path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_compare_segment_by_segment() {
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("2.0.0.Final", "2.0.0.Beta1"), Ordering::Greater);
        assert_eq!(compare_versions("1.0-1", "1.0-1"), Ordering::Equal);
    }
}
