//! Feature-pack coordinates.

use crate::error::{DescriptionError, require_non_empty};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version placeholder meaning "whatever the repository considers current".
pub const LATEST: &str = "LATEST";

/// Group/artifact/version coordinate of a feature-pack.
///
/// Serialized as `group:artifact:version`; parsing `group:artifact` yields [`LATEST`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gav {
    group_id: String,
    artifact_id: String,
    version: String,
}

impl Gav {
    /// # Errors
    /// Returns [`DescriptionError`] if a part is empty or contains `:`.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, DescriptionError> {
        let gav =
            Self { group_id: group_id.into(), artifact_id: artifact_id.into(), version: version.into() };
        for (part, what) in [
            (&gav.group_id, "groupId"),
            (&gav.artifact_id, "artifactId"),
            (&gav.version, "version"),
        ] {
            require_non_empty(part, what)?;
            if part.contains(':') {
                return Err(DescriptionError::malformed(format!("{what} '{part}' contains ':'")));
            }
        }
        Ok(gav)
    }

    /// A coordinate to be resolved to the current version by the repository.
    ///
    /// # Errors
    /// See [`Gav::new`].
    pub fn latest(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
    ) -> Result<Self, DescriptionError> {
        Self::new(group_id, artifact_id, LATEST)
    }

    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    #[must_use]
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn is_latest(&self) -> bool {
        self.version == LATEST
    }

    /// `true` when both coordinates name the same artifact, regardless of version.
    #[must_use]
    pub fn same_artifact(&self, other: &Self) -> bool {
        self.group_id == other.group_id && self.artifact_id == other.artifact_id
    }

    /// Returns `group:artifact`.
    #[must_use]
    pub fn to_ga_string(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

impl fmt::Display for Gav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl FromStr for Gav {
    type Err = DescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact] => Self::latest(*group, *artifact),
            [group, artifact, version] => Self::new(*group, *artifact, *version),
            _ => Err(DescriptionError::Malformed {
                message: format!("'{s}' does not follow format groupId:artifactId[:version]").into(),
                context: None,
            }),
        }
    }
}

impl TryFrom<String> for Gav {
    type Error = DescriptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Gav> for String {
    fn from(value: Gav) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_coordinates() {
        let gav: Gav = "org.example:fp1:1.0.0.Final".parse().expect("valid gav");
        assert_eq!(gav.group_id(), "org.example");
        assert_eq!(gav.artifact_id(), "fp1");
        assert_eq!(gav.version(), "1.0.0.Final");
        assert_eq!(gav.to_string(), "org.example:fp1:1.0.0.Final");
    }

    #[test]
    fn missing_version_means_latest() {
        let gav: Gav = "org.example:fp1".parse().expect("valid gav");
        assert!(gav.is_latest());
        assert!(gav.same_artifact(&Gav::new("org.example", "fp1", "2.0").expect("valid gav")));
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!("fp1".parse::<Gav>().is_err());
        assert!("a:b:c:d".parse::<Gav>().is_err());
        assert!("org.example::1.0".parse::<Gav>().is_err());
    }

    #[test]
    fn serializes_as_string() -> Result<(), serde_json::Error> {
        let gav = Gav::new("org.example", "fp1", "1.0").expect("valid gav");
        let json = serde_json::to_string(&gav)?;
        assert_eq!(json, "\"org.example:fp1:1.0\"");
        assert_eq!(serde_json::from_str::<Gav>(&json)?, gav);
        Ok(())
    }
}
