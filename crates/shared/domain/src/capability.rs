//! Capability patterns declared by feature specs.

use crate::error::DescriptionError;
use std::fmt;
use std::str::FromStr;

/// One dot-separated part of a capability pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CapabilitySegment {
    Literal(String),
    /// `$name`: replaced by the value(s) of parameter `name`.
    Param(String),
}

/// A provided or required capability, e.g. `org.wildfly.network.socket-binding.$name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilitySpec {
    pattern: String,
    segments: Vec<CapabilitySegment>,
    optional: bool,
}

impl CapabilitySpec {
    /// # Errors
    /// Returns [`DescriptionError::Malformed`] for empty segments or a bare `$`.
    pub fn parse(pattern: &str) -> Result<Self, DescriptionError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(DescriptionError::malformed("Capability pattern is empty"));
        }
        let segments = pattern
            .split('.')
            .map(|segment| match segment.strip_prefix('$') {
                _ if segment.is_empty() => Err(malformed_pattern(pattern, "contains an empty segment")),
                Some("") => Err(malformed_pattern(pattern, "contains a '$' without a parameter name")),
                Some(param) => Ok(CapabilitySegment::Param(param.to_owned())),
                None => Ok(CapabilitySegment::Literal(segment.to_owned())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pattern: pattern.to_owned(), segments, optional: false })
    }

    /// A requirement that never fails resolution when unmet.
    ///
    /// # Errors
    /// See [`CapabilitySpec::parse`].
    pub fn optional(pattern: &str) -> Result<Self, DescriptionError> {
        Ok(Self { optional: true, ..Self::parse(pattern)? })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn segments(&self) -> &[CapabilitySegment] {
        &self.segments
    }

    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// `true` when the pattern has no parameter placeholders.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.params().next().is_none()
    }

    /// Names of the parameters referenced by placeholders, in pattern order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            CapabilitySegment::Param(name) => Some(name.as_str()),
            CapabilitySegment::Literal(_) => None,
        })
    }
}

impl FromStr for CapabilitySpec {
    type Err = DescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CapabilitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn malformed_pattern(pattern: &str, problem: &str) -> DescriptionError {
    DescriptionError::Malformed {
        message: format!("Capability '{pattern}' {problem}").into(),
        context: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_literals_and_placeholders() -> Result<(), DescriptionError> {
        let cap = CapabilitySpec::parse("org.$a.socket.$name")?;
        assert_eq!(
            cap.segments(),
            &[
                CapabilitySegment::Literal("org".to_owned()),
                CapabilitySegment::Param("a".to_owned()),
                CapabilitySegment::Literal("socket".to_owned()),
                CapabilitySegment::Param("name".to_owned()),
            ]
        );
        assert_eq!(cap.params().collect::<Vec<_>>(), vec!["a", "name"]);
        assert!(!cap.is_static());
        assert!(CapabilitySpec::parse("cap.a")?.is_static());
        Ok(())
    }

    #[test]
    fn rejects_empty_segments() {
        for bad in ["", "a..b", ".a", "a.", "a.$", "$"] {
            assert!(CapabilitySpec::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn optional_flag() -> Result<(), DescriptionError> {
        assert!(CapabilitySpec::optional("$p1.$p2")?.is_optional());
        assert!(!CapabilitySpec::parse("$p1.$p2")?.is_optional());
        Ok(())
    }
}
