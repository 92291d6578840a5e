use crate::core::error::{DepackError, DepackResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An exact semantic version, as accepted by `<tool> info <pkg>@<version>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release version (e.g., "alpha.1", "beta.2", "rc.1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<String>,
    /// Build metadata (e.g., "build.123")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_metadata: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build_metadata: None,
        }
    }

    /// Parse a strict version string (e.g., "1.2.3", "1.2.3-alpha.1", "1.2.3+build.123")
    ///
    /// All three numeric parts are required and may not carry leading zeros.
    pub fn parse(s: &str) -> DepackResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('v').unwrap_or(s);

        let (rest, build_metadata) = match s.split_once('+') {
            Some((rest, build)) => (rest, Some(Self::identifiers(build, s)?)),
            None => (s, None),
        };
        let (core, prerelease) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(Self::identifiers(pre, s)?)),
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(DepackError::Version(format!(
                "Invalid version format: {}",
                s
            )));
        }

        let numbers = parts
            .iter()
            .map(|part| Self::numeric(part, s))
            .collect::<DepackResult<Vec<u64>>>()?;

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            prerelease,
            build_metadata,
        })
    }

    fn numeric(part: &str, whole: &str) -> DepackResult<u64> {
        let valid = !part.is_empty()
            && part.chars().all(|c| c.is_ascii_digit())
            && (part == "0" || !part.starts_with('0'));
        if !valid {
            return Err(DepackError::Version(format!(
                "Invalid numeric part '{}' in version: {}",
                part, whole
            )));
        }
        part.parse()
            .map_err(|_| DepackError::Version(format!("Version part out of range: {}", whole)))
    }

    fn identifiers(ids: &str, whole: &str) -> DepackResult<String> {
        let valid = ids.split('.').all(|id| {
            !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
        if valid {
            Ok(ids.to_string())
        } else {
            Err(DepackError::Version(format!(
                "Invalid pre-release or build identifier in version: {}",
                whole
            )))
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        if let Some(ref build) = self.build_metadata {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

/// Strip a leading caret or tilde qualifier from a declared range
pub fn strip_range_qualifier(range: &str) -> &str {
    let range = range.trim();
    range
        .strip_prefix('^')
        .or_else(|| range.strip_prefix('~'))
        .unwrap_or(range)
}

/// The exact version a simple range pins to, if it is `X.Y.Z`, `^X.Y.Z` or `~X.Y.Z`
///
/// Compound ranges (`>=1 <2`, `1.x`, `*`, tags, URLs) yield `None`.
pub fn pinned_version(range: &str) -> Option<Version> {
    Version::parse(strip_range_qualifier(range)).ok()
}
