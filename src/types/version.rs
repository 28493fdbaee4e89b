use std::fmt;
use std::str::FromStr;

use semver::Version;
use thiserror::Error;

/// Version assumed for library copies that ship without a version file.
///
/// Old enough to sort below every real release, so such copies are always
/// replaced.
pub const ASSUMED_VERSION: LibraryVersion = LibraryVersion(Version::new(0, 0, 1));

/// Version of a bundled Alfred-Workflow library
///
/// Accepts the loose forms found in library `version` files:
/// - `1.25.1`, `v1.25.1`
/// - `1.25` and `1` (missing components are zero)
/// - `1.25.1-beta`, `1.25.1-beta+build.3`, `1.25.1+build.3`
///
/// Ordering follows semver precedence. Build metadata is dropped on parse,
/// so it never affects comparisons.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LibraryVersion(Version);

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,
    #[error("invalid version '{0}': expected one to three numeric components")]
    InvalidFormat(String),
    #[error("invalid version '{0}': suffix must start with '-' or '+'")]
    InvalidSuffix(String),
    #[error("invalid version '{0}'")]
    Semver(String, #[source] semver::Error),
}

impl LibraryVersion {
    /// Parse a version string like "1.25.1" or "v2.0-beta"
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (numeric, suffix) = trimmed.split_at(split);

        if !numeric.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(VersionError::InvalidFormat(s.to_string()));
        }

        let parts = numeric
            .split('.')
            .map(|p| p.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionError::InvalidFormat(s.to_string()))?;

        if parts.len() > 3 {
            return Err(VersionError::InvalidFormat(s.to_string()));
        }

        if !suffix.is_empty() && !suffix.starts_with(['-', '+']) {
            return Err(VersionError::InvalidSuffix(s.to_string()));
        }

        let component = |i: usize| parts.get(i).copied().unwrap_or(0);
        let mut normalized = format!("{}.{}.{}", component(0), component(1), component(2));
        if let Some(pre) = suffix.strip_prefix('-') {
            // Build metadata is dropped anyway
            let pre = pre.split('+').next().unwrap_or_default();
            let pre = normalize_prerelease(pre);
            if !pre.is_empty() {
                normalized.push('-');
                normalized.push_str(&pre);
            }
        }

        let version =
            Version::parse(&normalized).map_err(|e| VersionError::Semver(s.to_string(), e))?;

        Ok(Self(version))
    }

    /// True if this version sorts strictly below `minimum`
    pub fn is_older_than(&self, minimum: &LibraryVersion) -> bool {
        self < minimum
    }
}

/// Coerce a free-form pre-release into semver identifiers
///
/// Characters outside `[0-9A-Za-z-]` become `-`, empty identifiers are
/// dropped, and leading zeros are stripped from numeric identifiers:
/// `beta_1` -> `beta-1`, `rc.01` -> `rc.1`.
fn normalize_prerelease(pre: &str) -> String {
    pre.split('.')
        .filter(|ident| !ident.is_empty())
        .map(|ident| {
            if ident.chars().all(|c| c.is_ascii_digit()) {
                let trimmed = ident.trim_start_matches('0');
                if trimmed.is_empty() { "0" } else { trimmed }.to_string()
            } else {
                ident
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
                    .collect()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

impl FromStr for LibraryVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
