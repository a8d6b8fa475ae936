use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use semver::Version;

use crate::search::error::VersionError;

/// Parse a version string as published by a package feed.
///
/// Feeds commonly publish versions such as "1", "2.0-beta" or "4.0.0.1", so
/// the numeric part is padded with zeros before the prerelease and build
/// suffixes, and a fourth numeric part is kept as the revision.
///
/// Examples:
/// - "1" -> 1.0.0
/// - "1.2" -> 1.2.0
/// - "2.0-beta" -> 2.0.0-beta
/// - "4.0.0.1" -> 4.0.0 revision 1
pub fn parse_version(version: &str) -> Result<PackageVersion, VersionError> {
    let trimmed = version.trim();
    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);

    let parts: Vec<&str> = core.split('.').collect();
    let (normalized, revision) = match parts.as_slice() {
        [major] => (format!("{major}.0.0{suffix}"), 0),
        [major, minor] => (format!("{major}.{minor}.0{suffix}"), 0),
        [major, minor, patch, revision] if is_numeric(revision) => {
            match revision.parse::<u64>() {
                Ok(revision) => (format!("{major}.{minor}.{patch}{suffix}"), revision),
                Err(_) => (trimmed.to_string(), 0),
            }
        }
        _ => (trimmed.to_string(), 0),
    };

    let version = Version::parse(&normalized).map_err(|source| VersionError {
        input: version.to_string(),
        source,
    })?;

    Ok(PackageVersion { version, revision })
}

fn is_numeric(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

/// A package version as published by a feed
///
/// Equality, hashing and ordering follow semver precedence extended with a
/// fourth revision number. Build metadata is ignored, a prerelease sorts
/// before its release, and prerelease labels compare case-insensitively.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    version: Version,
    revision: u64,
}

impl PackageVersion {
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        parse_version(version)
    }

    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Version> for PackageVersion {
    fn from(version: Version) -> Self {
        Self {
            version,
            revision: 0,
        }
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.version;
        write!(f, "{}.{}.{}", v.major, v.minor, v.patch)?;
        if self.revision != 0 {
            write!(f, ".{}", self.revision)?;
        }
        if !v.pre.is_empty() {
            write!(f, "-{}", v.pre)?;
        }
        if !v.build.is_empty() {
            write!(f, "+{}", v.build)?;
        }
        Ok(())
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.version, &other.version);
        (a.major, a.minor, a.patch, self.revision)
            .cmp(&(b.major, b.minor, b.patch, other.revision))
            .then_with(|| compare_prerelease(a.pre.as_str(), b.pre.as_str()))
    }
}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.major.hash(state);
        self.version.minor.hash(state);
        self.version.patch.hash(state);
        self.revision.hash(state);
        self.version.pre.as_str().to_ascii_lowercase().hash(state);
    }
}

/// Compare dot-separated prerelease labels, an empty label being a release
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = compare_identifier(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

// Numeric identifiers carry no leading zeros, so length decides first
fn compare_identifier(a: &str, b: &str) -> Ordering {
    match (is_numeric(a), is_numeric(b)) {
        (true, true) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a
            .bytes()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.bytes().map(|c| c.to_ascii_lowercase())),
    }
}
