//! Raw version records as delivered by a package feed

use chrono::{DateTime, Utc};

use crate::search::error::VersionError;
use crate::search::semver::PackageVersion;

/// One published version of a package, as listed by a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersionRecord {
    pub id: String,
    pub version: PackageVersion,
    pub is_listed: bool,
    pub download_count: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub published: Option<DateTime<Utc>>,
}

impl PackageVersionRecord {
    pub fn new(
        id: impl Into<String>,
        version: PackageVersion,
        is_listed: bool,
        download_count: i64,
    ) -> Self {
        Self {
            id: id.into(),
            version,
            is_listed,
            download_count,
            title: None,
            description: None,
            authors: Vec::new(),
            published: None,
        }
    }

    /// Creates a record from a raw version string, failing on malformed versions
    pub fn parse(
        id: impl Into<String>,
        version: &str,
        is_listed: bool,
        download_count: i64,
    ) -> Result<Self, VersionError> {
        let version = PackageVersion::parse(version)?;
        Ok(Self::new(id, version, is_listed, download_count))
    }

    /// Returns true if this record belongs to the given package id
    pub fn matches_id(&self, package_id: &str) -> bool {
        ids_match(&self.id, package_id)
    }
}

/// Ordinal, case-insensitive comparison of package ids
///
/// Chars are compared one to one after simple upper-casing, independent of
/// the host locale. A char whose upper case expands to several chars (such
/// as 'ß') is compared as is.
pub fn ids_match(a: &str, b: &str) -> bool {
    a.chars().map(simple_uppercase).eq(b.chars().map(simple_uppercase))
}

fn simple_uppercase(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}
