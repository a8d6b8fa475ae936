use serde::Deserialize;

use crate::search::record::PackageVersionRecord;

/// Query-time policy deciding which versions are eligible for a result
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchFilter {
    pub include_prerelease: bool,
    pub include_delisted: bool,
}

impl SearchFilter {
    pub fn new(include_prerelease: bool, include_delisted: bool) -> Self {
        Self {
            include_prerelease,
            include_delisted,
        }
    }

    /// Returns true if the record is eligible under this filter
    pub fn accepts(&self, record: &PackageVersionRecord) -> bool {
        (record.is_listed || self.include_delisted)
            && (!record.version.is_prerelease() || self.include_prerelease)
    }
}
