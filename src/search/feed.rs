//! Feed trait for querying the versions a remote feed publishes for a package

#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

use crate::search::error::FeedError;
use crate::search::record::PackageVersionRecord;

/// Trait for fetching package version records from a remote feed
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait FeedQuery: Send + Sync {
    /// Fetches the version records published for a package
    ///
    /// # Arguments
    /// * `package_id` - The package id, matched case-insensitively by the feed
    /// * `include_delisted` - Whether delisted versions should be returned
    /// * `include_prerelease` - Whether prerelease versions should be returned
    /// * `cancel` - Token that aborts the query when triggered
    ///
    /// # Returns
    /// * `Ok(Vec<PackageVersionRecord>)` - Records in no particular order, possibly with duplicates
    /// * `Err(FeedError)` - If the query fails or is cancelled
    ///
    /// The flags are a pre-filter only; callers re-check every record.
    async fn find_packages_by_id(
        &self,
        package_id: &str,
        include_delisted: bool,
        include_prerelease: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageVersionRecord>, FeedError>;
}
