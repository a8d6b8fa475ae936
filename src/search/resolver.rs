//! Version list resolution
//!
//! Turns raw feed records into the deduplicated, descending list of versions
//! a filter allows, either from an in-memory snapshot or from a remote feed.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::search::error::SearchError;
use crate::search::feed::FeedQuery;
use crate::search::filter::SearchFilter;
use crate::search::metadata::{PackageSearchMetadata, VersionInfo};
use crate::search::record::PackageVersionRecord;

/// Where the raw version records come from
#[derive(Clone, Copy)]
pub enum VersionSource<'a> {
    /// Records already fetched, possibly spanning many packages
    Snapshot(&'a [PackageVersionRecord]),
    /// Records queried on demand from a feed
    Feed(&'a dyn FeedQuery),
}

/// Resolve the versions of `package_id` that satisfy `filter`
///
/// The result is ordered from the highest version to the lowest and holds at
/// most one entry per version. Returns `SearchError::Cancelled` without
/// touching the source if `cancel` is already triggered.
pub async fn resolve(
    package_id: &str,
    filter: &SearchFilter,
    cancel: &CancellationToken,
    source: VersionSource<'_>,
) -> Result<Vec<VersionInfo>, SearchError> {
    match source {
        VersionSource::Snapshot(records) => resolve_snapshot(package_id, filter, cancel, records),
        VersionSource::Feed(feed) => resolve_feed(package_id, filter, cancel, feed).await,
    }
}

/// Resolve versions from an in-memory snapshot
pub fn resolve_snapshot(
    package_id: &str,
    filter: &SearchFilter,
    cancel: &CancellationToken,
    records: &[PackageVersionRecord],
) -> Result<Vec<VersionInfo>, SearchError> {
    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    let candidates = records
        .iter()
        .filter(|record| record.matches_id(package_id))
        .cloned();

    let versions = collect_versions(candidates, filter);
    debug!(
        "Resolved {} versions for {} from snapshot of {} records",
        versions.len(),
        package_id,
        records.len()
    );

    Ok(versions)
}

async fn resolve_feed(
    package_id: &str,
    filter: &SearchFilter,
    cancel: &CancellationToken,
    feed: &dyn FeedQuery,
) -> Result<Vec<VersionInfo>, SearchError> {
    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    let records = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SearchError::Cancelled),
        result = feed.find_packages_by_id(
            package_id,
            filter.include_delisted,
            filter.include_prerelease,
            cancel,
        ) => result?,
    };

    // A feed may finish its work even though the token fired meanwhile
    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    let fetched = records.len();
    let versions = collect_versions(records, filter);
    debug!(
        "Resolved {} versions for {} from {} feed records",
        versions.len(),
        package_id,
        fetched
    );

    Ok(versions)
}

/// Sort descending, filter, and keep the first record seen for each version
///
/// The sort is stable, so among duplicates the one that came first in the
/// input wins and later ones are dropped.
fn collect_versions<I>(records: I, filter: &SearchFilter) -> Vec<VersionInfo>
where
    I: IntoIterator<Item = PackageVersionRecord>,
{
    let mut candidates: Vec<PackageVersionRecord> = records.into_iter().collect();
    candidates.sort_by(|a, b| b.version.cmp(&a.version));

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|record| filter.accepts(record))
        .filter(|record| seen.insert(record.version.clone()))
        .map(|record| VersionInfo::new(Arc::new(PackageSearchMetadata::new(record))))
        .collect()
}
