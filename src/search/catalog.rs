//! Grouping of an in-memory catalog into per-package search results

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::search::filter::SearchFilter;
use crate::search::metadata::PackageSearchMetadata;
use crate::search::record::{PackageVersionRecord, ids_match};

/// Pick the record that represents a package in search results
///
/// This is the highest version among the records of `package_id` that the
/// filter accepts. When several records share that version, the first wins.
pub fn primary_record<'a>(
    records: &'a [PackageVersionRecord],
    package_id: &str,
    filter: &SearchFilter,
) -> Option<&'a PackageVersionRecord> {
    records
        .iter()
        .filter(|record| record.matches_id(package_id) && filter.accepts(record))
        .reduce(|best, record| {
            if record.version > best.version {
                record
            } else {
                best
            }
        })
}

/// Build one search result per package found in `records`
///
/// Packages are returned in the order their id first appears. Packages
/// without any record accepted by `filter` are left out. Every result shares
/// the snapshot, and none of them resolves its versions until asked.
pub fn group_snapshot(
    records: Arc<[PackageVersionRecord]>,
    filter: SearchFilter,
    cancel: CancellationToken,
) -> Vec<PackageSearchMetadata> {
    let mut package_ids: Vec<&str> = Vec::new();
    for record in records.iter() {
        if !package_ids.iter().any(|id| ids_match(id, &record.id)) {
            package_ids.push(&record.id);
        }
    }

    let results: Vec<PackageSearchMetadata> = package_ids
        .into_iter()
        .filter_map(|id| primary_record(&records, id, &filter))
        .map(|primary| {
            PackageSearchMetadata::from_snapshot(
                primary.clone(),
                Arc::clone(&records),
                filter,
                cancel.clone(),
            )
        })
        .collect();

    debug!(
        "Grouped {} records into {} packages",
        records.len(),
        results.len()
    );

    results
}
