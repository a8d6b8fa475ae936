//! Feed test utilities

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use feed_versions::search::error::FeedError;
use feed_versions::search::feed::FeedQuery;
use feed_versions::search::record::PackageVersionRecord;

/// Build a record, panicking on malformed versions
pub fn record(id: &str, version: &str, listed: bool, downloads: i64) -> PackageVersionRecord {
    PackageVersionRecord::parse(id, version, listed, downloads).unwrap()
}

/// Feed returning canned records and counting how often it is queried
pub struct StubFeed {
    records: Vec<PackageVersionRecord>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl StubFeed {
    pub fn new(records: Vec<PackageVersionRecord>) -> Self {
        Self {
            records,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            records: Vec::new(),
            failure: Some(message.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter, readable after the feed has been moved
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl FeedQuery for StubFeed {
    async fn find_packages_by_id(
        &self,
        package_id: &str,
        include_delisted: bool,
        _include_prerelease: bool,
        _cancel: &CancellationToken,
    ) -> Result<Vec<PackageVersionRecord>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(FeedError::InvalidResponse(message.clone()));
        }

        // Honours the delisting flag only, leaving order and duplicates as stored
        Ok(self
            .records
            .iter()
            .filter(|r| r.matches_id(package_id))
            .filter(|r| r.is_listed || include_delisted)
            .cloned()
            .collect())
    }
}
