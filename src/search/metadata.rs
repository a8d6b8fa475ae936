//! Search results whose version lists are produced lazily
//!
//! A [`PackageSearchMetadata`] is cheap to build: it holds the primary record
//! for a package and a producer for its version list. The producer runs the
//! first time [`PackageSearchMetadata::versions`] is awaited and the outcome
//! is kept for the life of the object.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::search::error::SearchError;
use crate::search::feed::FeedQuery;
use crate::search::filter::SearchFilter;
use crate::search::record::PackageVersionRecord;
use crate::search::resolver::{VersionSource, resolve, resolve_snapshot};
use crate::search::semver::PackageVersion;

type VersionsFuture = BoxFuture<'static, Result<Vec<VersionInfo>, SearchError>>;
type VersionsProducer = Box<dyn Fn() -> VersionsFuture + Send + Sync>;

/// One distinct version of a package in a resolved version list
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version: PackageVersion,
    pub download_count: i64,
    /// Single-version view of the record this entry was built from
    pub metadata: Arc<PackageSearchMetadata>,
}

impl VersionInfo {
    pub fn new(metadata: Arc<PackageSearchMetadata>) -> Self {
        Self {
            version: metadata.version().clone(),
            download_count: metadata.download_count(),
            metadata,
        }
    }
}

impl PartialEq for VersionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.metadata.record() == other.metadata.record()
    }
}

/// Search result for a single package
pub struct PackageSearchMetadata {
    record: PackageVersionRecord,
    versions: OnceCell<Vec<VersionInfo>>,
    producer: Option<VersionsProducer>,
}

impl PackageSearchMetadata {
    /// Creates a view of a single record with an empty version list
    pub fn new(record: PackageVersionRecord) -> Self {
        Self {
            record,
            versions: OnceCell::new(),
            producer: None,
        }
    }

    /// Creates a search result whose version list comes from `producer`
    ///
    /// The producer is not invoked here.
    pub fn with_versions<F, Fut>(record: PackageVersionRecord, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<VersionInfo>, SearchError>> + Send + 'static,
    {
        Self {
            record,
            versions: OnceCell::new(),
            producer: Some(Box::new(move || producer().boxed())),
        }
    }

    /// Creates a search result resolving versions from records already in memory
    pub fn from_snapshot(
        record: PackageVersionRecord,
        snapshot: Arc<[PackageVersionRecord]>,
        filter: SearchFilter,
        cancel: CancellationToken,
    ) -> Self {
        let package_id = record.id.clone();
        Self::with_versions(record, move || {
            let result = resolve_snapshot(&package_id, &filter, &cancel, &snapshot);
            futures::future::ready(result)
        })
    }

    /// Creates a search result resolving versions from a remote feed on first access
    pub fn from_feed(
        record: PackageVersionRecord,
        filter: SearchFilter,
        feed: Arc<dyn FeedQuery>,
        cancel: CancellationToken,
    ) -> Self {
        let package_id = record.id.clone();
        Self::with_versions(record, move || {
            let package_id = package_id.clone();
            let feed = Arc::clone(&feed);
            let cancel = cancel.clone();
            async move {
                resolve(
                    &package_id,
                    &filter,
                    &cancel,
                    VersionSource::Feed(feed.as_ref()),
                )
                .await
            }
        })
    }

    /// Returns the version list, producing it on the first call
    ///
    /// Concurrent callers share a single producer run. A failed or cancelled
    /// run leaves nothing cached, so a later call runs the producer again.
    pub async fn versions(&self) -> Result<&[VersionInfo], SearchError> {
        let Some(producer) = &self.producer else {
            return Ok(&[]);
        };

        let versions = self
            .versions
            .get_or_try_init(|| {
                debug!("Materializing versions for {}", self.record.id);
                producer()
            })
            .await?;

        Ok(versions.as_slice())
    }

    /// Returns true once the version list has been produced and cached
    pub fn is_materialized(&self) -> bool {
        self.versions.initialized()
    }

    pub fn record(&self) -> &PackageVersionRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn version(&self) -> &PackageVersion {
        &self.record.version
    }

    pub fn is_listed(&self) -> bool {
        self.record.is_listed
    }

    pub fn download_count(&self) -> i64 {
        self.record.download_count
    }

    pub fn title(&self) -> Option<&str> {
        self.record.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.record.description.as_deref()
    }

    pub fn authors(&self) -> &[String] {
        &self.record.authors
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.record.published
    }
}

impl fmt::Debug for PackageSearchMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageSearchMetadata")
            .field("record", &self.record)
            .field("versions", &self.versions.get())
            .field("lazy", &self.producer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::error::FeedError;
    use crate::search::feed::MockFeedQuery;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(id: &str, version: &str, listed: bool) -> PackageVersionRecord {
        PackageVersionRecord::parse(id, version, listed, 0).unwrap()
    }

    fn versions_of(result: &[VersionInfo]) -> Vec<String> {
        result.iter().map(|v| v.version.to_string()).collect()
    }

    #[test]
    fn version_info_equality_compares_source_records() {
        let info = |downloads| {
            VersionInfo::new(Arc::new(PackageSearchMetadata::new(
                PackageVersionRecord::parse("Foo", "1.0", true, downloads).unwrap(),
            )))
        };

        assert_eq!(info(5), info(5));
        assert_ne!(info(5), info(6));
    }

    #[tokio::test]
    async fn new_has_empty_version_list() {
        let metadata = PackageSearchMetadata::new(record("Foo", "1.0", true));

        assert!(metadata.versions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn with_versions_does_not_invoke_producer_until_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let metadata = PackageSearchMetadata::with_versions(record("Foo", "1.0", true), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<Vec<VersionInfo>, SearchError>(Vec::new()) }
        });

        assert_eq!(metadata.id(), "Foo");
        assert_eq!(metadata.version().to_string(), "1.0.0");
        assert!(metadata.is_listed());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!metadata.is_materialized());

        metadata.versions().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(metadata.is_materialized());
    }

    #[tokio::test]
    async fn versions_invokes_producer_once_across_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let metadata = PackageSearchMetadata::with_versions(record("Foo", "1.0", true), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Ok::<_, SearchError>(vec![VersionInfo::new(Arc::new(
                    PackageSearchMetadata::new(record("Foo", "1.0", true)),
                ))])
            }
        });

        let first = metadata.versions().await.unwrap().to_vec();
        let second = metadata.versions().await.unwrap().to_vec();
        let third = metadata.versions().await.unwrap().to_vec();

        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_runs_producer_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let metadata = Arc::new(PackageSearchMetadata::with_versions(
            record("Foo", "1.0", true),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    Ok::<_, SearchError>(vec![VersionInfo::new(Arc::new(
                        PackageSearchMetadata::new(record("Foo", "1.0", true)),
                    ))])
                }
            },
        ));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let metadata = Arc::clone(&metadata);
                tokio::spawn(async move { metadata.versions().await.unwrap().len() })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            assert_eq!(task.unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_producer_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let metadata = PackageSearchMetadata::with_versions(record("Foo", "1.0", true), move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(SearchError::Feed(FeedError::InvalidResponse(
                        "temporary".to_string(),
                    )))
                } else {
                    Ok(Vec::<VersionInfo>::new())
                }
            }
        });

        assert!(metadata.versions().await.is_err());
        assert!(!metadata.is_materialized());
        assert!(metadata.versions().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn from_snapshot_resolves_versions_of_its_package() {
        let snapshot: Arc<[PackageVersionRecord]> = vec![
            record("Foo", "1.0", true),
            record("foo", "1.1", true),
            record("Bar", "9.0", true),
            record("Foo", "2.0-beta", true),
        ]
        .into();
        let metadata = PackageSearchMetadata::from_snapshot(
            record("Foo", "1.1", true),
            snapshot,
            SearchFilter::default(),
            CancellationToken::new(),
        );

        let versions = metadata.versions().await.unwrap();

        assert_eq!(versions_of(versions), vec!["1.1.0", "1.0.0"]);
        assert!(versions[0].metadata.versions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn from_snapshot_reports_cancellation() {
        let cancel = CancellationToken::new();
        let metadata = PackageSearchMetadata::from_snapshot(
            record("Foo", "1.0", true),
            vec![record("Foo", "1.0", true)].into(),
            SearchFilter::default(),
            cancel.clone(),
        );
        cancel.cancel();

        let result = metadata.versions().await;

        assert!(result.unwrap_err().is_cancelled());
        assert!(!metadata.is_materialized());
    }

    #[tokio::test]
    async fn from_feed_queries_feed_once_with_filter_flags() {
        let mut feed = MockFeedQuery::new();
        feed.expect_find_packages_by_id()
            .withf(|id, delisted, prerelease, _| id == "Foo" && *delisted && !*prerelease)
            .times(1)
            .returning(|_, _, _, _| {
                Ok(vec![
                    record("Foo", "1.0", true),
                    record("Foo", "2.0", false),
                    record("Foo", "1.0", true),
                ])
            });

        let metadata = PackageSearchMetadata::from_feed(
            record("Foo", "2.0", false),
            SearchFilter::new(false, true),
            Arc::new(feed),
            CancellationToken::new(),
        );

        assert_eq!(
            versions_of(metadata.versions().await.unwrap()),
            vec!["2.0.0", "1.0.0"]
        );
        assert_eq!(
            versions_of(metadata.versions().await.unwrap()),
            vec!["2.0.0", "1.0.0"]
        );
    }
}
