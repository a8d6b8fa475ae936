//! JSON-over-HTTP feed implementation

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::search::error::FeedError;
use crate::search::feed::FeedQuery;
use crate::search::record::PackageVersionRecord;
use crate::search::semver::PackageVersion;

/// Response from the versions endpoint
#[derive(Debug, Deserialize)]
struct VersionsResponse {
    versions: Vec<FeedEntry>,
}

/// Single version entry as published by the feed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedEntry {
    id: String,
    version: String,
    #[serde(default = "default_listed")]
    listed: bool,
    #[serde(default)]
    download_count: i64,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    published: Option<DateTime<Utc>>,
}

fn default_listed() -> bool {
    true
}

impl FeedEntry {
    fn into_record(self) -> Result<PackageVersionRecord, FeedError> {
        let version =
            PackageVersion::parse(&self.version).map_err(|source| FeedError::InvalidVersion {
                package_id: self.id.clone(),
                source,
            })?;

        Ok(PackageVersionRecord {
            id: self.id,
            version,
            is_listed: self.listed,
            download_count: self.download_count,
            title: self.title,
            description: self.description,
            authors: self.authors,
            published: self.published,
        })
    }
}

/// Feed client for registries serving package versions as JSON
#[derive(Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpFeed {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let base_url = Url::parse(config.feed_url.trim())
            .map_err(|e| FeedError::InvalidUrl(format!("{}: {}", config.feed_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FeedError::InvalidUrl(config.feed_url.clone()));
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Builds `{base}/packages/{id}/versions?...`, percent-encoding the id as one path segment
    fn versions_url(
        &self,
        package_id: &str,
        include_delisted: bool,
        include_prerelease: bool,
    ) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["packages", package_id, "versions"]);
        }
        url.query_pairs_mut()
            .append_pair("includeDelisted", &include_delisted.to_string())
            .append_pair("includePrerelease", &include_prerelease.to_string());
        url
    }

    async fn fetch(
        &self,
        url: &Url,
        package_id: &str,
    ) -> Result<Vec<PackageVersionRecord>, FeedError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("Package {} not found on feed", package_id);
            return Ok(Vec::new());
        }

        if !status.is_success() {
            warn!("Feed returned status {}: {}", status, url);
            return Err(FeedError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body: VersionsResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse feed response: {}", e);
            FeedError::InvalidResponse(e.to_string())
        })?;

        body.versions
            .into_iter()
            .map(FeedEntry::into_record)
            .collect()
    }
}

#[async_trait::async_trait]
impl FeedQuery for HttpFeed {
    async fn find_packages_by_id(
        &self,
        package_id: &str,
        include_delisted: bool,
        include_prerelease: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageVersionRecord>, FeedError> {
        let url = self.versions_url(package_id, include_delisted, include_prerelease);
        debug!("Fetching package versions: {}", url);

        let records = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Feed query for {} cancelled", package_id);
                return Err(FeedError::Cancelled);
            }
            result = self.fetch(&url, package_id) => result?,
        };

        debug!(
            "Found {} version records for package {}",
            records.len(),
            package_id
        );

        Ok(records)
    }
}
