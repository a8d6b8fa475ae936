use thiserror::Error;

#[derive(Debug, Error)]
#[error("Invalid version '{input}': {source}")]
pub struct VersionError {
    pub input: String,
    #[source]
    pub source: semver::Error,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid version for package {package_id}: {source}")]
    InvalidVersion {
        package_id: String,
        #[source]
        source: VersionError,
    },

    #[error("Feed query was cancelled")]
    Cancelled,
}

/// Error returned when resolving the versions of a package
///
/// Cancellation is reported as its own variant so callers can tell an
/// aborted query apart from a failed one.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Version resolution was cancelled")]
    Cancelled,

    #[error(transparent)]
    Feed(FeedError),
}

impl SearchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}

impl From<FeedError> for SearchError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Cancelled => SearchError::Cancelled,
            other => SearchError::Feed(other),
        }
    }
}
