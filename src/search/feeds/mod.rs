//! Feed implementations for querying package versions

pub mod http;

pub use http::HttpFeed;
