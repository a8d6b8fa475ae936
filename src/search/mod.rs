//! Version search layer for package feeds
//!
//! This module answers "which versions of package P satisfy filter F",
//! either from records already in memory or from a feed queried on demand.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Feed     │────▶│  Resolver   │◀────│  Snapshot   │
//! │  (remote)   │     │(filter/sort)│     │ (in memory) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │  Metadata   │
//!                     │(lazy, once) │
//!                     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`catalog`]: Groups a snapshot into one search result per package
//! - [`error`]: Error types for versions, feeds and resolution
//! - [`feed`]: Feed trait for querying the records of a package
//! - [`feeds`]: Concrete feed implementations
//! - [`filter`]: Query policy for prerelease and delisted versions
//! - [`metadata`]: Search results with lazily produced version lists
//! - [`record`]: Raw version records
//! - [`resolver`]: Filtering, ordering and deduplication of records
//! - [`semver`]: Version parsing and precedence

pub mod catalog;
pub mod error;
pub mod feed;
pub mod feeds;
pub mod filter;
pub mod metadata;
pub mod record;
pub mod resolver;
pub mod semver;
