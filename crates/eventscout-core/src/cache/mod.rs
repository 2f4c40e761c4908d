//! Local caching of the event feed.
//!
//! This module provides the `FeedStore` trait the feed controller reads
//! and writes through, with two implementations:
//! - `FileFeedStore`: JSON envelope plus a timestamp file in the cache dir
//! - `MemoryFeedStore`: process-local, for tests and `--no-cache` runs
//!
//! A feed is considered fresh for 24 hours after the last successful fetch.
//! Unreadable or outdated cache files are treated as missing.

pub mod envelope;
pub mod store;

pub use envelope::{CacheEnvelope, CachedFeed, CACHE_SCHEMA_VERSION};
pub use store::{FeedStore, FileFeedStore, MemoryFeedStore};
