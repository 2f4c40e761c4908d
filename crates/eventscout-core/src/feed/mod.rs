//! The event feed: cache-first loading with tiered fallback.
//!
//! `FeedController::load` decides between, in order:
//! 1. a fresh cached feed (no network),
//! 2. a new fetch through the proxy, which replaces the cache,
//! 3. the cached feed of any age plus an advisory, when the fetch fails,
//! 4. a blocking `FeedError` when the fetch fails and nothing is cached.

pub mod controller;

pub use controller::{FailureKind, FeedController, FeedError, FeedSnapshot, FeedSource};
