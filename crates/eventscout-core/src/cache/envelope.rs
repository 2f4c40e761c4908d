use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{GroundingMetadata, TechEvent};

/// Bumped whenever the persisted envelope layout changes.
/// Envelopes written with another version are ignored.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Everything one successful feed fetch produced. Replaced as a whole, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope {
    pub events: Vec<TechEvent>,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// A cached envelope and the time it was fetched.
///
/// `fetched_at` is stored separately from the envelope and may be missing
/// or unreadable on its own, in which case the feed is never fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedFeed {
    pub envelope: CacheEnvelope,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CachedFeed {
    pub fn with_fetched_at(envelope: CacheEnvelope, at: DateTime<Utc>) -> Self {
        Self {
            envelope,
            fetched_at: Some(at),
        }
    }

    /// Fresh while strictly younger than `max_age`; exactly `max_age` old is stale.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.fetched_at {
            Some(t) => now - t < max_age,
            None => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
