use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::envelope::{CacheEnvelope, CachedFeed, CACHE_SCHEMA_VERSION};

/// Serialized envelope file name in the cache directory
const ENVELOPE_FILE: &str = "events.json";

/// Fetch time as epoch milliseconds in decimal text
const TIMESTAMP_FILE: &str = "events.timestamp";

/// Storage for the single cached feed.
///
/// `load` never fails: anything unreadable is reported as no cache.
pub trait FeedStore: Send + Sync {
    fn load(&self) -> Option<CachedFeed>;
    fn save(&self, feed: &CachedFeed) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedEnvelope {
    schema_version: u32,
    #[serde(flatten)]
    envelope: CacheEnvelope,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedEnvelopeRef<'a> {
    schema_version: u32,
    #[serde(flatten)]
    envelope: &'a CacheEnvelope,
}

// ============================================================================
// File-backed store
// ============================================================================

pub struct FileFeedStore {
    cache_dir: PathBuf,
}

impl FileFeedStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn envelope_path(&self) -> PathBuf {
        self.cache_dir.join(ENVELOPE_FILE)
    }

    fn timestamp_path(&self) -> PathBuf {
        self.cache_dir.join(TIMESTAMP_FILE)
    }

    fn try_load(&self) -> Result<Option<CachedFeed>> {
        let path = self.envelope_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents =
            std::fs::read_to_string(&path).context("Failed to read feed cache file")?;
        let persisted: PersistedEnvelope =
            serde_json::from_str(&contents).context("Failed to parse feed cache file")?;

        if persisted.schema_version != CACHE_SCHEMA_VERSION {
            debug!(
                found = persisted.schema_version,
                expected = CACHE_SCHEMA_VERSION,
                "Ignoring feed cache with other schema version"
            );
            return Ok(None);
        }

        Ok(Some(CachedFeed {
            envelope: persisted.envelope,
            fetched_at: self.load_timestamp(),
        }))
    }

    fn load_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = std::fs::read_to_string(self.timestamp_path()).ok()?;
        let millis = raw.trim().parse::<i64>().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    /// Write via a temp file and rename so readers never see a half-written file
    fn write_atomic(path: &Path, contents: &str) -> Result<()> {
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

impl FeedStore for FileFeedStore {
    fn load(&self) -> Option<CachedFeed> {
        match self.try_load() {
            Ok(feed) => feed,
            Err(e) => {
                debug!(error = %e, "Feed cache unreadable, treating as empty");
                None
            }
        }
    }

    fn save(&self, feed: &CachedFeed) -> Result<()> {
        let contents = serde_json::to_string_pretty(&PersistedEnvelopeRef {
            schema_version: CACHE_SCHEMA_VERSION,
            envelope: &feed.envelope,
        })?;
        // Envelope first: a crash in between leaves the new data with an old
        // timestamp, which only makes it look staler than it is
        Self::write_atomic(&self.envelope_path(), &contents)?;

        let timestamp_path = self.timestamp_path();
        match feed.fetched_at {
            Some(at) => Self::write_atomic(&timestamp_path, &at.timestamp_millis().to_string())?,
            None if timestamp_path.exists() => std::fs::remove_file(&timestamp_path)?,
            None => {}
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        for path in [self.envelope_path(), self.timestamp_path()] {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
pub struct MemoryFeedStore {
    feed: Mutex<Option<CachedFeed>>,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(feed: CachedFeed) -> Self {
        Self {
            feed: Mutex::new(Some(feed)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CachedFeed>> {
        // A panic while holding the lock cannot leave a half-written feed
        self.feed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FeedStore for MemoryFeedStore {
    fn load(&self) -> Option<CachedFeed> {
        self.slot().clone()
    }

    fn save(&self, feed: &CachedFeed) -> Result<()> {
        *self.slot() = Some(feed.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
