use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, Backend, GenerateRequest};
use crate::cache::{CacheEnvelope, CachedFeed, FeedStore};
use crate::config::Config;
use crate::extract::extract_events_at;
use crate::models::{GroundingMetadata, TechEvent};
use crate::prompts;

/// Where the events in a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    FreshCache,
    Network,
    StaleCache,
}

/// Why a fetch failed, as far as the user needs to know.
/// Both kinds recover the same way; only the guidance differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Network,
}

impl FailureKind {
    pub fn classify(error: &ApiError) -> Self {
        if error.is_rate_limited() {
            FailureKind::RateLimited
        } else {
            FailureKind::Network
        }
    }

    /// Banner shown above stale events
    pub fn advisory_message(&self) -> &'static str {
        match self {
            FailureKind::RateLimited => "Traffic is high (Rate Limit). Showing saved events.",
            FailureKind::Network => "Network issue. Showing saved events.",
        }
    }

    /// Error shown when there is nothing to fall back to
    pub fn blocking_message(&self) -> &'static str {
        match self {
            FailureKind::RateLimited => {
                "Server is busy (Rate Limit). Please try again in a minute."
            }
            FailureKind::Network => "Failed to load events. Please check your connection.",
        }
    }
}

/// No events could be shown at all
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("{}", .kind.blocking_message())]
    Unavailable {
        kind: FailureKind,
        #[source]
        source: ApiError,
    },
}

impl FeedError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FeedError::Unavailable { kind, .. } => *kind,
        }
    }
}

/// Events ready for display, with provenance
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub events: Vec<TechEvent>,
    pub raw_text: String,
    pub grounding_metadata: Option<GroundingMetadata>,
    pub source: FeedSource,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Set when stale events are shown because a refresh failed
    pub advisory: Option<FailureKind>,
    /// Malformed blocks skipped while extracting (network fetches only)
    pub dropped_blocks: usize,
}

impl FeedSnapshot {
    fn from_cache(feed: CachedFeed, source: FeedSource, advisory: Option<FailureKind>) -> Self {
        Self {
            events: feed.envelope.events,
            raw_text: feed.envelope.raw_text,
            grounding_metadata: feed.envelope.grounding_metadata,
            source,
            fetched_at: feed.fetched_at,
            advisory,
            dropped_blocks: 0,
        }
    }

    pub fn advisory_message(&self) -> Option<&'static str> {
        self.advisory.map(|k| k.advisory_message())
    }
}

/// Cache-first loader for the event feed.
pub struct FeedController<B, S> {
    backend: B,
    store: S,
    model: String,
    city: String,
    freshness: Duration,
}

impl<B: Backend, S: FeedStore> FeedController<B, S> {
    pub fn new(backend: B, store: S, config: &Config) -> Self {
        Self {
            backend,
            store,
            model: config.text_model.clone(),
            city: config.city.clone(),
            freshness: config.freshness(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The request issued on a cache miss or forced refresh
    pub fn search_request(&self) -> GenerateRequest {
        GenerateRequest::grounded_search(self.model.clone(), prompts::event_search(&self.city))
    }

    pub async fn load(&self, force_refresh: bool) -> Result<FeedSnapshot, FeedError> {
        self.load_at(force_refresh, Utc::now()).await
    }

    /// Same as `load`, with an explicit clock for freshness checks and id stamps.
    pub async fn load_at(
        &self,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<FeedSnapshot, FeedError> {
        let cached = self.store.load();

        if !force_refresh {
            if let Some(feed) = cached.as_ref().filter(|f| f.is_fresh_at(now, self.freshness)) {
                debug!(events = feed.envelope.events.len(), "Serving fresh feed cache");
                return Ok(FeedSnapshot::from_cache(
                    feed.clone(),
                    FeedSource::FreshCache,
                    None,
                ));
            }
        }

        info!(force_refresh, city = %self.city, "Fetching events from proxy");
        match self.fetch(now).await {
            Ok((envelope, dropped_blocks)) => {
                let feed = CachedFeed::with_fetched_at(envelope, now);
                if let Err(e) = self.store.save(&feed) {
                    warn!(error = %e, "Failed to cache feed");
                }
                Ok(FeedSnapshot {
                    dropped_blocks,
                    ..FeedSnapshot::from_cache(feed, FeedSource::Network, None)
                })
            }
            Err(e) => {
                let kind = FailureKind::classify(&e);
                match cached {
                    Some(feed) => {
                        warn!(error = %e, ?kind, "Feed fetch failed, serving stale cache");
                        Ok(FeedSnapshot::from_cache(feed, FeedSource::StaleCache, Some(kind)))
                    }
                    None => {
                        error!(error = %e, ?kind, "Feed fetch failed with no cache");
                        Err(FeedError::Unavailable { kind, source: e })
                    }
                }
            }
        }
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<(CacheEnvelope, usize), ApiError> {
        let response = self.backend.generate(&self.search_request()).await?;
        let raw_text = response.text().unwrap_or_default().to_string();
        let extraction = extract_events_at(&raw_text, now);

        info!(
            count = extraction.events.len(),
            dropped = extraction.dropped,
            "Events extracted"
        );

        Ok((
            CacheEnvelope {
                events: extraction.events,
                raw_text,
                grounding_metadata: response.grounding_metadata().cloned(),
            },
            extraction.dropped,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
