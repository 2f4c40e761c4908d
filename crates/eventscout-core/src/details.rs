//! On-demand event details, memoized per event id for the session.
//!
//! Expanding an event asks the model for a Markdown guide seeded with the
//! event's title and description. Successful replies are kept in memory
//! keyed by event id; failures produce a fixed message and are not cached,
//! so the next expansion tries again.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::api::{ApiError, Backend, GenerateRequest};
use crate::models::TechEvent;
use crate::prompts;

/// Shown when the enrichment request fails
pub const DETAILS_UNAVAILABLE: &str = "Could not retrieve details.";

/// Shown when the model answers with no text
pub const NO_DETAILS_FOUND: &str = "No details found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    Ready(String),
}

pub fn details_request(model: &str, event: &TechEvent) -> GenerateRequest {
    GenerateRequest::grounded_search(
        model,
        prompts::event_details(&event.title, &event.description),
    )
}

/// Issue one enrichment request. An empty reply becomes `NO_DETAILS_FOUND`.
pub async fn fetch_details<B: Backend + ?Sized>(
    backend: &B,
    model: &str,
    event: &TechEvent,
) -> Result<String, ApiError> {
    let response = backend.generate(&details_request(model, event)).await?;
    Ok(response.text().unwrap_or(NO_DETAILS_FOUND).to_string())
}

/// Session-lifetime details memo keyed by event id.
///
/// Ids change on every feed fetch, so entries for a previous fetch simply
/// stop being looked up.
#[derive(Debug, Default)]
pub struct DetailsCache {
    entries: HashMap<String, DetailState>,
}

impl DetailsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, event_id: &str) -> Option<&DetailState> {
        self.entries.get(event_id)
    }

    pub fn cached(&self, event_id: &str) -> Option<&str> {
        match self.entries.get(event_id) {
            Some(DetailState::Ready(text)) => Some(text),
            _ => None,
        }
    }

    pub fn is_loading(&self, event_id: &str) -> bool {
        matches!(self.entries.get(event_id), Some(DetailState::Loading))
    }

    /// Mark an event as loading unless its details are already cached.
    /// Returns false when nothing needs fetching.
    pub fn begin(&mut self, event_id: &str) -> bool {
        if self.cached(event_id).is_some() {
            return false;
        }
        self.entries
            .insert(event_id.to_string(), DetailState::Loading);
        true
    }

    /// Record the outcome of a fetch started with `begin` and return the text to show.
    pub fn complete(&mut self, event_id: &str, result: Result<String, ApiError>) -> String {
        match result {
            Ok(text) => {
                self.entries
                    .insert(event_id.to_string(), DetailState::Ready(text.clone()));
                text
            }
            Err(e) => {
                warn!(event_id, error = %e, "Event details fetch failed");
                self.entries.remove(event_id);
                DETAILS_UNAVAILABLE.to_string()
            }
        }
    }

    /// Cached details, or fetch, store and return them.
    pub async fn get_details<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        model: &str,
        event: &TechEvent,
    ) -> String {
        if let Some(text) = self.cached(&event.id) {
            debug!(event_id = %event.id, "Details served from memory");
            return text.to_string();
        }
        self.begin(&event.id);
        let result = fetch_details(backend, model, event).await;
        self.complete(&event.id, result)
    }

    /// Forget a fetch that will never complete. Ready entries are kept.
    pub fn abandon(&mut self, event_id: &str) {
        if self.is_loading(event_id) {
            self.entries.remove(event_id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|s| matches!(s, DetailState::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Contents, GenerateResponse};
    use crate::testing::ScriptedBackend;

    const MODEL: &str = "gemini-2.0-flash";

    fn event(id: &str) -> TechEvent {
        TechEvent {
            id: id.to_string(),
            title: "DevFest Delhi".to_string(),
            date: "Nov 2".to_string(),
            location: "IIT Delhi".to_string(),
            description: "Community-run Google developer festival".to_string(),
            source_url: None,
            tags: vec![],
            cost: "Free".to_string(),
            has_certificate: false,
        }
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_memory() {
        let backend = ScriptedBackend::new().reply_text("## Overview\nA festival.");
        let mut cache = DetailsCache::new();

        let first = cache.get_details(&backend, MODEL, &event("evt-1-1")).await;
        let second = cache.get_details(&backend, MODEL, &event("evt-1-1")).await;

        assert_eq!(first, "## Overview\nA festival.");
        assert_eq!(second, first);
        assert_eq!(backend.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_request_is_seeded_with_title_and_description() {
        let backend = ScriptedBackend::new().reply_text("ok");
        let mut cache = DetailsCache::new();
        cache.get_details(&backend, MODEL, &event("evt-1-1")).await;

        let request = &backend.requests()[0];
        match &request.contents {
            Contents::Prompt(p) => {
                assert!(p.contains("DevFest Delhi"));
                assert!(p.contains("Community-run Google developer festival"));
            }
            other => panic!("unexpected contents {:?}", other),
        }
        assert!(request.config.is_some());
    }

    #[tokio::test]
    async fn test_failure_yields_fallback_and_is_not_cached() {
        let backend = ScriptedBackend::new()
            .fail(ApiError::ServerError("boom".to_string()))
            .reply_text("Second try worked");
        let mut cache = DetailsCache::new();

        let first = cache.get_details(&backend, MODEL, &event("evt-2-1")).await;
        assert_eq!(first, DETAILS_UNAVAILABLE);
        assert!(cache.state("evt-2-1").is_none());

        let second = cache.get_details(&backend, MODEL, &event("evt-2-1")).await;
        assert_eq!(second, "Second try worked");
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_reply_is_no_details_found() {
        let backend = ScriptedBackend::new().reply(GenerateResponse::default());
        let mut cache = DetailsCache::new();
        let text = cache.get_details(&backend, MODEL, &event("evt-3-1")).await;
        assert_eq!(text, NO_DETAILS_FOUND);
    }

    #[test]
    fn test_begin_and_complete_states() {
        let mut cache = DetailsCache::new();
        assert!(cache.begin("evt-1-1"));
        assert!(cache.is_loading("evt-1-1"));
        assert!(cache.is_empty());

        cache.complete("evt-1-1", Ok("text".to_string()));
        assert_eq!(cache.state("evt-1-1"), Some(&DetailState::Ready("text".to_string())));
        assert!(!cache.begin("evt-1-1"));
    }

    #[test]
    fn test_abandon_only_clears_loading() {
        let mut cache = DetailsCache::new();
        cache.begin("evt-1-1");
        cache.abandon("evt-1-1");
        assert!(cache.state("evt-1-1").is_none());

        cache.begin("evt-2-1");
        cache.complete("evt-2-1", Ok("kept".to_string()));
        cache.abandon("evt-2-1");
        assert_eq!(cache.cached("evt-2-1"), Some("kept"));
    }

    #[tokio::test]
    async fn test_ids_from_a_new_fetch_miss_the_cache() {
        let backend = ScriptedBackend::new().reply_text("first").reply_text("second");
        let mut cache = DetailsCache::new();
        cache.get_details(&backend, MODEL, &event("evt-1-100")).await;
        let refetched = cache.get_details(&backend, MODEL, &event("evt-1-200")).await;
        assert_eq!(refetched, "second");
        assert_eq!(backend.calls(), 2);
    }
}
