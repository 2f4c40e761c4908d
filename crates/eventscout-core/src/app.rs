//! Application state for an eventscout front-end.
//!
//! `App` owns the feed controller, the details memo and the chat
//! transcript, runs every request as a background task in its feature
//! slot, and folds finished results back into plain state fields a
//! renderer can read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::api::{ApiError, Backend, LatLng};
use crate::cache::FeedStore;
use crate::config::Config;
use crate::details::{fetch_details, DetailsCache};
use crate::feed::{FailureKind, FeedController, FeedError, FeedSnapshot, FeedSource};
use crate::models::{ChatRole, ChatTurn, EventFilter, GroundingMetadata, TechEvent};
use crate::prompts;
use crate::queries::chat::{fetch_reply, reply_or_error};
use crate::queries::{explore_venues, Conversation, VenueResult, VENUES_UNAVAILABLE};
use crate::slots::{RequestSlots, Slot};

/// Result of a background request, tagged by feature
pub enum Outcome {
    Feed(Result<FeedSnapshot, FeedError>),
    Details {
        event_id: String,
        result: Result<String, ApiError>,
    },
    Venues(Result<VenueResult, ApiError>),
    Chat(Result<String, ApiError>),
}

pub struct App<B, S> {
    pub config: Config,
    backend: Arc<B>,
    feed: Arc<FeedController<Arc<B>, S>>,
    details: DetailsCache,
    conversation: Conversation,
    slots: RequestSlots<Outcome>,

    // Feed state
    pub events: Vec<TechEvent>,
    pub raw_text: String,
    pub grounding_metadata: Option<GroundingMetadata>,
    pub feed_source: Option<FeedSource>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Non-fatal banner over stale events; cleared by the next successful load
    pub advisory: Option<FailureKind>,
    /// Blocking error; no events are shown while set
    pub feed_error: Option<FailureKind>,
    pub filter: EventFilter,

    // Details modal
    pub selected_event: Option<String>,
    pub details_text: Option<String>,
    /// Event whose details request occupies the details slot
    loading_details: Option<String>,

    // Venue explorer
    pub venues: Option<VenueResult>,
    pub venue_error: Option<String>,
}

impl<B, S> App<B, S>
where
    B: Backend + 'static,
    S: FeedStore + 'static,
{
    pub fn new(config: Config, backend: B, store: S) -> Self {
        let backend = Arc::new(backend);
        let feed = Arc::new(FeedController::new(Arc::clone(&backend), store, &config));
        let conversation = Conversation::with_greeting(prompts::chat_greeting(&config.city));

        Self {
            config,
            backend,
            feed,
            details: DetailsCache::new(),
            conversation,
            slots: RequestSlots::new(),
            events: Vec::new(),
            raw_text: String::new(),
            grounding_metadata: None,
            feed_source: None,
            fetched_at: None,
            advisory: None,
            feed_error: None,
            filter: EventFilter::default(),
            selected_event: None,
            details_text: None,
            loading_details: None,
            venues: None,
            venue_error: None,
        }
    }

    pub fn store(&self) -> &S {
        self.feed.store()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_loading(&self, slot: Slot) -> bool {
        self.slots.is_pending(slot)
    }

    /// Events passing the current filter, in feed order
    pub fn visible_events(&self) -> Vec<&TechEvent> {
        self.filter.apply(&self.events)
    }

    pub fn find_event(&self, event_id: &str) -> Option<&TechEvent> {
        self.events.iter().find(|e| e.id == event_id)
    }

    pub fn advisory_message(&self) -> Option<&'static str> {
        self.advisory.map(|k| k.advisory_message())
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.feed_error.map(|k| k.blocking_message())
    }

    // ===== Requests =====

    pub fn request_feed(&mut self, force_refresh: bool) {
        let feed = Arc::clone(&self.feed);
        self.slots.spawn(Slot::Feed, async move {
            Outcome::Feed(feed.load(force_refresh).await)
        });
    }

    /// Select an event and show its details, fetching them if not memoized.
    /// Returns false if the id is not in the current feed.
    pub fn open_details(&mut self, event_id: &str) -> bool {
        let Some(event) = self.find_event(event_id).cloned() else {
            return false;
        };
        self.selected_event = Some(event.id.clone());

        if self.loading_details.as_deref() == Some(event.id.as_str()) {
            self.details_text = None;
            return true;
        }
        self.abandon_details();

        if let Some(text) = self.details.cached(&event.id) {
            self.details_text = Some(text.to_string());
            return true;
        }

        self.details_text = None;
        self.details.begin(&event.id);
        self.loading_details = Some(event.id.clone());
        let backend = Arc::clone(&self.backend);
        let model = self.config.text_model.clone();
        self.slots.spawn(Slot::Details, async move {
            let result = fetch_details(backend.as_ref(), &model, &event).await;
            Outcome::Details {
                event_id: event.id,
                result,
            }
        });
        true
    }

    /// Cancel the in-flight details request, if any, so its event is not left loading
    fn abandon_details(&mut self) {
        if let Some(previous) = self.loading_details.take() {
            debug!(event_id = %previous, "Abandoning details request");
            self.slots.cancel(Slot::Details);
            self.details.abandon(&previous);
        }
    }

    pub fn close_details(&mut self) {
        self.selected_event = None;
        self.details_text = None;
    }

    pub fn request_venues(&mut self, location: Option<LatLng>) {
        let backend = Arc::clone(&self.backend);
        let model = self.config.venue_model.clone();
        self.slots.spawn(Slot::Venues, async move {
            Outcome::Venues(explore_venues(backend.as_ref(), &model, location).await)
        });
    }

    /// Show the user turn right away and request a reply with the history before it.
    pub fn send_chat(&mut self, message: &str) {
        let history: Vec<ChatTurn> = self.conversation.turns().to_vec();
        self.conversation.push(ChatRole::User, message);

        let backend = Arc::clone(&self.backend);
        let model = self.config.text_model.clone();
        let message = message.to_string();
        self.slots.spawn(Slot::Chat, async move {
            Outcome::Chat(fetch_reply(backend.as_ref(), &model, &history, &message).await)
        });
    }

    // ===== Results =====

    /// Apply whatever has finished, without waiting
    pub fn poll(&mut self) -> Vec<Slot> {
        let finished = self.slots.try_collect();
        finished
            .into_iter()
            .map(|(slot, outcome)| {
                self.apply(outcome);
                slot
            })
            .collect()
    }

    /// Wait for every pending request and apply the results
    pub async fn settle(&mut self) {
        while let Some((_, outcome)) = self.slots.next().await {
            self.apply(outcome);
        }
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Feed(Ok(snapshot)) => {
                info!(count = snapshot.events.len(), source = ?snapshot.source, "Feed loaded");
                self.events = snapshot.events;
                self.raw_text = snapshot.raw_text;
                self.grounding_metadata = snapshot.grounding_metadata;
                self.feed_source = Some(snapshot.source);
                self.fetched_at = snapshot.fetched_at;
                self.advisory = snapshot.advisory;
                self.feed_error = None;
            }
            Outcome::Feed(Err(e)) => {
                self.events.clear();
                self.raw_text.clear();
                self.grounding_metadata = None;
                self.feed_source = None;
                self.fetched_at = None;
                self.advisory = None;
                self.feed_error = Some(e.kind());
            }
            Outcome::Details { event_id, result } => {
                self.loading_details = None;
                let text = self.details.complete(&event_id, result);
                if self.selected_event.as_deref() == Some(event_id.as_str()) {
                    self.details_text = Some(text);
                } else {
                    debug!(event_id = %event_id, "Details arrived for a closed event");
                }
            }
            Outcome::Venues(Ok(result)) => {
                self.venues = Some(result);
                self.venue_error = None;
            }
            Outcome::Venues(Err(e)) => {
                debug!(error = %e, "Venue exploration failed");
                self.venues = None;
                self.venue_error = Some(VENUES_UNAVAILABLE.to_string());
            }
            Outcome::Chat(result) => {
                self.conversation.push(ChatRole::Model, reply_or_error(result));
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEnvelope, CachedFeed, MemoryFeedStore};
    use crate::details::DETAILS_UNAVAILABLE;
    use crate::models::CostFilter;
    use crate::queries::CHAT_ERROR_REPLY;
    use crate::testing::ScriptedBackend;

    const FEED_REPLY: &str = "EVENT_START\nTitle: HackDelhi\nCost: Free\nCertificate: Yes\nEVENT_END\n\
        EVENT_START\nTitle: CloudConf\nCost: Paid\nEVENT_END\n";

    fn app(backend: ScriptedBackend, store: MemoryFeedStore) -> App<ScriptedBackend, MemoryFeedStore> {
        App::new(Config::default(), backend, store)
    }

    #[tokio::test]
    async fn test_feed_load_populates_state() {
        let mut app = app(ScriptedBackend::new().reply_text(FEED_REPLY), MemoryFeedStore::new());
        app.request_feed(false);
        assert!(app.is_loading(Slot::Feed));
        app.settle().await;

        assert!(!app.is_loading(Slot::Feed));
        assert_eq!(app.events.len(), 2);
        assert_eq!(app.feed_source, Some(FeedSource::Network));
        assert_eq!(app.error_message(), None);
        assert!(app.store().load().is_some());
    }

    #[tokio::test]
    async fn test_filter_narrows_visible_events() {
        let mut app = app(ScriptedBackend::new().reply_text(FEED_REPLY), MemoryFeedStore::new());
        app.request_feed(false);
        app.settle().await;

        app.filter.cost = CostFilter::Paid;
        let visible: Vec<_> = app.visible_events().iter().map(|e| e.title.clone()).collect();
        assert_eq!(visible, vec!["CloudConf".to_string()]);

        app.filter = EventFilter { cost: CostFilter::All, certificate_only: true };
        assert_eq!(app.visible_events()[0].title, "HackDelhi");
    }

    #[tokio::test]
    async fn test_blocking_error_clears_events() {
        let backend = ScriptedBackend::new().fail(ApiError::RateLimited("busy".to_string()));
        let mut app = app(backend, MemoryFeedStore::new());
        app.request_feed(true);
        app.settle().await;

        assert!(app.events.is_empty());
        assert_eq!(app.feed_error, Some(FailureKind::RateLimited));
        assert_eq!(
            app.error_message(),
            Some("Server is busy (Rate Limit). Please try again in a minute.")
        );
    }

    #[tokio::test]
    async fn test_advisory_cleared_by_successful_refresh() {
        let stale = CachedFeed::with_fetched_at(
            CacheEnvelope { events: vec![], raw_text: String::new(), grounding_metadata: None },
            Utc::now() - chrono::Duration::days(2),
        );
        let backend = ScriptedBackend::new()
            .fail(ApiError::ServerError("offline".to_string()))
            .reply_text(FEED_REPLY);
        let mut app = app(backend, MemoryFeedStore::with_feed(stale));

        app.request_feed(false);
        app.settle().await;
        assert_eq!(app.advisory_message(), Some("Network issue. Showing saved events."));

        app.request_feed(true);
        app.settle().await;
        assert_eq!(app.advisory, None);
        assert_eq!(app.events.len(), 2);
    }

    #[tokio::test]
    async fn test_details_fetched_once_then_memoized() {
        let backend = ScriptedBackend::new()
            .reply_text(FEED_REPLY)
            .reply_text("## HackDelhi\nRegister on Devfolio.");
        let mut app = app(backend, MemoryFeedStore::new());
        app.request_feed(false);
        app.settle().await;
        let id = app.events[0].id.clone();

        assert!(app.open_details(&id));
        assert!(app.is_loading(Slot::Details));
        app.settle().await;
        assert_eq!(app.details_text.as_deref(), Some("## HackDelhi\nRegister on Devfolio."));

        app.close_details();
        assert!(app.open_details(&id));
        assert!(!app.is_loading(Slot::Details));
        assert_eq!(app.details_text.as_deref(), Some("## HackDelhi\nRegister on Devfolio."));
        assert_eq!(app.backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_switching_events_abandons_pending_details() {
        let backend = ScriptedBackend::new()
            .reply_text(FEED_REPLY)
            .reply_text("CloudConf guide");
        let mut app = app(backend, MemoryFeedStore::new());
        app.request_feed(false);
        app.settle().await;
        let first = app.events[0].id.clone();
        let second = app.events[1].id.clone();

        app.open_details(&first);
        assert!(app.details.is_loading(&first));
        app.open_details(&second);

        assert!(!app.details.is_loading(&first));
        assert!(app.details.state(&first).is_none());
        app.settle().await;
        assert_eq!(app.selected_event.as_deref(), Some(second.as_str()));
        assert_eq!(app.details_text.as_deref(), Some("CloudConf guide"));
        assert!(!app.details.is_loading(&second));
    }

    #[tokio::test]
    async fn test_details_failure_shows_fallback() {
        let backend = ScriptedBackend::new()
            .reply_text(FEED_REPLY)
            .fail(ApiError::ServerError("boom".to_string()));
        let mut app = app(backend, MemoryFeedStore::new());
        app.request_feed(false);
        app.settle().await;

        let id = app.events[1].id.clone();
        app.open_details(&id);
        app.settle().await;
        assert_eq!(app.details_text.as_deref(), Some(DETAILS_UNAVAILABLE));
        assert!(!app.open_details("evt-unknown"));
    }

    #[tokio::test]
    async fn test_venue_failure_sets_message() {
        let backend = ScriptedBackend::new().fail(ApiError::ServerError("maps down".to_string()));
        let mut app = app(backend, MemoryFeedStore::new());
        app.request_venues(None);
        app.settle().await;
        assert_eq!(app.venue_error.as_deref(), Some(VENUES_UNAVAILABLE));
        assert!(app.venues.is_none());
    }

    #[tokio::test]
    async fn test_chat_turns_are_recorded() {
        let backend = ScriptedBackend::new()
            .reply_text("Try HackDelhi.")
            .fail(ApiError::ServerError("down".to_string()));
        let mut app = app(backend, MemoryFeedStore::new());

        app.send_chat("Any hackathons?");
        // User turn is visible before the reply lands
        assert_eq!(app.conversation().turns().len(), 2);
        app.settle().await;
        app.send_chat("Thanks!");
        app.settle().await;

        let turns = app.conversation().turns();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[2].text(), "Try HackDelhi.");
        assert_eq!(turns[4].text(), CHAT_ERROR_REPLY);

        // First request carried only the greeting plus the new message
        match &app.backend.requests()[0].contents {
            crate::api::Contents::Turns(sent) => {
                assert_eq!(sent.len(), 2);
                assert_eq!(sent[0].role, ChatRole::Model);
                assert_eq!(sent[1], ChatTurn::user("Any hackathons?"));
            }
            other => panic!("expected turns, got {:?}", other),
        }
    }
}
