//! Plain-text rendering for the terminal.

use chrono::{DateTime, Utc};

use eventscout_core::api::Backend;
use eventscout_core::cache::FeedStore;
use eventscout_core::feed::FeedSource;
use eventscout_core::models::{GroundingSource, SourceKind, TechEvent};
use eventscout_core::utils::{format_age_minutes, truncate_string, wrap_text};
use eventscout_core::App;

/// Width used for wrapped descriptions and replies
const TEXT_WIDTH: usize = 76;

/// Longest title shown on a card before truncation
const TITLE_MAX_LEN: usize = 60;

const INDENT: &str = "    ";

pub fn print_feed<B: Backend + 'static, S: FeedStore + 'static>(app: &App<B, S>) {
    if let Some(message) = app.error_message() {
        eprintln!("{}", message);
        return;
    }
    if let Some(advisory) = app.advisory_message() {
        eprintln!("! {}", advisory);
    }
    if let Some(status) = status_line(app.feed_source, app.fetched_at, Utc::now()) {
        println!("{}\n", status);
    }

    let visible = app.visible_events();
    if visible.is_empty() {
        println!("No events match the current filters.");
        return;
    }
    for event in visible {
        // Numbering follows the unfiltered feed so `details <n>` stays stable
        let position = app
            .events
            .iter()
            .position(|e| e.id == event.id)
            .map_or(0, |i| i + 1);
        println!("{}\n", event_card(position, event));
    }
}

pub fn print_details<B: Backend + 'static, S: FeedStore + 'static>(app: &App<B, S>) {
    let Some(event) = app.selected_event.as_deref().and_then(|id| app.find_event(id)) else {
        return;
    };
    println!("{}\n", event.title);
    match app.details_text.as_deref() {
        Some(text) => println!("{}", text),
        None => println!("Loading details..."),
    }
    if let Some(url) = &event.source_url {
        println!("\nSource: {}", url);
    }
}

pub fn print_sources<B: Backend + 'static, S: FeedStore + 'static>(app: &App<B, S>) {
    let sources = app
        .grounding_metadata
        .as_ref()
        .map(|m| m.sources())
        .unwrap_or_default();
    if sources.is_empty() {
        println!("No sources for the current feed.");
        return;
    }
    for source in &sources {
        println!("{}", source_line(source));
    }
}

pub fn print_venues<B: Backend + 'static, S: FeedStore + 'static>(app: &App<B, S>) {
    if let Some(message) = &app.venue_error {
        eprintln!("{}", message);
        return;
    }
    let Some(result) = &app.venues else {
        return;
    };
    println!("{}", result.text.trim());

    let places = result.places();
    if !places.is_empty() {
        println!("\nOn the map:");
        for place in &places {
            println!("{}", source_line(place));
            for snippet in &place.snippets {
                for line in wrap_text(snippet, TEXT_WIDTH - 6) {
                    println!("{}  \"{}\"", INDENT, line);
                }
            }
        }
    }
}

pub fn print_reply(text: &str) {
    println!("\n{}\n", text.trim_end());
}

/// "Live results" or "Cached 3h ago", depending on where the feed came from
fn status_line(
    source: Option<FeedSource>,
    fetched_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<String> {
    let age = fetched_at
        .map(|t| format_age_minutes((now - t).num_minutes()))
        .unwrap_or_else(|| "unknown".to_string());
    match source? {
        FeedSource::Network => Some("Live results".to_string()),
        FeedSource::FreshCache | FeedSource::StaleCache => Some(format!("Cached {}", age)),
    }
}

fn event_card(position: usize, event: &TechEvent) -> String {
    let mut lines = vec![format!(
        "{:>2}. {}",
        position,
        truncate_string(&event.title, TITLE_MAX_LEN)
    )];

    let mut meta = format!("{}{} | {} | {}", INDENT, event.date, event.location, event.cost);
    if event.has_certificate {
        meta.push_str(" | Certificate");
    }
    lines.push(meta);

    for line in wrap_text(&event.description, TEXT_WIDTH - INDENT.len()) {
        lines.push(format!("{}{}", INDENT, line));
    }
    if !event.tags.is_empty() {
        lines.push(format!("{}[{}]", INDENT, event.tags_display()));
    }
    if let Some(url) = &event.source_url {
        lines.push(format!("{}{}", INDENT, url));
    }
    lines.join("\n")
}

fn source_line(source: &GroundingSource) -> String {
    let marker = match source.kind {
        SourceKind::Web => "web",
        SourceKind::Place => "map",
    };
    let title = if source.title.is_empty() {
        &source.uri
    } else {
        &source.title
    };
    format!("  [{}] {} <{}>", marker, title, source.uri)
}
