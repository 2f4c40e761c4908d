use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::event::{
    DEFAULT_COST, DEFAULT_DATE, DEFAULT_DESCRIPTION, DEFAULT_LOCATION, DEFAULT_TAG,
};
use crate::models::TechEvent;

pub const BLOCK_START: &str = "EVENT_START";
pub const BLOCK_END: &str = "EVENT_END";

/// Sources shorter than this are placeholders like "N/A" or "-".
const MIN_SOURCE_LEN: usize = 5;

/// Tag the model keeps attaching to everything; it carries no signal.
const RESERVED_TAG: &str = "big tech";

/// Result of one extraction pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Records in source order
    pub events: Vec<TechEvent>,
    /// Blocks discarded for a missing end marker or missing title
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Title,
    Date,
    Location,
    Description,
    Source,
    Tags,
    Cost,
    Certificate,
}

impl Label {
    const ALL: [Label; 8] = [
        Label::Title,
        Label::Date,
        Label::Location,
        Label::Description,
        Label::Source,
        Label::Tags,
        Label::Cost,
        Label::Certificate,
    ];

    fn marker(self) -> &'static str {
        match self {
            Label::Title => "Title:",
            Label::Date => "Date:",
            Label::Location => "Location:",
            Label::Description => "Description:",
            Label::Source => "Source:",
            Label::Tags => "Tags:",
            Label::Cost => "Cost:",
            Label::Certificate => "Certificate:",
        }
    }

    /// Value after the first `Label:` anywhere in `line`, so numbering,
    /// headings and emphasis ("1. Title:", "**Title:**") are tolerated.
    /// An empty value counts as absent.
    fn value_in(self, line: &str) -> Option<&str> {
        let marker = self.marker();
        let start = if self == Label::Certificate {
            // Models write "CERTIFICATE:" often enough that this one label ignores case.
            // ASCII lowercasing keeps byte offsets intact.
            line.to_ascii_lowercase()
                .find(&marker.to_ascii_lowercase())?
        } else {
            line.find(marker)?
        };
        let value = strip_emphasis(&line[start + marker.len()..]);
        (!value.is_empty()).then_some(value)
    }
}

/// Trim whitespace and markdown emphasis markers around a value
fn strip_emphasis(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
}

/// Field values of one block, first non-empty occurrence per label.
#[derive(Default)]
struct BlockFields<'a> {
    values: [Option<&'a str>; 8],
}

impl<'a> BlockFields<'a> {
    fn parse(block: &'a str) -> Self {
        let mut fields = Self::default();
        for label in Label::ALL {
            fields.values[label as usize] = block.lines().find_map(|line| label.value_in(line));
        }
        fields
    }

    fn get(&self, label: Label) -> Option<&'a str> {
        self.values[label as usize]
    }

    fn get_or(&self, label: Label, default: &str) -> String {
        self.get(label).unwrap_or(default).to_string()
    }
}

/// Extract events with ids stamped from `issued_at`.
///
/// Output depends only on `text` and `issued_at`.
pub fn extract_events_at(text: &str, issued_at: DateTime<Utc>) -> Extraction {
    let stamp = issued_at.timestamp_millis();
    let mut extraction = Extraction::default();

    for (index, candidate) in text.split(BLOCK_START).enumerate() {
        let Some(end) = candidate.find(BLOCK_END) else {
            // Text before the first start marker is preamble, not a broken block
            if index > 0 {
                extraction.dropped += 1;
            }
            continue;
        };

        match build_event(&candidate[..end], index, stamp) {
            Some(event) => extraction.events.push(event),
            None => extraction.dropped += 1,
        }
    }

    if extraction.dropped > 0 {
        debug!(
            kept = extraction.events.len(),
            dropped = extraction.dropped,
            "Dropped malformed event blocks"
        );
    }
    extraction
}

fn build_event(block: &str, index: usize, stamp: i64) -> Option<TechEvent> {
    let fields = BlockFields::parse(block);
    let title = fields.get(Label::Title)?;

    let has_certificate = fields
        .get(Label::Certificate)
        .map(|c| c.to_lowercase().contains("yes"))
        .unwrap_or(false);

    let tags = match fields.get(Label::Tags) {
        Some(raw) => parse_tags(raw),
        None => vec![DEFAULT_TAG.to_string()],
    };

    Some(TechEvent {
        id: format!("evt-{}-{}", index, stamp),
        title: title.to_string(),
        date: fields.get_or(Label::Date, DEFAULT_DATE),
        location: fields.get_or(Label::Location, DEFAULT_LOCATION),
        description: fields.get_or(Label::Description, DEFAULT_DESCRIPTION),
        source_url: fields.get(Label::Source).and_then(normalize_source_url),
        tags,
        cost: fields.get_or(Label::Cost, DEFAULT_COST),
        has_certificate,
    })
}

/// Split a comma-separated tag line, keeping order and dropping blanks
/// and the reserved "big tech" tag.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case(RESERVED_TAG))
        .map(str::to_string)
        .collect()
}

/// Normalize a source link: placeholders become `None`, bare hosts get `https://`.
///
/// No further URL validation is done.
pub fn normalize_source_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    if url.eq_ignore_ascii_case("none") || url.chars().count() < MIN_SOURCE_LEN {
        return None;
    }
    if url.starts_with("http") {
        Some(url.to_string())
    } else {
        Some(format!("https://{}", url))
    }
}

// ============================================================================
// Tests
// ============================================================================
