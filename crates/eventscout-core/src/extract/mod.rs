//! Extraction of event records from free-text model replies.
//!
//! The event-search prompt asks the model to answer in a small delimited
//! format:
//!
//! ```text
//! EVENT_START
//! Title: Rust Delhi Meetup
//! Date: 14 March 2026
//! Location: 91springboard, Okhla
//! Description: Monthly meetup
//! Source: meetup.com/rust-delhi
//! Tags: Rust, Systems
//! Cost: Free
//! Certificate: No
//! EVENT_END
//! ```
//!
//! `extract_events_at` turns such a reply into ordered `TechEvent` records.
//! A label is recognised anywhere on its line, so list numbering and
//! markdown emphasis around it do not matter.
//! Blocks without an end marker or without a title are dropped and counted.

pub mod parser;

pub use parser::{
    extract_events_at, normalize_source_url, parse_tags, Extraction, BLOCK_END,
    BLOCK_START,
};
