//! eventscout core - a cache-first tech-events feed built on a generative
//! language model with web and maps grounding.
//!
//! The model is asked for events in a delimited plain-text format, which
//! `extract` turns into `TechEvent` records. `feed` decides between the
//! local cache and the network, `details` memoizes per-event enrichment,
//! and `queries` builds the venue and chat requests. `app` ties these
//! together for a front-end.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod details;
pub mod extract;
pub mod feed;
pub mod models;
pub mod prompts;
pub mod queries;
pub mod slots;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use app::App;
pub use config::Config;
