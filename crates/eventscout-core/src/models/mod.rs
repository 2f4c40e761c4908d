//! Data models for eventscout entities.
//!
//! This module contains the data structures shared by the extraction
//! grammar, the feed cache and the query builders:
//!
//! - `TechEvent`: one extracted event card
//! - `EventFilter`, `CostFilter`: client-side feed filtering
//! - `GroundingMetadata`: web/maps sources attached to a model reply
//! - `ChatTurn`, `ChatRole`: role-tagged conversation history

pub mod chat;
pub mod event;
pub mod grounding;

pub use chat::{ChatRole, ChatTurn, TextPart};
pub use event::{CostFilter, EventFilter, TechEvent};
pub use grounding::{
    GroundingChunk, GroundingMetadata, GroundingSource, MapsSource, PlaceAnswerSource,
    ReviewSnippet, SourceKind, WebSource,
};
