//! Request builders for the two auxiliary features.
//!
//! - `venue`: co-working spaces and tech hubs near an optional location,
//!   answered with Google Maps grounding
//! - `chat`: a free-form assistant conversation
//!
//! Both are stateless apart from the conversation history the caller keeps.

pub mod chat;
pub mod venue;

pub use chat::{chat_request, fetch_reply, send_chat, Conversation, CHAT_ERROR_REPLY, CHAT_FALLBACK_REPLY};
pub use venue::{explore_venues, venue_request, VenueResult, VENUES_UNAVAILABLE};
