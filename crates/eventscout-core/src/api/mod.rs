//! Client for the generative-language backend proxy.
//!
//! This module provides the `Backend` trait the feed controller, details
//! cache and query builders talk to, plus `ProxyClient`, the HTTP
//! implementation that POSTs JSON to the serverless proxy.
//!
//! The proxy forwards `{model, contents, config}` to the provider and
//! answers with a normalized candidates envelope, or `{error, message}`
//! with 429 when rate limited.

pub mod client;
pub mod error;
pub mod types;

pub use client::{Backend, ProxyClient};
pub use error::ApiError;
pub use types::{
    Candidate, CandidateContent, Contents, GenerateConfig, GenerateRequest, GenerateResponse,
    LatLng, ResponsePart, RetrievalConfig, Tool, ToolConfig,
};
