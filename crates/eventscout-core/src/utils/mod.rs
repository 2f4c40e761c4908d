//! Utility functions for string formatting.

pub mod format;

pub use format::{format_age_minutes, truncate_string, wrap_text};
