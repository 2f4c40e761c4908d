//! Application configuration management.
//!
//! Configuration is stored at `~/.config/eventscout/config.json`. Every
//! field has a default, and a handful of `EVENTSCOUT_*` environment
//! variables override the file (a `.env` file is honoured by the binary).

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "eventscout";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_PROXY_URL: &str = "http://localhost:8888/.netlify/functions/gemini";
const DEFAULT_CITY: &str = "Delhi NCR";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_VENUE_MODEL: &str = "gemini-2.5-flash";

/// A feed fetched less than a day ago is served from cache.
/// Grounded searches are quota-heavy and the event landscape moves slowly.
const DEFAULT_FRESHNESS_HOURS: i64 = 24;

/// Grounded searches regularly take 20-40s on the provider side.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub proxy_url: String,
    pub city: String,
    /// Model for the event search, details and chat
    pub text_model: String,
    /// Model for venue exploration (needs Maps grounding)
    pub venue_model: String,
    pub freshness_hours: i64,
    pub request_timeout_secs: u64,
    pub rate_limit_retries: u32,
    /// Overrides the platform cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            city: DEFAULT_CITY.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            venue_model: DEFAULT_VENUE_MODEL.to_string(),
            freshness_hours: DEFAULT_FRESHNESS_HOURS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            rate_limit_retries: 0,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    ///
    /// Rejected values are returned rather than logged, since this usually
    /// runs before the tracing subscriber exists.
    pub fn load() -> Result<(Self, Vec<String>)> {
        let path = Self::config_path()?;
        let mut config: Self = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        let mut rejected = Vec::new();
        if freshness_from_hours(config.freshness_hours).is_none() {
            rejected.push(format!(
                "Ignoring out-of-range freshness_hours {} in {}",
                config.freshness_hours,
                path.display()
            ));
            config.freshness_hours = DEFAULT_FRESHNESS_HOURS;
        }
        rejected.extend(config.apply_overrides(|key| std::env::var(key).ok()));
        Ok((config, rejected))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `EVENTSCOUT_*` overrides from any key lookup.
    /// Returns a message for each value that was ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut rejected = Vec::new();
        if let Some(url) = lookup("EVENTSCOUT_PROXY_URL") {
            self.proxy_url = url;
        }
        if let Some(city) = lookup("EVENTSCOUT_CITY") {
            self.city = city;
        }
        if let Some(model) = lookup("EVENTSCOUT_TEXT_MODEL") {
            self.text_model = model;
        }
        if let Some(model) = lookup("EVENTSCOUT_VENUE_MODEL") {
            self.venue_model = model;
        }
        if let Some(raw) = lookup("EVENTSCOUT_FRESHNESS_HOURS") {
            match raw.parse::<i64>() {
                Ok(hours) if freshness_from_hours(hours).is_some() => self.freshness_hours = hours,
                _ => rejected.push(format!("Ignoring invalid EVENTSCOUT_FRESHNESS_HOURS={}", raw)),
            }
        }
        if let Some(dir) = lookup("EVENTSCOUT_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        rejected
    }

    /// Freshness window; out-of-range hours fall back to the default
    pub fn freshness(&self) -> Duration {
        freshness_from_hours(self.freshness_hours)
            .unwrap_or_else(|| Duration::hours(DEFAULT_FRESHNESS_HOURS))
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

/// `None` for negative hours or more than `Duration` can hold
fn freshness_from_hours(hours: i64) -> Option<Duration> {
    if hours < 0 {
        return None;
    }
    Duration::try_hours(hours)
}
