use serde::{Deserialize, Serialize};

/// Fallback values used when an extracted block omits a field.
pub const DEFAULT_DATE: &str = "Upcoming";
pub const DEFAULT_LOCATION: &str = "Delhi NCR";
pub const DEFAULT_DESCRIPTION: &str = "No description available.";
pub const DEFAULT_COST: &str = "Unknown";
pub const DEFAULT_TAG: &str = "Tech";

/// A single tech event as extracted from a model reply.
///
/// Field names serialize in camelCase so cached feeds stay readable by the
/// browser front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TechEvent {
    /// `evt-{block}-{millis}`. Unique within one fetch only.
    pub id: String,
    pub title: String,
    pub date: String,
    pub location: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_cost")]
    pub cost: String,
    #[serde(default)]
    pub has_certificate: bool,
}

fn default_cost() -> String {
    DEFAULT_COST.to_string()
}

impl TechEvent {
    /// Comma-joined tags for single-line display
    pub fn tags_display(&self) -> String {
        self.tags.join(", ")
    }
}

/// Cost filter offered above the event list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostFilter {
    #[default]
    All,
    Free,
    Paid,
}

impl std::str::FromStr for CostFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(CostFilter::All),
            "free" => Ok(CostFilter::Free),
            "paid" => Ok(CostFilter::Paid),
            other => Err(format!("unknown cost filter: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventFilter {
    pub cost: CostFilter,
    pub certificate_only: bool,
}

impl EventFilter {
    pub fn matches(&self, event: &TechEvent) -> bool {
        // Substring match on the raw cost, so "Free (registration required)" counts as free
        let cost = event.cost.to_lowercase();
        match self.cost {
            CostFilter::All => {}
            CostFilter::Free if !cost.contains("free") => return false,
            CostFilter::Paid if !cost.contains("paid") => return false,
            _ => {}
        }
        !self.certificate_only || event.has_certificate
    }

    pub fn apply<'a>(&self, events: &'a [TechEvent]) -> Vec<&'a TechEvent> {
        events.iter().filter(|e| self.matches(e)).collect()
    }
}
