//! Request/response shapes exchanged with the backend proxy.

use serde::{Deserialize, Serialize};

use crate::models::{ChatTurn, GroundingMetadata};

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub contents: Contents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateConfig>,
}

/// Either a single prompt string or an ordered list of role-tagged turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Contents {
    Prompt(String),
    Turns(Vec<ChatTurn>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

/// Retrieval tools; each serializes as `{"googleSearch": {}}` / `{"googleMaps": {}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    GoogleSearch {},
    GoogleMaps {},
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl GenerateRequest {
    /// Plain prompt with no tools
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            contents: Contents::Prompt(prompt.into()),
            config: None,
        }
    }

    /// Prompt answered with Google Search grounding
    pub fn grounded_search(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            config: Some(GenerateConfig {
                tools: vec![Tool::GoogleSearch {}],
                tool_config: None,
            }),
            ..Self::prompt(model, prompt)
        }
    }

    pub fn conversation(model: impl Into<String>, turns: Vec<ChatTurn>) -> Self {
        Self {
            model: model.into(),
            contents: Contents::Turns(turns),
            config: None,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CandidateContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Convenience constructor for a single-candidate text reply
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![ResponsePart {
                        text: Some(text.into()),
                    }],
                }),
                grounding_metadata: None,
            }],
            ..Default::default()
        }
    }

    pub fn with_grounding(mut self, metadata: GroundingMetadata) -> Self {
        if let Some(first) = self.candidates.first_mut() {
            first.grounding_metadata = Some(metadata);
        }
        self
    }

    /// Text of the first part of the first candidate. Empty text counts as absent.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn grounding_metadata(&self) -> Option<&GroundingMetadata> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grounded_search_request_shape() {
        let req = GenerateRequest::grounded_search("gemini-2.0-flash", "find events");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model": "gemini-2.0-flash",
                "contents": "find events",
                "config": {"tools": [{"googleSearch": {}}]}
            })
        );
    }

    #[test]
    fn test_tool_config_shape() {
        let config = GenerateConfig {
            tools: vec![Tool::GoogleMaps {}],
            tool_config: Some(ToolConfig {
                retrieval_config: RetrievalConfig {
                    lat_lng: LatLng { latitude: 28.61, longitude: 77.21 },
                },
            }),
        };
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "tools": [{"googleMaps": {}}],
                "toolConfig": {"retrievalConfig": {"latLng": {"latitude": 28.61, "longitude": 77.21}}}
            })
        );
    }

    #[test]
    fn test_response_unwraps_first_candidate() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "hello"}, {"text": "ignored"}]},
                "groundingMetadata": {"groundingChunks": [{"web": {"uri": "https://a.io", "title": "A"}}]}
            }],
            "usageMetadata": {"totalTokenCount": 12}
        });
        let resp: GenerateResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.text(), Some("hello"));
        assert_eq!(resp.grounding_metadata().unwrap().sources().len(), 1);
    }

    #[test]
    fn test_response_without_candidates() {
        let resp: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(resp.text(), None);
        assert!(resp.grounding_metadata().is_none());
        assert_eq!(GenerateResponse::from_text("").text(), None);
    }
}
