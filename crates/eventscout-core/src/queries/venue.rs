use tracing::debug;

use crate::api::{
    ApiError, Backend, GenerateConfig, GenerateRequest, LatLng, RetrievalConfig, Tool, ToolConfig,
};
use crate::models::{GroundingMetadata, GroundingSource};
use crate::prompts;

/// Shown in place of recommendations when the request fails
pub const VENUES_UNAVAILABLE: &str = "Unable to load map data.";

/// Model prose plus the grounding metadata, unparsed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueResult {
    pub text: String,
    pub grounding_metadata: Option<GroundingMetadata>,
}

impl VenueResult {
    /// Place entries (maps URI, title, review snippets) in provider order
    pub fn places(&self) -> Vec<GroundingSource> {
        self.grounding_metadata
            .as_ref()
            .map(GroundingMetadata::places)
            .unwrap_or_default()
    }
}

/// Maps-grounded request for nearby venues. Coordinates, when known,
/// become the retrieval location hint.
pub fn venue_request(model: &str, location: Option<LatLng>) -> GenerateRequest {
    GenerateRequest {
        config: Some(GenerateConfig {
            tools: vec![Tool::GoogleMaps {}],
            tool_config: location.map(|lat_lng| ToolConfig {
                retrieval_config: RetrievalConfig { lat_lng },
            }),
        }),
        ..GenerateRequest::prompt(model, prompts::venue_recommendations())
    }
}

pub async fn explore_venues<B: Backend + ?Sized>(
    backend: &B,
    model: &str,
    location: Option<LatLng>,
) -> Result<VenueResult, ApiError> {
    debug!(?location, "Exploring venues");
    let response = backend.generate(&venue_request(model, location)).await?;
    Ok(VenueResult {
        text: response.text().unwrap_or_default().to_string(),
        grounding_metadata: response.grounding_metadata().cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GenerateResponse;
    use crate::testing::ScriptedBackend;
    use serde_json::json;

    #[test]
    fn test_request_with_location_carries_lat_lng() {
        let request = venue_request("gemini-2.5-flash", Some(LatLng { latitude: 28.5355, longitude: 77.391 }));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["config"]["tools"], json!([{"googleMaps": {}}]));
        assert_eq!(
            value["config"]["toolConfig"]["retrievalConfig"]["latLng"],
            json!({"latitude": 28.5355, "longitude": 77.391})
        );
    }

    #[test]
    fn test_request_without_location_has_no_tool_config() {
        let value = serde_json::to_value(venue_request("gemini-2.5-flash", None)).unwrap();
        assert!(value["config"].get("toolConfig").is_none());
        assert_eq!(value["model"], "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_places_are_surfaced_from_grounding() {
        let metadata: GroundingMetadata = serde_json::from_value(json!({
            "groundingChunks": [{"maps": {
                "uri": "https://maps.google.com/?cid=42",
                "title": "Innov8 Connaught Place",
                "placeAnswerSources": [{"reviewSnippets": [{"snippet": "Quiet and central"}]}]
            }}]
        }))
        .unwrap();
        let backend = ScriptedBackend::new()
            .reply(GenerateResponse::from_text("1. Innov8 ...").with_grounding(metadata.clone()));

        let result = explore_venues(&backend, "gemini-2.5-flash", None).await.unwrap();

        assert_eq!(result.text, "1. Innov8 ...");
        assert_eq!(result.grounding_metadata, Some(metadata));
        let places = result.places();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].snippets, vec!["Quiet and central".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let backend = ScriptedBackend::new().fail(ApiError::RateLimited("slow down".to_string()));
        let err = explore_venues(&backend, "gemini-2.5-flash", None).await.unwrap_err();
        assert!(err.is_rate_limited());
    }
}
