use serde::{Deserialize, Serialize};

/// Grounding metadata attached to a model candidate.
///
/// Only the parts the front-end renders are modelled; unknown fields from
/// the provider are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_chunks: Vec<GroundingChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_search_queries: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<MapsSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct WebSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MapsSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub place_answer_sources: Vec<PlaceAnswerSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PlaceAnswerSource {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub review_snippets: Vec<ReviewSnippet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ReviewSnippet {
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Web,
    Place,
}

/// Flattened view of one grounding chunk, ready for a link list
#[derive(Debug, Clone, PartialEq)]
pub struct GroundingSource {
    pub kind: SourceKind,
    pub uri: String,
    pub title: String,
    pub snippets: Vec<String>,
}

impl GroundingMetadata {
    /// All web and place sources in chunk order. Chunks without a URI are skipped.
    pub fn sources(&self) -> Vec<GroundingSource> {
        let mut sources = Vec::new();
        for chunk in &self.grounding_chunks {
            if let Some(web) = chunk.web.as_ref().filter(|w| !w.uri.is_empty()) {
                sources.push(GroundingSource {
                    kind: SourceKind::Web,
                    uri: web.uri.clone(),
                    title: web.title.clone(),
                    snippets: Vec::new(),
                });
            }
            if let Some(maps) = chunk.maps.as_ref().filter(|m| !m.uri.is_empty()) {
                let snippets = maps
                    .place_answer_sources
                    .iter()
                    .flat_map(|p| p.review_snippets.iter())
                    .map(|r| r.snippet.clone())
                    .filter(|s| !s.is_empty())
                    .collect();
                sources.push(GroundingSource {
                    kind: SourceKind::Place,
                    uri: maps.uri.clone(),
                    title: maps.title.clone(),
                    snippets,
                });
            }
        }
        sources
    }

    pub fn places(&self) -> Vec<GroundingSource> {
        self.sources()
            .into_iter()
            .filter(|s| s.kind == SourceKind::Place)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.grounding_chunks.is_empty() && self.web_search_queries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_flatten_web_and_maps() {
        let json = r#"{
            "groundingChunks": [
                {"web": {"uri": "https://devfolio.co/x", "title": "Devfolio"}},
                {"maps": {
                    "uri": "https://maps.google.com/?cid=1",
                    "title": "91springboard",
                    "placeAnswerSources": [
                        {"reviewSnippets": [{"snippet": "Great wifi"}, {"snippet": ""}]}
                    ]
                }},
                {"web": {"uri": "", "title": "dangling"}}
            ],
            "searchEntryPoint": {"renderedContent": "<div/>"}
        }"#;
        let metadata: GroundingMetadata = serde_json::from_str(json).unwrap();
        let sources = metadata.sources();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].kind, SourceKind::Web);
        assert_eq!(sources[1].title, "91springboard");
        assert_eq!(sources[1].snippets, vec!["Great wifi".to_string()]);
        assert_eq!(metadata.places().len(), 1);
    }

    #[test]
    fn test_empty_metadata() {
        let metadata: GroundingMetadata = serde_json::from_str("{}").unwrap();
        assert!(metadata.is_empty());
        assert!(metadata.sources().is_empty());
    }
}
