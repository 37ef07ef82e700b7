//! Gemini `generateContent` transport for the online resolver.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use gridmap_core::config::AssistantConfig;

use super::online::{GenerativeProvider, GroundingCitation, ProviderRequest, ProviderResponse};
use crate::error::ChatError;

/// HTTPS client for the Gemini generative language API.
pub struct GeminiProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(config: &AssistantConfig, api_key: &str) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ChatError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key: api_key.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// JSON body for a `generateContent` call.
pub fn request_body(request: &ProviderRequest) -> serde_json::Value {
    let mut body = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.query }]
        }],
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }]
        }
    });
    if request.grounding {
        body["tools"] = serde_json::json!([{ "googleMaps": {} }]);
    }
    body
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ChatError> {
        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request_body(request))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ChatError::Provider(format!("gemini http error {status}: {text}")));
        }

        let body: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| ChatError::Provider(format!("gemini returned invalid JSON: {e}")))?;
        Ok(body.into_provider_response())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    maps: Option<MapsChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct MapsChunk {
    title: Option<String>,
    uri: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate plus its map citations.
    fn into_provider_response(self) -> ProviderResponse {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return ProviderResponse::default();
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let citations = candidate
            .grounding_metadata
            .map(|m| {
                m.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.maps)
                    .map(|maps| GroundingCitation {
                        title: maps.title,
                        uri: maps.uri,
                    })
                    .collect()
            })
            .unwrap_or_default();

        ProviderResponse {
            text: (!text.is_empty()).then_some(text),
            citations,
        }
    }
}
