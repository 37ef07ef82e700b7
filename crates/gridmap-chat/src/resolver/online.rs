//! Online resolver: delegates to an external generative provider.
//!
//! The provider receives the serialized directory inside a fixed system
//! instruction. Map-grounding citations returned by the provider are
//! appended to the reply as links. Provider failures are logged and
//! replaced by [`PROVIDER_ERROR_REPLY`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use gridmap_core::StationDirectory;

use super::{QueryResolver, ResolverMode, PROVIDER_ERROR_REPLY};
use crate::error::ChatError;

/// Reply used when the provider answers without any text.
pub const EMPTY_TEXT_REPLY: &str = "Encontrei algumas informações.";

const CITATIONS_HEADER: &str = "\n\n**Encontrado no Google Maps:**\n";

// =============================================================================
// Provider contract
// =============================================================================

/// Everything the provider needs to answer one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRequest {
    pub query: String,
    pub system_instruction: String,
    /// Enable the provider's map grounding tool.
    pub grounding: bool,
}

/// External map result backing part of an answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingCitation {
    pub title: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub text: Option<String>,
    pub citations: Vec<GroundingCitation>,
}

/// Text generation backend. Errors are folded into a fixed reply by
/// [`OnlineResolver`].
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ChatError>;
}

// =============================================================================
// Reply assembly
// =============================================================================

/// System instruction sent with every query.
pub fn system_instruction(directory: &StationDirectory) -> String {
    format!(
        "You are an intelligent assistant for an Electrical Grid Management App for Enel São Paulo.

You have access to a database of known Substations (ETDs), Operational Bases (BASES) and ESDs.
The user might ask about specific locations, coverage, or technical details.

Current known database context:
{}

Rules:
1. If the user asks about a location that exists in your database, ALWAYS include its ID in the response using this exact format: {{{{STATION_ID:the_id_here}}}}. For example: {{{{STATION_ID:w1}}}}.
2. If the user asks for a location NOT in the database, use your Google Maps grounding to find real-world information.
3. Be concise and professional.
4. Provide distances if possible.",
        directory.context_lines()
    )
}

/// Turn a provider response into reply text, appending titled citations.
pub fn format_reply(response: ProviderResponse) -> String {
    let mut reply = response
        .text
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| EMPTY_TEXT_REPLY.to_string());

    let titled: Vec<(&str, &str)> = response
        .citations
        .iter()
        .filter_map(|c| {
            let title = c.title.as_deref().filter(|t| !t.trim().is_empty())?;
            Some((title, c.uri.as_deref().unwrap_or_default()))
        })
        .collect();

    if !titled.is_empty() {
        reply.push_str(CITATIONS_HEADER);
        for (title, uri) in titled {
            reply.push_str(&format!("- {}: [Ver no Mapa]({})\n", title, uri));
        }
    }
    reply
}

// =============================================================================
// OnlineResolver
// =============================================================================

/// Resolver backed by a [`GenerativeProvider`].
pub struct OnlineResolver<P> {
    provider: P,
}

impl<P: GenerativeProvider> OnlineResolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: GenerativeProvider> QueryResolver for OnlineResolver<P> {
    fn mode(&self) -> ResolverMode {
        ResolverMode::Online
    }

    async fn resolve(&self, query: &str, directory: &StationDirectory) -> String {
        let request = ProviderRequest {
            query: query.to_string(),
            system_instruction: system_instruction(directory),
            grounding: true,
        };

        match self.provider.generate(&request).await {
            Ok(response) => {
                tracing::debug!(
                    citations = response.citations.len(),
                    "Provider answered query"
                );
                format_reply(response)
            }
            Err(e) => {
                tracing::error!(error = %e, "Provider request failed");
                PROVIDER_ERROR_REPLY.to_string()
            }
        }
    }
}
