//! Query resolver strategies.
//!
//! Defines the `QueryResolver` async trait and the factory that picks the
//! offline or online implementation once, at startup, from the presence of
//! a provider credential.

pub mod gemini;
pub mod offline;
pub mod online;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use gridmap_core::config::AssistantConfig;
use gridmap_core::StationDirectory;

use crate::error::ChatError;

pub use gemini::GeminiProvider;
pub use offline::OfflineResolver;
pub use online::{
    GenerativeProvider, GroundingCitation, OnlineResolver, ProviderRequest, ProviderResponse,
};

/// Reply used when the offline resolver finds no candidate.
pub const NOT_FOUND_REPLY: &str = "Não encontrei essa estação no diretório. Tente digitar o nome exato, por exemplo \"ETD Barueri\".";

/// Reply used when the external provider fails.
pub const PROVIDER_ERROR_REPLY: &str =
    "Desculpe, encontrei um erro ao processar sua solicitação. Tente novamente.";

/// Which strategy answers queries for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverMode {
    Offline,
    Online,
}

impl ResolverMode {
    /// Online iff a non-blank credential is configured.
    pub fn from_credential(credential: Option<&str>) -> Self {
        match credential {
            Some(key) if !key.trim().is_empty() => ResolverMode::Online,
            _ => ResolverMode::Offline,
        }
    }
}

impl fmt::Display for ResolverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverMode::Offline => write!(f, "offline"),
            ResolverMode::Online => write!(f, "online"),
        }
    }
}

/// Turns a free-text query into a displayable reply.
///
/// Implementations are total: every failure is folded into the returned
/// text, so callers never handle errors from `resolve`.
#[async_trait]
pub trait QueryResolver: Send + Sync {
    fn mode(&self) -> ResolverMode;

    async fn resolve(&self, query: &str, directory: &StationDirectory) -> String;
}

/// Build the resolver strategy for this process.
///
/// Fails only when the HTTP client for online mode cannot be constructed.
pub fn build_resolver(
    config: &AssistantConfig,
    credential: Option<&str>,
) -> Result<Arc<dyn QueryResolver>, ChatError> {
    match (ResolverMode::from_credential(credential), credential) {
        (ResolverMode::Online, Some(key)) => {
            let provider = GeminiProvider::new(config, key.trim())?;
            tracing::info!(model = %config.model, "Assistant running in online mode");
            Ok(Arc::new(OnlineResolver::new(provider)))
        }
        _ => {
            tracing::info!(
                delay_ms = config.offline_delay_ms,
                "No provider credential configured, assistant running in offline mode"
            );
            Ok(Arc::new(OfflineResolver::from_config(config)))
        }
    }
}
