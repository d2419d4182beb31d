//! Image-synthesis backends.
//!
//! Each backend implements [`ImageProvider`]; a [`ProviderSet`] maps the
//! validated [`ProviderKind`] a job was created with to its implementation.

pub mod dalle;
pub mod stability;
#[cfg(test)]
mod stub_server;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};

use crate::config::AppConfig;

pub use dalle::DalleProvider;
pub use stability::StabilityProvider;

/// Closed set of supported backends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ProviderKind {
    #[strum(to_string = "dalle", serialize = "dall-e", serialize = "openai")]
    Dalle,
    #[strum(to_string = "stability", serialize = "stabilityai", serialize = "stability-ai")]
    Stability,
}

/// One image to synthesize.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub quality: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: ProviderKind,
        status: u16,
        body: String,
    },

    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    #[error("Malformed {provider} response: {message}")]
    MalformedPayload {
        provider: ProviderKind,
        message: String,
    },

    #[error("No provider registered for {0}")]
    Unavailable(ProviderKind),
}

/// A backend that turns a prompt into encoded image bytes.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Hard budget for one [`ImageProvider::synthesize`] call.
    fn timeout(&self) -> Duration;

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, ProviderError>;
}

/// Registered providers keyed by kind.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<ProviderKind, Arc<dyn ImageProvider>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both HTTP backends, whether or not their keys are configured.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new()
            .with(Arc::new(DalleProvider::new(
                config.openai_api_base.clone(),
                config.openai_api_key.clone(),
                config.dalle_timeout(),
            )))
            .with(Arc::new(StabilityProvider::new(
                config.stability_api_base.clone(),
                config.stability_api_key.clone(),
                config.stability_timeout(),
            )))
    }

    pub fn with(mut self, provider: Arc<dyn ImageProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn ImageProvider>, ProviderError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or(ProviderError::Unavailable(kind))
    }
}

/// Keep error bodies readable in tool output and logs.
pub(crate) fn truncate_body(body: &str, limit: usize) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= limit {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(limit).collect();
    format!("{cut}...")
}

pub(crate) fn non_empty_key(key: &Option<String>) -> Option<&str> {
    key.as_deref().map(str::trim).filter(|k| !k.is_empty())
}
