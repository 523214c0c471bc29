//! Shared application state for the web server.

use std::sync::Arc;

use trivia_common::RelayConfig;
use trivia_llm::{GeminiBackend, LlmError, Relay};

/// Read-only state injected into every Axum handler.
pub struct AppState {
    pub relay: Relay,
    pub port: u16,
}

impl AppState {
    pub fn new(relay: Relay, port: u16) -> Self {
        Self { relay, port }
    }

    /// Wire the Gemini backend and model table from startup configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self, LlmError> {
        let backend = GeminiBackend::new(
            config.settings.upstream_base_url.clone(),
            config.api_key.clone(),
            config.upstream_timeout(),
        )?;
        let relay = Relay::new(Arc::new(backend), config.models.clone());
        Ok(Self::new(relay, config.port))
    }
}

pub type SharedState = Arc<AppState>;
