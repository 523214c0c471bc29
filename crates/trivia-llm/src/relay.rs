//! The relay: one prompt in, one `RelayResult` out.
//!
//! Stages run strictly in order and stop at the first failure:
//! validate → resolve model → call upstream → classify status →
//! read candidate text → extract JSON.

use std::sync::Arc;

use serde_json::Value;
use trivia_common::error::truncate_body;
use trivia_common::{ModelList, RelayError};

use crate::backend::{candidate_text, token_usage, GenerationBackend};
use crate::extraction::extract_json;

/// Exactly one outcome per request.
#[derive(Debug)]
pub enum RelayResult {
    Success(Value),
    /// The current model is unavailable; the caller should retry with `next_model_index`.
    RetrySignal { next_model_index: i64, unavailable_model: String },
    Failure(RelayError),
}

/// How an upstream HTTP status is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// The model name is unknown or rejected for this request; eligible for fallback.
    ModelUnavailable,
    Failed,
}

/// Single place that decides what an upstream status means.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        400 | 404 => StatusClass::ModelUnavailable,
        _ => StatusClass::Failed,
    }
}

pub struct Relay {
    backend: Arc<dyn GenerationBackend>,
    models: ModelList,
}

impl Relay {
    pub fn new(backend: Arc<dyn GenerationBackend>, models: ModelList) -> Self {
        Self { backend, models }
    }

    pub fn models(&self) -> &ModelList {
        &self.models
    }

    pub async fn handle_trivia_request(&self, prompt: &str, model_index: i64) -> RelayResult {
        match self.relay(prompt, model_index).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(model_index, error = %e, "Trivia request failed");
                RelayResult::Failure(e)
            }
        }
    }

    async fn relay(&self, prompt: &str, model_index: i64) -> Result<RelayResult, RelayError> {
        if prompt.trim().is_empty() {
            return Err(RelayError::Validation("Prompt is required".to_string()));
        }

        let model = self.models.get(model_index)?;

        tracing::info!(
            model = %model.name,
            model_index,
            backend = self.backend.name(),
            "Relaying trivia prompt"
        );

        let reply = self.backend
            .generate(model, prompt)
            .await
            .map_err(|e| RelayError::UpstreamTransport(e.to_string()))?;

        match classify_status(reply.status) {
            StatusClass::Success => {}
            StatusClass::ModelUnavailable => {
                if let Some(next) = self.models.next_index(model_index) {
                    tracing::warn!(
                        model = %model.name,
                        status = reply.status,
                        next_model_index = next,
                        "Model unavailable, signalling fallback"
                    );
                    return Ok(RelayResult::RetrySignal {
                        next_model_index: next,
                        unavailable_model: model.name.clone(),
                    });
                }
                return Err(RelayError::UpstreamUnavailable {
                    status: reply.status,
                    body: truncate_body(&reply.body),
                });
            }
            StatusClass::Failed => {
                return Err(RelayError::UpstreamStatus {
                    status: reply.status,
                    body: truncate_body(&reply.body),
                });
            }
        }

        let envelope: Value =
            serde_json::from_str(&reply.body).map_err(|_| RelayError::EmptyResponse)?;
        let text = candidate_text(&envelope).ok_or(RelayError::EmptyResponse)?;

        let (prompt_tokens, completion_tokens) = token_usage(&envelope);
        tracing::debug!(model = %model.name, prompt_tokens, completion_tokens, "Upstream reply received");

        let data = extract_json(text)?;
        Ok(RelayResult::Success(data))
    }
}
