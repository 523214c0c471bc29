//! Trivia endpoint: forwards the prompt through the relay and maps the outcome to HTTP.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use trivia_common::RelayError;
use trivia_llm::RelayResult;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model_index: Option<i64>,
}

/// HTTP view of a relay outcome. Retry signals are a 200, not an error.
pub struct ApiResponse(pub RelayResult);

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self.0 {
            RelayResult::Success(data) => (
                StatusCode::OK,
                Json(json!({ "success": true, "data": data })),
            )
                .into_response(),
            RelayResult::RetrySignal { next_model_index, unavailable_model } => (
                StatusCode::OK,
                Json(json!({
                    "success":        false,
                    "retry":          true,
                    "nextModelIndex": next_model_index,
                    "error":          format!("Model {} unavailable", unavailable_model),
                })),
            )
                .into_response(),
            RelayResult::Failure(e) => {
                let status = if e.is_validation() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, Json(json!({ "success": false, "error": e.to_string() }))).into_response()
            }
        }
    }
}

/// POST /api/trivia
pub async fn trivia_submit(
    State(state): State<SharedState>,
    payload: Result<Json<TriviaRequest>, JsonRejection>,
) -> ApiResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected trivia request body");
            return ApiResponse(RelayResult::Failure(RelayError::Validation(format!(
                "Invalid request body: {}",
                rejection.body_text()
            ))));
        }
    };

    let prompt = req.prompt.unwrap_or_default();
    let model_index = req.model_index.unwrap_or(0);

    ApiResponse(state.relay.handle_trivia_request(&prompt, model_index).await)
}
