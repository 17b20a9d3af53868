use agentcore_client::{AgentError, FAILURE_MESSAGE};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Fields an invoke request must carry.
pub(crate) const REQUIRED_FIELDS: [&str; 4] = ["inputText", "sessionId", "agentId", "agentAliasId"];

/// Errors returned by the proxy's routes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("Failed to invoke agent")]
    Invocation(#[from] AgentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingFields => {
                debug!("Rejected invoke request with missing fields");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": self.to_string(),
                        "required": REQUIRED_FIELDS,
                    })),
                )
                    .into_response()
            }
            ApiError::InvalidBody(ref message) => {
                debug!(message = %message, "Rejected unreadable invoke request");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": self.to_string(),
                        "message": message,
                        "code": "INVALID_BODY",
                    })),
                )
                    .into_response()
            }
            ApiError::Invocation(ref source) => {
                error!(error_code = source.kind(), message = %source, "Agent invocation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": self.to_string(),
                        "message": source.to_string(),
                        "code": source.kind(),
                        "reply": FAILURE_MESSAGE,
                    })),
                )
                    .into_response()
            }
        }
    }
}
