use agentcore_client::{
    AgentRuntime, AgentTarget, QuickAction, Session, TicketContext, build_prompt,
};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ApiError;

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct ProxyState {
    pub runtime: AgentRuntime,
}

impl ProxyState {
    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }
}

/// Body of `POST /api/agent/invoke`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvokeRequest {
    pub input_text: Option<String>,
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    pub agent_alias_id: Option<String>,
    /// Name of a canned query; replaces `input_text` when present
    pub action: Option<String>,
    /// Ticket to ground the query in
    pub ticket_context: Option<TicketContext>,
}

/// Successful answer of `POST /api/agent/invoke`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    pub success: bool,
    pub completion: String,
    pub session_id: String,
}

fn required(value: Option<String>) -> Result<String, ApiError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::MissingFields)
}

/// Build the proxy's router.
pub fn router(state: ProxyState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/agent/invoke", post(invoke))
        .route("/api/agent/session", post(new_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn new_session() -> Json<Value> {
    let session = Session::generate();
    tracing::debug!(session = %session, "Issued session");
    Json(json!({ "sessionId": session }))
}

fn user_input(request: &mut InvokeRequest) -> Result<String, ApiError> {
    match request.action.take().filter(|action| !action.is_empty()) {
        Some(action) => {
            let action: QuickAction = action.parse().map_err(ApiError::InvalidBody)?;
            Ok(action.prompt().to_owned())
        }
        None => required(request.input_text.take()),
    }
}

async fn invoke(
    State(state): State<ProxyState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let Json(mut request) =
        payload.map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;

    let input_text = user_input(&mut request)?;
    let session = Session::from(required(request.session_id)?);
    let target = AgentTarget::new(
        required(request.agent_id)?,
        required(request.agent_alias_id)?,
    );

    let prompt = build_prompt(&input_text, request.ticket_context.as_ref());
    let completion = state.runtime.invoke(&target, &session, &prompt).await?;

    Ok(Json(InvokeResponse {
        success: true,
        completion,
        session_id: session.to_string(),
    }))
}
