use agentcore_sigv4::SigningError;
use thiserror::Error;

/// The common error type for agent invocations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Key material is missing or empty
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The request could not be built or lacks a required field
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The agent service answered with a non-success status
    #[error("Agent service error {status}: {body}")]
    UpstreamError {
        /// HTTP status (or the status implied by an exception frame)
        status: u16,
        /// Response body as text
        body: String,
    },

    /// A response chunk could not be decoded
    #[error("Could not decode response stream: {0}")]
    StreamDecodeError(String),

    /// The caller aborted the invocation
    #[error("Invocation cancelled")]
    Cancelled,

    /// The request never produced an HTTP status
    #[error("Transport error: {0}")]
    TransportError(String),
}

impl AgentError {
    /// Stable, upper-case identifier for this kind of error.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            AgentError::MalformedRequest(_) => "MALFORMED_REQUEST",
            AgentError::UpstreamError { .. } => "UPSTREAM_ERROR",
            AgentError::StreamDecodeError(_) => "STREAM_DECODE_ERROR",
            AgentError::Cancelled => "CANCELLED",
            AgentError::TransportError(_) => "TRANSPORT_ERROR",
        }
    }
}

impl From<SigningError> for AgentError {
    fn from(value: SigningError) -> Self {
        match value {
            SigningError::InvalidCredentials(message) => AgentError::InvalidCredentials(message),
            SigningError::MalformedRequest(message) => AgentError::MalformedRequest(message),
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(value: reqwest::Error) -> Self {
        AgentError::TransportError(value.to_string())
    }
}
