use thiserror::Error;

/// Errors produced while signing a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// Key material is missing or empty
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The request descriptor lacks something the protocol requires
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}
