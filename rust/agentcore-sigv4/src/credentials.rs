use std::fmt;

use crate::SigningError;

/// AWS access key pair, optionally with an STS session token.
///
/// Credentials are fixed for the lifetime of a [`Signer`](crate::Signer). The
/// `Debug` output redacts the secret and the token so that credentials can
/// sit inside structs that get logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create long-lived credentials from an access key pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token for temporary credentials.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Get the access key ID.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the session token, if any.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub(crate) fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Check that both halves of the key pair are present.
    pub fn validate(&self) -> Result<(), SigningError> {
        if self.access_key_id.trim().is_empty() {
            return Err(SigningError::InvalidCredentials(
                "access key id is empty".into(),
            ));
        }
        if self.secret_access_key.is_empty() {
            return Err(SigningError::InvalidCredentials(
                "secret access key is empty".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
