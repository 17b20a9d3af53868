use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::{
    ALGORITHM_IDENTIFIER, AMZ_DATE_HEADER, AMZ_SECURITY_TOKEN_HEADER, AUTHORIZATION_HEADER,
    CanonicalRequest, Credentials, HOST_HEADER, RequestDescriptor, SigningContext, SigningError,
    SigningKey, Timestamp,
};

/// Signs requests with header-based AWS SigV4 authorization.
///
/// A signer is an immutable pairing of credentials and signing scope. It
/// holds no other state: every call derives a fresh key and signature from
/// the request and a single captured instant.
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
    context: SigningContext,
}

impl Signer {
    /// Create a signer for the given credentials and scope.
    pub fn new(credentials: Credentials, context: SigningContext) -> Self {
        Self {
            credentials,
            context,
        }
    }

    /// Get the credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Get the signing context.
    pub fn context(&self) -> &SigningContext {
        &self.context
    }

    /// Sign a request at the current instant.
    pub fn sign(&self, request: &RequestDescriptor) -> Result<RequestDescriptor, SigningError> {
        self.sign_at(request, current_time())
    }

    /// Sign a request at the given instant.
    ///
    /// Returns a copy of `request` with `X-Amz-Date` (and
    /// `X-Amz-Security-Token` for temporary credentials) inserted before
    /// canonicalisation, plus the resulting `Authorization` header. Nothing
    /// else about the request changes.
    pub fn sign_at(
        &self,
        request: &RequestDescriptor,
        time: impl Into<Timestamp>,
    ) -> Result<RequestDescriptor, SigningError> {
        self.credentials.validate()?;

        match request.headers().get(HOST_HEADER) {
            Some(host) if !host.trim().is_empty() => {}
            _ => {
                return Err(SigningError::MalformedRequest(
                    "request is missing a host header".into(),
                ));
            }
        }

        let timestamp = time.into();

        let mut signed = request.clone();
        signed
            .headers_mut()
            .insert(AMZ_DATE_HEADER, timestamp.datetime());
        if let Some(token) = self.credentials.session_token() {
            signed.headers_mut().insert(AMZ_SECURITY_TOKEN_HEADER, token);
        }

        let canonical = CanonicalRequest::new(&signed);
        let scope = self.context.scope(&timestamp);
        let payload = string_to_sign(&timestamp, &scope, &canonical);

        let key = SigningKey::derive(
            self.credentials.secret_access_key(),
            &timestamp.date(),
            self.context.region(),
            self.context.service(),
        );
        let signature = key.sign(payload.as_bytes());

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM_IDENTIFIER,
            self.credentials.access_key_id(),
            scope,
            canonical.signed_headers(),
            signature
        );
        signed
            .headers_mut()
            .insert(AUTHORIZATION_HEADER, authorization);

        Ok(signed)
    }
}

/// Build the string-to-sign binding algorithm, time, scope and request hash.
pub(crate) fn string_to_sign(
    timestamp: &Timestamp,
    scope: &str,
    canonical: &CanonicalRequest,
) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM_IDENTIFIER,
        timestamp.datetime(),
        scope,
        canonical.hash()
    )
}

/// Get the current time as a UTC datetime.
pub fn current_time() -> DateTime<Utc> {
    DateTime::<Utc>::from(SystemTime::now())
}
