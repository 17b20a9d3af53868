use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use agentcore_sigv4::{HOST_HEADER, RequestDescriptor};

use crate::{AgentError, ChunkStream};

/// Status, content type and body of an upstream answer.
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ChunkStream,
}

impl UpstreamResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Sends a signed request and hands back the streaming response.
///
/// Implementations must send the request exactly as given; any header or body
/// change after signing invalidates the signature.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(
        &self,
        url: Url,
        request: RequestDescriptor,
    ) -> Result<UpstreamResponse, AgentError>;
}

/// [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing client (connection pool, timeouts, proxies).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn dispatch(
        &self,
        url: Url,
        request: RequestDescriptor,
    ) -> Result<UpstreamResponse, AgentError> {
        let method = reqwest::Method::from_bytes(request.method().as_bytes())
            .map_err(|error| AgentError::MalformedRequest(format!("Invalid method: {}", error)))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in request.headers().iter() {
            // reqwest derives Host from the URL, which is what was signed.
            if name.eq_ignore_ascii_case(HOST_HEADER) {
                continue;
            }
            builder = builder.header(name, value);
        }

        let response = builder.body(request.body().to_vec()).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        tracing::debug!(status, content_type = ?content_type, "Received upstream response");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(AgentError::from))
            .boxed();

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
