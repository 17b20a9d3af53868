use std::sync::Arc;

use agentcore_sigv4::{RequestDescriptor, Signer, SigningContext};
use serde::Serialize;
use url::Url;

use crate::config::host_header;
use crate::eventstream::{EVENT_STREAM_CONTENT_TYPE, completion_chunks};
use crate::{
    AgentConfig, AgentError, AgentResponse, AgentTarget, ReqwestTransport, Session, Transport,
    UpstreamResponse, collect_body, reassemble,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeAgentBody<'a> {
    input_text: &'a str,
    enable_trace: bool,
}

/// Signs and sends agent invocations.
///
/// A runtime holds no conversation state, so one instance can serve any
/// number of agents and sessions concurrently. Cloning is cheap.
#[derive(Clone)]
pub struct AgentRuntime {
    signer: Signer,
    endpoint: Url,
    host: String,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("signer", &self.signer)
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl AgentRuntime {
    /// Create a runtime that talks to the configured endpoint over HTTPS.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Create a runtime with a custom transport.
    pub fn with_transport(
        config: &AgentConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, AgentError> {
        config.credentials.validate()?;

        let endpoint = config.endpoint_url()?;
        let host = host_header(&endpoint)?;
        let signer = Signer::new(
            config.credentials.clone(),
            SigningContext::new(config.region.clone(), config.service.clone()),
        );

        Ok(Self {
            signer,
            endpoint,
            host,
            transport,
        })
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the unsigned invocation request.
    pub fn build_request(
        &self,
        target: &AgentTarget,
        session: &Session,
        input_text: &str,
    ) -> Result<RequestDescriptor, AgentError> {
        if target.agent_id.is_empty() || target.agent_alias_id.is_empty() {
            return Err(AgentError::MalformedRequest(
                "agent id and alias id are required".into(),
            ));
        }
        if session.as_str().is_empty() {
            return Err(AgentError::MalformedRequest("session id is required".into()));
        }

        let body = serde_json::to_vec(&InvokeAgentBody {
            input_text,
            enable_trace: false,
        })
        .map_err(|error| AgentError::MalformedRequest(error.to_string()))?;

        Ok(RequestDescriptor::post(target.invocation_path(session))
            .with_header("Host", self.host.clone())
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json")
            .with_body(body))
    }

    /// Build and sign the invocation request.
    pub fn sign_request(
        &self,
        target: &AgentTarget,
        session: &Session,
        input_text: &str,
    ) -> Result<RequestDescriptor, AgentError> {
        let request = self.build_request(target, session, input_text)?;
        Ok(self.signer.sign(&request)?)
    }

    /// Send a signed request.
    pub async fn dispatch(
        &self,
        request: RequestDescriptor,
    ) -> Result<UpstreamResponse, AgentError> {
        let mut url = self.endpoint.clone();
        url.set_path(request.path());
        url.set_query(match request.query() {
            "" => None,
            query => Some(query),
        });

        self.transport.dispatch(url, request).await
    }

    /// Turn a response into the completion text.
    ///
    /// Event-stream bodies are decoded into their chunk payloads and
    /// reassembled; anything else is read whole and normalised.
    pub async fn read_completion(&self, response: UpstreamResponse) -> Result<String, AgentError> {
        if !response.is_success() {
            let status = response.status;
            let body = match collect_body(response.body).await {
                Ok(body) => String::from_utf8_lossy(&body).into_owned(),
                Err(error) => {
                    tracing::warn!(status, "Could not read rejection body: {}", error);
                    format!("<body unreadable: {}>", error)
                }
            };
            tracing::warn!(status, "Agent invocation rejected");
            return Err(AgentError::UpstreamError { status, body });
        }

        let is_event_stream = response
            .content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with(EVENT_STREAM_CONTENT_TYPE));

        if is_event_stream {
            reassemble(completion_chunks(response.body)).await
        } else {
            let body = collect_body(response.body).await?;
            Ok(AgentResponse::from_body(&body)?.into_text())
        }
    }

    /// Invoke an agent within a session and return its completion.
    pub async fn invoke(
        &self,
        target: &AgentTarget,
        session: &Session,
        input_text: &str,
    ) -> Result<String, AgentError> {
        tracing::debug!(
            agent_id = %target.agent_id,
            agent_alias_id = %target.agent_alias_id,
            session = %session,
            "Invoking agent"
        );

        let request = self.sign_request(target, session, input_text)?;
        let response = self.dispatch(request).await?;
        self.read_completion(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_sigv4::Credentials;
    use pretty_assertions::assert_eq;

    fn runtime() -> AgentRuntime {
        AgentRuntime::new(&AgentConfig::new(
            "us-west-2",
            Credentials::new("AKID", "secret"),
        ))
        .unwrap()
    }

    #[test]
    fn it_builds_the_invocation_request() {
        let request = runtime()
            .build_request(
                &AgentTarget::new("A1", "B1"),
                &Session::from("session-1-abc"),
                "Hello",
            )
            .unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(
            request.path(),
            "/agents/A1/agentAliases/B1/sessions/session-1-abc/text"
        );
        assert_eq!(
            request.headers().get("host"),
            Some("bedrock-agent-runtime.us-west-2.amazonaws.com")
        );
        assert_eq!(
            request.body(),
            br#"{"inputText":"Hello","enableTrace":false}"#
        );
    }

    #[test]
    fn it_signs_for_bedrock_in_the_configured_region() {
        let request = runtime()
            .sign_request(&AgentTarget::new("A1", "B1"), &Session::from("s"), "Hi")
            .unwrap();
        let authorization = request.headers().get("authorization").unwrap();

        assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKID/"));
        assert!(authorization.contains("/us-west-2/bedrock/aws4_request"));
    }

    #[test]
    fn it_requires_agent_identifiers() {
        let result = runtime().build_request(&AgentTarget::new("", "B1"), &Session::from("s"), "Hi");
        assert!(matches!(result, Err(AgentError::MalformedRequest(_))));
    }

    #[test]
    fn it_refuses_empty_credentials_up_front() {
        let result = AgentRuntime::new(&AgentConfig::new("us-east-1", Credentials::new("", "")));
        assert!(matches!(result, Err(AgentError::InvalidCredentials(_))));
    }
}
