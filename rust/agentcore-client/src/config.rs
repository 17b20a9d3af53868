use agentcore_sigv4::Credentials;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{AgentError, Session};

/// Service name Bedrock agent runtime requests are signed for.
pub const DEFAULT_SERVICE: &str = "bedrock";

/// Configuration for an [`AgentRuntime`](crate::AgentRuntime).
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// AWS region hosting the agent
    pub region: String,

    /// Key pair used to sign requests
    pub credentials: Credentials,

    /// Base URL override (e.g. a VPC endpoint); derived from the region when unset
    pub endpoint: Option<String>,

    /// Signing service name
    pub service: String,
}

impl AgentConfig {
    /// Create a configuration for the public regional endpoint.
    pub fn new(region: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            region: region.into(),
            credentials,
            endpoint: None,
            service: DEFAULT_SERVICE.to_string(),
        }
    }

    /// Use a custom endpoint instead of the regional default.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sign for a different service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Parsed base URL of the agent runtime service.
    pub fn endpoint_url(&self) -> Result<Url, AgentError> {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://bedrock-agent-runtime.{}.amazonaws.com", self.region),
        };
        Url::parse(&endpoint)
            .map_err(|error| AgentError::MalformedRequest(format!("Invalid endpoint: {}", error)))
    }
}

/// Host header value for a URL, including port for non-standard ports.
pub(crate) fn host_header(url: &Url) -> Result<String, AgentError> {
    let hostname = url
        .host_str()
        .ok_or_else(|| AgentError::MalformedRequest("Endpoint URL missing host".into()))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", hostname, port),
        None => hostname.to_string(),
    })
}

/// The agent alias a conversation talks to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTarget {
    /// Agent identifier
    pub agent_id: String,
    /// Alias identifier of the deployed agent version
    pub agent_alias_id: String,
}

impl AgentTarget {
    /// Create a new target.
    pub fn new(agent_id: impl Into<String>, agent_alias_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_alias_id: agent_alias_id.into(),
        }
    }

    /// Request path for sending text within a session.
    pub fn invocation_path(&self, session: &Session) -> String {
        format!(
            "/agents/{}/agentAliases/{}/sessions/{}/text",
            self.agent_id, self.agent_alias_id, session
        )
    }
}
