use std::fmt;

use agentcore_client::AgentConfig;
use agentcore_sigv4::Credentials;
use axum::http::{HeaderName, HeaderValue, Method, header};
use clap::Parser;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Proxy settings, read from flags or the environment.
#[derive(Clone, Parser)]
#[command(name = "agentcore-proxy")]
#[command(bin_name = "agentcore-proxy")]
#[command(about = "Signs and forwards Bedrock agent invocations", long_about = None)]
pub struct ProxyConfig {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: String,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: String,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Override the regional agent runtime endpoint
    #[arg(long, env = "AGENT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Comma separated; any origin is allowed when empty
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,
}

impl ProxyConfig {
    /// Client configuration derived from these settings.
    pub fn agent_config(&self) -> AgentConfig {
        let mut credentials = Credentials::new(&self.access_key_id, &self.secret_access_key);
        if let Some(token) = &self.session_token {
            credentials = credentials.with_session_token(token);
        }

        let config = AgentConfig::new(&self.region, credentials);
        match &self.endpoint {
            Some(endpoint) => config.with_endpoint(endpoint),
            None => config,
        }
    }

    /// CORS policy for browser callers.
    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        let allow_origin = if origins.is_empty() {
            AllowOrigin::from(Any)
        } else {
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-zendesk-token"),
            ])
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("port", &self.port)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint", &self.endpoint)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}
