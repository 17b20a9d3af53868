use agentcore_client::AgentRuntime;
use agentcore_proxy::{ProxyConfig, ProxyState, router};
use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ProxyConfig::parse();
    tracing::debug!(config = ?config, "Loaded configuration");

    let runtime = AgentRuntime::new(&config.agent_config())?;
    tracing::info!(
        region = %config.region,
        endpoint = %runtime.endpoint(),
        "Agent runtime ready"
    );

    let app = router(ProxyState::new(runtime), config.cors_layer());
    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
