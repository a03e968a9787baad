use anyhow::{Context, Result};
use dashboard_auth::{AuthClient, AuthConfig, shell::shell_routes};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = matches!(
        std::env::var("DASHBOARD_LOG_JSON").as_deref(),
        Ok("1") | Ok("true"),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AuthConfig::from_env().context("loading configuration")?;
    let listen = std::env::var("DASHBOARD_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.into());

    let store = config.storage().open();
    let client = AuthClient::new(config, store);

    let status = client.restore().await;
    tracing::info!(?status, "Session restored");

    if !client.health_check().await {
        tracing::warn!("Backend health check failed, continuing");
    }

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    tracing::info!(%listen, "Dashboard listening");

    axum::serve(listener, shell_routes(client))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving dashboard")?;

    Ok(())
}
