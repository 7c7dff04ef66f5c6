use std::sync::Arc;
use std::time::Duration;

use guess_server::config;
use guess_server::fetcher::HttpGameSource;
use guess_server::routes;
use guess_server::session::{SessionLimits, SessionRegistry};

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();
    tracing::info!(
        backend = %config.backend_url,
        chess_com = %config.chess_com_api_url,
        frequent_users = config.fetch.frequent_users.len(),
        "Loaded configuration"
    );

    let source = HttpGameSource::from_config(&config).context("Failed to build HTTP clients")?;
    let limits = SessionLimits {
        idle_ttl: Duration::from_secs(config.session_idle_ttl_secs),
        max_sessions: config.max_sessions,
    };
    let registry =
        Arc::new(SessionRegistry::new(source, config.fetch.clone()).with_limits(limits));

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(registry).layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
