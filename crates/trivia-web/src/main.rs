//! Trivia relay server.
//!
//! Run with: cargo run -p trivia-web --bin trivia-relay

use tracing::info;
use tracing_subscriber::EnvFilter;
use trivia_common::RelayConfig;
use trivia_web::{router::build_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trivia=debug,tower_http=info,info")),
        )
        .init();

    info!("Trivia relay starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Refuse to serve without a key
    let config = match RelayConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            return Err(e.into());
        }
    };

    let model_names: Vec<&str> = config.models.iter().map(|m| m.name.as_str()).collect();
    info!(
        models = ?model_names,
        timeout_secs = config.settings.timeout_secs,
        "Model fallback order loaded"
    );

    let state = AppState::from_config(&config)?;
    let router = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Trivia relay listening on http://{}", bind_addr);
    info!("API key held server-side; clients never see it");

    axum::serve(listener, router).await?;

    Ok(())
}
