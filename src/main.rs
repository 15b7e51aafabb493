// Local stub backend for the mini app: serves every gateway operation.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use mlbb_miniapp::advisor::FallbackAdvisor;
use mlbb_miniapp::api::{self, AppState};
use mlbb_miniapp::config::ServerConfig;
use mlbb_miniapp::db::Database;
use mlbb_miniapp::metrics;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load();
    metrics::register_metrics();

    if config.bot_token.is_none() {
        tracing::warn!("TELEGRAM_BOT_TOKEN is not set; /tg/verify will answer 503");
    }

    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");

    let state = AppState::new(Arc::new(db), Arc::new(FallbackAdvisor), config.bot_token.clone());
    let app = api::router(state).layer(api::cors_layer(&config.cors_origins));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Mini app stub backend listening on {addr}");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
