// Shared helpers: run the stub backend (or any router) on a loopback port.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use mlbb_miniapp::advisor::FallbackAdvisor;
use mlbb_miniapp::api::{self, AppState};
use mlbb_miniapp::config::ClientConfig;
use mlbb_miniapp::db::Database;
use mlbb_miniapp::gateway::{Gateway, RetryPolicy};

pub const BOT_TOKEN: &str = "424242:stub-bot-token";

/// Serve `app` on 127.0.0.1 and return its base address.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Start the stub backend with an in-memory database.
pub async fn start_stub(bot_token: Option<&str>) -> String {
    let db = Database::new("sqlite::memory:").await.unwrap();
    let state = AppState::new(
        Arc::new(db),
        Arc::new(FallbackAdvisor),
        bot_token.map(str::to_string),
    );
    serve(api::router(state)).await
}

pub fn client_config(base: &str) -> ClientConfig {
    ClientConfig {
        api_base: base.to_string(),
        request_timeout: Duration::from_secs(5),
        max_retries: 0,
        page_url: None,
    }
}

/// Gateway without retries.
pub fn gateway(base: &str) -> Gateway {
    Gateway::new(&client_config(base)).unwrap()
}

pub fn gateway_with_retries(base: &str, max_retries: u32) -> Gateway {
    gateway(base).with_retry_policy(RetryPolicy {
        max_retries,
        backoff: Duration::from_millis(5),
    })
}

/// An address nothing is listening on.
pub async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
