// Application configuration, loaded from environment variables and CLI flags.

use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Upper bound for `max_retries`; larger configured values are clamped.
pub const MAX_RETRIES_CAP: u32 = 10;

/// Client-side configuration: where the backend lives and how patient to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address all catalog paths are appended to.
    pub api_base: String,
    /// Per-call timeout, covering connect, send and body read.
    pub request_timeout: Duration,
    /// Extra attempts for idempotent endpoints.
    pub max_retries: u32,
    /// Address of the current page, for the dev-mode assertion fallback.
    pub page_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(15),
            max_retries: 2,
            page_url: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment and arguments.
    ///
    /// Environment variables:
    /// - `MINIAPP_API_BASE` - backend base address (default: `http://127.0.0.1:8000`)
    /// - `MINIAPP_TIMEOUT_SECS` - per-call timeout in seconds (default: 15)
    /// - `MINIAPP_MAX_RETRIES` - retries for idempotent calls (default: 2, at most 10)
    /// - `MINIAPP_PAGE_URL` - current page address
    ///
    /// CLI flags `--api-base`, `--timeout`, `--retries` and `--page-url`
    /// override the matching variables.
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base = parse_cli_value(args, "--api-base")
            .or_else(|| env("MINIAPP_API_BASE"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.api_base);

        let request_timeout = parse_cli_value(args, "--timeout")
            .or_else(|| env("MINIAPP_TIMEOUT_SECS"))
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let max_retries = parse_cli_value(args, "--retries")
            .or_else(|| env("MINIAPP_MAX_RETRIES"))
            .and_then(|v| v.parse::<u32>().ok())
            .map(|n| n.min(MAX_RETRIES_CAP))
            .unwrap_or(defaults.max_retries);

        let page_url = parse_cli_value(args, "--page-url").or_else(|| env("MINIAPP_PAGE_URL"));

        ClientConfig {
            api_base,
            request_timeout,
            max_retries,
            page_url,
        }
    }
}

/// Configuration for the local stub backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Bot token used to verify identity assertions. Verification answers
    /// 503 when unset.
    pub bot_token: Option<String>,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from the process environment and arguments.
    ///
    /// Environment variables:
    /// - `PORT` - HTTP server port (default: 8000)
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:miniapp.db?mode=rwc`)
    /// - `TELEGRAM_BOT_TOKEN` - bot token for assertion verification
    /// - `CORS_ORIGINS` - comma-separated origins (default: `http://localhost:5173`)
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        // Port: CLI flag --port takes precedence, then env var, then default
        let port = parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(8000);

        let database_url =
            env("DATABASE_URL").unwrap_or_else(|| "sqlite:miniapp.db?mode=rwc".to_string());

        let bot_token = env("TELEGRAM_BOT_TOKEN").filter(|t| !t.trim().is_empty());

        let cors_origins = env("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        ServerConfig {
            port,
            database_url,
            bot_token,
            cors_origins,
        }
    }
}

/// Parse a CLI flag value like `--port 8080`.
fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find_map(|pair| {
        if pair[0] == flag {
            Some(pair[1].clone())
        } else {
            None
        }
    })
}
