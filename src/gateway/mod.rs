// Typed remote gateway: the single point of contact between views and the
// backend. Every call goes through `Gateway::call`, which owns transport,
// timeout, retry and error translation.

pub mod catalog;
pub mod error;
pub mod types;

use std::time::{Duration, Instant};

use serde::de::IgnoredAny;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::metrics;
use catalog::{op, Endpoint, HttpMethod, Operation};
pub use error::{RemoteError, RemoteErrorKind, TRANSPORT_STATUS};
use types::*;

/// Errors raised while constructing a gateway.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid API base address {0:?}: {1}")]
    InvalidBase(String, url::ParseError),
    #[error("API base address must be http or https, got {0:?}")]
    UnsupportedScheme(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Bounded retry for idempotent endpoints. Writes are attempted once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Total attempts allowed for `endpoint`.
    pub fn attempts_for(&self, endpoint: &Endpoint) -> u32 {
        if endpoint.idempotent {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: reqwest::Client,
    base: String,
    retry: RetryPolicy,
}

impl Gateway {
    pub fn new(config: &ClientConfig) -> Result<Self, BuildError> {
        let base = normalize_base(&config.api_base)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                ..RetryPolicy::default()
            },
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Invoke a catalog operation. Yields either the fully decoded response
    /// or a `RemoteError`; nothing in between.
    pub async fn call<O: Operation>(&self, request: &O::Request) -> Result<O::Response, RemoteError> {
        let endpoint = O::ENDPOINT;
        let attempts = self.retry.attempts_for(&endpoint);
        let started = Instant::now();

        let mut attempt = 1;
        let result = loop {
            match self.send_once::<O>(&endpoint, request).await {
                Err(e) if attempt < attempts && e.is_transient() => {
                    warn!(
                        operation = endpoint.name,
                        attempt,
                        error = %e,
                        "Transient gateway failure, retrying"
                    );
                    metrics::GATEWAY_RETRIES_TOTAL
                        .with_label_values(&[endpoint.name])
                        .inc();
                    tokio::time::sleep(self.retry.backoff.saturating_mul(attempt)).await;
                    attempt += 1;
                }
                other => break other,
            }
        };

        let outcome = match &result {
            Ok(_) => "ok".to_string(),
            Err(e) => e.outcome_label(),
        };
        metrics::GATEWAY_REQUESTS_TOTAL
            .with_label_values(&[endpoint.name, &outcome])
            .inc();
        metrics::GATEWAY_REQUEST_DURATION_SECONDS
            .with_label_values(&[endpoint.name])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn send_once<O: Operation>(
        &self,
        endpoint: &Endpoint,
        request: &O::Request,
    ) -> Result<O::Response, RemoteError> {
        let url = self.url_for(endpoint.path);
        debug!(operation = endpoint.name, method = endpoint.method.as_str(), %url, "Gateway call");

        let builder = match endpoint.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url).json(request),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure_from_response(response).await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::from_reqwest(&e))?;

        serde_json::from_slice::<O::Response>(&body).map_err(|e| {
            RemoteError::decode(
                status.as_u16(),
                format!("invalid {} response: {e}", endpoint.name),
            )
        })
    }

    // ── Catalog operations ───────────────────────────────────────────

    pub async fn health(&self) -> Result<Health, RemoteError> {
        self.call::<op::Health>(&()).await
    }

    pub async fn heroes_remaining(&self) -> Result<HeroesRemaining, RemoteError> {
        self.call::<op::HeroesRemaining>(&()).await
    }

    pub async fn pick_hero(&self) -> Result<PickedHero, RemoteError> {
        self.call::<op::PickHero>(&EmptyBody {}).await
    }

    /// The response body is decoded but otherwise ignored.
    pub async fn mark_used(&self, hero: &str) -> Result<(), RemoteError> {
        let _: IgnoredAny = self
            .call::<op::MarkUsed>(&MarkUsedRequest {
                hero: hero.to_string(),
            })
            .await?;
        Ok(())
    }

    pub async fn counter_pick(
        &self,
        enemy: &str,
        lane: Option<&str>,
        role: Option<&str>,
    ) -> Result<CounterPick, RemoteError> {
        let req = CounterPickRequest {
            enemy: enemy.to_string(),
            lane: lane.map(str::to_string),
            role: role.map(str::to_string),
        };
        self.call::<op::CounterPick>(&req).await
    }

    pub async fn tier_list(&self, req: &TierListRequest) -> Result<TierList, RemoteError> {
        self.call::<op::TierList>(req).await
    }

    pub async fn quiz_generate(
        &self,
        topic: Option<&str>,
        difficulty: Difficulty,
    ) -> Result<QuizQuestion, RemoteError> {
        let req = QuizGenerateRequest {
            topic: topic.map(str::to_string),
            difficulty,
        };
        self.call::<op::QuizGenerate>(&req).await
    }

    pub async fn quiz_check(&self, quiz_id: i64, answer_index: i64) -> Result<QuizVerdict, RemoteError> {
        self.call::<op::QuizCheck>(&QuizCheckRequest {
            quiz_id,
            answer_index,
        })
        .await
    }

    pub async fn daily_generate(&self) -> Result<DailyChallenge, RemoteError> {
        self.call::<op::DailyGenerate>(&EmptyBody {}).await
    }

    pub async fn patch_explain(&self, notes_text: &str) -> Result<PatchSummary, RemoteError> {
        self.call::<op::PatchExplain>(&PatchExplainRequest {
            notes_text: notes_text.to_string(),
        })
        .await
    }

    pub async fn verify_identity(&self, init_data: &str) -> Result<TrustDecision, RemoteError> {
        self.call::<op::VerifyIdentity>(&VerifyRequest {
            init_data: init_data.to_string(),
        })
        .await
    }

    pub async fn ai_ping(&self) -> Result<AiPing, RemoteError> {
        self.call::<op::AiPing>(&()).await
    }
}

/// Read a failed response into a `RemoteError`, falling back to the
/// status's reason phrase when the body is empty or unreadable.
async fn failure_from_response(response: reqwest::Response) -> RemoteError {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    let message = match response.text().await {
        Ok(body) if !body.trim().is_empty() => body,
        _ => reason.to_string(),
    };
    RemoteError::status(status.as_u16(), message)
}

fn normalize_base(raw: &str) -> Result<String, BuildError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed =
        url::Url::parse(trimmed).map_err(|e| BuildError::InvalidBase(raw.to_string(), e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BuildError::UnsupportedScheme(raw.to_string()));
    }
    Ok(trimmed.to_string())
}
