// Stub backend HTTP routes: every gateway catalog operation, backed by
// SQLite and the fallback advisor.

use axum::{
    extract::{Json, Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use rand::seq::SliceRandom;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::advisor::Advisor;
use crate::auth;
use crate::db::Database;
use crate::gateway::types::*;
use crate::metrics;
use crate::roster::{self, HEROES};

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub advisor: Arc<dyn Advisor>,
    /// Bot token for assertion verification; `None` disables `/tg/verify`.
    pub bot_token: Option<String>,
}

impl AppState {
    pub fn new(db: Arc<Database>, advisor: Arc<dyn Advisor>, bot_token: Option<String>) -> Self {
        Self {
            db,
            advisor,
            bot_token,
        }
    }
}

// ── Error helper ──────────────────────────────────────────────────────

pub fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn internal_error(e: sqlx::Error) -> impl IntoResponse {
    tracing::error!("Database error: {e}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "DB error")
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Heroes
        .route("/heroes/remaining", get(heroes_remaining))
        .route("/heroes/pick", post(pick_hero))
        .route("/heroes/mark-used", post(mark_used))
        .route("/heroes/reset", post(reset_heroes))
        // AI
        .route("/ai/counter-pick", post(counter_pick))
        .route("/ai/tier-list", post(tier_list))
        .route("/ai/patch-explain", post(patch_explain))
        // Quiz
        .route("/quiz/generate", post(quiz_generate))
        .route("/quiz/check", post(quiz_check))
        // Daily challenge
        .route("/daily/generate", post(daily_generate))
        // Identity
        .route("/tg/verify", post(auth::tg_verify))
        // Diagnostics
        .route("/debug/ai-ping", get(ai_ping))
        .route("/metrics", get(metrics_endpoint))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// CORS for the configured front-end origins. Unparseable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = metrics::normalize_path(req.uri().path());
    let response = next.run(req).await;
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, response.status().as_str()])
        .inc();
    response
}

// ── Diagnostics ───────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn ai_ping(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.advisor.ping())
}

async fn metrics_endpoint() -> impl IntoResponse {
    metrics::gather_metrics()
}

// ── Heroes ────────────────────────────────────────────────────────────

async fn remaining_heroes(db: &Database) -> Result<(Vec<String>, u32), sqlx::Error> {
    let used: std::collections::HashSet<String> =
        db.used_heroes().await?.into_iter().map(|u| u.hero).collect();
    let remaining: Vec<String> = HEROES
        .iter()
        .filter(|h| !used.contains(**h))
        .map(|h| h.to_string())
        .collect();
    let used_count = (HEROES.len() - remaining.len()) as u32;
    Ok((remaining, used_count))
}

async fn heroes_remaining(State(state): State<AppState>) -> impl IntoResponse {
    match remaining_heroes(&state.db).await {
        Ok((remaining, used_count)) => (
            StatusCode::OK,
            Json(HeroesRemaining {
                remaining,
                used_count,
                total: HEROES.len() as u32,
            }),
        )
            .into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn pick_hero(State(state): State<AppState>) -> impl IntoResponse {
    let remaining = match remaining_heroes(&state.db).await {
        Ok((remaining, _)) => remaining,
        Err(e) => return internal_error(e).into_response(),
    };
    let Some(hero) = remaining.choose(&mut rand::thread_rng()).cloned() else {
        return json_error(StatusCode::CONFLICT, "All heroes used. Reset needed.").into_response();
    };
    (StatusCode::OK, Json(PickedHero { hero })).into_response()
}

async fn mark_used(
    State(state): State<AppState>,
    Json(req): Json<MarkUsedRequest>,
) -> impl IntoResponse {
    if !roster::is_known(&req.hero) {
        return json_error(
            StatusCode::BAD_REQUEST,
            &format!("Unknown hero {:?}", req.hero),
        )
        .into_response();
    }
    let posted_at = now_iso();
    match state.db.mark_hero_used(&req.hero, &posted_at).await {
        Ok(newly_marked) => {
            if !newly_marked {
                tracing::debug!(hero = %req.hero, "Hero already marked used");
            }
            (
                StatusCode::OK,
                Json(json!({ "ok": true, "hero": req.hero, "posted_at": posted_at })),
            )
                .into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}

async fn reset_heroes(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.reset_heroes().await {
        Ok(cleared) => {
            tracing::info!(cleared, "Hero pool reset");
            (StatusCode::OK, Json(json!({ "ok": true, "cleared": cleared }))).into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}

// ── AI ────────────────────────────────────────────────────────────────

async fn counter_pick(
    State(state): State<AppState>,
    Json(req): Json<CounterPickRequest>,
) -> impl IntoResponse {
    let enemy = req.enemy.trim();
    if enemy.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "enemy is required").into_response();
    }
    let answer = state
        .advisor
        .counter_pick(enemy, req.lane.as_deref(), req.role.as_deref());
    (
        StatusCode::OK,
        Json(CounterPick {
            enemy: req.enemy.clone(),
            answer,
        }),
    )
        .into_response()
}

async fn tier_list(
    State(state): State<AppState>,
    Json(req): Json<TierListRequest>,
) -> impl IntoResponse {
    Json(state.advisor.tier_list(&req))
}

async fn patch_explain(
    State(state): State<AppState>,
    Json(req): Json<PatchExplainRequest>,
) -> impl IntoResponse {
    Json(PatchSummary {
        summary: state.advisor.explain_patch(&req.notes_text),
    })
}

// ── Quiz ──────────────────────────────────────────────────────────────

async fn quiz_generate(
    State(state): State<AppState>,
    Json(req): Json<QuizGenerateRequest>,
) -> impl IntoResponse {
    let draft = state.advisor.quiz(req.topic.as_deref(), req.difficulty);
    let saved = state
        .db
        .save_quiz(
            &draft.question,
            &draft.options,
            draft.correct_index,
            draft.explanation.as_deref(),
            &now_iso(),
        )
        .await;
    match saved {
        Ok(quiz_id) => (
            StatusCode::OK,
            Json(QuizQuestion {
                quiz_id,
                question: draft.question,
                options: draft.options,
                correct_index: draft.correct_index,
                explanation: draft.explanation,
            }),
        )
            .into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn quiz_check(
    State(state): State<AppState>,
    Json(req): Json<QuizCheckRequest>,
) -> impl IntoResponse {
    let quiz = match state.db.get_quiz(req.quiz_id).await {
        Ok(Some(q)) => q,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Quiz not found").into_response(),
        Err(e) => return internal_error(e).into_response(),
    };
    let options = match quiz.options() {
        Ok(o) => o,
        Err(e) => {
            tracing::error!(quiz_id = quiz.id, "Corrupt stored quiz options: {e}");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "DB error").into_response();
        }
    };
    (
        StatusCode::OK,
        Json(QuizVerdict {
            correct: req.answer_index == quiz.correct_index,
            correct_index: quiz.correct_index,
            explanation: quiz.explanation.unwrap_or_default(),
            question: quiz.question,
            options,
        }),
    )
        .into_response()
}

// ── Daily challenge ───────────────────────────────────────────────────

async fn daily_generate(State(state): State<AppState>) -> impl IntoResponse {
    let today = chrono::Utc::now().date_naive().to_string();

    match state.db.get_daily_challenge(&today).await {
        Ok(Some(existing)) => {
            return (
                StatusCode::OK,
                Json(DailyChallenge {
                    date: today,
                    text: existing.text,
                    cached: true,
                }),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => return internal_error(e).into_response(),
    }

    let text = state.advisor.daily_challenge();
    match state.db.save_daily_challenge(&today, &text, &now_iso()).await {
        Ok(stored) => (
            StatusCode::OK,
            Json(DailyChallenge {
                date: stored.date,
                text: stored.text,
                cached: false,
            }),
        )
            .into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}
