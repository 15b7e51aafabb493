// End-to-end start-up: platform detection, assertion lookup and the
// background verification handshake against the stub backend.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use common::*;
use mlbb_miniapp::auth::sign_init_data;
use mlbb_miniapp::dev_mode::{AssertionSource, INIT_DATA_PARAM};
use mlbb_miniapp::handshake::{HandshakeOutcome, SessionTrust, UntrustedSession};
use mlbb_miniapp::platform::{ColorScheme, HostError, HostSdk, PlatformProvider};
use mlbb_miniapp::MiniApp;

struct TestHost {
    init_data: Option<String>,
    broken: bool,
}

impl HostSdk for TestHost {
    fn ready(&self) -> Result<(), HostError> {
        if self.broken {
            Err(HostError::Failed("bridge not attached".into()))
        } else {
            Ok(())
        }
    }

    fn expand(&self) -> Result<(), HostError> {
        if self.broken {
            Err(HostError::Failed("bridge not attached".into()))
        } else {
            Ok(())
        }
    }

    fn color_scheme(&self) -> Option<String> {
        Some("dark".into())
    }

    fn init_data(&self) -> Option<String> {
        self.init_data.clone()
    }
}

fn host(init_data: Option<String>) -> PlatformProvider {
    PlatformProvider::embedded(Arc::new(TestHost {
        init_data,
        broken: false,
    }))
}

fn signed_assertion(token: &str) -> String {
    sign_init_data(
        &[
            ("auth_date", "1760000000"),
            ("query_id", "AAHdF6IQ"),
            ("user", r#"{"id":777,"first_name":"Rin","username":"rin_mlbb"}"#),
        ],
        token,
    )
}

#[tokio::test]
async fn test_embedded_host_assertion_is_trusted() {
    let base = start_stub(Some(BOT_TOKEN)).await;
    let app = MiniApp::start(&client_config(&base), host(Some(signed_assertion(BOT_TOKEN)))).unwrap();

    assert_eq!(app.assertion_source(), Some(AssertionSource::Host));
    assert_eq!(app.display_hints().color_scheme, Some(ColorScheme::Dark));

    let outcome = app.session().wait_settled().await;
    let SessionTrust::Trusted(decision) = outcome.trust() else {
        panic!("expected trusted session, got {outcome:?}");
    };
    let user = decision.user.unwrap();
    assert_eq!(user.id, 777);
    assert_eq!(user.username.as_deref(), Some("rin_mlbb"));
    assert_eq!(decision.auth_date.as_deref(), Some("1760000000"));
    assert_eq!(decision.query_id.as_deref(), Some("AAHdF6IQ"));

    assert!(app.trust().is_trusted());
    assert!(app.session().require_trusted().is_ok());
}

#[tokio::test]
async fn test_standalone_reads_assertion_from_page_url() {
    let base = start_stub(Some(BOT_TOKEN)).await;
    let page = url::Url::parse_with_params(
        "http://localhost:5173/",
        &[(INIT_DATA_PARAM, signed_assertion(BOT_TOKEN))],
    )
    .unwrap();
    let mut config = client_config(&base);
    config.page_url = Some(page.to_string());

    let app = MiniApp::start(&config, PlatformProvider::Standalone).unwrap();
    assert_eq!(app.assertion_source(), Some(AssertionSource::PageUrl));
    assert_eq!(app.display_hints().color_scheme, None);

    app.session().wait_settled().await;
    assert!(app.trust().is_trusted());
}

#[tokio::test]
async fn test_host_assertion_wins_over_page_url() {
    let base = start_stub(Some(BOT_TOKEN)).await;
    let mut config = client_config(&base);
    config.page_url = Some("http://localhost:5173/?initData=garbage".into());

    let app = MiniApp::start(&config, host(Some(signed_assertion(BOT_TOKEN)))).unwrap();
    assert_eq!(app.assertion_source(), Some(AssertionSource::Host));
    app.session().wait_settled().await;
    assert!(app.trust().is_trusted());
}

#[tokio::test]
async fn test_bad_signature_is_rejected_but_app_keeps_working() {
    let base = start_stub(Some(BOT_TOKEN)).await;
    let forged = signed_assertion("999:some-other-bot");
    let app = MiniApp::start(&client_config(&base), host(Some(forged))).unwrap();

    let outcome = app.session().wait_settled().await;
    let HandshakeOutcome::Failed(failure) = &outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.status, 401);
    assert!(failure.message.contains("Invalid init_data hash"));
    assert!(matches!(app.trust(), SessionTrust::Rejected(_)));
    assert!(matches!(
        app.session().require_trusted(),
        Err(UntrustedSession::Rejected(_))
    ));

    // trust state does not gate ordinary calls
    let remaining = app.gateway().heroes_remaining().await.unwrap();
    assert!(!remaining.remaining.is_empty());
}

#[tokio::test]
async fn test_missing_token_on_server_fails_verification() {
    let base = start_stub(None).await;
    let app = MiniApp::start(&client_config(&base), host(Some(signed_assertion(BOT_TOKEN)))).unwrap();

    let outcome = app.session().wait_settled().await;
    let HandshakeOutcome::Failed(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.status, 503);
    assert!(matches!(app.trust(), SessionTrust::Rejected(_)));
}

fn counting_backend(verify_hits: Arc<AtomicUsize>, verify_delay: Duration) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route(
            "/tg/verify",
            post(move || {
                let hits = verify_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(verify_delay).await;
                    Json(json!({ "ok": true }))
                }
            }),
        )
}

#[tokio::test]
async fn test_no_assertion_never_contacts_verify() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(counting_backend(hits.clone(), Duration::ZERO)).await;

    let app = MiniApp::start(&client_config(&base), host(None)).unwrap();
    assert_eq!(app.assertion_source(), None);

    let outcome = app.session().wait_settled().await;
    assert_eq!(outcome, HandshakeOutcome::NoAssertion);
    assert_eq!(app.trust(), SessionTrust::Unverified);
    assert_eq!(app.gateway().health().await.unwrap().status, "ok");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_host_assertion_counts_as_absent() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(counting_backend(hits.clone(), Duration::ZERO)).await;

    let app = MiniApp::start(&client_config(&base), host(Some(String::new()))).unwrap();
    assert_eq!(app.session().wait_settled().await, HandshakeOutcome::NoAssertion);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_start_does_not_wait_for_verification() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(counting_backend(hits.clone(), Duration::from_millis(500))).await;

    let app = MiniApp::start(&client_config(&base), host(Some("user=x&hash=00".into()))).unwrap();
    assert!(!app.session().is_settled());
    assert_eq!(app.trust(), SessionTrust::Unverified);

    // other calls proceed while verification is in flight
    assert_eq!(app.gateway().health().await.unwrap().status, "ok");
    assert!(!app.session().is_settled());

    app.session().wait_settled().await;
    assert!(app.trust().is_trusted());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_broken_host_still_starts() {
    let base = start_stub(Some(BOT_TOKEN)).await;
    let platform = PlatformProvider::embedded(Arc::new(TestHost {
        init_data: Some(signed_assertion(BOT_TOKEN)),
        broken: true,
    }));

    let app = MiniApp::start(&client_config(&base), platform).unwrap();
    assert!(app.platform().is_embedded());
    assert_eq!(app.display_hints().color_scheme, Some(ColorScheme::Dark));

    app.session().wait_settled().await;
    assert!(app.trust().is_trusted());
}

#[tokio::test]
async fn test_verification_against_unreachable_backend() {
    let base = dead_address().await;
    let app = MiniApp::start(&client_config(&base), host(Some(signed_assertion(BOT_TOKEN)))).unwrap();

    let HandshakeOutcome::Failed(failure) = app.session().wait_settled().await else {
        panic!("expected failure");
    };
    assert_eq!(failure.status, 0);
    assert!(matches!(app.trust(), SessionTrust::Rejected(_)));
}

#[test]
fn test_invalid_base_is_a_start_error() {
    let config = client_config("ftp://example.com");
    assert!(MiniApp::start(&config, PlatformProvider::Standalone).is_err());
}
