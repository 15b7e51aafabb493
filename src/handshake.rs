// Identity verification handshake.
//
// Sends the session's assertion to the backend exactly once, in the
// background, and publishes the resulting trust state. Nothing waits on it
// unless a caller explicitly asks to.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::gateway::types::TrustDecision;
use crate::gateway::{Gateway, RemoteError, TRANSPORT_STATUS};
use crate::metrics;
use crate::platform::IdentityAssertion;

/// Verification request failed at the transport or status level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identity verification failed: {status} {message}")]
pub struct VerificationFailed {
    pub status: u16,
    pub message: String,
}

impl From<RemoteError> for VerificationFailed {
    fn from(err: RemoteError) -> Self {
        Self {
            status: err.status,
            message: err.message,
        }
    }
}

/// How a handshake ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// No assertion from the host or the page address. Normal outside a host.
    NoAssertion,
    /// The backend answered with a decision (which may be `ok: false`).
    Decided(TrustDecision),
    Failed(VerificationFailed),
}

impl HandshakeOutcome {
    pub fn trust(&self) -> SessionTrust {
        match self {
            HandshakeOutcome::NoAssertion => SessionTrust::Unverified,
            HandshakeOutcome::Decided(decision) if decision.ok => {
                SessionTrust::Trusted(decision.clone())
            }
            HandshakeOutcome::Decided(_) => {
                SessionTrust::Rejected("backend rejected the identity assertion".to_string())
            }
            HandshakeOutcome::Failed(e) => SessionTrust::Rejected(e.to_string()),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            HandshakeOutcome::NoAssertion => "no_assertion",
            HandshakeOutcome::Decided(d) if d.ok => "trusted",
            HandshakeOutcome::Decided(_) => "rejected",
            HandshakeOutcome::Failed(_) => "failed",
        }
    }
}

/// Trust state of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTrust {
    /// No decision (yet, or ever: absent assertion).
    Unverified,
    Trusted(TrustDecision),
    Rejected(String),
}

impl SessionTrust {
    pub fn is_trusted(&self) -> bool {
        matches!(self, SessionTrust::Trusted(_))
    }
}

/// Returned by `SessionHandle::require_trusted` when the session is not trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UntrustedSession {
    #[error("session has no verified identity")]
    Unverified,
    #[error("session rejected: {0}")]
    Rejected(String),
}

/// Read side of the handshake result. Clone freely.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<Option<HandshakeOutcome>>,
}

impl SessionHandle {
    /// A handle that is already settled, e.g. for tests or when no handshake
    /// was attempted.
    pub fn settled(outcome: HandshakeOutcome) -> Self {
        let (_tx, rx) = watch::channel(Some(outcome));
        Self { rx }
    }

    /// Current trust state without waiting.
    pub fn trust(&self) -> SessionTrust {
        self.rx
            .borrow()
            .as_ref()
            .map(HandshakeOutcome::trust)
            .unwrap_or(SessionTrust::Unverified)
    }

    /// The outcome, if the handshake has finished.
    pub fn outcome(&self) -> Option<HandshakeOutcome> {
        self.rx.borrow().clone()
    }

    pub fn is_settled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait until the handshake finishes.
    pub async fn wait_settled(&self) -> HandshakeOutcome {
        let mut rx = self.rx.clone();
        let settled = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(HandshakeOutcome::NoAssertion),
            Err(_) => HandshakeOutcome::Failed(VerificationFailed {
                status: TRANSPORT_STATUS,
                message: "handshake ended without a decision".to_string(),
            }),
        };
        settled
    }

    /// Gate for callers that require a verified identity.
    pub fn require_trusted(&self) -> Result<TrustDecision, UntrustedSession> {
        match self.trust() {
            SessionTrust::Trusted(decision) => Ok(decision),
            SessionTrust::Unverified => Err(UntrustedSession::Unverified),
            SessionTrust::Rejected(reason) => Err(UntrustedSession::Rejected(reason)),
        }
    }
}

/// A single verification attempt. Consumed by `run` or `spawn`, so it
/// cannot be issued twice.
pub struct Handshake {
    gateway: Gateway,
    assertion: Option<IdentityAssertion>,
}

impl Handshake {
    pub fn new(gateway: Gateway, assertion: Option<IdentityAssertion>) -> Self {
        Self { gateway, assertion }
    }

    /// Perform the handshake. Never returns an error: failures are part of
    /// the outcome and are logged here.
    pub async fn run(self) -> HandshakeOutcome {
        let outcome = match self.assertion {
            None => {
                info!("No identity assertion available; skipping verification");
                HandshakeOutcome::NoAssertion
            }
            Some(assertion) => match self.gateway.verify_identity(assertion.as_str()).await {
                Ok(decision) => {
                    info!(ok = decision.ok, "Identity verification answered");
                    HandshakeOutcome::Decided(decision)
                }
                Err(e) => {
                    let failure = VerificationFailed::from(e);
                    warn!("{failure}");
                    HandshakeOutcome::Failed(failure)
                }
            },
        };

        metrics::HANDSHAKE_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();
        outcome
    }

    /// Run in the background and return the read handle immediately.
    pub fn spawn(self) -> SessionHandle {
        let (tx, rx) = watch::channel(None);
        tokio::spawn(async move {
            let outcome = self.run().await;
            tx.send_replace(Some(outcome));
        });
        SessionHandle { rx }
    }
}
