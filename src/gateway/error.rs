// Normalized failure shape for every gateway call.

use std::fmt;

/// Status marker used when no HTTP response was received at all.
pub const TRANSPORT_STATUS: u16 = 0;

/// What went wrong, beyond the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The backend answered with a non-2xx status.
    Status,
    /// Connection refused, reset, DNS failure, etc.
    Transport,
    /// The per-call timeout elapsed before a response arrived.
    Timeout,
    /// A 2xx response whose body does not match the declared response shape.
    Decode,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteErrorKind::Status => write!(f, "status"),
            RemoteErrorKind::Transport => write!(f, "transport"),
            RemoteErrorKind::Timeout => write!(f, "timeout"),
            RemoteErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// The only error a gateway call returns. Views display `status` and
/// `message` as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status} {message}")]
pub struct RemoteError {
    pub status: u16,
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: RemoteErrorKind::Status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: TRANSPORT_STATUS,
            kind: RemoteErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            status: TRANSPORT_STATUS,
            kind: RemoteErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: RemoteErrorKind::Decode,
            message: message.into(),
        }
    }

    /// Classify a `reqwest` error raised before a response was available.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }

    /// Whether the failure may clear up on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            RemoteErrorKind::Transport | RemoteErrorKind::Timeout => true,
            RemoteErrorKind::Status => matches!(self.status, 502..=504),
            RemoteErrorKind::Decode => false,
        }
    }

    /// Short label for metrics.
    pub fn outcome_label(&self) -> String {
        match self.kind {
            RemoteErrorKind::Status => self.status.to_string(),
            other => other.to_string(),
        }
    }
}
