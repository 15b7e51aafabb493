// Bridge to an optional host embedding SDK.
//
// The host is injected once at startup as a `PlatformProvider`: `Embedded`
// wraps a real host, `Standalone` is the plain-browser no-op. Every host
// interaction is best-effort; failures are logged and swallowed.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

/// Opaque identity string issued by the host. Forwarded verbatim, never parsed.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityAssertion(String);

impl IdentityAssertion {
    /// Wrap a raw assertion. Empty strings count as absent.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Assertions are credentials; keep them out of logs.
impl fmt::Debug for IdentityAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityAssertion({} bytes)", self.0.len())
    }
}

/// Failure reported by a host SDK call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("host does not support {0}")]
    Unsupported(&'static str),
    #[error("host call failed: {0}")]
    Failed(String),
}

/// Color scheme reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(ColorScheme::Light),
            "dark" => Some(ColorScheme::Dark),
            _ => None,
        }
    }
}

/// Styling hints gathered during initialization. Not part of the trust path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayHints {
    pub color_scheme: Option<ColorScheme>,
}

/// The host embedding SDK. Every method has a default meaning "not
/// available", so partial hosts only implement what they have.
pub trait HostSdk: Send + Sync {
    /// Signal that the app is ready to be shown.
    fn ready(&self) -> Result<(), HostError> {
        Err(HostError::Unsupported("ready"))
    }

    /// Ask the host to expand the app to the full viewport.
    fn expand(&self) -> Result<(), HostError> {
        Err(HostError::Unsupported("expand"))
    }

    /// Raw color scheme name, if the host reports one.
    fn color_scheme(&self) -> Option<String> {
        None
    }

    /// Raw identity assertion, if the host provides one.
    fn init_data(&self) -> Option<String> {
        None
    }
}

/// An embedded host plus its one-shot initialization state.
pub struct EmbeddedHost {
    sdk: Arc<dyn HostSdk>,
    initialized: OnceLock<DisplayHints>,
}

impl EmbeddedHost {
    pub fn new(sdk: Arc<dyn HostSdk>) -> Self {
        Self {
            sdk,
            initialized: OnceLock::new(),
        }
    }

    fn run_lifecycle(&self) -> DisplayHints {
        if let Err(e) = host_call("ready", || self.sdk.ready()) {
            debug!("Host ready() skipped: {e}");
        }
        if let Err(e) = host_call("expand", || self.sdk.expand()) {
            debug!("Host expand() skipped: {e}");
        }

        let color_scheme = host_call("color_scheme", || Ok(self.sdk.color_scheme()))
            .ok()
            .flatten()
            .and_then(|raw| {
                let parsed = ColorScheme::parse(&raw);
                if parsed.is_none() {
                    debug!("Ignoring unknown host color scheme {raw:?}");
                }
                parsed
            });

        info!(?color_scheme, "Embedded host initialized");
        DisplayHints { color_scheme }
    }
}

/// Run one host SDK call. A panicking host is reported as `HostError::Failed`.
fn host_call<T>(
    op: &'static str,
    f: impl FnOnce() -> Result<T, HostError>,
) -> Result<T, HostError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        warn!("Host {op}() panicked");
        Err(HostError::Failed(format!("{op} panicked")))
    })
}

/// The active hosting platform, chosen once at startup.
pub enum PlatformProvider {
    Embedded(EmbeddedHost),
    Standalone,
}

impl PlatformProvider {
    pub fn embedded(sdk: Arc<dyn HostSdk>) -> Self {
        PlatformProvider::Embedded(EmbeddedHost::new(sdk))
    }

    /// `Embedded` when a host object was detected, `Standalone` otherwise.
    pub fn detect(host: Option<Arc<dyn HostSdk>>) -> Self {
        match host {
            Some(sdk) => Self::embedded(sdk),
            None => PlatformProvider::Standalone,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, PlatformProvider::Embedded(_))
    }

    /// Run the host lifecycle (ready, expand, read color scheme). Idempotent:
    /// the host is signalled on the first call only. Never fails.
    pub fn initialize(&self) -> DisplayHints {
        match self {
            PlatformProvider::Embedded(host) => {
                *host.initialized.get_or_init(|| host.run_lifecycle())
            }
            PlatformProvider::Standalone => DisplayHints::default(),
        }
    }

    /// The host-provided assertion, or `None` when there is no host or it
    /// carries no assertion.
    pub fn extract_assertion(&self) -> Option<IdentityAssertion> {
        match self {
            PlatformProvider::Embedded(host) => host_call("init_data", || Ok(host.sdk.init_data()))
                .ok()
                .flatten()
                .and_then(IdentityAssertion::new),
            PlatformProvider::Standalone => None,
        }
    }
}

impl fmt::Debug for PlatformProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformProvider::Embedded(_) => write!(f, "PlatformProvider::Embedded"),
            PlatformProvider::Standalone => write!(f, "PlatformProvider::Standalone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeHost {
        ready_calls: AtomicUsize,
        expand_calls: AtomicUsize,
        init_data: Option<String>,
        scheme: Option<String>,
        fail_ready: bool,
    }

    impl HostSdk for FakeHost {
        fn ready(&self) -> Result<(), HostError> {
            self.ready_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_ready {
                Err(HostError::Failed("boom".into()))
            } else {
                Ok(())
            }
        }

        fn expand(&self) -> Result<(), HostError> {
            self.expand_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn color_scheme(&self) -> Option<String> {
            self.scheme.clone()
        }

        fn init_data(&self) -> Option<String> {
            self.init_data.clone()
        }
    }

    /// A host that implements nothing at all.
    struct BareHost;
    impl HostSdk for BareHost {}

    #[test]
    fn test_initialize_signals_host_once() {
        let host = Arc::new(FakeHost {
            scheme: Some("dark".into()),
            ..FakeHost::default()
        });
        let platform = PlatformProvider::embedded(host.clone());

        let hints = platform.initialize();
        let again = platform.initialize();

        assert_eq!(hints.color_scheme, Some(ColorScheme::Dark));
        assert_eq!(hints, again);
        assert_eq!(host.ready_calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.expand_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_initialize_swallows_host_failures() {
        let host = Arc::new(FakeHost {
            fail_ready: true,
            scheme: Some("sepia".into()),
            ..FakeHost::default()
        });
        let platform = PlatformProvider::embedded(host.clone());
        let hints = platform.initialize();
        assert_eq!(hints.color_scheme, None);
        // expand still attempted after ready failed
        assert_eq!(host.expand_calls.load(Ordering::SeqCst), 1);

        let bare = PlatformProvider::embedded(Arc::new(BareHost));
        assert_eq!(bare.initialize(), DisplayHints::default());
        assert!(bare.extract_assertion().is_none());
    }

    /// A host whose every call panics.
    struct PanickingHost;
    impl HostSdk for PanickingHost {
        fn ready(&self) -> Result<(), HostError> {
            panic!("bridge crashed");
        }

        fn expand(&self) -> Result<(), HostError> {
            panic!("bridge crashed");
        }

        fn color_scheme(&self) -> Option<String> {
            panic!("bridge crashed");
        }

        fn init_data(&self) -> Option<String> {
            panic!("bridge crashed");
        }
    }

    #[test]
    fn test_panicking_host_does_not_escape() {
        let platform = PlatformProvider::embedded(Arc::new(PanickingHost));
        assert_eq!(platform.initialize(), DisplayHints::default());
        assert!(platform.extract_assertion().is_none());
    }

    #[test]
    fn test_extract_assertion() {
        let host = Arc::new(FakeHost {
            init_data: Some("query_id=1&hash=ab".into()),
            ..FakeHost::default()
        });
        let platform = PlatformProvider::embedded(host);
        assert_eq!(
            platform.extract_assertion().unwrap().as_str(),
            "query_id=1&hash=ab"
        );
    }

    #[test]
    fn test_empty_host_assertion_is_absent() {
        let host = Arc::new(FakeHost {
            init_data: Some(String::new()),
            ..FakeHost::default()
        });
        assert!(PlatformProvider::embedded(host).extract_assertion().is_none());
    }

    #[test]
    fn test_standalone_is_inert() {
        let platform = PlatformProvider::detect(None);
        assert!(!platform.is_embedded());
        assert_eq!(platform.initialize(), DisplayHints::default());
        assert!(platform.extract_assertion().is_none());
    }

    #[test]
    fn test_assertion_debug_hides_content() {
        let a = IdentityAssertion::new("user=secret&hash=ff").unwrap();
        let shown = format!("{a:?}");
        assert!(!shown.contains("secret"));
    }
}
