// Application start: platform lifecycle, assertion lookup, background
// verification, and the gateway handed to views.

use tracing::info;

use crate::config::ClientConfig;
use crate::dev_mode::{resolve_assertion, AssertionSource};
use crate::gateway::{BuildError, Gateway};
use crate::handshake::{Handshake, SessionHandle, SessionTrust};
use crate::platform::{DisplayHints, PlatformProvider};

/// Everything a view needs after start-up.
#[derive(Debug)]
pub struct MiniApp {
    platform: PlatformProvider,
    gateway: Gateway,
    session: SessionHandle,
    hints: DisplayHints,
    assertion_source: Option<AssertionSource>,
}

impl MiniApp {
    /// Start the app. Must be called inside a tokio runtime: the
    /// verification handshake is spawned and not awaited here.
    ///
    /// Only an unusable configuration fails; host problems and a missing
    /// assertion never do.
    pub fn start(config: &ClientConfig, platform: PlatformProvider) -> Result<Self, BuildError> {
        let gateway = Gateway::new(config)?;
        let hints = platform.initialize();

        let resolved = resolve_assertion(&platform, config.page_url.as_deref());
        let assertion_source = resolved.as_ref().map(|(_, source)| *source);
        info!(
            embedded = platform.is_embedded(),
            ?assertion_source,
            api_base = gateway.base(),
            "Mini app starting"
        );

        let session = Handshake::new(gateway.clone(), resolved.map(|(a, _)| a)).spawn();

        Ok(Self {
            platform,
            gateway,
            session,
            hints,
            assertion_source,
        })
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn trust(&self) -> SessionTrust {
        self.session.trust()
    }

    pub fn display_hints(&self) -> DisplayHints {
        self.hints
    }

    pub fn assertion_source(&self) -> Option<AssertionSource> {
        self.assertion_source
    }

    pub fn platform(&self) -> &PlatformProvider {
        &self.platform
    }
}
