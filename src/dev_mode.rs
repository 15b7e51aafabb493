// Dev-mode identity source: read the assertion from the page address when
// the app runs outside an embedding host.

use url::Url;

use crate::platform::{IdentityAssertion, PlatformProvider};

/// Query parameter carrying the assertion in dev mode.
pub const INIT_DATA_PARAM: &str = "initData";

/// Where an assertion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionSource {
    Host,
    PageUrl,
}

/// Read `initData` from a page address. Unparseable addresses, a missing
/// parameter and an empty value are all "absent".
pub fn extract_from_url(page_url: &str) -> Option<IdentityAssertion> {
    let url = Url::parse(page_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == INIT_DATA_PARAM)
        .and_then(|(_, value)| IdentityAssertion::new(value.into_owned()))
}

/// Host assertion first, page address second.
pub fn resolve_assertion(
    platform: &PlatformProvider,
    page_url: Option<&str>,
) -> Option<(IdentityAssertion, AssertionSource)> {
    if let Some(assertion) = platform.extract_assertion() {
        return Some((assertion, AssertionSource::Host));
    }
    page_url
        .and_then(extract_from_url)
        .map(|assertion| (assertion, AssertionSource::PageUrl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HostSdk;
    use std::sync::Arc;

    struct HostWith(&'static str);
    impl HostSdk for HostWith {
        fn init_data(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn test_extract_from_url() {
        let a = extract_from_url("http://localhost:5173/?initData=user%3D1%26hash%3Dab").unwrap();
        // query values are percent-decoded once
        assert_eq!(a.as_str(), "user=1&hash=ab");
    }

    #[test]
    fn test_extract_from_url_absent_cases() {
        assert!(extract_from_url("http://localhost:5173/").is_none());
        assert!(extract_from_url("http://localhost:5173/?initData=").is_none());
        assert!(extract_from_url("http://localhost:5173/?other=1").is_none());
        assert!(extract_from_url("not a url").is_none());
        // fragment is not a query
        assert!(extract_from_url("http://localhost:5173/#initData=abc").is_none());
    }

    #[test]
    fn test_host_takes_precedence() {
        let platform = PlatformProvider::embedded(Arc::new(HostWith("from-host")));
        let (a, source) =
            resolve_assertion(&platform, Some("http://localhost/?initData=from-url")).unwrap();
        assert_eq!(a.as_str(), "from-host");
        assert_eq!(source, AssertionSource::Host);
    }

    #[test]
    fn test_url_used_without_host() {
        let (a, source) = resolve_assertion(
            &PlatformProvider::Standalone,
            Some("http://localhost/?initData=from-url"),
        )
        .unwrap();
        assert_eq!(a.as_str(), "from-url");
        assert_eq!(source, AssertionSource::PageUrl);
    }

    #[test]
    fn test_nothing_available() {
        assert!(resolve_assertion(&PlatformProvider::Standalone, None).is_none());
        assert!(resolve_assertion(&PlatformProvider::Standalone, Some("http://localhost/")).is_none());
    }
}
