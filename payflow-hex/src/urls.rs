//! Absolute URLs for the service's own routes.

use payflow_types::{Route, TokenHash, UrlResolver};
use url::Url;

use crate::inbound::TOKEN_PARAM;

/// Resolves routes against the public base URL the service is reachable at.
#[derive(Debug, Clone)]
pub struct RouteUrlResolver {
    base_url: String,
}

impl RouteUrlResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }
}

impl UrlResolver for RouteUrlResolver {
    fn resolve(&self, route: Route, hash: &TokenHash) -> String {
        let path = route.path().replace("{payum_token}", hash.as_str());
        format!("{}{}", self.base_url, path)
    }
}

/// Appends `payum_token=<hash>` to an arbitrary URL, keeping any existing query.
///
/// Relative or unparseable URLs get the parameter spliced in as text.
pub fn with_token_query(url: &str, hash: &TokenHash) -> String {
    if let Ok(mut parsed) = Url::parse(url) {
        parsed
            .query_pairs_mut()
            .append_pair(TOKEN_PARAM, hash.as_str());
        return parsed.into();
    }

    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };

    let mut out = format!("{}{}{}={}", base, separator, TOKEN_PARAM, hash);
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_routes() {
        let urls = RouteUrlResolver::new("http://localhost:3000/");
        let hash = TokenHash::new("abc");

        assert_eq!(
            urls.resolve(Route::Capture, &hash),
            "http://localhost:3000/payment/capture/abc"
        );
        assert_eq!(
            urls.resolve(Route::Authorize, &hash),
            "http://localhost:3000/payment/authorize/abc"
        );
        assert_eq!(
            urls.resolve(Route::PaymentGet, &hash),
            "http://localhost:3000/api/payment/abc"
        );
    }

    #[test]
    fn test_token_query_separator() {
        let hash = TokenHash::new("abc");

        assert_eq!(
            with_token_query("http://shop.test/done", &hash),
            "http://shop.test/done?payum_token=abc"
        );
        assert_eq!(
            with_token_query("http://shop.test/done?order=7", &hash),
            "http://shop.test/done?order=7&payum_token=abc"
        );
        assert_eq!(
            with_token_query("http://shop.test/done#top", &hash),
            "http://shop.test/done?payum_token=abc#top"
        );
    }

    #[test]
    fn test_token_query_on_relative_url() {
        let hash = TokenHash::new("abc");

        assert_eq!(with_token_query("/done", &hash), "/done?payum_token=abc");
        assert_eq!(
            with_token_query("/done?order=7#top", &hash),
            "/done?order=7&payum_token=abc#top"
        );
    }
}
