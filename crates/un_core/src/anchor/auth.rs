//! Credentials for the configured API domain.
//!
//! Exactly one style is applied per request. Requests to any other host go
//! out anonymously.

use std::fmt;

use url::Url;

pub const DEFAULT_HEADER_NAME: &str = "X-API-Key";
pub const DEFAULT_QUERY_NAME: &str = "api_key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `<name>: <key>`
    Header(String),
    /// `?<name>=<key>`
    Query(String),
}

impl AuthStyle {
    /// Parse a style selector: `bearer`, `x-api-key`, `header:<Name>` or
    /// `query[:<param>]`. Empty names fall back to the given defaults;
    /// unrecognised selectors mean bearer.
    pub fn parse(selector: &str, default_header: &str, default_query: &str) -> Self {
        let selector = selector.trim();
        let lower = selector.to_ascii_lowercase();
        if lower == "bearer" {
            AuthStyle::Bearer
        } else if lower == "x-api-key" {
            AuthStyle::Header(DEFAULT_HEADER_NAME.to_string())
        } else if lower.starts_with("header:") {
            let name = selector["header:".len()..].trim();
            AuthStyle::Header(if name.is_empty() { default_header } else { name }.to_string())
        } else if lower.starts_with("query") {
            let name = selector["query".len()..].trim_start_matches(':').trim();
            AuthStyle::Query(if name.is_empty() { default_query } else { name }.to_string())
        } else {
            AuthStyle::Bearer
        }
    }
}

/// Credential configuration, supplied by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub domain: String,
    pub key: String,
    pub style: AuthStyle,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("domain", &self.domain)
            .field("key", &"<redacted>")
            .field("style", &self.style)
            .finish()
    }
}

/// Headers and query parameters to attach to one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthParts {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl AuthParts {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.query.is_empty()
    }

    /// Merge the query parameters into `url`, replacing existing keys.
    pub fn apply_query(&self, url: &mut Url) {
        if self.query.is_empty() {
            return;
        }
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        for (name, value) in &self.query {
            match pairs.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => slot.1 = value.clone(),
                None => pairs.push((name.clone(), value.clone())),
            }
        }
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

/// Credentials for `url`, or nothing when the host is outside the configured
/// domain or no key is set.
pub fn build_auth(url: &Url, auth: &AuthConfig) -> AuthParts {
    let domain = auth.domain.trim().trim_start_matches('.').to_ascii_lowercase();
    let key = auth.key.trim();
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if domain.is_empty() || key.is_empty() || !in_domain(&host, &domain) {
        return AuthParts::default();
    }

    let mut parts = AuthParts::default();
    match &auth.style {
        AuthStyle::Bearer => {
            parts.headers.push(("Authorization".to_string(), format!("Bearer {key}")))
        }
        AuthStyle::Header(name) => parts.headers.push((name.clone(), key.to_string())),
        AuthStyle::Query(name) => parts.query.push((name.clone(), key.to_string())),
    }
    parts
}

/// `host` is `domain` itself or a subdomain of it.
fn in_domain(host: &str, domain: &str) -> bool {
    host.strip_suffix(domain)
        .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(style: AuthStyle) -> AuthConfig {
        AuthConfig { domain: "aybllc.org".into(), key: "s3cret".into(), style }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_style_selectors() {
        let parse = |s| AuthStyle::parse(s, DEFAULT_HEADER_NAME, DEFAULT_QUERY_NAME);
        assert_eq!(parse("bearer"), AuthStyle::Bearer);
        assert_eq!(parse("X-API-KEY"), AuthStyle::Header("X-API-Key".into()));
        assert_eq!(parse("header:X-Token"), AuthStyle::Header("X-Token".into()));
        assert_eq!(parse("header:"), AuthStyle::Header(DEFAULT_HEADER_NAME.into()));
        assert_eq!(parse("query"), AuthStyle::Query(DEFAULT_QUERY_NAME.into()));
        assert_eq!(parse("query:token"), AuthStyle::Query("token".into()));
        assert_eq!(parse("carrier-pigeon"), AuthStyle::Bearer);
    }

    #[test]
    fn test_matching_domain_gets_bearer() {
        let parts = build_auth(&url("https://api.aybllc.org/a.json"), &auth(AuthStyle::Bearer));
        assert_eq!(parts.headers, vec![("Authorization".to_string(), "Bearer s3cret".to_string())]);
        assert!(parts.query.is_empty());
    }

    #[test]
    fn test_other_host_is_anonymous() {
        let parts = build_auth(&url("https://zenodo.org/a.json"), &auth(AuthStyle::Bearer));
        assert!(parts.is_empty());
    }

    #[test]
    fn test_domain_match_respects_label_boundary() {
        let cfg = auth(AuthStyle::Bearer);
        assert!(build_auth(&url("https://evil-aybllc.org/a.json"), &cfg).is_empty());
        assert!(build_auth(&url("https://aybllc.org.evil.net/a.json"), &cfg).is_empty());
        assert!(!build_auth(&url("https://aybllc.org:8443/a.json"), &cfg).is_empty());
        assert!(!build_auth(&url("https://data.API.aybllc.org/a.json"), &cfg).is_empty());
    }

    #[test]
    fn test_missing_key_is_anonymous() {
        let mut cfg = auth(AuthStyle::Bearer);
        cfg.key = "  ".into();
        assert!(build_auth(&url("https://aybllc.org/a.json"), &cfg).is_empty());
    }

    #[test]
    fn test_query_style_merges_into_url() {
        let mut u = url("https://aybllc.org/a.json?v=2&api_key=old");
        let parts = build_auth(&u, &auth(AuthStyle::Query("api_key".into())));
        assert!(parts.headers.is_empty());
        parts.apply_query(&mut u);
        assert_eq!(u.as_str(), "https://aybllc.org/a.json?v=2&api_key=s3cret");
    }

    #[test]
    fn test_debug_redacts_key() {
        let dbg = format!("{:?}", auth(AuthStyle::Bearer));
        assert!(!dbg.contains("s3cret"));
    }
}
