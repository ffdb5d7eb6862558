//! Read-only view over a browser-style cookie header.

/// Cookie carrying the anti-forgery token issued by the console.
pub const CSRF_COOKIE_NAME: &str = "csrf-token";

/// Request header that mirrors the anti-forgery token back to the origin.
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";

/// A raw `Cookie` header value, e.g. `openshift-session-token=...; csrf-token=...`.
///
/// The jar never writes cookies; it only answers lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    raw: String,
}

impl CookieJar {
    pub fn from_header(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The header value to send, if any cookies are configured.
    pub fn header(&self) -> Option<&str> {
        let trimmed = self.raw.trim();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    }

    /// Value of the named cookie. When the name appears more than once, the
    /// last occurrence wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.raw
            .split(';')
            .map(str::trim)
            .filter_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
            .next_back()
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.get(CSRF_COOKIE_NAME).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_csrf_token() {
        let jar = CookieJar::from_header("openshift-session-token=abc; csrf-token=xyz123");
        assert_eq!(jar.csrf_token().as_deref(), Some("xyz123"));
    }

    #[test]
    fn last_duplicate_wins() {
        let jar = CookieJar::from_header("csrf-token=first;csrf-token=second ; other=1");
        assert_eq!(jar.get(CSRF_COOKIE_NAME), Some("second"));
    }

    #[test]
    fn prefix_names_do_not_match() {
        let jar = CookieJar::from_header("csrf-token-old=stale; xcsrf-token=nope");
        assert_eq!(jar.csrf_token(), None);
    }

    #[test]
    fn empty_jar_has_no_header() {
        let jar = CookieJar::from_header("   ");
        assert_eq!(jar.header(), None);
        assert_eq!(jar.csrf_token(), None);
    }

    #[test]
    fn empty_value_is_preserved() {
        let jar = CookieJar::from_header("csrf-token=");
        assert_eq!(jar.csrf_token().as_deref(), Some(""));
    }
}
