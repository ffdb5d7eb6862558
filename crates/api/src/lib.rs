//! Console HTTP client utilities.
//!
//! This crate provides a lightweight client for talking to a web console that
//! fronts the dashboards plugin backend. It focuses on:
//!
//! - Constructing an HTTP client with the headers every probe carries
//! - Validating the console base URL
//! - Resolving operator-entered endpoints (relative paths or absolute URLs)
//! - Carrying the session cookie header and exposing the anti-forgery token
//!
//! The primary entry point is [`ConsoleClient`]. Create an instance via
//! [`ConsoleClient::new`], and then build requests with
//! [`ConsoleClient::request`].
//!
//! # Example
//!
//! ```ignore
//! use dashprobe_api::ConsoleClient;
//!
//! async fn probe() -> anyhow::Result<()> {
//!     let client = ConsoleClient::new("http://localhost:9000")?;
//!     let res = client
//!         .request(reqwest::Method::GET, "/api/proxy/plugin/console-dashboards-plugin/backend/health")?
//!         .send()
//!         .await?;
//!     println!("status: {}", res.status());
//!     Ok(())
//! }
//! ```

mod cookies;
mod paths;

pub use cookies::{CSRF_COOKIE_NAME, CSRF_HEADER_NAME, CookieJar};
pub use paths::{BACKEND_API, InvalidNameError, datasource_lookup_path, proxy_base_path, validate_datasource_name};

use std::env;
use std::sync::{Arc, RwLock};

use reqwest::{Client, Method, RequestBuilder, header};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Default console origin used by the plugin development server.
pub const DEFAULT_CONSOLE_URL: &str = "http://localhost:9000";

/// Errors raised while configuring the client or resolving endpoints.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid console URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Thin wrapper around a configured `reqwest::Client` for console access.
///
/// Every request carries `Content-Type: application/json` and, when a cookie
/// header is configured, the cookies of the current session. The cookie jar
/// is shared between clones so an update is visible to every holder.
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    pub base_url: Url,
    pub http: Client,
    pub user_agent: String,
    cookies: Arc<RwLock<CookieJar>>,
}

impl ConsoleClient {
    /// Construct a client rooted at `base_url`.
    ///
    /// The base must be an absolute `http` or `https` URL with a host. No
    /// request timeout is configured.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));

        let http = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("dashprobe/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
            cookies: Arc::new(RwLock::new(CookieJar::default())),
        })
    }

    /// Attach a raw cookie header (`name=value; other=value`).
    pub fn with_cookie_header(self, raw: impl Into<String>) -> Self {
        self.set_cookie_header(raw);
        self
    }

    /// Replace the cookie header used by subsequent requests.
    pub fn set_cookie_header(&self, raw: impl Into<String>) {
        let jar = CookieJar::from_header(raw);
        match self.cookies.write() {
            Ok(mut guard) => *guard = jar,
            Err(poisoned) => *poisoned.into_inner() = jar,
        }
    }

    /// Snapshot of the cookie jar as it is right now.
    pub fn cookies(&self) -> CookieJar {
        match self.cookies.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Resolve an operator-entered endpoint against the console base URL.
    ///
    /// Absolute `http`/`https` URLs are returned unchanged; anything else is
    /// joined onto [`Self::base_url`].
    pub fn resolve_url(&self, endpoint: &str) -> Result<Url, ClientError> {
        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            return Err(ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "endpoint cannot be empty".to_string(),
            });
        }

        if let Ok(absolute) = Url::parse(trimmed) {
            return match absolute.scheme() {
                "http" | "https" => Ok(absolute),
                other => Err(ClientError::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    reason: format!("unsupported scheme '{other}' (expected http/https)"),
                }),
            };
        }

        self.base_url.join(trimmed).map_err(|error| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: error.to_string(),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and endpoint.
    ///
    /// The request includes the configured User-Agent and, if present, the
    /// session cookie header.
    pub fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.resolve_url(endpoint)?;
        debug!(%method, %url, "building request");

        let mut builder = self.http.request(method, url).header(header::USER_AGENT, &self.user_agent);
        let cookies = self.cookies();
        if let Some(cookie_header) = cookies.header() {
            builder = builder.header(header::COOKIE, cookie_header);
        }
        Ok(builder)
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - must parse as an absolute URL
/// - scheme must be `http` or `https`
/// - must include a host
fn validate_base_url(base: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };

    let parsed = Url::parse(base.trim()).map_err(|error| invalid(error.to_string()))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(invalid(format!("unsupported scheme '{scheme}' (expected http/https)")));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("must include a host".to_string()));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(ConsoleClient::new("ftp://console.example.com").is_err());
        assert!(ConsoleClient::new("not a url").is_err());
        assert!(ConsoleClient::new("https://console.example.com").is_ok());
    }

    #[test]
    fn relative_endpoints_join_onto_base() {
        let client = ConsoleClient::new("http://localhost:9000").unwrap();
        let url = client.resolve_url("/api/proxy/plugin/x/backend/health").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/proxy/plugin/x/backend/health");
    }

    #[test]
    fn absolute_endpoints_pass_through() {
        let client = ConsoleClient::new("http://localhost:9000").unwrap();
        let url = client.resolve_url("https://console.example.com/api/v1/status").unwrap();
        assert_eq!(url.as_str(), "https://console.example.com/api/v1/status");

        assert!(client.resolve_url("file:///etc/passwd").is_err());
        assert!(client.resolve_url("   ").is_err());
    }

    #[test]
    fn cookie_updates_are_shared_between_clones() {
        let client = ConsoleClient::new("http://localhost:9000").unwrap();
        let clone = client.clone();
        client.set_cookie_header("csrf-token=abc");
        assert_eq!(clone.cookies().csrf_token().as_deref(), Some("abc"));
    }

    #[test]
    fn request_attaches_cookie_header() {
        let client = ConsoleClient::new("http://localhost:9000").unwrap().with_cookie_header("session=s1; csrf-token=t1");
        let request = client.request(Method::GET, "/health").unwrap().build().unwrap();
        assert_eq!(request.headers().get(header::COOKIE).unwrap(), "session=s1; csrf-token=t1");
        assert!(request.headers().get(CSRF_HEADER_NAME).is_none());
    }
}
