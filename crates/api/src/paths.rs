//! Backend path templates and datasource name validation.

use std::net::IpAddr;

use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use thiserror::Error;

/// Prefix under which the console proxies requests to the plugin backend.
pub const BACKEND_API: &str = "/api/proxy/plugin/console-dashboards-plugin/backend";

/// Upper bound on the name length once dots are removed.
const MAX_NAME_LENGTH: usize = 255;

static DNS_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,62}(\.[a-zA-Z0-9_][a-zA-Z0-9_-]{0,62})*[._]?$")
        .expect("dns name regex should compile")
});

/// Characters escaped when a name is used as a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid datasource name '{name}': {reason}")]
pub struct InvalidNameError {
    pub name: String,
    pub reason: String,
}

/// Proxy base path through which requests to `datasource_name` are routed.
pub fn proxy_base_path(datasource_name: &str) -> String {
    format!("{BACKEND_API}/proxy/{datasource_name}")
}

/// Backend endpoint that describes `datasource_name`.
pub fn datasource_lookup_path(datasource_name: &str) -> String {
    format!(
        "{BACKEND_API}/api/v1/datasources/{}",
        utf8_percent_encode(datasource_name, PATH_SEGMENT)
    )
}

/// Validate a datasource name the same way the backend proxy does: the name
/// must be a DNS name and must not be an IP address.
pub fn validate_datasource_name(name: &str) -> Result<(), InvalidNameError> {
    let invalid = |reason: &str| InvalidNameError {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }

    if name.replace('.', "").len() > MAX_NAME_LENGTH {
        return Err(invalid("name is longer than 255 characters"));
    }

    if name.parse::<IpAddr>().is_ok() {
        return Err(invalid("name must not be an IP address"));
    }

    if !DNS_NAME_REGEX.is_match(name) {
        return Err(invalid("name must be a DNS name (letters, digits, '-', '_' and dot-separated labels of at most 63 characters)"));
    }

    Ok(())
}
