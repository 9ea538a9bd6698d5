//! Pulling the session cookie and CSRF token out of a login page response.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{HeaderMap, SET_COOKIE};

/// `name="_csrf"` followed (possibly across lines) by the next `value="..."`.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static CSRF_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)name="_csrf".*?value="([^"]+)""#).expect("valid regex literal")
});

/// Extract the hidden `_csrf` field value from an HTML body.
pub fn extract_csrf_token(body: &str) -> Option<String> {
    CSRF_VALUE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// The first `Set-Cookie` header reduced to its `name=value` pair.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .find(|pair| pair.contains('='))
        .map(str::to_string)
}
