//! Cookie plumbing for the local session and the in-flight sign-in attempt.
//!
//! Both cookies only carry random identifiers; everything else lives server-side.

use axum::http::{HeaderMap, header};

pub const SESSION_COOKIE: &str = "cas_session";
pub const ATTEMPT_COOKIE: &str = "cas_attempt";

/// Read a cookie value from the `Cookie` request header(s).
pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

pub fn set(name: &str, value: &str, secure: bool, max_age_seconds: Option<u64>) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age_seconds {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear(name: &str, secure: bool) -> String {
    set(name, "", secure, Some(0))
}
