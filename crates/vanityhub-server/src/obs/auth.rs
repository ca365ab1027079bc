//! HTTP Basic auth for the metrics endpoint.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::config::PrometheusSection;

/// Check the `Authorization` header against the configured credentials.
/// When neither credential is configured the endpoint is open.
pub fn authorized(cfg: &PrometheusSection, headers: &HeaderMap) -> bool {
    if cfg.auth_username.is_empty() && cfg.auth_password.is_empty() {
        return true;
    }

    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = BASE64.decode(encoded.trim()) else {
        return false;
    };
    let Ok(credentials) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((user, pass)) = credentials.split_once(':') else {
        return false;
    };

    // Non-short-circuiting so both fields are always compared.
    secure_eq(user, &cfg.auth_username) & secure_eq(pass, &cfg.auth_password)
}

/// Constant-time string equality (modulo the length check).
fn secure_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
