//! services/api/src/web/middleware.rs
//!
//! Admin-key middleware for protecting routes.

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Middleware that only lets requests through when they present the configured admin key.
///
/// The key is read from an `Authorization: Bearer <key>` header, or from a `key` query
/// parameter for browser WebSocket clients, which cannot set headers.
/// Without a configured key every request is refused.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Admin access is disabled unless a key is configured
    let Some(expected) = state.config.admin_key.as_deref() else {
        warn!("Admin route {} requested but no ADMIN_KEY is configured.", req.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    };

    // 2. Compare the presented key
    let authorized = bearer_key(req.headers())
        .map(str::to_owned)
        .or_else(|| query_key(req.uri()))
        .is_some_and(|presented| keys_match(&presented, expected));

    if !authorized {
        warn!("Rejected admin request to {}.", req.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    }

    // 3. Continue to the handler
    Ok(next.run(req).await)
}

fn bearer_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

#[derive(Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

/// Percent-decoded `key` query parameter.
fn query_key(uri: &Uri) -> Option<String> {
    Query::<KeyQuery>::try_from_uri(uri).ok()?.0.key
}

/// Compares every byte regardless of where the first mismatch is.
fn keys_match(presented: &str, expected: &str) -> bool {
    let (presented, expected) = (presented.as_bytes(), expected.as_bytes());
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc "));
        assert_eq!(bearer_key(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_key(&headers), None);
    }

    #[test]
    fn reads_key_query_parameter() {
        let uri: Uri = "/ws/admin?foo=1&key=abc".parse().unwrap();
        assert_eq!(query_key(&uri).as_deref(), Some("abc"));

        let uri: Uri = "/ws/admin".parse().unwrap();
        assert_eq!(query_key(&uri), None);
    }

    #[test]
    fn key_query_parameter_is_percent_decoded() {
        let uri: Uri = "/ws/admin?key=a%26b%3Dc%2B%20d".parse().unwrap();
        assert_eq!(query_key(&uri).as_deref(), Some("a&b=c+ d"));

        let uri: Uri = "/ws/admin?key=x+y".parse().unwrap();
        assert_eq!(query_key(&uri).as_deref(), Some("x y"));
    }

    #[test]
    fn keys_must_match_exactly() {
        assert!(keys_match("open-sesame", "open-sesame"));
        assert!(!keys_match("open-sesam", "open-sesame"));
        assert!(!keys_match("open-sesamE", "open-sesame"));
        assert!(!keys_match("", "open-sesame"));
    }
}
