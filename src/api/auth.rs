//! Bearer token gate for `/api/v1`
//!
//! When no token is configured every request passes. Otherwise the
//! `Authorization` header must carry `<scheme> <token>` where the scheme is
//! `bearer` in any case and the token matches exactly.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::state::AppState;

pub const AUTH_REQUIRED: &str = "Auth Required";

/// Pure authorization predicate
pub fn authorize(headers: Option<&HeaderMap>, configured_token: Option<&str>) -> bool {
    let Some(expected) = configured_token else {
        return true;
    };
    let Some(headers) = headers else {
        return false;
    };

    let Some(authorization) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let Some((scheme, credential)) = authorization.trim_start().split_once(char::is_whitespace) else {
        return false;
    };
    let credential = credential.trim_start();

    scheme.eq_ignore_ascii_case("bearer") && constant_time_eq(credential.as_bytes(), expected.as_bytes())
}

/// Compares all bytes regardless of where the first mismatch is
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

pub(crate) fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::CONTENT_TYPE, super::models::TEXT_CONTENT_TYPE)],
        AUTH_REQUIRED,
    )
        .into_response()
}

/// Middleware rejecting requests that fail [`authorize`]
pub async fn require_bearer_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let token = state.config.server.auth_token.as_deref();
    if authorize(Some(request.headers()), token) {
        return next.run(request).await;
    }

    debug!(uri = %request.uri(), "Rejected unauthenticated request");
    state.metrics.auth_rejected();
    unauthenticated()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn test_open_mode_authorizes_everything() {
        assert!(authorize(None, None));
        assert!(authorize(Some(&HeaderMap::new()), None));
        assert!(authorize(Some(&headers("Basic abc")), None));
    }

    #[test]
    fn test_missing_headers_denied() {
        assert!(!authorize(None, Some("secret")));
        assert!(!authorize(Some(&HeaderMap::new()), Some("secret")));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert!(authorize(Some(&headers("Bearer secret")), Some("secret")));
        assert!(authorize(Some(&headers("BEARER secret")), Some("secret")));
        assert!(authorize(Some(&headers("bearer secret")), Some("secret")));
    }

    #[test]
    fn test_whitespace_run_separates_scheme() {
        assert!(authorize(Some(&headers("Bearer   secret")), Some("secret")));
        assert!(authorize(Some(&headers("Bearer\tsecret")), Some("secret")));
    }

    #[test]
    fn test_wrong_credentials_denied() {
        assert!(!authorize(Some(&headers("Bearer wrong")), Some("secret")));
        assert!(!authorize(Some(&headers("Bearer SECRET")), Some("secret")));
        assert!(!authorize(Some(&headers("Basic secret")), Some("secret")));
        assert!(!authorize(Some(&headers("Bearersecret")), Some("secret")));
        assert!(!authorize(Some(&headers("secret")), Some("secret")));
        assert!(!authorize(Some(&headers("Bearer secret extra")), Some("secret")));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
