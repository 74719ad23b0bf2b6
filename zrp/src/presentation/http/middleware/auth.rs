// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Authentication middleware: resolves the request's credentials into a
//! [`Principal`](crate::application::services::Principal) request extension.
//!
//! Exempt: `/healthz`, `/auth/login`, `/api/v1/openapi.json`, and anything
//! outside `/api/v1/` and `/auth/` (static assets, metrics scrapes, …).

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use zrp_domain::entities::SESSION_COOKIE;

use crate::presentation::http::error::ApiError;
use crate::presentation::http::state::AppState;

/// Routes served without credentials.
pub fn is_exempt(path: &str) -> bool {
    if path == "/healthz" || path == "/auth/login" || path == "/api/v1/openapi.json" {
        return true;
    }
    !(path.starts_with("/api/v1/") || path.starts_with("/auth/"))
}

/// Pulls the session token out of the `Cookie` header.
pub fn session_token(request: &Request<Body>) -> Option<String> {
    let cookies = request.headers().get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Pulls a bearer token out of the `Authorization` header.
pub fn bearer_token(request: &Request<Body>) -> Option<String> {
    let value = request.headers().get("authorization")?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|token| token.trim().to_string())
}

pub async fn authenticate(State(state): State<AppState>, mut request: Request<Body>, next: Next) -> Response {
    if is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    // Session cookie first, bearer key second.
    let resolved = if let Some(token) = session_token(&request) {
        state.auth.resolve_session(&token).await
    } else if let Some(key) = bearer_token(&request) {
        state.auth.resolve_api_key(&key).await
    } else {
        Err(zrp_domain::ZrpError::unauthorized("unauthorized"))
    };

    match resolved {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => ApiError(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exemptions() {
        assert!(is_exempt("/healthz"));
        assert!(is_exempt("/auth/login"));
        assert!(is_exempt("/api/v1/openapi.json"));
        assert!(is_exempt("/static/app.js"));
        assert!(!is_exempt("/api/v1/parts"));
        assert!(!is_exempt("/auth/me"));
        assert!(!is_exempt("/auth/logout"));
    }

    #[test]
    fn test_cookie_parsing() {
        let request = Request::builder()
            .header("cookie", "theme=dark; zrp_session=abc123; other=1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(session_token(&request).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_bearer_parsing() {
        let request = Request::builder()
            .header("authorization", "Bearer zrp_deadbeef")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request).as_deref(), Some("zrp_deadbeef"));

        let basic = Request::builder()
            .header("authorization", "Basic dXNlcjpwdw==")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&basic), None);
    }
}
