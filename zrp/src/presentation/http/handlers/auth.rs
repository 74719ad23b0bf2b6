// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `/auth/*` — login, logout, current principal.

use axum::extract::State;
use axum::http::header::{HeaderValue, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use zrp_domain::entities::{AuditAction, SESSION_COOKIE};
use zrp_domain::ZrpError;

use crate::application::services::Principal;
use crate::presentation::http::error::{data, ApiError, ApiResult};
use crate::presentation::http::state::AppState;

use super::Actor;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Actor(mut actor): Actor,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let (user, session) = state.auth.login(&body.username, &body.password).await?;

    actor.user_id = Some(user.id);
    actor.username = user.username.clone();
    state
        .audit
        .log_enhanced(&actor, AuditAction::Login, "auth", &user.id.to_string(), "logged in", None, None);

    let max_age = state.config.session_lifetime_hours * 3600;
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, session.token, max_age
    );
    let mut response = data(serde_json::json!({ "user": user.public_view() })).into_response();
    response.headers_mut().insert(
        SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| ZrpError::internal(e.to_string()))?,
    );
    Ok(response)
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    Actor(actor): Actor,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = cookie_token(&headers) {
        state.auth.logout(&token).await?;
    }
    state
        .audit
        .log_enhanced(&actor, AuditAction::Logout, "auth", "", "logged out", None, None);

    let clear = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    let mut response = data(serde_json::json!({ "ok": true })).into_response();
    response.headers_mut().insert(
        SET_COOKIE,
        HeaderValue::from_str(&clear).map_err(|e| ZrpError::internal(e.to_string()))?,
    );
    Ok(response)
}

/// `GET /auth/me`
pub async fn me(State(state): State<AppState>, Extension(principal): Extension<Principal>) -> ApiResult {
    match state.auth.current_user(&principal).await? {
        Some(user) => Ok(data(serde_json::json!({
            "user": user.public_view(),
            "method": principal.method,
        }))),
        None => Ok(data(serde_json::json!({
            "user": { "username": principal.username, "role": null },
            "method": principal.method,
        }))),
    }
}
