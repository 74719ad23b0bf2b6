// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `/api/v1/users*` — account administration (admin-only by prefix).
//!
//! Deactivation leaves sessions in place; the credential resolver rejects
//! them at next use. A password change additionally invalidates the user's
//! existing sessions.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use zrp_domain::entities::{AuditAction, Role};
use zrp_domain::repositories::NewUser;
use zrp_domain::ZrpError;

use crate::application::services::auth::hash_password;
use crate::presentation::http::error::{data, ApiResult};
use crate::presentation::http::state::AppState;

use super::Actor;

/// `GET /api/v1/users`
pub async fn list(State(state): State<AppState>) -> ApiResult {
    let users: Vec<_> = state.user_repo.list_all().await?.iter().map(|u| u.public_view()).collect();
    Ok(data(users))
}

/// `GET /api/v1/users/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult {
    let user = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ZrpError::not_found(format!("user {} not found", id)))?;
    Ok(data(user.public_view()))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /api/v1/users`
pub async fn create(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult {
    if body.username.trim().is_empty() {
        return Err(ZrpError::bad_request("username must not be empty").into());
    }
    if body.password.len() < 8 {
        return Err(ZrpError::bad_request("password must be at least 8 characters").into());
    }

    let password_hash = hash_password(&body.password)?;
    let user = state
        .user_repo
        .create(NewUser {
            username: body.username,
            password_hash,
            role: Role::parse(body.role.as_deref().unwrap_or("user")),
            active: true,
            email: body.email,
        })
        .await?;

    state.audit.log_enhanced(
        &actor,
        AuditAction::Create,
        "admin",
        &user.id.to_string(),
        &format!("created user {}", user.username),
        None,
        None,
    );
    Ok(data(user.public_view()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub email: Option<String>,
}

/// `PUT /api/v1/users/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Actor(actor): Actor,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult {
    let mut user = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ZrpError::not_found(format!("user {} not found", id)))?;

    let before = user.public_view();
    if let Some(role) = body.role {
        user.role = Role::parse(&role);
    }
    if let Some(active) = body.active {
        user.active = active;
    }
    if let Some(email) = body.email {
        user.email = Some(email);
    }
    state.user_repo.update(&user).await?;

    state
        .audit
        .log_update_with_diff(&actor, "admin", &id.to_string(), &before, &user.public_view());
    Ok(data(user.public_view()))
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

/// `PUT /api/v1/users/{id}/password`
pub async fn set_password(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Actor(actor): Actor,
    Json(body): Json<PasswordRequest>,
) -> ApiResult {
    if body.password.len() < 8 {
        return Err(ZrpError::bad_request("password must be at least 8 characters").into());
    }
    let password_hash = hash_password(&body.password)?;
    if !state.user_repo.set_password_hash(id, &password_hash).await? {
        return Err(ZrpError::not_found(format!("user {} not found", id)).into());
    }
    // Old sessions die with the old password.
    state.session_repo.delete_for_user(id).await?;

    state.audit.log_enhanced(
        &actor,
        AuditAction::Update,
        "admin",
        &id.to_string(),
        "password changed",
        None,
        None,
    );
    Ok(data(serde_json::json!({ "updated": true })))
}

/// `DELETE /api/v1/users/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>, Actor(actor): Actor) -> ApiResult {
    if actor.user_id == Some(id) {
        return Err(ZrpError::bad_request("cannot delete the current account").into());
    }
    if !state.user_repo.delete(id).await? {
        return Err(ZrpError::not_found(format!("user {} not found", id)).into());
    }
    state.audit.log_enhanced(
        &actor,
        AuditAction::Delete,
        "admin",
        &id.to_string(),
        "deleted user",
        None,
        None,
    );
    Ok(data(serde_json::json!({ "deleted": true })))
}
