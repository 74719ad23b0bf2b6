// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `/api/v1/apikeys*` — service-account key administration (admin-only).
//!
//! The plaintext key appears exactly once, in the creation response.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use zrp_domain::entities::{ApiKey, AuditAction};
use zrp_domain::repositories::NewApiKey;
use zrp_domain::ZrpError;

use crate::presentation::http::error::{data, ApiResult};
use crate::presentation::http::state::AppState;

use super::Actor;

/// `GET /api/v1/apikeys`
pub async fn list(State(state): State<AppState>) -> ApiResult {
    let keys: Vec<_> = state.api_key_repo.list_all().await?.iter().map(|k| k.public_view()).collect();
    Ok(data(keys))
}

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    pub name: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// `POST /api/v1/apikeys`
pub async fn create(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(body): Json<CreateKeyRequest>,
) -> ApiResult {
    if body.name.trim().is_empty() {
        return Err(ZrpError::bad_request("name must not be empty").into());
    }

    let generated = ApiKey::generate();
    let stored = state
        .api_key_repo
        .insert(NewApiKey {
            name: body.name,
            key_hash: generated.key_hash,
            key_prefix: generated.key_prefix,
            enabled: true,
            expires_at: body.expires_at,
        })
        .await?;

    state.audit.log_enhanced(
        &actor,
        AuditAction::Create,
        "admin",
        &stored.id.to_string(),
        &format!("created API key {}", stored.name),
        None,
        None,
    );

    // Plaintext leaves the process here and only here.
    let mut payload = stored.public_view();
    payload["key"] = serde_json::Value::String(generated.plaintext);
    Ok(data(payload))
}

#[derive(Debug, Deserialize)]
pub struct EnableRequest {
    pub enabled: bool,
}

/// `PUT /api/v1/apikeys/{id}`
pub async fn set_enabled(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Actor(actor): Actor,
    Json(body): Json<EnableRequest>,
) -> ApiResult {
    if !state.api_key_repo.set_enabled(id, body.enabled).await? {
        return Err(ZrpError::not_found(format!("API key {} not found", id)).into());
    }
    state.audit.log_enhanced(
        &actor,
        AuditAction::Update,
        "admin",
        &id.to_string(),
        if body.enabled { "enabled API key" } else { "disabled API key" },
        None,
        None,
    );
    Ok(data(serde_json::json!({ "enabled": body.enabled })))
}

/// `DELETE /api/v1/apikeys/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>, Actor(actor): Actor) -> ApiResult {
    if !state.api_key_repo.delete(id).await? {
        return Err(ZrpError::not_found(format!("API key {} not found", id)).into());
    }
    state.audit.log_enhanced(
        &actor,
        AuditAction::Delete,
        "admin",
        &id.to_string(),
        "deleted API key",
        None,
        None,
    );
    Ok(data(serde_json::json!({ "deleted": true })))
}
