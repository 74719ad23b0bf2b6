// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `/api/v1/permissions*` — what the current principal may do, the module
//! catalog, and the admin-only matrix maintenance endpoints.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::{Extension, Json};

use zrp_domain::repositories::PermissionEntry;
use zrp_domain::value_objects::Module;

use crate::application::services::{AuthMethod, Principal};
use crate::presentation::http::error::{data, ApiResult};
use crate::presentation::http::state::AppState;

/// `GET /api/v1/permissions/me`
pub async fn me(State(state): State<AppState>, Extension(principal): Extension<Principal>) -> ApiResult {
    // Bearer keys act as service accounts: report every module as granted.
    if principal.method == AuthMethod::ApiKey {
        let all: BTreeMap<&str, Vec<&str>> = Module::ALL
            .iter()
            .map(|m| (m.as_str(), vec!["view", "create", "edit", "delete", "approve"]))
            .collect();
        return Ok(data(all));
    }

    let grants = principal
        .role
        .as_ref()
        .map(|role| state.permissions.grants_for_role(role))
        .unwrap_or_default();
    let rendered: BTreeMap<&str, Vec<&str>> = grants
        .iter()
        .map(|(module, actions)| (module.as_str(), actions.iter().map(|a| a.as_str()).collect()))
        .collect();
    Ok(data(rendered))
}

/// `GET /api/v1/permissions/modules`
pub async fn modules() -> ApiResult {
    let names: Vec<&str> = Module::ALL.iter().map(|m| m.as_str()).collect();
    Ok(data(names))
}

/// `GET /api/v1/admin/permissions` — the raw matrix.
pub async fn matrix(State(state): State<AppState>) -> ApiResult {
    Ok(data(state.permission_repo.list_all().await?))
}

/// `PUT /api/v1/admin/permissions` — upsert cells, then refresh the cache.
pub async fn update_matrix(State(state): State<AppState>, Json(entries): Json<Vec<PermissionEntry>>) -> ApiResult {
    for entry in &entries {
        state.permission_repo.upsert(entry).await?;
    }
    state.permissions.refresh().await?;
    Ok(data(serde_json::json!({ "updated": entries.len() })))
}
