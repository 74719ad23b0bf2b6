// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `POST /api/v1/bulk/{resource}` — batched workflow actions.
//!
//! Each id is processed independently; the batch is deliberately NOT one
//! transaction. The response is always 200 with a success/failed/errors
//! breakdown, even when every id failed.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use zrp_domain::services::PermissionChecker;
use zrp_domain::value_objects::{Action, Module};
use zrp_domain::ZrpError;

use crate::application::services::{AuditActor, AuthMethod, Principal};
use crate::presentation::http::error::{data, ApiResult};
use crate::presentation::http::state::AppState;

use super::Actor;

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub ids: Vec<serde_json::Value>,
    pub action: String,
}

/// Dispatches one action for one id; unknown combinations are per-id errors.
async fn apply(state: &AppState, resource: &str, action: &str, id: &serde_json::Value, actor: &AuditActor) -> Result<(), ZrpError> {
    match resource {
        "ecos" => {
            let eco_id = id
                .as_str()
                .ok_or_else(|| ZrpError::bad_request("ECO ids must be strings"))?;
            match action {
                "submit" => state.ecos.submit(eco_id, actor).await.map(|_| ()),
                "approve" => state.ecos.approve(eco_id, actor).await.map(|_| ()),
                "reject" => state.ecos.reject(eco_id, actor).await.map(|_| ()),
                "cancel" => state.ecos.cancel(eco_id, actor).await.map(|_| ()),
                other => Err(ZrpError::bad_request(format!("unsupported ECO action: {}", other))),
            }
        }
        "part-changes" => {
            let change_id = id
                .as_i64()
                .ok_or_else(|| ZrpError::bad_request("part-change ids must be integers"))?;
            match action {
                "delete" => {
                    if state.change_repo.delete_draft(change_id).await? {
                        Ok(())
                    } else {
                        Err(ZrpError::conflict(format!("change {} is not a deletable draft", change_id)))
                    }
                }
                other => Err(ZrpError::bad_request(format!("unsupported part-change action: {}", other))),
            }
        }
        other => Err(ZrpError::bad_request(format!("unsupported bulk resource: {}", other))),
    }
}

/// Workflow transitions carry the stricter `approve` requirement even when
/// reached through the generic bulk route.
fn check_action_permission(state: &AppState, principal: &Principal, resource: &str, action: &str) -> Result<(), ZrpError> {
    if principal.method == AuthMethod::ApiKey {
        return Ok(());
    }
    if resource == "ecos" && matches!(action, "approve" | "reject") {
        let role = principal
            .role
            .as_ref()
            .ok_or_else(|| ZrpError::forbidden("forbidden"))?;
        if !state.permissions.has_permission(role, Module::Ecos, Action::Approve) {
            return Err(ZrpError::forbidden("forbidden"));
        }
    }
    Ok(())
}

/// `POST /api/v1/bulk/{resource}`
pub async fn bulk(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Extension(principal): Extension<Principal>,
    Actor(actor): Actor,
    Json(request): Json<BulkRequest>,
) -> ApiResult {
    check_action_permission(&state, &principal, &resource, &request.action)?;

    let mut success = 0usize;
    let mut failed = 0usize;
    let mut errors = Vec::new();

    for id in &request.ids {
        match apply(&state, &resource, &request.action, id, &actor).await {
            Ok(()) => success += 1,
            Err(err) => {
                failed += 1;
                errors.push(format!("{}: {}", id, err));
            }
        }
    }

    Ok(data(serde_json::json!({
        "success": success,
        "failed": failed,
        "errors": errors,
    })))
}
