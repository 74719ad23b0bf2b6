// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `/api/v1/parts*` and `/api/v1/part-changes*` — the catalog read surface
//! and the part-change workflow entry points.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use zrp_domain::entities::ChangeStatus;
use zrp_domain::repositories::ChangeFilter;
use zrp_domain::ZrpError;

use crate::application::services::CreateEcoRequest;
use crate::presentation::http::error::{data, ApiResult};
use crate::presentation::http::state::AppState;

use super::Actor;

/// `GET /api/v1/parts`
pub async fn list_parts(State(state): State<AppState>) -> ApiResult {
    let parts = state.catalog.list_parts()?;
    Ok(data(parts))
}

/// `GET /api/v1/parts/{ipn}`
pub async fn get_part(State(state): State<AppState>, Path(ipn): Path<String>) -> ApiResult {
    let location = state
        .catalog
        .find_part(&ipn)?
        .ok_or_else(|| ZrpError::not_found(format!("part {} not found", ipn)))?;
    Ok(data(location.file.row_as_map(location.row)))
}

/// `GET /api/v1/parts/{ipn}/changes`
pub async fn list_part_changes(State(state): State<AppState>, Path(ipn): Path<String>) -> ApiResult {
    let changes = state
        .change_repo
        .list(&ChangeFilter {
            part_ipn: Some(ipn),
            ..Default::default()
        })
        .await?;
    Ok(data(changes))
}

#[derive(Debug, Deserialize)]
pub struct CreateChangeRequest {
    pub field_name: String,
    pub new_value: String,
}

/// `POST /api/v1/parts/{ipn}/changes`
pub async fn create_part_change(
    State(state): State<AppState>,
    Path(ipn): Path<String>,
    Actor(actor): Actor,
    Json(body): Json<CreateChangeRequest>,
) -> ApiResult {
    let change = state
        .ecos
        .create_change(&ipn, &body.field_name, &body.new_value, &actor)
        .await?;
    Ok(data(change))
}

/// `POST /api/v1/parts/{ipn}/changes/create-eco`
pub async fn create_eco_from_changes(
    State(state): State<AppState>,
    Path(ipn): Path<String>,
    Actor(actor): Actor,
    Json(body): Json<CreateEcoRequest>,
) -> ApiResult {
    let eco = state.ecos.create_eco_from_changes(&ipn, body, &actor).await?;
    Ok(data(eco))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeListQuery {
    pub status: Option<String>,
    pub eco_id: Option<String>,
}

/// `GET /api/v1/part-changes`
pub async fn list_changes(State(state): State<AppState>, Query(query): Query<ChangeListQuery>) -> ApiResult {
    let status = query.status.as_deref().map(ChangeStatus::from_str).transpose()?;
    let changes = state
        .change_repo
        .list(&ChangeFilter {
            status,
            eco_id: query.eco_id,
            ..Default::default()
        })
        .await?;
    Ok(data(changes))
}

/// `DELETE /api/v1/part-changes/{id}` — drafts only.
pub async fn delete_change(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Actor(actor): Actor,
) -> ApiResult {
    if state.change_repo.delete_draft(id).await? {
        state.audit.log_enhanced(
            &actor,
            zrp_domain::entities::AuditAction::Delete,
            "parts",
            &id.to_string(),
            "deleted draft change",
            None,
            None,
        );
        return Ok(data(serde_json::json!({ "deleted": true })));
    }
    match state.change_repo.find_by_id(id).await? {
        Some(change) => Err(ZrpError::conflict(format!(
            "change {} is {} and cannot be deleted",
            id, change.status
        ))
        .into()),
        None => Err(ZrpError::not_found(format!("change {} not found", id)).into()),
    }
}
