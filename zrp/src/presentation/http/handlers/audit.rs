// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `/api/v1/audit*` — trail listing, CSV export, retention policy.

use axum::extract::{Query, State};
use axum::http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use zrp_domain::repositories::AuditQuery;
use zrp_domain::ZrpError;

use crate::presentation::http::error::{data, ApiError, ApiResult};
use crate::presentation::http::state::AppState;

use super::Actor;

#[derive(Debug, Default, Deserialize)]
pub struct AuditListQuery {
    pub module: Option<String>,
    pub action: Option<String>,
    pub username: Option<String>,
    pub record_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<AuditListQuery> for AuditQuery {
    fn from(q: AuditListQuery) -> Self {
        AuditQuery {
            module: q.module,
            action: q.action,
            username: q.username,
            record_id: q.record_id,
            limit: q.limit,
            offset: q.offset,
        }
    }
}

/// `GET /api/v1/audit`
pub async fn list(State(state): State<AppState>, Query(query): Query<AuditListQuery>) -> ApiResult {
    Ok(data(state.audit_repo.list(&query.into()).await?))
}

/// `GET /api/v1/audit/export` — CSV download, itself audited as an EXPORT.
pub async fn export(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<AuditListQuery>,
) -> Result<Response, ApiError> {
    let mut query: AuditQuery = query.into();
    query.limit = Some(query.limit.unwrap_or(10_000));
    let entries = state.audit_repo.list(&query).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "id", "user_id", "username", "action", "module", "record_id", "summary",
            "before_value", "after_value", "ip_address", "user_agent", "created_at",
        ])
        .map_err(|e| ZrpError::internal(e.to_string()))?;
    for entry in &entries {
        writer
            .write_record([
                entry.id.to_string(),
                entry.user_id.map(|id| id.to_string()).unwrap_or_default(),
                entry.username.clone(),
                entry.action.as_str().to_string(),
                entry.module.clone(),
                entry.record_id.clone(),
                entry.summary.clone(),
                entry.before_value.clone().unwrap_or_default(),
                entry.after_value.clone().unwrap_or_default(),
                entry.ip_address.clone(),
                entry.user_agent.clone(),
                entry.created_at.to_rfc3339(),
            ])
            .map_err(|e| ZrpError::internal(e.to_string()))?;
    }
    let csv_bytes = writer
        .into_inner()
        .map_err(|e| ZrpError::internal(e.to_string()))?;

    state.audit.log_data_export(&actor, "audit", "csv", entries.len());

    let mut response = csv_bytes.into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"));
    response.headers_mut().insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"audit_log.csv\""),
    );
    Ok(response)
}

/// `GET /api/v1/audit/retention`
pub async fn get_retention(State(state): State<AppState>) -> ApiResult {
    Ok(data(serde_json::json!({ "retention_days": state.audit.retention_days().await })))
}

#[derive(Debug, Deserialize)]
pub struct RetentionRequest {
    pub retention_days: i64,
}

/// `PUT /api/v1/audit/retention`
pub async fn set_retention(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(body): Json<RetentionRequest>,
) -> ApiResult {
    state.audit.set_retention_days(body.retention_days).await?;
    state.audit.log_enhanced(
        &actor,
        zrp_domain::entities::AuditAction::Update,
        "admin",
        "audit_retention_days",
        &format!("retention set to {} days", body.retention_days),
        None,
        None,
    );
    Ok(data(serde_json::json!({ "retention_days": body.retention_days })))
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    #[serde(default)]
    pub retention_days: Option<i64>,
}

/// `POST /api/v1/audit/cleanup`
pub async fn cleanup(
    State(state): State<AppState>,
    Actor(actor): Actor,
    body: Option<Json<CleanupRequest>>,
) -> ApiResult {
    let retention_days = body.and_then(|Json(b)| b.retention_days);
    let deleted = state.audit.cleanup_old(retention_days).await?;
    state.audit.log_enhanced(
        &actor,
        zrp_domain::entities::AuditAction::Delete,
        "admin",
        "audit_log",
        &format!("purged {} audit entries", deleted),
        None,
        None,
    );
    Ok(data(serde_json::json!({ "deleted": deleted })))
}
