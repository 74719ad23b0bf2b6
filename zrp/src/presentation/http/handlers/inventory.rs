// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `/api/v1/inventory*` — reads plus the single transact write path.
//!
//! `bulk-update` follows the partial-success contract: items are processed
//! independently, the response is always 200 with a success/failed/errors
//! breakdown, and no surrounding transaction is added.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use zrp_domain::entities::{AuditAction, InventoryItem};
use zrp_domain::value_objects::Ipn;
use zrp_domain::ZrpError;

use crate::application::services::TransactRequest;
use crate::presentation::http::error::{data, ApiResult};
use crate::presentation::http::state::AppState;

use super::Actor;

/// `GET /api/v1/inventory`
pub async fn list(State(state): State<AppState>) -> ApiResult {
    Ok(data(state.inventory_repo.list_all().await?))
}

/// `GET /api/v1/inventory/{ipn}`
pub async fn get(State(state): State<AppState>, Path(ipn): Path<String>) -> ApiResult {
    let item = state
        .inventory_repo
        .get(&ipn)
        .await?
        .ok_or_else(|| ZrpError::not_found(format!("inventory item {} not found", ipn)))?;
    Ok(data(item))
}

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// `GET /api/v1/inventory/{ipn}/transactions`
pub async fn transactions(
    State(state): State<AppState>,
    Path(ipn): Path<String>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult {
    Ok(data(state.inventory_repo.list_transactions(&ipn, query.limit).await?))
}

/// `GET /api/v1/inventory/low-stock`
pub async fn low_stock(State(state): State<AppState>) -> ApiResult {
    let items: Vec<_> = state
        .inventory_repo
        .list_all()
        .await?
        .into_iter()
        .filter(InventoryItem::needs_reorder)
        .collect();
    Ok(data(items))
}

/// `POST /api/v1/inventory/transact`
pub async fn transact(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<TransactRequest>,
) -> ApiResult {
    let outcome = state.inventory.transact(request, &actor).await?;
    Ok(data(outcome))
}

#[derive(Debug, Deserialize)]
pub struct BulkItemUpdate {
    pub ipn: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub reorder_point: Option<f64>,
    #[serde(default)]
    pub reorder_qty: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mpn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    pub items: Vec<BulkItemUpdate>,
}

/// `POST /api/v1/inventory/bulk-update` — descriptive fields only; quantity
/// mutations always go through `transact`.
pub async fn bulk_update(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<BulkUpdateRequest>,
) -> ApiResult {
    let mut success = 0usize;
    let mut failed = 0usize;
    let mut errors = Vec::new();

    for update in request.items {
        match apply_item_update(&state, &update).await {
            Ok(()) => success += 1,
            Err(err) => {
                failed += 1;
                errors.push(format!("{}: {}", update.ipn, err));
            }
        }
    }

    state.audit.log_enhanced(
        &actor,
        AuditAction::Update,
        "inventory",
        "",
        &format!("bulk update: {} ok, {} failed", success, failed),
        None,
        None,
    );
    Ok(data(serde_json::json!({
        "success": success,
        "failed": failed,
        "errors": errors,
    })))
}

async fn apply_item_update(state: &AppState, update: &BulkItemUpdate) -> Result<(), ZrpError> {
    let ipn = Ipn::new(update.ipn.as_str())?;
    let mut item = state
        .inventory_repo
        .get(ipn.as_str())
        .await?
        .unwrap_or_else(|| InventoryItem::empty(ipn.as_str()));

    if let Some(location) = &update.location {
        item.location = location.clone();
    }
    if let Some(reorder_point) = update.reorder_point {
        if reorder_point < 0.0 {
            return Err(ZrpError::bad_request("reorder_point must be non-negative"));
        }
        item.reorder_point = reorder_point;
    }
    if let Some(reorder_qty) = update.reorder_qty {
        if reorder_qty < 0.0 {
            return Err(ZrpError::bad_request("reorder_qty must be non-negative"));
        }
        item.reorder_qty = reorder_qty;
    }
    if let Some(description) = &update.description {
        item.description = description.clone();
    }
    if let Some(mpn) = &update.mpn {
        item.mpn = mpn.clone();
    }

    state.inventory_repo.upsert_item(&item).await
}
