// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `/api/v1/ecos*` — the change-order lifecycle.

use axum::extract::{Path, State};

use zrp_domain::repositories::ChangeFilter;

use crate::presentation::http::error::{data, ApiResult};
use crate::presentation::http::state::AppState;

use super::Actor;

/// `GET /api/v1/ecos`
pub async fn list(State(state): State<AppState>) -> ApiResult {
    Ok(data(state.eco_repo.list_all().await?))
}

/// `GET /api/v1/ecos/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(data(state.ecos.get(&id).await?))
}

/// `GET /api/v1/ecos/{id}/part-changes`
pub async fn part_changes(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let changes = state
        .change_repo
        .list(&ChangeFilter {
            eco_id: Some(id),
            ..Default::default()
        })
        .await?;
    Ok(data(changes))
}

/// `POST /api/v1/ecos/{id}/submit`
pub async fn submit(State(state): State<AppState>, Path(id): Path<String>, Actor(actor): Actor) -> ApiResult {
    Ok(data(state.ecos.submit(&id, &actor).await?))
}

/// `POST /api/v1/ecos/{id}/approve`
pub async fn approve(State(state): State<AppState>, Path(id): Path<String>, Actor(actor): Actor) -> ApiResult {
    Ok(data(state.ecos.approve(&id, &actor).await?))
}

/// `POST /api/v1/ecos/{id}/implement`
pub async fn implement(State(state): State<AppState>, Path(id): Path<String>, Actor(actor): Actor) -> ApiResult {
    let (eco, summary) = state.ecos.implement(&id, &actor).await?;
    Ok(data(serde_json::json!({ "eco": eco, "summary": summary })))
}

/// `POST /api/v1/ecos/{id}/reject`
pub async fn reject(State(state): State<AppState>, Path(id): Path<String>, Actor(actor): Actor) -> ApiResult {
    Ok(data(state.ecos.reject(&id, &actor).await?))
}

/// `POST /api/v1/ecos/{id}/cancel`
pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>, Actor(actor): Actor) -> ApiResult {
    Ok(data(state.ecos.cancel(&id, &actor).await?))
}
