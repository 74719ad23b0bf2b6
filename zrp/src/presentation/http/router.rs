// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Router and Middleware Composition
//!
//! One declarative place wiring every route and the middleware pipeline.
//! Layer order (outermost first): panic recovery → security headers → rate
//! limit → request timeout → CORS/trace → authenticate → authorize →
//! handler. axum applies the *last* added layer first, so the `.layer`
//! calls below read inside-out.
//!
//! The RBAC mapping consumed by the authorize layer lives in
//! [`middleware::rbac::permission_for`] so the route table and the
//! permission table cannot drift apart silently: both are derived from the
//! same path shapes.

use std::time::Duration;

use axum::http::{HeaderValue, StatusCode};
use axum::middleware as axum_middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::handlers::{api_keys, audit, auth, bulk, ecos, inventory, parts, permissions, users};
use super::middleware::{auth as auth_middleware, rate_limit, rbac, security_headers};
use super::state::AppState;
use super::ws;

/// `GET /healthz`
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /api/v1/openapi.json` — enough for clients to discover the server.
async fn openapi() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "openapi": "3.0.0",
        "info": { "title": "zrp", "version": env!("CARGO_PKG_VERSION") },
    }))
}

/// A panicking handler becomes a plain 500; the stack trace goes to the
/// server log, never to the client.
fn handle_panic(panic: Box<dyn std::any::Any + Send + 'static>) -> axum::http::Response<axum::body::Body> {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(panic = %detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "internal error", "code": "INTERNAL" })),
    )
        .into_response()
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match state.config.cors_allow_origin.as_str() {
        "*" => layer.allow_origin(Any),
        origin => match HeaderValue::from_str(origin) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => layer.allow_origin(Any),
        },
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Parts catalog + change workflow
        .route("/parts", get(parts::list_parts))
        .route("/parts/:ipn", get(parts::get_part))
        .route(
            "/parts/:ipn/changes",
            get(parts::list_part_changes).post(parts::create_part_change),
        )
        .route("/parts/:ipn/changes/create-eco", post(parts::create_eco_from_changes))
        .route("/part-changes", get(parts::list_changes))
        .route("/part-changes/:id", delete(parts::delete_change))
        // ECO lifecycle
        .route("/ecos", get(ecos::list))
        .route("/ecos/:id", get(ecos::get))
        .route("/ecos/:id/part-changes", get(ecos::part_changes))
        .route("/ecos/:id/submit", post(ecos::submit))
        .route("/ecos/:id/approve", post(ecos::approve))
        .route("/ecos/:id/implement", post(ecos::implement))
        .route("/ecos/:id/reject", post(ecos::reject))
        .route("/ecos/:id/cancel", post(ecos::cancel))
        // Inventory
        .route("/inventory", get(inventory::list))
        .route("/inventory/low-stock", get(inventory::low_stock))
        .route("/inventory/transact", post(inventory::transact))
        .route("/inventory/bulk-update", post(inventory::bulk_update))
        .route("/inventory/:ipn", get(inventory::get))
        .route("/inventory/:ipn/transactions", get(inventory::transactions))
        // Audit
        .route("/audit", get(audit::list))
        .route("/audit/export", get(audit::export))
        .route("/audit/retention", get(audit::get_retention).put(audit::set_retention))
        .route("/audit/cleanup", post(audit::cleanup))
        // Admin surfaces
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route("/users/:id/password", put(users::set_password))
        .route("/apikeys", get(api_keys::list).post(api_keys::create))
        .route("/apikeys/:id", put(api_keys::set_enabled).delete(api_keys::delete))
        .route("/admin/permissions", get(permissions::matrix).put(permissions::update_matrix))
        // Permissions introspection
        .route("/permissions/me", get(permissions::me))
        .route("/permissions/modules", get(permissions::modules))
        // Bulk actions
        .route("/bulk/:resource", post(bulk::bulk))
        // Events
        .route("/ws", get(ws::ws_handler))
        .route("/openapi.json", get(openapi));

    Router::new()
        .route("/healthz", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .nest("/api/v1", api)
        // Innermost: authorize, then authenticate beneath it, out to the
        // security headers. `.layer` order is inside-out.
        .layer(axum_middleware::from_fn_with_state(state.clone(), rbac::authorize))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware::authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state))
        .layer(TimeoutLayer::new(Duration::from_secs(state.config.request_timeout_secs)))
        .layer(axum_middleware::from_fn_with_state(state.clone(), rate_limit::rate_limit))
        .layer(axum_middleware::from_fn(security_headers::security_headers))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}
