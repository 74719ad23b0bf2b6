// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Authorization Middleware
//!
//! Maps every API route deterministically onto a `(module, action)` pair
//! and consults the permission cache. The mapping is pure and lives next to
//! its tests:
//!
//! - path segment after `/api/v1/` names the module (normalized, with a few
//!   aliases such as `part-changes` → `parts`)
//! - HTTP method maps GET→view, POST→create, PUT/PATCH→edit, DELETE→delete
//! - trailing `approve`/`implement` segments map to the `approve` action
//! - unknown paths fall back to `(admin, view)` — fail closed
//!
//! A small set of prefixes is admin-only regardless of the matrix. Bearer
//! API keys bypass RBAC entirely: they are service accounts with implicit
//! full privileges (kept from the original contract; a stored key role
//! could route them through the matrix here).

use std::str::FromStr;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use zrp_domain::services::PermissionChecker;
use zrp_domain::value_objects::{Action, Module};
use zrp_domain::ZrpError;

use crate::application::services::{AuthMethod, Principal};
use crate::presentation::http::error::ApiError;
use crate::presentation::http::state::AppState;

/// Prefixes (relative to `/api/v1/`) only admins may touch.
const ADMIN_ONLY_PREFIXES: [&str; 6] = ["users", "apikeys", "api-keys", "email", "settings", "admin"];

/// Module aliases: URL segment → matrix module name.
fn module_for_segment(segment: &str) -> Module {
    let normalized = segment.to_ascii_lowercase().replace('-', "_");
    let aliased = match normalized.as_str() {
        "part_changes" => "parts",
        "audit" => "admin",
        "permissions" => "admin",
        other => other,
    };
    Module::from_str(aliased).unwrap_or(Module::Admin)
}

/// Deterministic route → permission mapping.
pub fn permission_for(path: &str, method: &Method) -> (Module, Action) {
    let Some(rest) = path.strip_prefix("/api/v1/") else {
        // Fail closed on anything unrecognized.
        return (Module::Admin, Action::View);
    };
    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let module = match segments.next() {
        // Bulk actions borrow their module from the target resource.
        Some("bulk") => segments.next().map(module_for_segment).unwrap_or(Module::Admin),
        Some(first) => module_for_segment(first),
        None => Module::Admin,
    };

    if let Some(last) = rest.split('/').filter(|s| !s.is_empty()).last() {
        if matches!(last, "approve" | "implement") {
            return (module, Action::Approve);
        }
    }

    let action = match *method {
        Method::GET => Action::View,
        Method::POST => Action::Create,
        Method::PUT | Method::PATCH => Action::Edit,
        Method::DELETE => Action::Delete,
        _ => Action::View,
    };
    (module, action)
}

/// True when the path is reserved to admins.
pub fn is_admin_only(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/api/v1/") else {
        return false;
    };
    let first = rest.split('/').next().unwrap_or("");
    ADMIN_ONLY_PREFIXES.contains(&first)
}

pub async fn authorize(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let Some(principal) = request.extensions().get::<Principal>() else {
        // Exempt route; authentication never ran.
        return next.run(request).await;
    };

    // Bearer keys are service accounts with implicit full privileges.
    if principal.method == AuthMethod::ApiKey {
        return next.run(request).await;
    }

    let Some(role) = principal.role.clone() else {
        return ApiError(ZrpError::forbidden("forbidden")).into_response();
    };

    let path = request.uri().path();
    // Non-API authenticated surfaces (`/auth/me`, `/auth/logout`) need a
    // principal, not a matrix entry.
    if !path.starts_with("/api/v1/") {
        return next.run(request).await;
    }
    if is_admin_only(path) {
        if role.is_admin() {
            return next.run(request).await;
        }
        return ApiError(ZrpError::forbidden("forbidden")).into_response();
    }

    let (module, action) = permission_for(path, request.method());
    if state.permissions.has_permission(&role, module, action) {
        next.run(request).await
    } else {
        ApiError(ZrpError::forbidden("forbidden")).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_and_action_mapping() {
        assert_eq!(permission_for("/api/v1/parts", &Method::GET), (Module::Parts, Action::View));
        assert_eq!(
            permission_for("/api/v1/parts/RES-0001", &Method::DELETE),
            (Module::Parts, Action::Delete)
        );
        assert_eq!(
            permission_for("/api/v1/part-changes", &Method::POST),
            (Module::Parts, Action::Create)
        );
        assert_eq!(
            permission_for("/api/v1/inventory/transact", &Method::POST),
            (Module::Inventory, Action::Create)
        );
        assert_eq!(
            permission_for("/api/v1/field-reports", &Method::PUT),
            (Module::FieldReports, Action::Edit)
        );
    }

    #[test]
    fn test_workflow_verbs_map_to_approve() {
        assert_eq!(
            permission_for("/api/v1/ecos/ECO-001/approve", &Method::POST),
            (Module::Ecos, Action::Approve)
        );
        assert_eq!(
            permission_for("/api/v1/ecos/ECO-001/implement", &Method::POST),
            (Module::Ecos, Action::Approve)
        );
    }

    #[test]
    fn test_unknown_paths_fail_closed() {
        assert_eq!(
            permission_for("/api/v1/warehouse-robots", &Method::GET),
            (Module::Admin, Action::View)
        );
        assert_eq!(permission_for("/somewhere/else", &Method::GET), (Module::Admin, Action::View));
    }

    #[test]
    fn test_bulk_borrows_target_module() {
        assert_eq!(
            permission_for("/api/v1/bulk/ecos", &Method::POST),
            (Module::Ecos, Action::Create)
        );
    }

    #[test]
    fn test_admin_only_prefixes() {
        assert!(is_admin_only("/api/v1/users"));
        assert!(is_admin_only("/api/v1/users/3"));
        assert!(is_admin_only("/api/v1/apikeys"));
        assert!(is_admin_only("/api/v1/api-keys/7"));
        assert!(is_admin_only("/api/v1/settings/audit"));
        assert!(!is_admin_only("/api/v1/parts"));
        assert!(!is_admin_only("/auth/me"));
    }
}
