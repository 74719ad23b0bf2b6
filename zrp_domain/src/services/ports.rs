// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Collaborator Capability Ports
//!
//! Small single-capability traits the application services depend on instead
//! of each other. Handlers receive concrete implementations through the
//! composition root; tests substitute fakes.
//!
//! - [`Auditor`] — fire-and-forget audit emission; enqueue must never block
//!   the caller's critical path.
//! - [`Broadcaster`] — push an event to every connected WebSocket client.
//! - [`PermissionChecker`] — RBAC matrix lookup; pure in-memory read.
//! - [`IdAllocator`] — per-prefix sequential id allocation (`ECO-001`, …).

use async_trait::async_trait;

use crate::entities::{NewAuditEntry, Role};
use crate::value_objects::{Action, IdPrefix, Module};
use crate::ZrpError;

/// Fire-and-forget audit sink.
pub trait Auditor: Send + Sync {
    /// Enqueues one entry. Must not block; at capacity the oldest queued
    /// entry is dropped in favor of the new one.
    fn record(&self, entry: NewAuditEntry);
}

/// Event fan-out to live clients.
pub trait Broadcaster: Send + Sync {
    /// Best-effort delivery; lagging receivers miss messages rather than
    /// applying back-pressure.
    fn broadcast(&self, message: serde_json::Value);
}

/// RBAC matrix lookup.
pub trait PermissionChecker: Send + Sync {
    /// Missing entries mean denied.
    fn has_permission(&self, role: &Role, module: Module, action: Action) -> bool;
}

/// Allocator behind human-readable record ids.
#[async_trait]
pub trait IdAllocator: Send + Sync {
    /// Returns the next formatted id for the family, e.g. `ECO-042`.
    async fn next_id(&self, prefix: IdPrefix) -> Result<String, ZrpError>;
}
