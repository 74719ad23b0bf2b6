// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence port for the RBAC grant matrix.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::value_objects::{Action, Module};
use crate::ZrpError;

/// One cell of the matrix; unique on `(role, module, action)`. Absent cells
/// mean denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub role: String,
    pub module: Module,
    pub action: Action,
    pub granted: bool,
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<PermissionEntry>, ZrpError>;

    /// Inserts or overwrites one cell.
    async fn upsert(&self, entry: &PermissionEntry) -> Result<(), ZrpError>;

    /// Inserts cells that do not exist yet, leaving operator edits alone.
    /// Returns the number of rows actually inserted, so re-seeding is
    /// observably idempotent.
    async fn seed_missing(&self, entries: &[PermissionEntry]) -> Result<u64, ZrpError>;
}
