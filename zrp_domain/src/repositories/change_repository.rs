// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence ports for part changes and ECOs.
//!
//! [`PartChangeRepository::adopt_into_eco`] is transactional: all selected
//! drafts move to `pending` with the ECO id set, or none do.

use async_trait::async_trait;

use crate::entities::{ChangeStatus, Eco, PartChange};
use crate::ZrpError;

/// Fields for a new draft change.
#[derive(Debug, Clone)]
pub struct NewPartChange {
    pub part_ipn: String,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub created_by: String,
}

/// Optional filters for listing changes.
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    pub part_ipn: Option<String>,
    pub eco_id: Option<String>,
    pub status: Option<ChangeStatus>,
}

#[async_trait]
pub trait PartChangeRepository: Send + Sync {
    async fn insert(&self, change: NewPartChange) -> Result<PartChange, ZrpError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PartChange>, ZrpError>;

    async fn list(&self, filter: &ChangeFilter) -> Result<Vec<PartChange>, ZrpError>;

    async fn drafts_for_part(&self, part_ipn: &str) -> Result<Vec<PartChange>, ZrpError>;

    async fn pending_for_eco(&self, eco_id: &str) -> Result<Vec<PartChange>, ZrpError>;

    /// Atomically marks `change_ids` pending under `eco_id`.
    async fn adopt_into_eco(&self, change_ids: &[i64], eco_id: &str) -> Result<(), ZrpError>;

    async fn set_status(&self, id: i64, status: ChangeStatus) -> Result<bool, ZrpError>;

    async fn set_status_many(&self, ids: &[i64], status: ChangeStatus) -> Result<u64, ZrpError>;

    /// Deletes a change iff it is still `draft`. Returns false otherwise.
    async fn delete_draft(&self, id: i64) -> Result<bool, ZrpError>;
}

#[async_trait]
pub trait EcoRepository: Send + Sync {
    async fn insert(&self, eco: &Eco) -> Result<(), ZrpError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Eco>, ZrpError>;

    async fn list_all(&self) -> Result<Vec<Eco>, ZrpError>;

    /// Persists entity state after a transition. Returns false when the id
    /// is unknown.
    async fn update(&self, eco: &Eco) -> Result<bool, ZrpError>;
}
