// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Inventory Persistence Port
//!
//! The single write entry point is [`InventoryRepository::apply_movement`]:
//! row mutation and journal append happen inside one store transaction, so
//! readers never observe a journal entry whose effect is not yet visible in
//! the row. Handlers must not update quantity columns any other way.

use async_trait::async_trait;

use crate::entities::{InventoryItem, InventoryTransaction, NewTransaction};
use crate::ZrpError;

/// How the movement touches `qty_on_hand`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QtyChange {
    /// `qty_on_hand = qty_on_hand + delta` (delta may be negative).
    Delta(f64),
    /// `qty_on_hand = value` (the `adjust` type).
    Set(f64),
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn get(&self, ipn: &str) -> Result<Option<InventoryItem>, ZrpError>;

    async fn list_all(&self) -> Result<Vec<InventoryItem>, ZrpError>;

    /// Creates or updates the descriptive fields of an item (location,
    /// reorder policy, description, mpn). Quantity columns are untouched.
    async fn upsert_item(&self, item: &InventoryItem) -> Result<(), ZrpError>;

    /// Atomically: ensure the row exists, apply `change`, append `journal`.
    ///
    /// The store's CHECK constraint rejects negative outcomes; that failure
    /// maps to `ConstraintViolation` and nothing is persisted. Returns the
    /// post-movement `qty_on_hand`.
    async fn apply_movement(
        &self,
        ipn: &str,
        change: QtyChange,
        journal: &[NewTransaction],
    ) -> Result<f64, ZrpError>;

    async fn list_transactions(&self, ipn: &str, limit: i64) -> Result<Vec<InventoryTransaction>, ZrpError>;

    async fn count_transactions(&self, ipn: &str) -> Result<i64, ZrpError>;
}
