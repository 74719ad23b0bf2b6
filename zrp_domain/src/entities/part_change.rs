// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Part Changes
//!
//! A `PartChange` is a proposed edit to a single field of a single part's
//! catalog row. Changes are born `draft`, become `pending` when an ECO
//! adopts them, and end `applied` or `rejected` when that ECO is
//! implemented, rejected or cancelled. Both end states are terminal.
//!
//! ```text
//! draft ──associate to ECO──► pending ──ECO implement ok───► applied
//!   │                                 ├─ECO implement fail─► rejected
//!   └─ delete (only here)             └─ECO reject/cancel──► rejected
//! ```
//!
//! Only `draft` changes may be deleted; everything else is history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ZrpError;

/// Lifecycle state of a part change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Draft,
    Pending,
    Applied,
    Rejected,
}

impl ChangeStatus {
    pub const ALL: [ChangeStatus; 4] = [
        ChangeStatus::Draft,
        ChangeStatus::Pending,
        ChangeStatus::Applied,
        ChangeStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Draft => "draft",
            ChangeStatus::Pending => "pending",
            ChangeStatus::Applied => "applied",
            ChangeStatus::Rejected => "rejected",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChangeStatus::Applied | ChangeStatus::Rejected)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeStatus {
    type Err = ZrpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChangeStatus::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| ZrpError::validation(format!("unknown change status: {}", s)))
    }
}

/// Proposed field-level edit to a part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartChange {
    pub id: i64,
    pub part_ipn: String,
    pub eco_id: Option<String>,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub status: ChangeStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl PartChange {
    /// Deletion is allowed only before an ECO adopts the change.
    pub fn can_delete(&self) -> bool {
        self.status == ChangeStatus::Draft
    }

    /// Whether this change renames the part itself. Applied renames cascade
    /// into BOM references.
    pub fn is_ipn_rename(&self) -> bool {
        matches!(
            self.field_name.to_ascii_lowercase().as_str(),
            "ipn" | "part_number" | "pn"
        )
    }
}
