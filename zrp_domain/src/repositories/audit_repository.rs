// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence port for the audit trail (append + retention purge only).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{AuditEntry, NewAuditEntry};
use crate::ZrpError;

/// Filters for listing/exporting the trail.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub module: Option<String>,
    pub action: Option<String>,
    pub username: Option<String>,
    pub record_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one entry, returning its id.
    async fn insert(&self, entry: &NewAuditEntry) -> Result<i64, ZrpError>;

    async fn list(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, ZrpError>;

    async fn count(&self) -> Result<i64, ZrpError>;

    /// Retention purge; returns deleted row count.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, ZrpError>;
}
