// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Audit Trail Entries
//!
//! Append-only records of who did what. Rows are never edited; the only
//! deletion path is the retention-driven purge. Before/after snapshots are
//! JSON strings capped at [`MAX_SNAPSHOT_BYTES`] each — audit exists for
//! accountability, not as a backup, so oversized values are truncated rather
//! than refused.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Size cap applied to `before_value` / `after_value` snapshots.
pub const MAX_SNAPSHOT_BYTES: usize = 4096;

/// Retention policy bounds, in days.
pub const MIN_RETENTION_DAYS: i64 = 30;
pub const MAX_RETENTION_DAYS: i64 = 3650;

/// What happened. The closed set covers the standard CRUD/auth/workflow
/// verbs; anything else travels as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    View,
    ViewSensitive,
    Export,
    Login,
    Logout,
    Approve,
    Reject,
    Custom(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::View => "VIEW",
            AuditAction::ViewSensitive => "VIEW_SENSITIVE",
            AuditAction::Export => "EXPORT",
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::Approve => "APPROVE",
            AuditAction::Reject => "REJECT",
            AuditAction::Custom(s) => s,
        }
    }

    /// Total parse; unknown verbs become `Custom`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "CREATE" => AuditAction::Create,
            "UPDATE" => AuditAction::Update,
            "DELETE" => AuditAction::Delete,
            "VIEW" => AuditAction::View,
            "VIEW_SENSITIVE" => AuditAction::ViewSensitive,
            "EXPORT" => AuditAction::Export,
            "LOGIN" => AuditAction::Login,
            "LOGOUT" => AuditAction::Logout,
            "APPROVE" => AuditAction::Approve,
            "REJECT" => AuditAction::Reject,
            other => AuditAction::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AuditAction {
    fn from(value: String) -> Self {
        AuditAction::parse(&value)
    }
}

impl From<AuditAction> for String {
    fn from(value: AuditAction) -> Self {
        value.as_str().to_string()
    }
}

/// Persisted audit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub username: String,
    pub action: AuditAction,
    pub module: String,
    pub record_id: String,
    pub summary: String,
    pub before_value: Option<String>,
    pub after_value: Option<String>,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

/// Audit record before insertion; what callers hand to the recorder.
#[derive(Debug, Clone, Default)]
pub struct NewAuditEntry {
    pub user_id: Option<i64>,
    pub username: String,
    pub action: Option<AuditAction>,
    pub module: String,
    pub record_id: String,
    pub summary: String,
    pub before_value: Option<String>,
    pub after_value: Option<String>,
    pub ip_address: String,
    pub user_agent: String,
}

impl NewAuditEntry {
    /// Applies the snapshot size cap. UTF-8 boundaries are respected; the
    /// result is marked so truncation is visible in the trail.
    pub fn cap_snapshots(mut self) -> Self {
        self.before_value = self.before_value.map(cap_snapshot);
        self.after_value = self.after_value.map(cap_snapshot);
        self
    }
}

fn cap_snapshot(value: String) -> String {
    if value.len() <= MAX_SNAPSHOT_BYTES {
        return value;
    }
    let mut cut = MAX_SNAPSHOT_BYTES;
    while cut > 0 && !value.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…[truncated]", &value[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse_is_total() {
        assert_eq!(AuditAction::parse("CREATE"), AuditAction::Create);
        assert_eq!(AuditAction::parse("VIEW_SENSITIVE"), AuditAction::ViewSensitive);
        assert_eq!(
            AuditAction::parse("BULK_ARCHIVE"),
            AuditAction::Custom("BULK_ARCHIVE".to_string())
        );
    }

    #[test]
    fn test_snapshot_cap() {
        let big = "x".repeat(MAX_SNAPSHOT_BYTES * 2);
        let entry = NewAuditEntry {
            before_value: Some(big.clone()),
            after_value: Some("small".to_string()),
            ..Default::default()
        }
        .cap_snapshots();
        let before = entry.before_value.unwrap();
        assert!(before.len() < big.len());
        assert!(before.ends_with("[truncated]"));
        assert_eq!(entry.after_value.as_deref(), Some("small"));
    }

    #[test]
    fn test_snapshot_cap_respects_utf8_boundaries() {
        let big = "é".repeat(MAX_SNAPSHOT_BYTES);
        let capped = cap_snapshot(big);
        assert!(capped.is_char_boundary(capped.len()));
    }
}
