// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engineering Change Orders
//!
//! An ECO batches part changes for review and implementation. The entity
//! owns its state machine; services call the transition methods and never
//! write `status` directly, so an illegal transition is unrepresentable
//! outside of raw store manipulation.
//!
//! ```text
//! draft ──submit──► review ──approve──► approved ──implement──► implemented
//!   │                  │                   ├──reject──────────► rejected
//!   │                  ├──reject─────────► rejected
//!   └──cancel──►       └──cancel──►        └──cancel──────────► cancelled
//! ```
//!
//! `implemented`, `rejected` and `cancelled` are terminal. Only `approved`
//! ECOs may be implemented, and implementation requires the RBAC `approve`
//! action on module `ecos`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ZrpError;

/// ECO lifecycle state. Stored lowercase, CHECK-constrained in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcoStatus {
    Draft,
    Review,
    Approved,
    Implemented,
    Rejected,
    Cancelled,
}

impl EcoStatus {
    pub const ALL: [EcoStatus; 6] = [
        EcoStatus::Draft,
        EcoStatus::Review,
        EcoStatus::Approved,
        EcoStatus::Implemented,
        EcoStatus::Rejected,
        EcoStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EcoStatus::Draft => "draft",
            EcoStatus::Review => "review",
            EcoStatus::Approved => "approved",
            EcoStatus::Implemented => "implemented",
            EcoStatus::Rejected => "rejected",
            EcoStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EcoStatus::Implemented | EcoStatus::Rejected | EcoStatus::Cancelled)
    }

    /// The legal transition relation.
    pub fn can_transition_to(&self, next: EcoStatus) -> bool {
        use EcoStatus::*;
        matches!(
            (self, next),
            (Draft, Review)
                | (Draft, Cancelled)
                | (Review, Approved)
                | (Review, Rejected)
                | (Review, Cancelled)
                | (Approved, Implemented)
                | (Approved, Rejected)
                | (Approved, Cancelled)
        )
    }
}

impl fmt::Display for EcoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EcoStatus {
    type Err = ZrpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EcoStatus::ALL
            .iter()
            .find(|e| e.as_str() == s)
            .copied()
            .ok_or_else(|| ZrpError::validation(format!("unknown ECO status: {}", s)))
    }
}

/// Review priority, informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcoPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl EcoPriority {
    pub const ALL: [EcoPriority; 4] = [
        EcoPriority::Low,
        EcoPriority::Normal,
        EcoPriority::High,
        EcoPriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EcoPriority::Low => "low",
            EcoPriority::Normal => "normal",
            EcoPriority::High => "high",
            EcoPriority::Critical => "critical",
        }
    }
}

impl fmt::Display for EcoPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EcoPriority {
    type Err = ZrpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EcoPriority::ALL
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| ZrpError::validation(format!("unknown ECO priority: {}", s)))
    }
}

/// The workflow aggregate batching part changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eco {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: EcoStatus,
    pub priority: EcoPriority,
    /// Ordered, deduplicated list of IPNs this ECO touches.
    pub affected_ipns: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Eco {
    /// Creates a new draft ECO.
    pub fn new_draft(
        id: String,
        title: String,
        description: String,
        priority: EcoPriority,
        affected_ipns: Vec<String>,
        created_by: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description,
            status: EcoStatus::Draft,
            priority,
            affected_ipns,
            created_by,
            created_at: now,
            updated_at: now,
            approved_by: None,
            approved_at: None,
        }
    }

    fn transition(&mut self, next: EcoStatus) -> Result<(), ZrpError> {
        if !self.status.can_transition_to(next) {
            return Err(ZrpError::InvalidTransition(format!(
                "ECO {} cannot move {} -> {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// draft → review.
    pub fn submit(&mut self) -> Result<(), ZrpError> {
        self.transition(EcoStatus::Review)
    }

    /// review → approved; records who approved and when.
    pub fn approve(&mut self, approver: &str) -> Result<(), ZrpError> {
        self.transition(EcoStatus::Approved)?;
        self.approved_by = Some(approver.to_string());
        self.approved_at = Some(Utc::now());
        Ok(())
    }

    /// approved → implemented.
    pub fn implement(&mut self) -> Result<(), ZrpError> {
        self.transition(EcoStatus::Implemented)
    }

    /// review/approved → rejected.
    pub fn reject(&mut self) -> Result<(), ZrpError> {
        self.transition(EcoStatus::Rejected)
    }

    /// Any non-terminal state → cancelled.
    pub fn cancel(&mut self) -> Result<(), ZrpError> {
        self.transition(EcoStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Eco {
        Eco::new_draft(
            "ECO-001".to_string(),
            "Resistor value change".to_string(),
            String::new(),
            EcoPriority::Normal,
            vec!["RES-0001".to_string()],
            "jdoe".to_string(),
        )
    }

    #[test]
    fn test_happy_path() {
        let mut eco = draft();
        eco.submit().unwrap();
        assert_eq!(eco.status, EcoStatus::Review);
        eco.approve("admin").unwrap();
        assert_eq!(eco.status, EcoStatus::Approved);
        assert_eq!(eco.approved_by.as_deref(), Some("admin"));
        assert!(eco.approved_at.is_some());
        eco.implement().unwrap();
        assert_eq!(eco.status, EcoStatus::Implemented);
        assert!(eco.status.is_terminal());
    }

    #[test]
    fn test_implement_requires_approved() {
        let mut eco = draft();
        assert!(eco.implement().is_err());
        eco.submit().unwrap();
        assert!(eco.implement().is_err());
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        let mut eco = draft();
        eco.cancel().unwrap();
        assert!(eco.submit().is_err());
        assert!(eco.reject().is_err());
        assert!(eco.cancel().is_err());
    }

    #[test]
    fn test_reject_from_review_and_approved() {
        let mut eco = draft();
        eco.submit().unwrap();
        eco.reject().unwrap();
        assert_eq!(eco.status, EcoStatus::Rejected);

        let mut eco = draft();
        eco.submit().unwrap();
        eco.approve("admin").unwrap();
        eco.reject().unwrap();
        assert_eq!(eco.status, EcoStatus::Rejected);
    }
}
