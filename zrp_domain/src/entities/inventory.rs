// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Inventory Items and the Movement Journal
//!
//! `InventoryItem` is the live quantity row per IPN; `InventoryTransaction`
//! is the append-only journal of every movement against it. The store's
//! CHECK constraints own the non-negativity invariant — this module owns the
//! signed-delta arithmetic that each [`TransactionType`] implies:
//!
//! | type | effect on `qty_on_hand` | journal rows |
//! |---|---|---|
//! | `receive`, `return` | `+qty` | one, `+qty` |
//! | `issue`, `scrap` | `-qty` | one, `-qty` |
//! | `adjust` | set to `qty` | one, `qty - current` |
//! | `transfer` | none | two (`-qty` out, `+qty` in) |
//!
//! Journal entries are never mutated and never deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ZrpError;

/// Live stock row for one IPN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub ipn: String,
    pub qty_on_hand: f64,
    pub qty_reserved: f64,
    pub location: String,
    pub reorder_point: f64,
    pub reorder_qty: f64,
    pub description: String,
    pub mpn: String,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Empty row inserted on first movement against an unseen IPN.
    pub fn empty(ipn: &str) -> Self {
        Self {
            ipn: ipn.to_string(),
            qty_on_hand: 0.0,
            qty_reserved: 0.0,
            location: String::new(),
            reorder_point: 0.0,
            reorder_qty: 0.0,
            description: String::new(),
            mpn: String::new(),
            updated_at: Utc::now(),
        }
    }

    /// Low-stock report predicate.
    pub fn needs_reorder(&self) -> bool {
        self.reorder_point > 0.0 && self.qty_on_hand <= self.reorder_point
    }
}

/// Movement class. Stored lowercase; the store's CHECK constraint mirrors
/// this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Receive,
    Issue,
    Adjust,
    Transfer,
    Return,
    Scrap,
}

impl TransactionType {
    pub const ALL: [TransactionType; 6] = [
        TransactionType::Receive,
        TransactionType::Issue,
        TransactionType::Adjust,
        TransactionType::Transfer,
        TransactionType::Return,
        TransactionType::Scrap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Receive => "receive",
            TransactionType::Issue => "issue",
            TransactionType::Adjust => "adjust",
            TransactionType::Transfer => "transfer",
            TransactionType::Return => "return",
            TransactionType::Scrap => "scrap",
        }
    }

    /// Signed change to `qty_on_hand` given the requested `qty` and the
    /// current row value.
    pub fn delta(&self, qty: f64, current: f64) -> f64 {
        match self {
            TransactionType::Receive | TransactionType::Return => qty,
            TransactionType::Issue | TransactionType::Scrap => -qty,
            TransactionType::Adjust => qty - current,
            TransactionType::Transfer => 0.0,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ZrpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| ZrpError::validation(format!("unknown transaction type: {}", s)))
    }
}

/// One journal row. `qty` carries the signed convention described in the
/// module docs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: i64,
    pub ipn: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub qty: f64,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Journal row prior to insertion (no id, no timestamp yet).
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub ipn: String,
    pub tx_type: TransactionType,
    pub qty: f64,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_conventions() {
        assert_eq!(TransactionType::Receive.delta(10.0, 100.0), 10.0);
        assert_eq!(TransactionType::Return.delta(3.0, 100.0), 3.0);
        assert_eq!(TransactionType::Issue.delta(4.0, 100.0), -4.0);
        assert_eq!(TransactionType::Scrap.delta(2.0, 100.0), -2.0);
        assert_eq!(TransactionType::Adjust.delta(80.0, 100.0), -20.0);
        assert_eq!(TransactionType::Adjust.delta(0.0, 100.0), -100.0);
        assert_eq!(TransactionType::Transfer.delta(5.0, 100.0), 0.0);
    }

    #[test]
    fn test_type_names_round_trip() {
        for tx_type in TransactionType::ALL {
            assert_eq!(tx_type.as_str().parse::<TransactionType>().unwrap(), tx_type);
        }
        assert!("restock".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_needs_reorder() {
        let mut item = InventoryItem::empty("RES-0001");
        assert!(!item.needs_reorder(), "zero reorder point never triggers");
        item.reorder_point = 10.0;
        item.qty_on_hand = 10.0;
        assert!(item.needs_reorder());
        item.qty_on_hand = 10.5;
        assert!(!item.needs_reorder());
    }
}
