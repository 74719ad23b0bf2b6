// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Prefixed Record Identifiers
//!
//! Workflow records carry human-readable identifiers of the form
//! `<PREFIX>-<zero-padded-N>`: `ECO-001`, `PO-0042`, `RFQ-0007`. The numeric
//! part comes from the per-prefix monotone counter in `id_sequences`; this
//! module owns the formatting and parsing of the textual form.
//!
//! Pad width is a property of the resource family, not of the individual
//! id, so it is carried by [`IdPrefix`]. Numbers that outgrow the pad width
//! are rendered unpadded rather than truncated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ZrpError;

/// A resource family that allocates sequential ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdPrefix {
    prefix: &'static str,
    pad: usize,
}

impl IdPrefix {
    /// Engineering change orders: `ECO-NNN`.
    pub const ECO: IdPrefix = IdPrefix { prefix: "ECO", pad: 3 };
    /// Purchase orders: `PO-NNNN`.
    pub const PO: IdPrefix = IdPrefix { prefix: "PO", pad: 4 };
    /// Requests for quote: `RFQ-NNNN`.
    pub const RFQ: IdPrefix = IdPrefix { prefix: "RFQ", pad: 4 };
    /// Work orders: `WO-NNNN`.
    pub const WO: IdPrefix = IdPrefix { prefix: "WO", pad: 4 };
    /// Non-conformance reports: `NCR-NNNN`.
    pub const NCR: IdPrefix = IdPrefix { prefix: "NCR", pad: 4 };

    pub fn as_str(&self) -> &'static str {
        self.prefix
    }

    /// Renders sequence number `n` in this family's textual form.
    pub fn format(&self, n: i64) -> String {
        format!("{}-{:0width$}", self.prefix, n, width = self.pad)
    }

    /// Parses an id of this family back to its sequence number.
    pub fn parse(&self, id: &str) -> Result<i64, ZrpError> {
        let rest = id
            .strip_prefix(self.prefix)
            .and_then(|r| r.strip_prefix('-'))
            .ok_or_else(|| ZrpError::validation(format!("not a {} id: {}", self.prefix, id)))?;
        rest.parse::<i64>()
            .map_err(|_| ZrpError::validation(format!("malformed {} id: {}", self.prefix, id)))
    }
}

impl fmt::Display for IdPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix)
    }
}
