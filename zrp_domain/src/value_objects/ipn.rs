// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Internal Part Number
//!
//! `Ipn` is the validated identifier of a part. It is the join key between
//! the CSV catalog on disk, the `inventory` table, and part-change rows, so
//! the character set is restricted to what is safe in all three places: no
//! whitespace, no path separators, no CSV-hostile characters.
//!
//! ## Validation Rules
//!
//! - Non-empty, at most 64 characters
//! - ASCII alphanumerics plus `-`, `_` and `.`
//! - Must not begin with `.` (would hide files on disk)
//!
//! Validation happens once at the boundary; the rest of the system treats an
//! `Ipn` as known-good and moves `&str` views around.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ZrpError;

/// Maximum accepted IPN length.
pub const MAX_IPN_LEN: usize = 64;

/// Validated Internal Part Number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipn(String);

impl Ipn {
    /// Parses and validates an IPN.
    pub fn new(raw: impl Into<String>) -> Result<Self, ZrpError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ZrpError::validation("IPN must not be empty"));
        }
        if raw.len() > MAX_IPN_LEN {
            return Err(ZrpError::validation(format!(
                "IPN exceeds {} characters: {}",
                MAX_IPN_LEN, raw
            )));
        }
        if raw.starts_with('.') {
            return Err(ZrpError::validation(format!("IPN must not start with '.': {}", raw)));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(ZrpError::validation(format!(
                "IPN contains invalid character {:?}: {}",
                bad, raw
            )));
        }
        Ok(Self(raw))
    }

    /// Borrow the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive equality against a raw catalog cell.
    pub fn matches(&self, cell: &str) -> bool {
        self.0.eq_ignore_ascii_case(cell.trim())
    }
}

impl fmt::Display for Ipn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ipn {
    type Err = ZrpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipn {
    type Error = ZrpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipn> for String {
    fn from(value: Ipn) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_typical_part_numbers() {
        for ok in ["RES-0001", "CAP_100nF", "PCA-2040.A", "IC7400"] {
            assert!(Ipn::new(ok).is_ok(), "{} should parse", ok);
        }
    }

    #[test]
    fn test_rejects_hostile_input() {
        for bad in ["", "a b", "../etc/passwd", ".hidden", "x,y", "naïve"] {
            assert!(Ipn::new(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_matches_is_case_insensitive_and_trims() {
        let ipn = Ipn::new("RES-0001").unwrap();
        assert!(ipn.matches("res-0001"));
        assert!(ipn.matches(" RES-0001 "));
        assert!(!ipn.matches("RES-0002"));
    }

    proptest! {
        #[test]
        fn prop_valid_ipns_round_trip(s in "[A-Za-z0-9][A-Za-z0-9._-]{0,62}") {
            let ipn = Ipn::new(s.clone()).unwrap();
            prop_assert_eq!(ipn.as_str(), s.as_str());
            prop_assert_eq!(Ipn::from_str(ipn.as_str()).unwrap(), ipn);
        }
    }
}
