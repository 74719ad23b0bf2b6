// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Permission Coordinates
//!
//! The RBAC matrix is keyed by `(role, module, action)`. `Module` and
//! `Action` are the closed sets of valid coordinates; every API route maps
//! deterministically onto one pair (the mapping itself lives in the
//! presentation layer, next to the route table).
//!
//! Both enums serialize as their lowercase wire names, which are also the
//! strings stored in the `permissions` table. Parsing an unknown name fails
//! rather than defaulting, so a typo in a stored row surfaces as an error
//! instead of a silent denial with the wrong key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ZrpError;

/// Functional area a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Parts,
    Ecos,
    Documents,
    Inventory,
    Vendors,
    Pos,
    Workorders,
    Ncrs,
    Rmas,
    Quotes,
    Pricing,
    Devices,
    Firmware,
    Shipments,
    FieldReports,
    Rfqs,
    Reports,
    Testing,
    Admin,
}

impl Module {
    /// All modules, in matrix-seeding order.
    pub const ALL: [Module; 19] = [
        Module::Parts,
        Module::Ecos,
        Module::Documents,
        Module::Inventory,
        Module::Vendors,
        Module::Pos,
        Module::Workorders,
        Module::Ncrs,
        Module::Rmas,
        Module::Quotes,
        Module::Pricing,
        Module::Devices,
        Module::Firmware,
        Module::Shipments,
        Module::FieldReports,
        Module::Rfqs,
        Module::Reports,
        Module::Testing,
        Module::Admin,
    ];

    /// Modules where the default `user` role may create and edit.
    pub const OPERATIONAL: [Module; 8] = [
        Module::Parts,
        Module::Ecos,
        Module::Documents,
        Module::Inventory,
        Module::Workorders,
        Module::Ncrs,
        Module::Rmas,
        Module::FieldReports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Parts => "parts",
            Module::Ecos => "ecos",
            Module::Documents => "documents",
            Module::Inventory => "inventory",
            Module::Vendors => "vendors",
            Module::Pos => "pos",
            Module::Workorders => "workorders",
            Module::Ncrs => "ncrs",
            Module::Rmas => "rmas",
            Module::Quotes => "quotes",
            Module::Pricing => "pricing",
            Module::Devices => "devices",
            Module::Firmware => "firmware",
            Module::Shipments => "shipments",
            Module::FieldReports => "field_reports",
            Module::Rfqs => "rfqs",
            Module::Reports => "reports",
            Module::Testing => "testing",
            Module::Admin => "admin",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = ZrpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| ZrpError::validation(format!("unknown permission module: {}", s)))
    }
}

/// Operation class a permission grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Approve,
}

impl Action {
    pub const ALL: [Action; 5] = [Action::View, Action::Create, Action::Edit, Action::Delete, Action::Approve];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Approve => "approve",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ZrpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| ZrpError::validation(format!("unknown permission action: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_names_round_trip() {
        for module in Module::ALL {
            assert_eq!(Module::from_str(module.as_str()).unwrap(), module);
        }
        assert!(Module::from_str("Parts").is_err());
        assert!(Module::from_str("warehouse").is_err());
    }

    #[test]
    fn test_action_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_str(action.as_str()).unwrap(), action);
        }
        assert!(Action::from_str("write").is_err());
    }

    #[test]
    fn test_operational_modules_are_a_subset() {
        for module in Module::OPERATIONAL {
            assert!(Module::ALL.contains(&module));
        }
    }
}
