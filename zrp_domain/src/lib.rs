// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ZRP Domain Layer
//!
//! Pure business logic for the ZRP PLM back-end: entities with their state
//! machines, validated value objects, the domain error type, and the ports
//! (repository traits and capability traits) the application layer wires to
//! infrastructure.
//!
//! This crate has no runtime, no HTTP types and no SQL — those concerns live
//! in the `zrp` application crate. Everything here is synchronous business
//! logic except the ports, which are async because they front I/O.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-export commonly used types for convenient access
// These exports provide a clean API surface for consumers of the domain layer
pub use entities::{
    ApiKey, AuditAction, AuditEntry, ChangeStatus, Eco, EcoPriority, EcoStatus, InventoryItem,
    InventoryTransaction, NewAuditEntry, NewTransaction, PartChange, Role, Session, TransactionType, User,
};
pub use error::ZrpError;
pub use value_objects::{Action, IdPrefix, Ipn, Module};
