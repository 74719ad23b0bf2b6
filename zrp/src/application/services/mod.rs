// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Application services orchestrating domain logic over the ports.

pub mod audit;
pub mod auth;
pub mod eco;
pub mod id_allocator;
pub mod inventory;
pub mod permissions;

pub use audit::{AuditActor, AuditRecorder};
pub use auth::{AuthMethod, AuthService, Principal};
pub use eco::{ApplySummary, CreateEcoRequest, EcoService};
pub use id_allocator::SequenceIdAllocator;
pub use inventory::{InventoryService, TransactOutcome, TransactRequest};
pub use permissions::PermissionCache;
