// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ZRP PLM Back-End
//!
//! JSON/HTTP API for a single-organization PLM/light-ERP system: parts and
//! their change workflow (ECOs), inventory with a journaled transaction
//! engine, RBAC over cookie sessions and bearer API keys, rate limiting,
//! and an audit trail — backed by SQLite and an on-disk CSV parts catalog.
//!
//! Layout follows the domain / application+infrastructure / presentation
//! split; the `zrp-domain` crate holds the pure business logic and this
//! crate supplies everything that touches a runtime, a socket or a disk.

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use presentation::http::{build_router, AppState};
