// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence port for scalar settings and the per-prefix id counters.

use async_trait::async_trait;

use crate::ZrpError;

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ZrpError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), ZrpError>;

    /// Atomically increments and returns the next number for `prefix`.
    /// First call for an unseen prefix returns 1.
    async fn next_in_sequence(&self, prefix: &str) -> Result<i64, ZrpError>;
}
