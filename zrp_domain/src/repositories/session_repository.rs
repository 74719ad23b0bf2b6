// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence port for cookie sessions.
//!
//! Expired rows stay until [`SessionRepository::delete_expired`] runs;
//! resolution treats them as invalid but never deletes implicitly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::Session;
use crate::ZrpError;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<(), ZrpError>;

    async fn find(&self, token: &str) -> Result<Option<Session>, ZrpError>;

    /// Slides the expiry window (the per-request sliding-session UPDATE).
    async fn touch(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
        last_activity: DateTime<Utc>,
    ) -> Result<bool, ZrpError>;

    async fn delete(&self, token: &str) -> Result<bool, ZrpError>;

    /// Invalidate every session of one user (password change, deactivation).
    async fn delete_for_user(&self, user_id: i64) -> Result<u64, ZrpError>;

    /// Explicit maintenance sweep; returns purged row count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, ZrpError>;
}
