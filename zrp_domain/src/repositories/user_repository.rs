// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence port for user accounts.

use async_trait::async_trait;

use crate::entities::{Role, User};
use crate::ZrpError;

/// Fields required to create an account. The hash is produced by the
/// application layer; repositories never see plaintext passwords.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub email: Option<String>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new account. Duplicate usernames surface as `Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, ZrpError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ZrpError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ZrpError>;

    async fn list_all(&self) -> Result<Vec<User>, ZrpError>;

    /// Updates role/active/email. Returns false when the id is unknown.
    async fn update(&self, user: &User) -> Result<bool, ZrpError>;

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, ZrpError>;

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, ZrpError>;

    async fn delete(&self, id: i64) -> Result<bool, ZrpError>;

    async fn count(&self) -> Result<i64, ZrpError>;
}
