// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # User Accounts and Roles
//!
//! A `User` is a cookie-session principal. The password is stored only as an
//! argon2 hash (hashing itself lives in the application layer; the entity
//! just carries the opaque string). Deactivating a user does not delete
//! sessions — the credential resolver rejects inactive users at next use.
//!
//! `Role` is an open set: `admin`, `user` and `readonly` are seeded with a
//! default permission matrix, but operators may add custom roles, so parsing
//! never fails — unknown names become [`Role::Other`] and fall through the
//! permission cache like any other role (absent entries mean denied).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Principal role used as the first coordinate of the RBAC matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    User,
    Readonly,
    /// Operator-defined role; permissions come solely from the matrix.
    Other(String),
}

impl Role {
    /// Total parse: unknown names become `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Role::Admin,
            "user" => Role::User,
            "readonly" => Role::Readonly,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Readonly => "readonly",
            Role::Other(name) => name,
        }
    }

    /// Admin-only surfaces bypass the matrix and check this directly.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// A login-capable account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Opaque argon2 PHC string. Never serialized to API responses; the
    /// presentation layer maps users through [`User::public_view`].
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// JSON shape safe to return from the API (no credential material).
    pub fn public_view(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "username": self.username,
            "role": self.role.as_str(),
            "active": self.active,
            "email": self.email,
            "created_at": self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_total() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("readonly"), Role::Readonly);
        assert_eq!(Role::parse("quality"), Role::Other("quality".to_string()));
        assert!(!Role::parse("quality").is_admin());
        assert!(Role::parse("admin").is_admin());
    }

    #[test]
    fn test_public_view_hides_credentials() {
        let user = User {
            id: 1,
            username: "jdoe".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            role: Role::User,
            active: true,
            email: None,
            created_at: Utc::now(),
        };
        let rendered = user.public_view().to_string();
        assert!(!rendered.contains("argon2"));
        assert!(rendered.contains("jdoe"));
    }
}
