// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session / Credential Resolver
//!
//! Turns request credentials into a [`Principal`]:
//!
//! 1. Session cookie → token lookup. Missing/expired token ⇒ 401; inactive
//!    user ⇒ 403. Success slides the expiry window (one UPDATE per request).
//! 2. `Authorization: Bearer zrp_…` → SHA-256 digest lookup. Disabled or
//!    expired keys fail closed with 401.
//!
//! Login verifies argon2 hashes on a blocking thread (memory-hard hashing
//! must not stall the async runtime) and returns one uniform error for any
//! failure — unknown usernames verify against a throwaway hash so timing
//! does not leak account existence.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::debug;

use zrp_domain::entities::{ApiKey, Role, Session, User};
use zrp_domain::repositories::{ApiKeyRepository, SessionRepository, UserRepository};
use zrp_domain::ZrpError;

/// Hash verified for unknown usernames, so both failure paths cost one
/// argon2 verification.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_password("zrp-timing-pad").unwrap_or_default());

/// How the request authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Session,
    ApiKey,
}

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub user_id: Option<i64>,
    pub username: String,
    /// `None` for bearer keys (service accounts outside the role matrix).
    pub role: Option<Role>,
    pub method: AuthMethod,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    api_keys: Arc<dyn ApiKeyRepository>,
    session_lifetime_hours: i64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        api_keys: Arc<dyn ApiKeyRepository>,
        session_lifetime_hours: i64,
    ) -> Self {
        Self {
            users,
            sessions,
            api_keys,
            session_lifetime_hours,
        }
    }

    /// Verifies credentials and issues a fresh session.
    ///
    /// Every failure is the same `Unauthorized` — no username enumeration.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, Session), ZrpError> {
        let uniform = || ZrpError::unauthorized("invalid username or password");

        let user = self.users.find_by_username(username).await?;
        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.clone());

        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| ZrpError::internal(format!("verification task failed: {}", e)))?;

        let Some(user) = user else { return Err(uniform()) };
        if !verified || !user.active {
            return Err(uniform());
        }

        let session = Session::issue(user.id, self.session_lifetime_hours);
        self.sessions.insert(&session).await?;
        debug!(username = %user.username, "login succeeded");
        Ok((user, session))
    }

    /// Deletes the session; idempotent.
    pub async fn logout(&self, token: &str) -> Result<(), ZrpError> {
        self.sessions.delete(token).await?;
        Ok(())
    }

    /// Resolves a session cookie, sliding the window on success.
    pub async fn resolve_session(&self, token: &str) -> Result<Principal, ZrpError> {
        let session = self
            .sessions
            .find(token)
            .await?
            .ok_or_else(|| ZrpError::unauthorized("invalid session"))?;

        let now = Utc::now();
        if session.is_expired(now) {
            // The row stays; only explicit cleanup deletes sessions.
            return Err(ZrpError::unauthorized("session expired"));
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| ZrpError::unauthorized("invalid session"))?;
        if !user.active {
            return Err(ZrpError::forbidden("account is deactivated"));
        }

        let mut session = session;
        session.touch(now, self.session_lifetime_hours);
        self.sessions
            .touch(token, session.expires_at, session.last_activity)
            .await?;

        Ok(Principal {
            user_id: Some(user.id),
            username: user.username,
            role: Some(user.role),
            method: AuthMethod::Session,
        })
    }

    /// Resolves a bearer API key by digest.
    pub async fn resolve_api_key(&self, presented: &str) -> Result<Principal, ZrpError> {
        let digest = ApiKey::digest(presented);
        let key = self
            .api_keys
            .find_by_hash(&digest)
            .await?
            .ok_or_else(|| ZrpError::unauthorized("invalid API key"))?;
        if !key.is_usable(Utc::now()) {
            return Err(ZrpError::unauthorized("invalid API key"));
        }

        // last_used is informational; its write stays off the hot path.
        let repo = self.api_keys.clone();
        let key_id = key.id;
        tokio::spawn(async move {
            let _ = repo.record_usage(key_id, Utc::now()).await;
        });

        Ok(Principal {
            user_id: None,
            username: key.name,
            role: None,
            method: AuthMethod::ApiKey,
        })
    }

    /// The `/auth/me` payload for a session principal.
    pub async fn current_user(&self, principal: &Principal) -> Result<Option<User>, ZrpError> {
        match principal.user_id {
            Some(id) => self.users.find_by_id(id).await,
            None => Ok(None),
        }
    }
}

/// argon2id PHC-string hash for storage.
pub fn hash_password(password: &str) -> Result<String, ZrpError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ZrpError::internal(format!("password hashing failed: {}", e)))
}

/// Constant-result verification; malformed stored hashes verify false.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "wrong horse"));
    }

    #[test]
    fn test_malformed_hash_verifies_false() {
        assert!(!verify_password("not-a-phc-string", "anything"));
        assert!(!verify_password("", "anything"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }
}
