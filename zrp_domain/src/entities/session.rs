// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cookie Sessions
//!
//! Sessions are sliding-window: every authenticated request pushes
//! `expires_at` out to `now + lifetime`. Expiry comparison is strict — a
//! request arriving exactly at `expires_at` is already rejected. Expired
//! rows are not deleted implicitly; cleanup is an explicit maintenance
//! operation.
//!
//! Tokens carry 256 bits of OS randomness rendered as 64 hex characters.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Default session lifetime in hours.
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Cookie name the session token travels in.
pub const SESSION_COOKIE: &str = "zrp_session";

/// A live (or expired-but-not-yet-cleaned) session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh session for `user_id` with a newly generated token.
    pub fn issue(user_id: i64, lifetime_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            token: Self::generate_token(),
            user_id,
            created_at: now,
            expires_at: now + Duration::hours(lifetime_hours),
            last_activity: now,
        }
    }

    /// 256-bit random token, hex encoded.
    pub fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Strict comparison: a session is valid only while `now < expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Slides the expiry window out from `now`.
    pub fn touch(&mut self, now: DateTime<Utc>, lifetime_hours: i64) {
        self.expires_at = now + Duration::hours(lifetime_hours);
        self.last_activity = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_long_and_unique() {
        let a = Session::generate_token();
        let b = Session::generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let session = Session::issue(1, SESSION_LIFETIME_HOURS);
        assert!(!session.is_expired(session.expires_at - Duration::seconds(1)));
        assert!(session.is_expired(session.expires_at));
        assert!(session.is_expired(session.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_touch_slides_the_window() {
        let mut session = Session::issue(1, SESSION_LIFETIME_HOURS);
        let later = Utc::now() + Duration::hours(10);
        session.touch(later, SESSION_LIFETIME_HOURS);
        assert_eq!(session.expires_at, later + Duration::hours(SESSION_LIFETIME_HOURS));
        assert_eq!(session.last_activity, later);
    }
}
