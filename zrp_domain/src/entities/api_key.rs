// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bearer API Keys
//!
//! Service-account credentials presented as `Authorization: Bearer zrp_…`.
//! The plaintext is generated once, shown to the caller once, and only its
//! SHA-256 digest is persisted. Lookup happens by digest, so a leaked
//! database never yields usable keys; `key_prefix` exists purely so the
//! admin UI can show which key is which.
//!
//! Key format: `zrp_` + 40 hex characters (160 bits of OS randomness).
//! Disabled and expired keys fail closed at the credential resolver.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Recognizable key prefix on the wire.
pub const API_KEY_PREFIX: &str = "zrp_";

/// Characters of the plaintext retained as a display hint.
pub const KEY_PREFIX_HINT_LEN: usize = 12;

/// Stored API-key record. Contains the digest, never the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub key_prefix: String,
    pub enabled: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Output of key generation; `plaintext` leaves the process exactly once.
#[derive(Debug)]
pub struct GeneratedKey {
    pub plaintext: String,
    pub key_hash: String,
    pub key_prefix: String,
}

impl ApiKey {
    /// Generates a fresh key: plaintext plus the fields to persist.
    pub fn generate() -> GeneratedKey {
        let mut body = [0u8; 20];
        rand::rng().fill_bytes(&mut body);
        let plaintext = format!("{}{}", API_KEY_PREFIX, hex::encode(body));
        GeneratedKey {
            key_hash: Self::digest(&plaintext),
            key_prefix: plaintext[..KEY_PREFIX_HINT_LEN].to_string(),
            plaintext,
        }
    }

    /// One-way digest used for storage and lookup.
    pub fn digest(plaintext: &str) -> String {
        hex::encode(Sha256::digest(plaintext.as_bytes()))
    }

    /// A key admits requests only while enabled and unexpired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        match self.expires_at {
            Some(expiry) => now < expiry,
            None => true,
        }
    }

    /// JSON shape for the admin listing (metadata only).
    pub fn public_view(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "key_prefix": self.key_prefix,
            "enabled": self.enabled,
            "expires_at": self.expires_at,
            "last_used": self.last_used,
            "created_at": self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_generated_key_shape() {
        let generated = ApiKey::generate();
        assert!(generated.plaintext.starts_with(API_KEY_PREFIX));
        assert_eq!(generated.plaintext.len(), API_KEY_PREFIX.len() + 40);
        assert_eq!(generated.key_prefix.len(), KEY_PREFIX_HINT_LEN);
        assert_eq!(generated.key_hash, ApiKey::digest(&generated.plaintext));
        assert_ne!(generated.key_hash, generated.plaintext);
    }

    #[test]
    fn test_disabled_and_expired_keys_fail_closed() {
        let now = Utc::now();
        let mut key = ApiKey {
            id: 1,
            name: "ci".to_string(),
            key_hash: "h".to_string(),
            key_prefix: "zrp_deadbeef".to_string(),
            enabled: true,
            expires_at: None,
            last_used: None,
            created_at: now,
        };
        assert!(key.is_usable(now));

        key.enabled = false;
        assert!(!key.is_usable(now));

        key.enabled = true;
        key.expires_at = Some(now - Duration::seconds(1));
        assert!(!key.is_usable(now));

        key.expires_at = Some(now);
        assert!(!key.is_usable(now), "expiry boundary is strict");
    }
}
