// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence port for bearer API keys. Lookup is by digest only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::ApiKey;
use crate::ZrpError;

/// Fields persisted at key creation; the plaintext never reaches this layer.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub name: String,
    pub key_hash: String,
    pub key_prefix: String,
    pub enabled: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    async fn insert(&self, key: NewApiKey) -> Result<ApiKey, ZrpError>;

    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, ZrpError>;

    async fn list_all(&self) -> Result<Vec<ApiKey>, ZrpError>;

    async fn set_enabled(&self, id: i64, enabled: bool) -> Result<bool, ZrpError>;

    async fn delete(&self, id: i64) -> Result<bool, ZrpError>;

    /// Stamps `last_used`; best-effort, never on the request critical path.
    async fn record_usage(&self, id: i64, when: DateTime<Utc>) -> Result<(), ZrpError>;
}
