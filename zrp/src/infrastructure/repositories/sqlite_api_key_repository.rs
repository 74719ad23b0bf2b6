// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of the API-key port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use zrp_domain::entities::ApiKey;
use zrp_domain::repositories::{ApiKeyRepository, NewApiKey};
use zrp_domain::ZrpError;

use super::map_db_err;

pub struct SqliteApiKeyRepository {
    pool: SqlitePool,
}

impl SqliteApiKeyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_key(row: &SqliteRow) -> Result<ApiKey, ZrpError> {
        Ok(ApiKey {
            id: row.try_get("id").map_err(map_db_err)?,
            name: row.try_get("name").map_err(map_db_err)?,
            key_hash: row.try_get("key_hash").map_err(map_db_err)?,
            key_prefix: row.try_get("key_prefix").map_err(map_db_err)?,
            enabled: row.try_get::<i64, _>("enabled").map_err(map_db_err)? != 0,
            expires_at: row.try_get::<Option<DateTime<Utc>>, _>("expires_at").map_err(map_db_err)?,
            last_used: row.try_get::<Option<DateTime<Utc>>, _>("last_used").map_err(map_db_err)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(map_db_err)?,
        })
    }
}

#[async_trait]
impl ApiKeyRepository for SqliteApiKeyRepository {
    async fn insert(&self, key: NewApiKey) -> Result<ApiKey, ZrpError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO api_keys (name, key_hash, key_prefix, enabled, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&key.name)
        .bind(&key.key_hash)
        .bind(&key.key_prefix)
        .bind(key.enabled as i64)
        .bind(key.expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?
        .last_insert_rowid();

        Ok(ApiKey {
            id,
            name: key.name,
            key_hash: key.key_hash,
            key_prefix: key.key_prefix,
            enabled: key.enabled,
            expires_at: key.expires_at,
            last_used: None,
            created_at: now,
        })
    }

    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, ZrpError> {
        let row = sqlx::query("SELECT * FROM api_keys WHERE key_hash = ?")
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.as_ref().map(Self::row_to_key).transpose()
    }

    async fn list_all(&self) -> Result<Vec<ApiKey>, ZrpError> {
        let rows = sqlx::query("SELECT * FROM api_keys ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.iter().map(Self::row_to_key).collect()
    }

    async fn set_enabled(&self, id: i64, enabled: bool) -> Result<bool, ZrpError> {
        let result = sqlx::query("UPDATE api_keys SET enabled = ? WHERE id = ?")
            .bind(enabled as i64)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, ZrpError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_usage(&self, id: i64, when: DateTime<Utc>) -> Result<(), ZrpError> {
        sqlx::query("UPDATE api_keys SET last_used = ? WHERE id = ?")
            .bind(when)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
