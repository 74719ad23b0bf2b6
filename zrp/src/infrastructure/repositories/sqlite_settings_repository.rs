// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of scalar settings and the per-prefix id counters.
//!
//! `next_in_sequence` relies on SQLite's UPSERT + RETURNING so increment and
//! read-back are one statement — concurrent allocators on the same prefix
//! serialize on the row and can never observe the same number.

use async_trait::async_trait;
use sqlx::SqlitePool;

use zrp_domain::repositories::SettingsRepository;
use zrp_domain::ZrpError;

use super::map_db_err;

pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, ZrpError> {
        sqlx::query_scalar("SELECT value FROM app_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ZrpError> {
        sqlx::query(
            "INSERT INTO app_settings (key, value) VALUES (?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn next_in_sequence(&self, prefix: &str) -> Result<i64, ZrpError> {
        sqlx::query_scalar(
            "INSERT INTO id_sequences (prefix, next_num) VALUES (?, 1) \
             ON CONFLICT (prefix) DO UPDATE SET next_num = next_num + 1 \
             RETURNING next_num",
        )
        .bind(prefix)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_database;

    #[tokio::test]
    async fn test_sequence_is_monotone_per_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/zrp.db", dir.path().display());
        let pool = initialize_database(&url).await.unwrap();
        let repo = SqliteSettingsRepository::new(pool);

        assert_eq!(repo.next_in_sequence("ECO").await.unwrap(), 1);
        assert_eq!(repo.next_in_sequence("ECO").await.unwrap(), 2);
        assert_eq!(repo.next_in_sequence("PO").await.unwrap(), 1);
        assert_eq!(repo.next_in_sequence("ECO").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/zrp.db", dir.path().display());
        let pool = initialize_database(&url).await.unwrap();
        let repo = SqliteSettingsRepository::new(pool);

        assert_eq!(repo.get("audit_retention_days").await.unwrap(), None);
        repo.set("audit_retention_days", "365").await.unwrap();
        repo.set("audit_retention_days", "400").await.unwrap();
        assert_eq!(repo.get("audit_retention_days").await.unwrap().as_deref(), Some("400"));
    }
}
