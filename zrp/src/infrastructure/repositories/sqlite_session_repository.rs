// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of the session port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use zrp_domain::entities::Session;
use zrp_domain::repositories::SessionRepository;
use zrp_domain::ZrpError;

use super::map_db_err;

pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_session(row: &SqliteRow) -> Result<Session, ZrpError> {
        Ok(Session {
            token: row.try_get("token").map_err(map_db_err)?,
            user_id: row.try_get("user_id").map_err(map_db_err)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(map_db_err)?,
            expires_at: row.try_get::<DateTime<Utc>, _>("expires_at").map_err(map_db_err)?,
            last_activity: row.try_get::<DateTime<Utc>, _>("last_activity").map_err(map_db_err)?,
        })
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn insert(&self, session: &Session) -> Result<(), ZrpError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at, last_activity) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.last_activity)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<Session>, ZrpError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn touch(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
        last_activity: DateTime<Utc>,
    ) -> Result<bool, ZrpError> {
        let result = sqlx::query("UPDATE sessions SET expires_at = ?, last_activity = ? WHERE token = ?")
            .bind(expires_at)
            .bind(last_activity)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, token: &str) -> Result<bool, ZrpError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: i64) -> Result<u64, ZrpError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, ZrpError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected())
    }
}
