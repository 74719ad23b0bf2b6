// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of the audit-trail port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use zrp_domain::entities::{AuditAction, AuditEntry, NewAuditEntry};
use zrp_domain::repositories::{AuditQuery, AuditRepository};
use zrp_domain::ZrpError;

use super::map_db_err;

pub struct SqliteAuditRepository {
    pool: SqlitePool,
}

impl SqliteAuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: &SqliteRow) -> Result<AuditEntry, ZrpError> {
        Ok(AuditEntry {
            id: row.try_get("id").map_err(map_db_err)?,
            user_id: row.try_get("user_id").map_err(map_db_err)?,
            username: row.try_get("username").map_err(map_db_err)?,
            action: AuditAction::parse(row.try_get::<String, _>("action").map_err(map_db_err)?.as_str()),
            module: row.try_get("module").map_err(map_db_err)?,
            record_id: row.try_get("record_id").map_err(map_db_err)?,
            summary: row.try_get("summary").map_err(map_db_err)?,
            before_value: row.try_get("before_value").map_err(map_db_err)?,
            after_value: row.try_get("after_value").map_err(map_db_err)?,
            ip_address: row.try_get("ip_address").map_err(map_db_err)?,
            user_agent: row.try_get("user_agent").map_err(map_db_err)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(map_db_err)?,
        })
    }
}

#[async_trait]
impl AuditRepository for SqliteAuditRepository {
    async fn insert(&self, entry: &NewAuditEntry) -> Result<i64, ZrpError> {
        let action = entry
            .action
            .clone()
            .unwrap_or(AuditAction::Custom("UNKNOWN".to_string()));
        let id = sqlx::query(
            "INSERT INTO audit_log \
             (user_id, username, action, module, record_id, summary, before_value, after_value, ip_address, user_agent, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.user_id)
        .bind(&entry.username)
        .bind(action.as_str())
        .bind(&entry.module)
        .bind(&entry.record_id)
        .bind(&entry.summary)
        .bind(&entry.before_value)
        .bind(&entry.after_value)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?
        .last_insert_rowid();
        Ok(id)
    }

    async fn list(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, ZrpError> {
        let mut sql = String::from("SELECT * FROM audit_log WHERE 1 = 1");
        if query.module.is_some() {
            sql.push_str(" AND module = ?");
        }
        if query.action.is_some() {
            sql.push_str(" AND action = ?");
        }
        if query.username.is_some() {
            sql.push_str(" AND username = ?");
        }
        if query.record_id.is_some() {
            sql.push_str(" AND record_id = ?");
        }
        sql.push_str(" ORDER BY id DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query(&sql);
        if let Some(module) = &query.module {
            q = q.bind(module);
        }
        if let Some(action) = &query.action {
            q = q.bind(action);
        }
        if let Some(username) = &query.username {
            q = q.bind(username);
        }
        if let Some(record_id) = &query.record_id {
            q = q.bind(record_id);
        }
        q = q.bind(query.limit.unwrap_or(100)).bind(query.offset.unwrap_or(0));

        let rows = q.fetch_all(&self.pool).await.map_err(map_db_err)?;
        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn count(&self) -> Result<i64, ZrpError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, ZrpError> {
        let result = sqlx::query("DELETE FROM audit_log WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected())
    }
}
