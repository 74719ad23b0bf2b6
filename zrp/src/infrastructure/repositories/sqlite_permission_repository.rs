// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of the RBAC matrix port.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use zrp_domain::repositories::{PermissionEntry, PermissionRepository};
use zrp_domain::value_objects::{Action, Module};
use zrp_domain::ZrpError;

use super::map_db_err;

pub struct SqlitePermissionRepository {
    pool: SqlitePool,
}

impl SqlitePermissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for SqlitePermissionRepository {
    async fn list_all(&self) -> Result<Vec<PermissionEntry>, ZrpError> {
        let rows = sqlx::query("SELECT role, module, action, granted FROM permissions")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(PermissionEntry {
                role: row.try_get("role").map_err(map_db_err)?,
                module: Module::from_str(row.try_get::<String, _>("module").map_err(map_db_err)?.as_str())?,
                action: Action::from_str(row.try_get::<String, _>("action").map_err(map_db_err)?.as_str())?,
                granted: row.try_get::<i64, _>("granted").map_err(map_db_err)? != 0,
            });
        }
        Ok(entries)
    }

    async fn upsert(&self, entry: &PermissionEntry) -> Result<(), ZrpError> {
        sqlx::query(
            "INSERT INTO permissions (role, module, action, granted) VALUES (?, ?, ?, ?) \
             ON CONFLICT (role, module, action) DO UPDATE SET granted = excluded.granted",
        )
        .bind(&entry.role)
        .bind(entry.module.as_str())
        .bind(entry.action.as_str())
        .bind(entry.granted as i64)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn seed_missing(&self, entries: &[PermissionEntry]) -> Result<u64, ZrpError> {
        let mut inserted = 0u64;
        for entry in entries {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO permissions (role, module, action, granted) VALUES (?, ?, ?, ?)",
            )
            .bind(&entry.role)
            .bind(entry.module.as_str())
            .bind(entry.action.as_str())
            .bind(entry.granted as i64)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }
}
