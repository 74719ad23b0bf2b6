// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementations of the part-change and ECO ports.
//!
//! `affected_ipns` is stored as a JSON array in a TEXT column; the list is
//! small (the IPNs one change order touches) and is always read and written
//! as a whole.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use zrp_domain::entities::{ChangeStatus, Eco, EcoPriority, EcoStatus, PartChange};
use zrp_domain::repositories::{ChangeFilter, EcoRepository, NewPartChange, PartChangeRepository};
use zrp_domain::ZrpError;

use super::map_db_err;

pub struct SqlitePartChangeRepository {
    pool: SqlitePool,
}

impl SqlitePartChangeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_change(row: &SqliteRow) -> Result<PartChange, ZrpError> {
        Ok(PartChange {
            id: row.try_get("id").map_err(map_db_err)?,
            part_ipn: row.try_get("part_ipn").map_err(map_db_err)?,
            eco_id: row.try_get("eco_id").map_err(map_db_err)?,
            field_name: row.try_get("field_name").map_err(map_db_err)?,
            old_value: row.try_get("old_value").map_err(map_db_err)?,
            new_value: row.try_get("new_value").map_err(map_db_err)?,
            status: ChangeStatus::from_str(row.try_get::<String, _>("status").map_err(map_db_err)?.as_str())?,
            created_by: row.try_get("created_by").map_err(map_db_err)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(map_db_err)?,
        })
    }
}

#[async_trait]
impl PartChangeRepository for SqlitePartChangeRepository {
    async fn insert(&self, change: NewPartChange) -> Result<PartChange, ZrpError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO part_changes (part_ipn, field_name, old_value, new_value, status, created_by, created_at) \
             VALUES (?, ?, ?, ?, 'draft', ?, ?)",
        )
        .bind(&change.part_ipn)
        .bind(&change.field_name)
        .bind(&change.old_value)
        .bind(&change.new_value)
        .bind(&change.created_by)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?
        .last_insert_rowid();

        Ok(PartChange {
            id,
            part_ipn: change.part_ipn,
            eco_id: None,
            field_name: change.field_name,
            old_value: change.old_value,
            new_value: change.new_value,
            status: ChangeStatus::Draft,
            created_by: change.created_by,
            created_at: now,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PartChange>, ZrpError> {
        let row = sqlx::query("SELECT * FROM part_changes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.as_ref().map(Self::row_to_change).transpose()
    }

    async fn list(&self, filter: &ChangeFilter) -> Result<Vec<PartChange>, ZrpError> {
        // Three optional predicates; bind only the present ones.
        let mut sql = String::from("SELECT * FROM part_changes WHERE 1 = 1");
        if filter.part_ipn.is_some() {
            sql.push_str(" AND part_ipn = ?");
        }
        if filter.eco_id.is_some() {
            sql.push_str(" AND eco_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query(&sql);
        if let Some(part_ipn) = &filter.part_ipn {
            query = query.bind(part_ipn);
        }
        if let Some(eco_id) = &filter.eco_id {
            query = query.bind(eco_id);
        }
        if let Some(status) = &filter.status {
            query = query.bind(status.as_str());
        }

        let rows = query.fetch_all(&self.pool).await.map_err(map_db_err)?;
        rows.iter().map(Self::row_to_change).collect()
    }

    async fn drafts_for_part(&self, part_ipn: &str) -> Result<Vec<PartChange>, ZrpError> {
        let rows = sqlx::query("SELECT * FROM part_changes WHERE part_ipn = ? AND status = 'draft' ORDER BY id")
            .bind(part_ipn)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.iter().map(Self::row_to_change).collect()
    }

    async fn pending_for_eco(&self, eco_id: &str) -> Result<Vec<PartChange>, ZrpError> {
        let rows = sqlx::query("SELECT * FROM part_changes WHERE eco_id = ? AND status = 'pending' ORDER BY id")
            .bind(eco_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.iter().map(Self::row_to_change).collect()
    }

    async fn adopt_into_eco(&self, change_ids: &[i64], eco_id: &str) -> Result<(), ZrpError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        for id in change_ids {
            let result = sqlx::query(
                "UPDATE part_changes SET eco_id = ?, status = 'pending' WHERE id = ? AND status = 'draft'",
            )
            .bind(eco_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
            if result.rows_affected() == 0 {
                return Err(ZrpError::conflict(format!(
                    "part change {} is no longer a draft",
                    id
                )));
            }
        }
        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    async fn set_status(&self, id: i64, status: ChangeStatus) -> Result<bool, ZrpError> {
        let result = sqlx::query("UPDATE part_changes SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status_many(&self, ids: &[i64], status: ChangeStatus) -> Result<u64, ZrpError> {
        let mut updated = 0u64;
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        for id in ids {
            let result = sqlx::query("UPDATE part_changes SET status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
            updated += result.rows_affected();
        }
        tx.commit().await.map_err(map_db_err)?;
        Ok(updated)
    }

    async fn delete_draft(&self, id: i64) -> Result<bool, ZrpError> {
        let result = sqlx::query("DELETE FROM part_changes WHERE id = ? AND status = 'draft'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct SqliteEcoRepository {
    pool: SqlitePool,
}

impl SqliteEcoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_eco(row: &SqliteRow) -> Result<Eco, ZrpError> {
        let affected_raw: String = row.try_get("affected_ipns").map_err(map_db_err)?;
        Ok(Eco {
            id: row.try_get("id").map_err(map_db_err)?,
            title: row.try_get("title").map_err(map_db_err)?,
            description: row.try_get("description").map_err(map_db_err)?,
            status: EcoStatus::from_str(row.try_get::<String, _>("status").map_err(map_db_err)?.as_str())?,
            priority: EcoPriority::from_str(row.try_get::<String, _>("priority").map_err(map_db_err)?.as_str())?,
            affected_ipns: serde_json::from_str(&affected_raw)?,
            created_by: row.try_get("created_by").map_err(map_db_err)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(map_db_err)?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(map_db_err)?,
            approved_by: row.try_get("approved_by").map_err(map_db_err)?,
            approved_at: row.try_get::<Option<DateTime<Utc>>, _>("approved_at").map_err(map_db_err)?,
        })
    }
}

#[async_trait]
impl EcoRepository for SqliteEcoRepository {
    async fn insert(&self, eco: &Eco) -> Result<(), ZrpError> {
        sqlx::query(
            "INSERT INTO ecos \
             (id, title, description, status, priority, affected_ipns, created_by, created_at, updated_at, approved_by, approved_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&eco.id)
        .bind(&eco.title)
        .bind(&eco.description)
        .bind(eco.status.as_str())
        .bind(eco.priority.as_str())
        .bind(serde_json::to_string(&eco.affected_ipns)?)
        .bind(&eco.created_by)
        .bind(eco.created_at)
        .bind(eco.updated_at)
        .bind(&eco.approved_by)
        .bind(eco.approved_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Eco>, ZrpError> {
        let row = sqlx::query("SELECT * FROM ecos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.as_ref().map(Self::row_to_eco).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Eco>, ZrpError> {
        let rows = sqlx::query("SELECT * FROM ecos ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.iter().map(Self::row_to_eco).collect()
    }

    async fn update(&self, eco: &Eco) -> Result<bool, ZrpError> {
        let result = sqlx::query(
            "UPDATE ecos SET \
             title = ?, description = ?, status = ?, priority = ?, affected_ipns = ?, \
             updated_at = ?, approved_by = ?, approved_at = ? \
             WHERE id = ?",
        )
        .bind(&eco.title)
        .bind(&eco.description)
        .bind(eco.status.as_str())
        .bind(eco.priority.as_str())
        .bind(serde_json::to_string(&eco.affected_ipns)?)
        .bind(eco.updated_at)
        .bind(&eco.approved_by)
        .bind(eco.approved_at)
        .bind(&eco.id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
