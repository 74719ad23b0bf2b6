// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Inventory Repository
//!
//! [`apply_movement`](zrp_domain::repositories::InventoryRepository::apply_movement)
//! is the only quantity write path. It runs one transaction:
//! ensure-row → UPDATE quantity → append journal rows → read back → commit.
//! The CHECK constraint on `qty_on_hand` makes a negative outcome roll the
//! whole transaction back, so the row and its journal can never disagree.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use zrp_domain::entities::{InventoryItem, InventoryTransaction, NewTransaction, TransactionType};
use zrp_domain::repositories::{InventoryRepository, QtyChange};
use zrp_domain::ZrpError;

use super::map_db_err;

pub struct SqliteInventoryRepository {
    pool: SqlitePool,
}

impl SqliteInventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &SqliteRow) -> Result<InventoryItem, ZrpError> {
        Ok(InventoryItem {
            ipn: row.try_get("ipn").map_err(map_db_err)?,
            qty_on_hand: row.try_get("qty_on_hand").map_err(map_db_err)?,
            qty_reserved: row.try_get("qty_reserved").map_err(map_db_err)?,
            location: row.try_get("location").map_err(map_db_err)?,
            reorder_point: row.try_get("reorder_point").map_err(map_db_err)?,
            reorder_qty: row.try_get("reorder_qty").map_err(map_db_err)?,
            description: row.try_get("description").map_err(map_db_err)?,
            mpn: row.try_get("mpn").map_err(map_db_err)?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(map_db_err)?,
        })
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<InventoryTransaction, ZrpError> {
        Ok(InventoryTransaction {
            id: row.try_get("id").map_err(map_db_err)?,
            ipn: row.try_get("ipn").map_err(map_db_err)?,
            tx_type: TransactionType::from_str(row.try_get::<String, _>("type").map_err(map_db_err)?.as_str())?,
            qty: row.try_get("qty").map_err(map_db_err)?,
            reference: row.try_get("reference").map_err(map_db_err)?,
            notes: row.try_get("notes").map_err(map_db_err)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(map_db_err)?,
        })
    }
}

#[async_trait]
impl InventoryRepository for SqliteInventoryRepository {
    async fn get(&self, ipn: &str) -> Result<Option<InventoryItem>, ZrpError> {
        let row = sqlx::query("SELECT * FROM inventory WHERE ipn = ?")
            .bind(ipn)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn list_all(&self) -> Result<Vec<InventoryItem>, ZrpError> {
        let rows = sqlx::query("SELECT * FROM inventory ORDER BY ipn")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.iter().map(Self::row_to_item).collect()
    }

    async fn upsert_item(&self, item: &InventoryItem) -> Result<(), ZrpError> {
        sqlx::query(
            "INSERT INTO inventory (ipn, location, reorder_point, reorder_qty, description, mpn, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (ipn) DO UPDATE SET \
                 location = excluded.location, \
                 reorder_point = excluded.reorder_point, \
                 reorder_qty = excluded.reorder_qty, \
                 description = excluded.description, \
                 mpn = excluded.mpn, \
                 updated_at = excluded.updated_at",
        )
        .bind(&item.ipn)
        .bind(&item.location)
        .bind(item.reorder_point)
        .bind(item.reorder_qty)
        .bind(&item.description)
        .bind(&item.mpn)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn apply_movement(
        &self,
        ipn: &str,
        change: QtyChange,
        journal: &[NewTransaction],
    ) -> Result<f64, ZrpError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        sqlx::query("INSERT INTO inventory (ipn, updated_at) VALUES (?, ?) ON CONFLICT (ipn) DO NOTHING")
            .bind(ipn)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        let update = match change {
            QtyChange::Delta(delta) => sqlx::query(
                "UPDATE inventory SET qty_on_hand = qty_on_hand + ?, updated_at = ? WHERE ipn = ?",
            )
            .bind(delta)
            .bind(now)
            .bind(ipn),
            QtyChange::Set(value) => {
                sqlx::query("UPDATE inventory SET qty_on_hand = ?, updated_at = ? WHERE ipn = ?")
                    .bind(value)
                    .bind(now)
                    .bind(ipn)
            }
        };
        // A negative outcome trips the CHECK constraint here and the whole
        // transaction rolls back on drop.
        update.execute(&mut *tx).await.map_err(map_db_err)?;

        for entry in journal {
            sqlx::query(
                "INSERT INTO inventory_transactions (ipn, type, qty, reference, notes, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&entry.ipn)
            .bind(entry.tx_type.as_str())
            .bind(entry.qty)
            .bind(&entry.reference)
            .bind(&entry.notes)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        }

        let new_qty: f64 = sqlx::query_scalar("SELECT qty_on_hand FROM inventory WHERE ipn = ?")
            .bind(ipn)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(new_qty)
    }

    async fn list_transactions(&self, ipn: &str, limit: i64) -> Result<Vec<InventoryTransaction>, ZrpError> {
        let rows = sqlx::query("SELECT * FROM inventory_transactions WHERE ipn = ? ORDER BY id DESC LIMIT ?")
            .bind(ipn)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn count_transactions(&self, ipn: &str) -> Result<i64, ZrpError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM inventory_transactions WHERE ipn = ?")
            .bind(ipn)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }
}
