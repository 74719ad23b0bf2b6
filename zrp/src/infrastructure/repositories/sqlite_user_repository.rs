// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of the user account port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use zrp_domain::entities::{Role, User};
use zrp_domain::repositories::{NewUser, UserRepository};
use zrp_domain::ZrpError;

use super::map_db_err;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &SqliteRow) -> Result<User, ZrpError> {
        Ok(User {
            id: row.try_get("id").map_err(map_db_err)?,
            username: row.try_get("username").map_err(map_db_err)?,
            password_hash: row.try_get("password_hash").map_err(map_db_err)?,
            role: Role::parse(row.try_get::<String, _>("role").map_err(map_db_err)?.as_str()),
            active: row.try_get::<i64, _>("active").map_err(map_db_err)? != 0,
            email: row.try_get("email").map_err(map_db_err)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(map_db_err)?,
        })
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, ZrpError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO users (username, password_hash, role, active, email, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.active as i64)
        .bind(&user.email)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?
        .last_insert_rowid();

        Ok(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            active: user.active,
            email: user.email,
            created_at: now,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ZrpError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ZrpError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, ZrpError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.iter().map(Self::row_to_user).collect()
    }

    async fn update(&self, user: &User) -> Result<bool, ZrpError> {
        let result = sqlx::query("UPDATE users SET username = ?, role = ?, active = ?, email = ? WHERE id = ?")
            .bind(&user.username)
            .bind(user.role.as_str())
            .bind(user.active as i64)
            .bind(&user.email)
            .bind(user.id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, ZrpError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, ZrpError> {
        let result = sqlx::query("UPDATE users SET active = ? WHERE id = ?")
            .bind(active as i64)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, ZrpError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, ZrpError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }
}
