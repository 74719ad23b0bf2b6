// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite repository implementations of the domain persistence ports.

pub mod schema;
pub mod sqlite_api_key_repository;
pub mod sqlite_audit_repository;
pub mod sqlite_change_repository;
pub mod sqlite_inventory_repository;
pub mod sqlite_permission_repository;
pub mod sqlite_session_repository;
pub mod sqlite_settings_repository;
pub mod sqlite_user_repository;

pub use sqlite_api_key_repository::SqliteApiKeyRepository;
pub use sqlite_audit_repository::SqliteAuditRepository;
pub use sqlite_change_repository::{SqliteEcoRepository, SqlitePartChangeRepository};
pub use sqlite_inventory_repository::SqliteInventoryRepository;
pub use sqlite_permission_repository::SqlitePermissionRepository;
pub use sqlite_session_repository::SqliteSessionRepository;
pub use sqlite_settings_repository::SqliteSettingsRepository;
pub use sqlite_user_repository::SqliteUserRepository;

use zrp_domain::ZrpError;

/// Maps driver errors onto the domain error taxonomy. CHECK failures are
/// user-attributable (negative quantity, bad enum); UNIQUE failures are
/// conflicts; FK failures are internal wiring mistakes.
pub(crate) fn map_db_err(err: sqlx::Error) -> ZrpError {
    match &err {
        sqlx::Error::RowNotFound => ZrpError::not_found("record not found"),
        sqlx::Error::Database(db) => {
            let message = db.message();
            if message.contains("CHECK constraint failed") {
                ZrpError::constraint(message.to_string())
            } else if message.contains("UNIQUE constraint failed") {
                ZrpError::conflict(message.to_string())
            } else if message.contains("FOREIGN KEY constraint failed") {
                ZrpError::constraint_internal(message.to_string())
            } else {
                ZrpError::database(message.to_string())
            }
        }
        _ => ZrpError::database(err.to_string()),
    }
}
