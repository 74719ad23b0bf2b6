// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Relational Store
//!
//! SQLite pool construction and the embedded schema. The store, not the
//! application, enforces the hard invariants: non-negative quantities,
//! status enums, and referential integrity (CASCADE from PO lines to their
//! header, RESTRICT from the header to its vendor).
//!
//! Connections run in WAL mode with a busy timeout and foreign keys ON.
//! Schema application is idempotent (`CREATE TABLE IF NOT EXISTS`), so
//! start-up doubles as migration for a fresh database and is a no-op for an
//! existing one.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use zrp_domain::ZrpError;

/// Full embedded schema. Table order matters only for readability; foreign
/// keys are enforced at DML time.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE CHECK (length(username) > 0),
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user',
    active        INTEGER NOT NULL DEFAULT 1 CHECK (active IN (0, 1)),
    email         TEXT,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token         TEXT PRIMARY KEY,
    user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL,
    expires_at    TEXT NOT NULL,
    last_activity TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);

CREATE TABLE IF NOT EXISTS api_keys (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL CHECK (length(name) > 0),
    key_hash   TEXT NOT NULL UNIQUE,
    key_prefix TEXT NOT NULL,
    enabled    INTEGER NOT NULL DEFAULT 1 CHECK (enabled IN (0, 1)),
    expires_at TEXT,
    last_used  TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS permissions (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    role    TEXT NOT NULL,
    module  TEXT NOT NULL,
    action  TEXT NOT NULL CHECK (action IN ('view', 'create', 'edit', 'delete', 'approve')),
    granted INTEGER NOT NULL DEFAULT 0 CHECK (granted IN (0, 1)),
    UNIQUE (role, module, action)
);

CREATE TABLE IF NOT EXISTS inventory (
    ipn           TEXT PRIMARY KEY,
    qty_on_hand   REAL NOT NULL DEFAULT 0 CHECK (qty_on_hand >= 0),
    qty_reserved  REAL NOT NULL DEFAULT 0 CHECK (qty_reserved >= 0),
    location      TEXT NOT NULL DEFAULT '',
    reorder_point REAL NOT NULL DEFAULT 0 CHECK (reorder_point >= 0),
    reorder_qty   REAL NOT NULL DEFAULT 0 CHECK (reorder_qty >= 0),
    description   TEXT NOT NULL DEFAULT '',
    mpn           TEXT NOT NULL DEFAULT '',
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory_transactions (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    ipn        TEXT NOT NULL REFERENCES inventory(ipn) ON DELETE RESTRICT,
    type       TEXT NOT NULL CHECK (type IN ('receive', 'issue', 'adjust', 'transfer', 'return', 'scrap')),
    qty        REAL NOT NULL,
    reference  TEXT,
    notes      TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_inventory_transactions_ipn ON inventory_transactions(ipn);

CREATE TABLE IF NOT EXISTS ecos (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL CHECK (length(title) > 0),
    description   TEXT NOT NULL DEFAULT '',
    status        TEXT NOT NULL DEFAULT 'draft'
                  CHECK (status IN ('draft', 'review', 'approved', 'implemented', 'rejected', 'cancelled')),
    priority      TEXT NOT NULL DEFAULT 'normal'
                  CHECK (priority IN ('low', 'normal', 'high', 'critical')),
    affected_ipns TEXT NOT NULL DEFAULT '[]',
    created_by    TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    approved_by   TEXT,
    approved_at   TEXT
);

CREATE TABLE IF NOT EXISTS part_changes (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    part_ipn   TEXT NOT NULL CHECK (length(part_ipn) > 0),
    eco_id     TEXT REFERENCES ecos(id) ON DELETE SET NULL,
    field_name TEXT NOT NULL CHECK (length(field_name) > 0),
    old_value  TEXT NOT NULL DEFAULT '',
    new_value  TEXT NOT NULL DEFAULT '',
    status     TEXT NOT NULL DEFAULT 'draft'
               CHECK (status IN ('draft', 'pending', 'applied', 'rejected')),
    created_by TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_part_changes_part_ipn ON part_changes(part_ipn);
CREATE INDEX IF NOT EXISTS idx_part_changes_eco_id ON part_changes(eco_id);

CREATE TABLE IF NOT EXISTS audit_log (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER,
    username     TEXT NOT NULL DEFAULT '',
    action       TEXT NOT NULL,
    module       TEXT NOT NULL DEFAULT '',
    record_id    TEXT NOT NULL DEFAULT '',
    summary      TEXT NOT NULL DEFAULT '',
    before_value TEXT,
    after_value  TEXT,
    ip_address   TEXT NOT NULL DEFAULT '',
    user_agent   TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_log_created_at ON audit_log(created_at);

CREATE TABLE IF NOT EXISTS app_settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS id_sequences (
    prefix   TEXT PRIMARY KEY,
    next_num INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS vendors (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL UNIQUE CHECK (length(name) > 0),
    contact    TEXT NOT NULL DEFAULT '',
    email      TEXT NOT NULL DEFAULT '',
    phone      TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS purchase_orders (
    id         TEXT PRIMARY KEY,
    vendor_id  INTEGER NOT NULL REFERENCES vendors(id) ON DELETE RESTRICT,
    status     TEXT NOT NULL DEFAULT 'draft'
               CHECK (status IN ('draft', 'issued', 'received', 'cancelled')),
    notes      TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS purchase_order_lines (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    po_id      TEXT NOT NULL REFERENCES purchase_orders(id) ON DELETE CASCADE,
    ipn        TEXT NOT NULL,
    qty        REAL NOT NULL CHECK (qty >= 0),
    unit_price REAL NOT NULL DEFAULT 0 CHECK (unit_price >= 0)
);
CREATE INDEX IF NOT EXISTS idx_purchase_order_lines_po_id ON purchase_order_lines(po_id);
"#;

/// Opens (creating if missing) the database and applies the schema.
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, ZrpError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| ZrpError::database(format!("invalid database url: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .map_err(|e| ZrpError::database(format!("failed to open database: {}", e)))?;

    ensure_schema(&pool).await?;
    info!(url = database_url, "database ready");
    Ok(pool)
}

/// Applies the embedded schema; idempotent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), ZrpError> {
    debug!("ensuring database schema is up to date");
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| ZrpError::database(format!("failed to apply schema: {}", e)))?;
    Ok(())
}
