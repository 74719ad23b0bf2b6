// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Configuration
//!
//! Layered configuration: built-in defaults → optional `zrp.toml` →
//! `ZRP_`-prefixed environment variables (e.g. `ZRP_LISTEN_ADDR`,
//! `ZRP_API_RATE_LIMIT`). The result is one immutable
//! [`AppConfig`] constructed at start-up and threaded through the
//! composition root; nothing reads the environment after boot.

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use zrp_domain::ZrpError;

/// Typed runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds.
    pub listen_addr: String,
    /// SQLite URL, e.g. `sqlite://zrp.db`.
    pub database_url: String,
    /// Root of the CSV parts catalog.
    pub parts_dir: String,
    /// Attachment upload directory.
    pub uploads_dir: String,
    /// Credentials seeded for the first admin account when the user table
    /// is empty. Ignored afterwards.
    pub admin_username: String,
    pub admin_password: String,
    /// Sliding-session lifetime.
    pub session_lifetime_hours: i64,
    /// Per-request deadline.
    pub request_timeout_secs: u64,
    /// Fixed-window budgets per client IP per minute.
    pub login_rate_limit: u32,
    pub api_rate_limit: u32,
    /// Audit retention applied when no stored setting exists yet.
    pub audit_retention_default_days: i64,
    /// Bounded audit queue capacity (drop-oldest beyond this).
    pub audit_queue_capacity: usize,
    /// `Access-Control-Allow-Origin` value.
    pub cors_allow_origin: String,
}

impl AppConfig {
    /// Loads configuration; `config_file` overrides the default `zrp.toml`
    /// lookup in the working directory.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ZrpError> {
        let mut builder = Config::builder()
            .set_default("listen_addr", "127.0.0.1:8080")
            .and_then(|b| b.set_default("database_url", "sqlite://zrp.db"))
            .and_then(|b| b.set_default("parts_dir", "parts"))
            .and_then(|b| b.set_default("uploads_dir", "uploads"))
            .and_then(|b| b.set_default("admin_username", "admin"))
            .and_then(|b| b.set_default("admin_password", "admin"))
            .and_then(|b| b.set_default("session_lifetime_hours", 24))
            .and_then(|b| b.set_default("request_timeout_secs", 30))
            .and_then(|b| b.set_default("login_rate_limit", 5))
            .and_then(|b| b.set_default("api_rate_limit", 100))
            .and_then(|b| b.set_default("audit_retention_default_days", 365))
            .and_then(|b| b.set_default("audit_queue_capacity", 1024))
            .and_then(|b| b.set_default("cors_allow_origin", "*"))
            .map_err(|e| ZrpError::internal(format!("config defaults: {}", e)))?;

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("zrp").required(false)),
        };
        builder = builder.add_source(Environment::with_prefix("ZRP").separator("__"));

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ZrpError::bad_request(format!("invalid configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_load_without_a_file() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.session_lifetime_hours, 24);
        assert_eq!(config.login_rate_limit, 5);
        assert_eq!(config.api_rate_limit, 100);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "listen_addr = \"0.0.0.0:9000\"\napi_rate_limit = 250").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.api_rate_limit, 250);
        assert_eq!(config.login_rate_limit, 5, "untouched keys keep defaults");
    }
}
