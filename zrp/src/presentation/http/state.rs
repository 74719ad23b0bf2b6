// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application State and Composition Root
//!
//! One explicit context struct threaded to every handler through axum's
//! `State` — no global mutable `db`/`partsDir`/hub variables. [`AppState::build`]
//! is the composition root: it opens the store, wires repositories into
//! services, seeds the first admin account and the default permission
//! matrix, and starts the audit drain worker.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tracing::info;

use zrp_domain::entities::Role;
use zrp_domain::repositories::{
    ApiKeyRepository, AuditRepository, EcoRepository, InventoryRepository, NewUser,
    PartChangeRepository, PermissionRepository, SessionRepository, SettingsRepository,
    UserRepository,
};
use zrp_domain::ZrpError;

use crate::application::services::{
    auth::hash_password, AuditRecorder, AuthService, EcoService, InventoryService,
    PermissionCache, SequenceIdAllocator,
};
use crate::infrastructure::catalog::PartsCatalog;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::repositories::{
    schema, SqliteApiKeyRepository, SqliteAuditRepository, SqliteEcoRepository,
    SqliteInventoryRepository, SqlitePartChangeRepository, SqlitePermissionRepository,
    SqliteSessionRepository, SqliteSettingsRepository, SqliteUserRepository,
};
use crate::presentation::http::middleware::rate_limit::RateLimiter;
use crate::presentation::http::ws::EventHub;

/// Shared application context for all HTTP/WS handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: SqlitePool,

    // Services
    pub auth: Arc<AuthService>,
    pub permissions: Arc<PermissionCache>,
    pub audit: AuditRecorder,
    pub inventory: Arc<InventoryService>,
    pub ecos: Arc<EcoService>,

    // Infrastructure shared with handlers that read directly
    pub catalog: PartsCatalog,
    pub rate_limiter: Arc<RateLimiter>,
    pub events: EventHub,

    // Repositories for the thin CRUD surfaces
    pub user_repo: Arc<dyn UserRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub api_key_repo: Arc<dyn ApiKeyRepository>,
    pub permission_repo: Arc<dyn PermissionRepository>,
    pub inventory_repo: Arc<dyn InventoryRepository>,
    pub change_repo: Arc<dyn PartChangeRepository>,
    pub eco_repo: Arc<dyn EcoRepository>,
    pub audit_repo: Arc<dyn AuditRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
}

impl AppState {
    /// Wires the whole application. Returns the state and the audit worker
    /// handle (awaited during shutdown for the bounded drain).
    pub async fn build(config: AppConfig) -> Result<(Self, JoinHandle<()>), ZrpError> {
        std::fs::create_dir_all(&config.parts_dir)?;
        std::fs::create_dir_all(&config.uploads_dir)?;
        let pool = schema::initialize_database(&config.database_url).await?;

        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(pool.clone()));
        let session_repo: Arc<dyn SessionRepository> = Arc::new(SqliteSessionRepository::new(pool.clone()));
        let api_key_repo: Arc<dyn ApiKeyRepository> = Arc::new(SqliteApiKeyRepository::new(pool.clone()));
        let permission_repo: Arc<dyn PermissionRepository> =
            Arc::new(SqlitePermissionRepository::new(pool.clone()));
        let inventory_repo: Arc<dyn InventoryRepository> =
            Arc::new(SqliteInventoryRepository::new(pool.clone()));
        let change_repo: Arc<dyn PartChangeRepository> =
            Arc::new(SqlitePartChangeRepository::new(pool.clone()));
        let eco_repo: Arc<dyn EcoRepository> = Arc::new(SqliteEcoRepository::new(pool.clone()));
        let audit_repo: Arc<dyn AuditRepository> = Arc::new(SqliteAuditRepository::new(pool.clone()));
        let settings_repo: Arc<dyn SettingsRepository> =
            Arc::new(SqliteSettingsRepository::new(pool.clone()));

        let events = EventHub::new();
        let audit = AuditRecorder::new(
            audit_repo.clone(),
            settings_repo.clone(),
            Arc::new(events.clone()),
            config.audit_queue_capacity,
            config.audit_retention_default_days,
        );
        let audit_worker = audit.spawn_worker();

        let permissions = Arc::new(PermissionCache::new(permission_repo.clone()));
        permissions.seed_defaults().await?;

        seed_admin_user(&config, user_repo.as_ref()).await?;

        let auth = Arc::new(AuthService::new(
            user_repo.clone(),
            session_repo.clone(),
            api_key_repo.clone(),
            config.session_lifetime_hours,
        ));

        let catalog = PartsCatalog::new(&config.parts_dir);
        let inventory = Arc::new(InventoryService::new(inventory_repo.clone(), Arc::new(audit.clone())));
        let ecos = Arc::new(EcoService::new(
            eco_repo.clone(),
            change_repo.clone(),
            Arc::new(SequenceIdAllocator::new(settings_repo.clone())),
            catalog.clone(),
            Arc::new(audit.clone()),
        ));

        let rate_limiter = Arc::new(RateLimiter::new(config.login_rate_limit, config.api_rate_limit));

        let state = Self {
            config: Arc::new(config),
            pool,
            auth,
            permissions,
            audit,
            inventory,
            ecos,
            catalog,
            rate_limiter,
            events,
            user_repo,
            session_repo,
            api_key_repo,
            permission_repo,
            inventory_repo,
            change_repo,
            eco_repo,
            audit_repo,
            settings_repo,
        };
        Ok((state, audit_worker))
    }
}

/// Creates the initial admin account when the user table is empty.
async fn seed_admin_user(config: &AppConfig, users: &dyn UserRepository) -> Result<(), ZrpError> {
    if users.count().await? > 0 {
        return Ok(());
    }
    let password_hash = hash_password(&config.admin_password)?;
    users
        .create(NewUser {
            username: config.admin_username.clone(),
            password_hash,
            role: Role::Admin,
            active: true,
            email: None,
        })
        .await?;
    info!(username = %config.admin_username, "seeded initial admin account");
    Ok(())
}
