// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Permission Cache
//!
//! Read-mostly RBAC matrix consulted on every authorized request. The whole
//! map is rebuilt from the store and swapped atomically under a write lock;
//! request-path reads take the read lock only for the lookup, so a refresh
//! never blocks admission for longer than one swap.
//!
//! Only granted cells are stored. A missing cell — unknown role, unknown
//! module, revoked grant — reads as denied.
//!
//! ## Default Matrix
//!
//! First start seeds three roles:
//!
//! - `admin`: every (module, action)
//! - `user`: view/create/edit on the operational modules, view elsewhere
//! - `readonly`: view everywhere
//!
//! Seeding inserts only missing cells, so operator edits survive restarts
//! and re-seeding is idempotent.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use zrp_domain::entities::Role;
use zrp_domain::repositories::{PermissionEntry, PermissionRepository};
use zrp_domain::services::PermissionChecker;
use zrp_domain::value_objects::{Action, Module};
use zrp_domain::ZrpError;

type Matrix = HashMap<String, HashSet<(Module, Action)>>;

pub struct PermissionCache {
    repo: Arc<dyn PermissionRepository>,
    matrix: RwLock<Matrix>,
}

impl PermissionCache {
    /// Creates an empty cache; call [`refresh`](Self::refresh) (or
    /// [`seed_defaults`](Self::seed_defaults)) before serving traffic.
    pub fn new(repo: Arc<dyn PermissionRepository>) -> Self {
        Self {
            repo,
            matrix: RwLock::new(Matrix::new()),
        }
    }

    /// Rebuilds the matrix from the store and swaps it in atomically.
    pub async fn refresh(&self) -> Result<(), ZrpError> {
        let entries = self.repo.list_all().await?;
        let mut fresh = Matrix::new();
        for entry in entries.into_iter().filter(|e| e.granted) {
            fresh
                .entry(entry.role)
                .or_default()
                .insert((entry.module, entry.action));
        }
        debug!(roles = fresh.len(), "permission matrix refreshed");
        *self.matrix.write() = fresh;
        Ok(())
    }

    /// Seeds the default matrix (missing cells only), then refreshes.
    pub async fn seed_defaults(&self) -> Result<u64, ZrpError> {
        let inserted = self.repo.seed_missing(&Self::default_matrix()).await?;
        if inserted > 0 {
            info!(inserted, "seeded default permission matrix");
        }
        self.refresh().await?;
        Ok(inserted)
    }

    /// The built-in admin/user/readonly matrix.
    pub fn default_matrix() -> Vec<PermissionEntry> {
        let mut entries = Vec::new();
        for module in Module::ALL {
            for action in Action::ALL {
                entries.push(PermissionEntry {
                    role: "admin".to_string(),
                    module,
                    action,
                    granted: true,
                });
            }
            entries.push(PermissionEntry {
                role: "readonly".to_string(),
                module,
                action: Action::View,
                granted: true,
            });

            let operational = Module::OPERATIONAL.contains(&module);
            for action in [Action::View, Action::Create, Action::Edit] {
                entries.push(PermissionEntry {
                    role: "user".to_string(),
                    module,
                    action,
                    granted: action == Action::View || operational,
                });
            }
        }
        entries
    }

    /// Granted (module → actions) map for one role, for `/permissions/me`.
    pub fn grants_for_role(&self, role: &Role) -> HashMap<Module, Vec<Action>> {
        let matrix = self.matrix.read();
        let mut grants: HashMap<Module, Vec<Action>> = HashMap::new();
        if let Some(cells) = matrix.get(role.as_str()) {
            for (module, action) in cells {
                grants.entry(*module).or_default().push(*action);
            }
        }
        for actions in grants.values_mut() {
            actions.sort_by_key(|a| a.as_str());
        }
        grants
    }
}

impl PermissionChecker for PermissionCache {
    fn has_permission(&self, role: &Role, module: Module, action: Action) -> bool {
        self.matrix
            .read()
            .get(role.as_str())
            .map(|cells| cells.contains(&(module, action)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// In-memory stand-in for the SQLite repository.
    struct FakePermissionRepo {
        rows: Mutex<Vec<PermissionEntry>>,
    }

    #[async_trait]
    impl PermissionRepository for FakePermissionRepo {
        async fn list_all(&self) -> Result<Vec<PermissionEntry>, ZrpError> {
            Ok(self.rows.lock().clone())
        }

        async fn upsert(&self, entry: &PermissionEntry) -> Result<(), ZrpError> {
            let mut rows = self.rows.lock();
            rows.retain(|e| !(e.role == entry.role && e.module == entry.module && e.action == entry.action));
            rows.push(entry.clone());
            Ok(())
        }

        async fn seed_missing(&self, entries: &[PermissionEntry]) -> Result<u64, ZrpError> {
            let mut rows = self.rows.lock();
            let mut inserted = 0;
            for entry in entries {
                let exists = rows
                    .iter()
                    .any(|e| e.role == entry.role && e.module == entry.module && e.action == entry.action);
                if !exists {
                    rows.push(entry.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        }
    }

    fn cache() -> PermissionCache {
        PermissionCache::new(Arc::new(FakePermissionRepo {
            rows: Mutex::new(Vec::new()),
        }))
    }

    #[tokio::test]
    async fn test_missing_entries_are_denied() {
        let cache = cache();
        cache.seed_defaults().await.unwrap();
        let ghost = Role::parse("ghost");
        assert!(!cache.has_permission(&ghost, Module::Parts, Action::View));
    }

    #[tokio::test]
    async fn test_default_matrix_shape() {
        let cache = cache();
        cache.seed_defaults().await.unwrap();

        let admin = Role::Admin;
        let user = Role::User;
        let readonly = Role::Readonly;

        assert!(cache.has_permission(&admin, Module::Admin, Action::Delete));
        assert!(cache.has_permission(&user, Module::Parts, Action::Edit));
        assert!(cache.has_permission(&user, Module::Vendors, Action::View));
        assert!(!cache.has_permission(&user, Module::Vendors, Action::Edit));
        assert!(!cache.has_permission(&user, Module::Parts, Action::Delete));
        assert!(cache.has_permission(&readonly, Module::Reports, Action::View));
        assert!(!cache.has_permission(&readonly, Module::Parts, Action::Create));
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let cache = cache();
        let first = cache.seed_defaults().await.unwrap();
        let second = cache.seed_defaults().await.unwrap();
        assert!(first > 0);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_refresh_swaps_in_revocations() {
        let repo = Arc::new(FakePermissionRepo {
            rows: Mutex::new(Vec::new()),
        });
        let cache = PermissionCache::new(repo.clone());
        cache.seed_defaults().await.unwrap();

        let user = Role::User;
        assert!(cache.has_permission(&user, Module::Parts, Action::Edit));

        repo.upsert(&PermissionEntry {
            role: "user".to_string(),
            module: Module::Parts,
            action: Action::Edit,
            granted: false,
        })
        .await
        .unwrap();

        // Not visible until refresh…
        assert!(cache.has_permission(&user, Module::Parts, Action::Edit));
        cache.refresh().await.unwrap();
        assert!(!cache.has_permission(&user, Module::Parts, Action::Edit));
    }
}
