// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Audit Recorder
//!
//! Fire-and-forget audit emission. [`AuditRecorder::record`] pushes onto a
//! bounded in-memory queue and returns immediately; a single worker task
//! drains the queue to the store and emits a `{"type":"audit",…}` event on
//! the broadcast bus per persisted entry. At capacity the oldest queued
//! entry is dropped — the mutation already happened, losing the newest
//! record would be worse than losing the oldest.
//!
//! Transient store errors retry with bounded back-off; after the last
//! attempt the entry is logged to the server log and dropped. Shutdown
//! flips a watch flag; the worker finishes the queue and exits, and the
//! composition root bounds the drain with a grace period.
//!
//! Retention policy lives in `app_settings` (`audit_retention_days`,
//! bounded 30..=3650); cleanup deletes entries older than the cutoff.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use zrp_domain::entities::{
    AuditAction, NewAuditEntry, MAX_RETENTION_DAYS, MIN_RETENTION_DAYS,
};
use zrp_domain::repositories::{AuditRepository, SettingsRepository};
use zrp_domain::services::{Auditor, Broadcaster};
use zrp_domain::ZrpError;

/// Settings key holding the retention policy.
const RETENTION_KEY: &str = "audit_retention_days";

/// Persist retry schedule.
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_millis(50),
    Duration::from_millis(200),
    Duration::from_millis(800),
];

/// Who performed an audited operation, plus the request surface it arrived
/// through. Built by handlers from the authenticated principal and request
/// headers.
#[derive(Debug, Clone, Default)]
pub struct AuditActor {
    pub user_id: Option<i64>,
    pub username: String,
    pub ip: String,
    pub user_agent: String,
}

impl AuditActor {
    /// Actor for internally triggered operations (seeding, maintenance).
    pub fn system() -> Self {
        Self {
            user_id: None,
            username: "system".to_string(),
            ip: String::new(),
            user_agent: String::new(),
        }
    }
}

struct Inner {
    queue: Mutex<VecDeque<NewAuditEntry>>,
    notify: Notify,
    capacity: usize,
    repo: Arc<dyn AuditRepository>,
    settings: Arc<dyn SettingsRepository>,
    broadcaster: Arc<dyn Broadcaster>,
    default_retention_days: i64,
    shutdown_tx: watch::Sender<bool>,
}

impl Inner {
    async fn persist(&self, entry: NewAuditEntry) {
        for (attempt, delay) in RETRY_DELAYS.iter().enumerate() {
            match self.repo.insert(&entry).await {
                Ok(id) => {
                    let action = entry
                        .action
                        .as_ref()
                        .map(|a| a.as_str().to_string())
                        .unwrap_or_default();
                    self.broadcaster
                        .broadcast(serde_json::json!({ "type": "audit", "id": id, "action": action }));
                    return;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "audit insert failed, retrying");
                    tokio::time::sleep(*delay).await;
                }
            }
        }
        if let Err(err) = self.repo.insert(&entry).await {
            error!(error = %err, summary = %entry.summary, "audit entry dropped after retries");
        }
    }
}

#[derive(Clone)]
pub struct AuditRecorder {
    inner: Arc<Inner>,
}

impl AuditRecorder {
    pub fn new(
        repo: Arc<dyn AuditRepository>,
        settings: Arc<dyn SettingsRepository>,
        broadcaster: Arc<dyn Broadcaster>,
        capacity: usize,
        default_retention_days: i64,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
                capacity: capacity.max(1),
                repo,
                settings,
                broadcaster,
                default_retention_days,
                shutdown_tx,
            }),
        }
    }

    /// Starts the single drain worker. Call once from the composition root.
    pub fn spawn_worker(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let mut shutdown_rx = inner.shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                let next = inner.queue.lock().pop_front();
                match next {
                    Some(entry) => inner.persist(entry).await,
                    None => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                        tokio::select! {
                            _ = inner.notify.notified() => {}
                            _ = shutdown_rx.changed() => {}
                        }
                    }
                }
            }
        })
    }

    /// Signals the worker to drain what is queued and exit. The caller
    /// bounds the wait (`tokio::time::timeout` on the worker handle).
    pub fn initiate_shutdown(&self) {
        let _ = self.inner.shutdown_tx.send(true);
        self.inner.notify.notify_waiters();
    }

    /// Persists everything queued, inline. Test hook and shutdown fallback.
    pub async fn drain_now(&self) {
        loop {
            let next = self.inner.queue.lock().pop_front();
            match next {
                Some(entry) => self.inner.persist(entry).await,
                None => break,
            }
        }
    }

    /// Minimal-form emission.
    pub fn log(&self, username: &str, action: AuditAction, module: &str, record_id: &str, summary: &str) {
        self.record(NewAuditEntry {
            username: username.to_string(),
            action: Some(action),
            module: module.to_string(),
            record_id: record_id.to_string(),
            summary: summary.to_string(),
            ..Default::default()
        });
    }

    /// Full-form emission with actor context.
    pub fn log_enhanced(
        &self,
        actor: &AuditActor,
        action: AuditAction,
        module: &str,
        record_id: &str,
        summary: &str,
        before_value: Option<String>,
        after_value: Option<String>,
    ) {
        self.record(NewAuditEntry {
            user_id: actor.user_id,
            username: actor.username.clone(),
            action: Some(action),
            module: module.to_string(),
            record_id: record_id.to_string(),
            summary: summary.to_string(),
            before_value,
            after_value,
            ip_address: actor.ip.clone(),
            user_agent: actor.user_agent.clone(),
        });
    }

    /// UPDATE with before/after snapshots. For object snapshots only the
    /// differing fields are stored, so the trail shows what changed rather
    /// than a full copy of the record.
    pub fn log_update_with_diff(
        &self,
        actor: &AuditActor,
        module: &str,
        record_id: &str,
        before: &serde_json::Value,
        after: &serde_json::Value,
    ) {
        let (before, after) = diff_snapshots(before, after);
        self.log_enhanced(
            actor,
            AuditAction::Update,
            module,
            record_id,
            &format!("updated {}", record_id),
            Some(before.to_string()),
            Some(after.to_string()),
        );
    }

    pub fn log_sensitive_access(&self, actor: &AuditActor, data_type: &str, record_id: &str, details: &str) {
        self.log_enhanced(
            actor,
            AuditAction::ViewSensitive,
            data_type,
            record_id,
            details,
            None,
            None,
        );
    }

    pub fn log_data_export(&self, actor: &AuditActor, module: &str, format: &str, record_count: usize) {
        self.log_enhanced(
            actor,
            AuditAction::Export,
            module,
            "",
            &format!("exported {} records as {}", record_count, format),
            None,
            None,
        );
    }

    /// Current retention policy in days.
    pub async fn retention_days(&self) -> i64 {
        match self.inner.settings.get(RETENTION_KEY).await {
            Ok(Some(value)) => value.parse().unwrap_or(self.inner.default_retention_days),
            _ => self.inner.default_retention_days,
        }
    }

    /// Sets the retention policy; bounds 30..=3650 days.
    pub async fn set_retention_days(&self, days: i64) -> Result<(), ZrpError> {
        if !(MIN_RETENTION_DAYS..=MAX_RETENTION_DAYS).contains(&days) {
            return Err(ZrpError::bad_request(format!(
                "retention must be between {} and {} days",
                MIN_RETENTION_DAYS, MAX_RETENTION_DAYS
            )));
        }
        self.inner.settings.set(RETENTION_KEY, &days.to_string()).await
    }

    /// Purges entries older than the policy (or an explicit override).
    pub async fn cleanup_old(&self, retention_days: Option<i64>) -> Result<u64, ZrpError> {
        let days = match retention_days {
            Some(days) if (MIN_RETENTION_DAYS..=MAX_RETENTION_DAYS).contains(&days) => days,
            Some(days) => {
                return Err(ZrpError::bad_request(format!("invalid retention: {} days", days)));
            }
            None => self.retention_days().await,
        };
        let cutoff = Utc::now() - chrono::Duration::days(days);
        self.inner.repo.delete_older_than(cutoff).await
    }
}

impl Auditor for AuditRecorder {
    fn record(&self, entry: NewAuditEntry) {
        let entry = entry.cap_snapshots();
        {
            let mut queue = self.inner.queue.lock();
            if queue.len() >= self.inner.capacity {
                queue.pop_front();
                warn!("audit queue full, dropped oldest entry");
            }
            queue.push_back(entry);
        }
        self.inner.notify.notify_one();
    }
}

/// Reduces two object snapshots to their differing fields; non-objects are
/// kept whole.
fn diff_snapshots(before: &serde_json::Value, after: &serde_json::Value) -> (serde_json::Value, serde_json::Value) {
    match (before.as_object(), after.as_object()) {
        (Some(before_map), Some(after_map)) => {
            let mut before_diff = serde_json::Map::new();
            let mut after_diff = serde_json::Map::new();
            for (key, before_val) in before_map {
                let after_val = after_map.get(key).cloned().unwrap_or(serde_json::Value::Null);
                if *before_val != after_val {
                    before_diff.insert(key.clone(), before_val.clone());
                    after_diff.insert(key.clone(), after_val);
                }
            }
            for (key, after_val) in after_map {
                if !before_map.contains_key(key) {
                    before_diff.insert(key.clone(), serde_json::Value::Null);
                    after_diff.insert(key.clone(), after_val.clone());
                }
            }
            (before_diff.into(), after_diff.into())
        }
        _ => (before.clone(), after.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diff_keeps_only_changed_fields() {
        let before = json!({"description": "A", "cost": "10.50", "mpn": "X"});
        let after = json!({"description": "B", "cost": "10.50", "mpn": "X"});
        let (b, a) = diff_snapshots(&before, &after);
        assert_eq!(b, json!({"description": "A"}));
        assert_eq!(a, json!({"description": "B"}));
    }

    #[test]
    fn test_diff_handles_added_and_removed_fields() {
        let before = json!({"old_only": 1});
        let after = json!({"new_only": 2});
        let (b, a) = diff_snapshots(&before, &after);
        assert_eq!(b, json!({"old_only": 1, "new_only": null}));
        assert_eq!(a, json!({"old_only": null, "new_only": 2}));
    }

    #[test]
    fn test_diff_passes_non_objects_through() {
        let (b, a) = diff_snapshots(&json!("A"), &json!("B"));
        assert_eq!(b, json!("A"));
        assert_eq!(a, json!("B"));
    }
}
