// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Inventory Transaction Service
//!
//! The one coordinated mutation entry point for `qty_on_hand`. Handlers may
//! read inventory freely but every write funnels through
//! [`InventoryService::transact`]; nothing else issues quantity UPDATEs.
//!
//! Concurrency: calls targeting the same IPN serialize on a per-IPN async
//! mutex taken for the whole read-compute-write sequence; calls on
//! different IPNs proceed in parallel. The row mutation and its journal
//! rows commit in one store transaction, and the CHECK constraint turns a
//! would-be-negative quantity into `CONSTRAINT_VIOLATION` with nothing
//! persisted.
//!
//! The lock map holds one entry per recently touched IPN and is swept when
//! it grows past a threshold, dropping mutexes nobody currently holds.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use zrp_domain::entities::{AuditAction, NewTransaction, TransactionType};
use zrp_domain::repositories::{InventoryRepository, QtyChange};
use zrp_domain::services::Auditor;
use zrp_domain::value_objects::Ipn;
use zrp_domain::ZrpError;

use super::audit::AuditActor;

/// Sweep the lock map once it holds this many entries.
const LOCK_MAP_SWEEP_THRESHOLD: usize = 1024;

/// One movement request.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactRequest {
    pub ipn: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub qty: f64,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Target location for `transfer`; omitted means the transfer is an
    /// audit-only movement with no location change.
    #[serde(default)]
    pub destination: Option<String>,
}

/// Movement outcome.
#[derive(Debug, Clone, Serialize)]
pub struct TransactOutcome {
    pub ipn: String,
    pub new_qty_on_hand: f64,
}

pub struct InventoryService {
    repo: Arc<dyn InventoryRepository>,
    auditor: Arc<dyn Auditor>,
    locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl InventoryService {
    pub fn new(repo: Arc<dyn InventoryRepository>, auditor: Arc<dyn Auditor>) -> Self {
        Self {
            repo,
            auditor,
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, ipn: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        if locks.len() > LOCK_MAP_SWEEP_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(ipn.to_string()).or_default().clone()
    }

    /// Applies one movement. See the module docs for the signed-delta and
    /// journaling contract.
    pub async fn transact(&self, request: TransactRequest, actor: &AuditActor) -> Result<TransactOutcome, ZrpError> {
        let ipn = Ipn::new(request.ipn.as_str())?;
        if !request.qty.is_finite() || request.qty < 0.0 {
            return Err(ZrpError::bad_request(format!(
                "qty must be a non-negative number, got {}",
                request.qty
            )));
        }

        let lock = self.lock_for(ipn.as_str());
        let _guard = lock.lock().await;

        let current = self
            .repo
            .get(ipn.as_str())
            .await?
            .map(|item| item.qty_on_hand)
            .unwrap_or(0.0);

        let (change, journal) = self.plan_movement(&ipn, &request, current);
        let new_qty = self.repo.apply_movement(ipn.as_str(), change, &journal).await?;

        if request.tx_type == TransactionType::Transfer {
            if let Some(destination) = &request.destination {
                let mut item = self
                    .repo
                    .get(ipn.as_str())
                    .await?
                    .ok_or_else(|| ZrpError::internal("inventory row vanished mid-transfer"))?;
                item.location = destination.clone();
                self.repo.upsert_item(&item).await?;
            }
        }

        self.auditor.record(zrp_domain::entities::NewAuditEntry {
            user_id: actor.user_id,
            username: actor.username.clone(),
            action: Some(AuditAction::Update),
            module: "inventory".to_string(),
            record_id: ipn.to_string(),
            summary: format!("{} qty {} -> on hand {}", request.tx_type, request.qty, new_qty),
            ip_address: actor.ip.clone(),
            user_agent: actor.user_agent.clone(),
            ..Default::default()
        });

        debug!(ipn = %ipn, tx_type = %request.tx_type, new_qty, "inventory movement committed");
        Ok(TransactOutcome {
            ipn: ipn.to_string(),
            new_qty_on_hand: new_qty,
        })
    }

    fn plan_movement(
        &self,
        ipn: &Ipn,
        request: &TransactRequest,
        current: f64,
    ) -> (QtyChange, Vec<NewTransaction>) {
        let base = NewTransaction {
            ipn: ipn.to_string(),
            tx_type: request.tx_type,
            qty: 0.0,
            reference: request.reference.clone(),
            notes: request.notes.clone(),
        };

        match request.tx_type {
            TransactionType::Receive | TransactionType::Return => (
                QtyChange::Delta(request.qty),
                vec![NewTransaction { qty: request.qty, ..base }],
            ),
            TransactionType::Issue | TransactionType::Scrap => (
                QtyChange::Delta(-request.qty),
                vec![NewTransaction { qty: -request.qty, ..base }],
            ),
            TransactionType::Adjust => (
                QtyChange::Set(request.qty),
                vec![NewTransaction {
                    qty: request.qty - current,
                    ..base
                }],
            ),
            // Two journal rows, zero net movement; a destination in `notes`
            // territory is handled by the caller-visible location update.
            TransactionType::Transfer => (
                QtyChange::Delta(0.0),
                vec![
                    NewTransaction {
                        qty: -request.qty,
                        ..base.clone()
                    },
                    NewTransaction { qty: request.qty, ..base },
                ],
            ),
        }
    }
}
