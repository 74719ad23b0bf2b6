// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ECO / Part-Change Engine
//!
//! The PLM-core workflow across two substrates: `part_changes`/`ecos` rows
//! in the store and the CSV catalog on disk.
//!
//! Implementation holds a process-wide mutex, so two ECOs can never rewrite
//! catalog files concurrently. Application is atomic *per part*: each IPN
//! group either applies (CSV rewritten atomically, changes marked
//! `applied`) or fails (changes marked `rejected`) independently of other
//! groups.
//!
//! An applied IPN rename cascades through BOM files. The cascade is not
//! rolled back mid-stream: the first failing file aborts the walk with an
//! error naming it, and files already rewritten keep their new reference —
//! a documented, operator-surfaced inconsistency, visible in the summary
//! and the audit trail.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use zrp_domain::entities::{AuditAction, ChangeStatus, Eco, EcoPriority, NewAuditEntry, PartChange};
use zrp_domain::repositories::{EcoRepository, NewPartChange, PartChangeRepository};
use zrp_domain::services::{Auditor, IdAllocator};
use zrp_domain::value_objects::{IdPrefix, Ipn};
use zrp_domain::ZrpError;

use crate::infrastructure::catalog::PartsCatalog;

use super::audit::AuditActor;

/// Request body for creating an ECO from a part's draft changes.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateEcoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<EcoPriority>,
}

/// Per-change outcome of an implementation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplySummary {
    pub applied: Vec<i64>,
    pub rejected: Vec<i64>,
    pub errors: Vec<String>,
}

pub struct EcoService {
    ecos: Arc<dyn EcoRepository>,
    changes: Arc<dyn PartChangeRepository>,
    ids: Arc<dyn IdAllocator>,
    catalog: PartsCatalog,
    auditor: Arc<dyn Auditor>,
    /// Process-wide implementation mutex (see module docs).
    implement_lock: tokio::sync::Mutex<()>,
}

impl EcoService {
    pub fn new(
        ecos: Arc<dyn EcoRepository>,
        changes: Arc<dyn PartChangeRepository>,
        ids: Arc<dyn IdAllocator>,
        catalog: PartsCatalog,
        auditor: Arc<dyn Auditor>,
    ) -> Self {
        Self {
            ecos,
            changes,
            ids,
            catalog,
            auditor,
            implement_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Creates a draft part change after validating the part exists.
    pub async fn create_change(
        &self,
        part_ipn: &str,
        field_name: &str,
        new_value: &str,
        actor: &AuditActor,
    ) -> Result<PartChange, ZrpError> {
        let ipn = Ipn::new(part_ipn)?;
        if field_name.trim().is_empty() {
            return Err(ZrpError::bad_request("field_name must not be empty"));
        }

        let location = self
            .catalog
            .find_part(ipn.as_str())?
            .ok_or_else(|| ZrpError::not_found(format!("part {} not found", ipn)))?;
        let old_value = location
            .file
            .column(field_name)
            .and_then(|col| location.file.records[location.row].get(col))
            .unwrap_or("")
            .to_string();

        let change = self
            .changes
            .insert(NewPartChange {
                part_ipn: ipn.to_string(),
                field_name: field_name.to_string(),
                old_value,
                new_value: new_value.to_string(),
                created_by: actor.username.clone(),
            })
            .await?;

        self.audit(actor, AuditAction::Create, &change.id.to_string(), format!(
            "draft change on {}: {}",
            ipn, field_name
        ));
        Ok(change)
    }

    /// Batches every draft change of `part_ipn` into a fresh draft ECO.
    pub async fn create_eco_from_changes(
        &self,
        part_ipn: &str,
        request: CreateEcoRequest,
        actor: &AuditActor,
    ) -> Result<Eco, ZrpError> {
        let ipn = Ipn::new(part_ipn)?;
        if request.title.trim().is_empty() {
            return Err(ZrpError::bad_request("title must not be empty"));
        }

        let drafts = self.changes.drafts_for_part(ipn.as_str()).await?;
        if drafts.is_empty() {
            return Err(ZrpError::bad_request(format!("no draft changes for part {}", ipn)));
        }

        let eco_id = self.ids.next_id(IdPrefix::ECO).await?;
        let eco = Eco::new_draft(
            eco_id.clone(),
            request.title,
            request.description.unwrap_or_default(),
            request.priority.unwrap_or_default(),
            vec![ipn.to_string()],
            actor.username.clone(),
        );
        self.ecos.insert(&eco).await?;

        let draft_ids: Vec<i64> = drafts.iter().map(|c| c.id).collect();
        self.changes.adopt_into_eco(&draft_ids, &eco_id).await?;

        self.audit(actor, AuditAction::Create, &eco_id, format!(
            "created from {} draft change(s) on {}",
            draft_ids.len(),
            ipn
        ));
        info!(eco = %eco_id, changes = draft_ids.len(), "ECO created from changes");
        Ok(eco)
    }

    pub async fn get(&self, eco_id: &str) -> Result<Eco, ZrpError> {
        self.ecos
            .find_by_id(eco_id)
            .await?
            .ok_or_else(|| ZrpError::not_found(format!("ECO {} not found", eco_id)))
    }

    /// draft → review.
    pub async fn submit(&self, eco_id: &str, actor: &AuditActor) -> Result<Eco, ZrpError> {
        let mut eco = self.get(eco_id).await?;
        eco.submit()?;
        self.ecos.update(&eco).await?;
        self.audit(actor, AuditAction::Update, eco_id, "submitted for review".to_string());
        Ok(eco)
    }

    /// review → approved.
    pub async fn approve(&self, eco_id: &str, actor: &AuditActor) -> Result<Eco, ZrpError> {
        let mut eco = self.get(eco_id).await?;
        eco.approve(&actor.username)?;
        self.ecos.update(&eco).await?;
        self.audit(actor, AuditAction::Approve, eco_id, "approved".to_string());
        Ok(eco)
    }

    /// Rejects the ECO and every pending change under it. Re-running on an
    /// already rejected ECO is a transition error; rejecting the changes
    /// themselves is a no-op when none are pending.
    pub async fn reject(&self, eco_id: &str, actor: &AuditActor) -> Result<Eco, ZrpError> {
        let mut eco = self.get(eco_id).await?;
        eco.reject()?;
        self.ecos.update(&eco).await?;
        self.reject_part_changes_for_eco(eco_id).await?;
        self.audit(actor, AuditAction::Reject, eco_id, "rejected".to_string());
        Ok(eco)
    }

    /// Cancels the ECO; pending changes are rejected like a reject.
    pub async fn cancel(&self, eco_id: &str, actor: &AuditActor) -> Result<Eco, ZrpError> {
        let mut eco = self.get(eco_id).await?;
        eco.cancel()?;
        self.ecos.update(&eco).await?;
        self.reject_part_changes_for_eco(eco_id).await?;
        self.audit(actor, AuditAction::Reject, eco_id, "cancelled".to_string());
        Ok(eco)
    }

    /// approved → implemented, applying every pending change to the
    /// catalog. Only `approved` ECOs implement; anything else is a
    /// transition error before any file is touched.
    pub async fn implement(&self, eco_id: &str, actor: &AuditActor) -> Result<(Eco, ApplySummary), ZrpError> {
        let _guard = self.implement_lock.lock().await;

        let mut eco = self.get(eco_id).await?;
        if !eco.status.can_transition_to(zrp_domain::entities::EcoStatus::Implemented) {
            return Err(ZrpError::InvalidTransition(format!(
                "ECO {} cannot be implemented from {}",
                eco_id, eco.status
            )));
        }

        let summary = self.apply_part_changes_for_eco(eco_id).await?;

        eco.implement()?;
        self.ecos.update(&eco).await?;

        self.auditor.record(NewAuditEntry {
            user_id: actor.user_id,
            username: actor.username.clone(),
            action: Some(AuditAction::Custom("IMPLEMENT".to_string())),
            module: "ecos".to_string(),
            record_id: eco_id.to_string(),
            summary: format!(
                "implemented: {} applied, {} rejected{}",
                summary.applied.len(),
                summary.rejected.len(),
                if summary.errors.is_empty() {
                    String::new()
                } else {
                    format!(", errors: {}", summary.errors.join("; "))
                }
            ),
            ip_address: actor.ip.clone(),
            user_agent: actor.user_agent.clone(),
            ..Default::default()
        });
        Ok((eco, summary))
    }

    /// Applies pending changes grouped per part. Idempotent: a second run
    /// finds no pending rows and reports an empty summary.
    async fn apply_part_changes_for_eco(&self, eco_id: &str) -> Result<ApplySummary, ZrpError> {
        let pending = self.changes.pending_for_eco(eco_id).await?;

        let mut groups: BTreeMap<String, Vec<PartChange>> = BTreeMap::new();
        for change in pending {
            groups.entry(change.part_ipn.clone()).or_default().push(change);
        }

        let mut summary = ApplySummary::default();
        for (part_ipn, group) in groups {
            let ids: Vec<i64> = group.iter().map(|c| c.id).collect();
            let edits: Vec<(String, String)> = group
                .iter()
                .map(|c| (c.field_name.clone(), c.new_value.clone()))
                .collect();

            match self.catalog.apply_changes(&part_ipn, &edits) {
                Ok(_) => {
                    self.changes.set_status_many(&ids, ChangeStatus::Applied).await?;
                    summary.applied.extend(&ids);

                    for change in group.iter().filter(|c| c.is_ipn_rename()) {
                        if let Err(err) = self.catalog.update_bom_references(&part_ipn, &change.new_value) {
                            warn!(part = %part_ipn, error = %err, "BOM rename cascade failed");
                            summary.errors.push(err.to_string());
                        }
                    }
                }
                Err(err) => {
                    // This part failed; the rest of the ECO still proceeds.
                    warn!(part = %part_ipn, error = %err, "part change application failed");
                    self.changes.set_status_many(&ids, ChangeStatus::Rejected).await?;
                    summary.rejected.extend(&ids);
                    summary.errors.push(format!("{}: {}", part_ipn, err));
                }
            }
        }
        Ok(summary)
    }

    /// Marks all pending changes of the ECO rejected; no-op when none are
    /// pending.
    pub async fn reject_part_changes_for_eco(&self, eco_id: &str) -> Result<u64, ZrpError> {
        let pending = self.changes.pending_for_eco(eco_id).await?;
        if pending.is_empty() {
            return Ok(0);
        }
        let ids: Vec<i64> = pending.iter().map(|c| c.id).collect();
        self.changes.set_status_many(&ids, ChangeStatus::Rejected).await
    }

    fn audit(&self, actor: &AuditActor, action: AuditAction, record_id: &str, summary: String) {
        self.auditor.record(NewAuditEntry {
            user_id: actor.user_id,
            username: actor.username.clone(),
            action: Some(action),
            module: "ecos".to_string(),
            record_id: record_id.to_string(),
            summary,
            ip_address: actor.ip.clone(),
            user_agent: actor.user_agent.clone(),
            ..Default::default()
        });
    }
}
