//! Correction Workflow
//!
//! State machine for proposing, reviewing, and applying corrections to
//! attendance records: `pending` -> `approved` | `rejected`, both terminal.
//! The original record content survives in the request snapshot and in the
//! audit trail.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit::emitter::{AuditEmitter, AuditEvent};
use crate::audit::entry::AuditAction;
use crate::chain::hash::compute_hash;
use crate::context::RequestContext;
use crate::database::models::{
    AttendanceRecord, AttendanceStatus, CorrectionRequest, CorrectionStatus,
};
use crate::database::Database;
use crate::error::LedgerError;

pub const MIN_REASON_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

/// Input for one correction proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionProposal {
    pub attendance_record_id: String,
    pub corrected_status: AttendanceStatus,
    #[serde(default)]
    pub corrected_notes: String,
    pub reason: String,
}

/// Result of a review: the request in its terminal state and the record as
/// it stands after the review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub request: CorrectionRequest,
    pub record: AttendanceRecord,
}

/// Proposal preconditions, checked against the record's current content.
pub fn check_proposal(
    record: &AttendanceRecord,
    proposal: &CorrectionProposal,
) -> Result<(), LedgerError> {
    let reason_length = proposal.reason.trim().chars().count();
    if reason_length < MIN_REASON_LENGTH {
        return Err(LedgerError::reason_too_short(reason_length, MIN_REASON_LENGTH));
    }

    if proposal.corrected_status == record.status && proposal.corrected_notes == record.notes {
        return Err(LedgerError::StateConflictError(format!(
            "Correction matches the current record (status {}, identical notes); nothing to change",
            record.status
        )));
    }

    Ok(())
}

/// Review precondition: only pending requests can be reviewed.
pub fn check_review(request: &CorrectionRequest) -> Result<(), LedgerError> {
    if request.status != CorrectionStatus::Pending {
        return Err(LedgerError::StateConflictError(format!(
            "Correction request {} is already {}; only pending requests can be reviewed",
            request.id, request.status
        )));
    }

    Ok(())
}

#[derive(Clone)]
pub struct CorrectionWorkflow {
    db: Database,
    audit: AuditEmitter,
}

impl CorrectionWorkflow {
    pub fn new(db: Database, audit: AuditEmitter) -> Self {
        Self { db, audit }
    }

    /// Propose a correction for an existing attendance record.
    ///
    /// Snapshots the record's current status/notes; the record itself is
    /// untouched until an approval. At most one pending request may exist
    /// per record.
    pub async fn propose(
        &self,
        ctx: &RequestContext,
        proposal: CorrectionProposal,
    ) -> Result<CorrectionRequest, LedgerError> {
        let record = self
            .db
            .get_attendance_record(&ctx.tenant_id, &proposal.attendance_record_id)
            .await?
            .ok_or_else(|| LedgerError::record_not_found(&proposal.attendance_record_id))?;

        check_proposal(&record, &proposal)?;

        if self
            .db
            .pending_correction_exists(&ctx.tenant_id, &record.id)
            .await?
        {
            return Err(LedgerError::StateConflictError(format!(
                "A pending correction request already exists for attendance record {}",
                record.id
            )));
        }

        let request = CorrectionRequest {
            id: Uuid::new_v4().to_string(),
            tenant_id: ctx.tenant_id.clone(),
            attendance_record_id: record.id.clone(),
            class_session_id: record.class_session_id.clone(),
            original_status: record.status,
            original_notes: record.notes.clone(),
            corrected_status: proposal.corrected_status,
            corrected_notes: proposal.corrected_notes,
            reason: proposal.reason.trim().to_string(),
            status: CorrectionStatus::Pending,
            requested_by: ctx.actor_id.clone(),
            requested_at: Utc::now(),
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
        };

        self.db.insert_correction_request(&request).await?;

        info!(
            "Correction request {} proposed for attendance {} ({} -> {})",
            request.id, record.id, request.original_status, request.corrected_status
        );

        self.audit
            .record_audit(AuditEvent {
                actor: ctx.actor_id.clone(),
                action: AuditAction::CorrectionProposed,
                target: format!("{}/corrections/{}", ctx.tenant_id, request.id),
                scope: "attendance:correct".to_string(),
                before: None,
                after: Some(serde_json::to_value(&request)?),
                correlation_id: None,
            })
            .await?;

        Ok(request)
    }

    /// Review a pending correction request.
    ///
    /// Approval mutates the record, rechains the session, and flips the
    /// request status in one transaction; rejection only flips the status.
    pub async fn review(
        &self,
        ctx: &RequestContext,
        request_id: &str,
        action: ReviewAction,
        review_notes: Option<String>,
    ) -> Result<ReviewOutcome, LedgerError> {
        let request = self
            .db
            .get_correction_request(&ctx.tenant_id, request_id)
            .await?
            .ok_or_else(|| LedgerError::request_not_found(request_id))?;

        check_review(&request)?;

        match action {
            ReviewAction::Approve => self.apply_approval(ctx, request, review_notes).await,
            ReviewAction::Reject => self.apply_rejection(ctx, request, review_notes).await,
        }
    }

    async fn apply_approval(
        &self,
        ctx: &RequestContext,
        request: CorrectionRequest,
        review_notes: Option<String>,
    ) -> Result<ReviewOutcome, LedgerError> {
        let reviewed_at = Utc::now();
        let mut tx = self.db.pool.begin().await?;

        let record = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance_records WHERE tenant_id = ? AND id = ?",
        )
        .bind(&ctx.tenant_id)
        .bind(&request.attendance_record_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| LedgerError::record_not_found(&request.attendance_record_id))?;

        let before_snapshot = serde_json::to_value(&record)?;

        let mut corrected = record.clone();
        corrected.status = request.corrected_status;
        corrected.notes = request.corrected_notes.clone();
        corrected.edited_by = Some(ctx.actor_id.clone());
        corrected.edited_at = Some(reviewed_at);
        corrected.edit_count = record.edit_count + 1;
        corrected.hash = Some(compute_hash(
            &corrected.payload(),
            corrected.previous_hash.as_deref(),
        ));

        sqlx::query(
            r#"
            UPDATE attendance_records
            SET status = ?, notes = ?, edited_by = ?, edited_at = ?, edit_count = ?, hash = ?
            WHERE id = ?
            "#,
        )
        .bind(corrected.status)
        .bind(&corrected.notes)
        .bind(&corrected.edited_by)
        .bind(corrected.edited_at)
        .bind(corrected.edit_count)
        .bind(&corrected.hash)
        .bind(&corrected.id)
        .execute(&mut *tx)
        .await?;

        // The corrected record's digest changed, so every later record in
        // the session chain must be relinked and rehashed for the chain
        // invariant to keep holding.
        let successors = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT * FROM attendance_records
            WHERE tenant_id = ? AND class_session_id = ? AND chain_position > ?
            ORDER BY chain_position ASC
            "#,
        )
        .bind(&ctx.tenant_id)
        .bind(&corrected.class_session_id)
        .bind(corrected.chain_position)
        .fetch_all(&mut *tx)
        .await?;

        let mut previous_hash = corrected.hash.clone();
        for mut successor in successors {
            successor.previous_hash = previous_hash;
            successor.hash = Some(compute_hash(
                &successor.payload(),
                successor.previous_hash.as_deref(),
            ));

            sqlx::query("UPDATE attendance_records SET previous_hash = ?, hash = ? WHERE id = ?")
                .bind(&successor.previous_hash)
                .bind(&successor.hash)
                .bind(&successor.id)
                .execute(&mut *tx)
                .await?;

            previous_hash = successor.hash;
        }

        let updated = sqlx::query(
            r#"
            UPDATE correction_requests
            SET status = 'approved', reviewed_by = ?, reviewed_at = ?, review_notes = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(&ctx.actor_id)
        .bind(reviewed_at)
        .bind(&review_notes)
        .bind(&request.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls the record mutation back.
            return Err(LedgerError::StateConflictError(format!(
                "Correction request {} left pending state during review",
                request.id
            )));
        }

        tx.commit().await?;

        let approved = CorrectionRequest {
            status: CorrectionStatus::Approved,
            reviewed_by: Some(ctx.actor_id.clone()),
            reviewed_at: Some(reviewed_at),
            review_notes,
            ..request
        };

        info!(
            "Correction request {} approved; attendance {} now {} (edit {})",
            approved.id, corrected.id, corrected.status, corrected.edit_count
        );

        self.audit
            .record_audit(AuditEvent {
                actor: ctx.actor_id.clone(),
                action: AuditAction::CorrectionApplied,
                target: format!("{}/attendance/{}", ctx.tenant_id, corrected.id),
                scope: "attendance:review".to_string(),
                before: Some(json!({ "record": before_snapshot })),
                after: Some(json!({
                    "record": serde_json::to_value(&corrected)?,
                    "reason": approved.reason,
                    "reviewed_by": ctx.actor_id,
                })),
                correlation_id: None,
            })
            .await?;

        Ok(ReviewOutcome {
            request: approved,
            record: corrected,
        })
    }

    async fn apply_rejection(
        &self,
        ctx: &RequestContext,
        request: CorrectionRequest,
        review_notes: Option<String>,
    ) -> Result<ReviewOutcome, LedgerError> {
        let reviewed_at = Utc::now();

        let record = self
            .db
            .get_attendance_record(&ctx.tenant_id, &request.attendance_record_id)
            .await?
            .ok_or_else(|| LedgerError::record_not_found(&request.attendance_record_id))?;

        let updated = sqlx::query(
            r#"
            UPDATE correction_requests
            SET status = 'rejected', reviewed_by = ?, reviewed_at = ?, review_notes = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(&ctx.actor_id)
        .bind(reviewed_at)
        .bind(&review_notes)
        .bind(&request.id)
        .execute(&self.db.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(LedgerError::StateConflictError(format!(
                "Correction request {} left pending state during review",
                request.id
            )));
        }

        let rejected = CorrectionRequest {
            status: CorrectionStatus::Rejected,
            reviewed_by: Some(ctx.actor_id.clone()),
            reviewed_at: Some(reviewed_at),
            review_notes,
            ..request
        };

        info!(
            "Correction request {} rejected; attendance {} unchanged",
            rejected.id, record.id
        );

        self.audit
            .record_audit(AuditEvent {
                actor: ctx.actor_id.clone(),
                action: AuditAction::CorrectionRejected,
                target: format!("{}/corrections/{}", ctx.tenant_id, rejected.id),
                scope: "attendance:review".to_string(),
                before: None,
                after: Some(serde_json::to_value(&rejected)?),
                correlation_id: None,
            })
            .await?;

        Ok(ReviewOutcome {
            request: rejected,
            record,
        })
    }
}
