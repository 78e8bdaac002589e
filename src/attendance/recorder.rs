//! Attendance Recorder
//!
//! Append path for session attendance chains. Appends to the same chain are
//! serialized through a per-session lock so two records can never claim the
//! same previous hash; appends to different sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::audit::emitter::{AuditEmitter, AuditEvent};
use crate::audit::entry::AuditAction;
use crate::chain::hash::{compute_hash, RecordPayload};
use crate::chain::validator::{validate_chain, ChainValidationReport};
use crate::context::RequestContext;
use crate::database::models::{AttendanceRecord, AttendanceStatus};
use crate::database::Database;
use crate::error::LedgerError;

/// Input for one attendance append.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttendance {
    pub student_id: String,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: String,
    pub minutes_late: Option<i64>,
    pub minutes_left_early: Option<i64>,
}

#[derive(Clone)]
pub struct AttendanceRecorder {
    db: Database,
    audit: AuditEmitter,
    session_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl AttendanceRecorder {
    pub fn new(db: Database, audit: AuditEmitter) -> Self {
        Self {
            db,
            audit,
            session_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn session_lock(&self, tenant_id: &str, class_session_id: &str) -> Arc<Mutex<()>> {
        let key = format!("{}:{}", tenant_id, class_session_id);
        let mut locks = self.session_locks.lock().await;
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Append one record to a session's chain.
    ///
    /// A session/student pair gets exactly one record; later changes go
    /// through the correction workflow.
    pub async fn record_attendance(
        &self,
        ctx: &RequestContext,
        class_session_id: &str,
        new: NewAttendance,
    ) -> Result<AttendanceRecord, LedgerError> {
        let lock = self.session_lock(&ctx.tenant_id, class_session_id).await;
        let _guard = lock.lock().await;

        if self
            .db
            .find_record_for_student(&ctx.tenant_id, class_session_id, &new.student_id)
            .await?
            .is_some()
        {
            return Err(LedgerError::StateConflictError(format!(
                "Attendance for student {} in session {} is already recorded; changes go through the correction workflow",
                new.student_id, class_session_id
            )));
        }

        let head = self.db.get_chain_head(&ctx.tenant_id, class_session_id).await?;
        let previous_hash = head.as_ref().and_then(|record| record.hash.clone());
        let chain_position = head.as_ref().map(|record| record.chain_position + 1).unwrap_or(0);

        let recorded_at = Utc::now();
        let payload = RecordPayload {
            tenant_id: ctx.tenant_id.clone(),
            class_session_id: class_session_id.to_string(),
            student_id: new.student_id.clone(),
            status: new.status,
            recorded_by: ctx.actor_id.clone(),
            recorded_at,
            notes: new.notes.clone(),
        };
        let hash = compute_hash(&payload, previous_hash.as_deref());

        let record = AttendanceRecord {
            id: Uuid::new_v4().to_string(),
            tenant_id: ctx.tenant_id.clone(),
            class_session_id: class_session_id.to_string(),
            student_id: new.student_id,
            status: new.status,
            notes: new.notes,
            minutes_late: new.minutes_late,
            minutes_left_early: new.minutes_left_early,
            recorded_by: ctx.actor_id.clone(),
            recorded_at,
            edited_by: None,
            edited_at: None,
            edit_count: 0,
            hash: Some(hash),
            previous_hash,
            chain_position,
        };

        self.db.insert_attendance_record(&record).await?;

        info!(
            "Recorded attendance {} for student {} in session {} at position {}",
            record.id, record.student_id, class_session_id, record.chain_position
        );

        self.audit
            .record_audit(AuditEvent {
                actor: ctx.actor_id.clone(),
                action: AuditAction::AttendanceRecorded,
                target: format!("{}/attendance/{}", ctx.tenant_id, record.id),
                scope: "attendance:write".to_string(),
                before: None,
                after: Some(serde_json::to_value(&record)?),
                correlation_id: None,
            })
            .await?;

        Ok(record)
    }

    /// Recompute and compare every digest in a session's chain.
    ///
    /// Read-only; suspect records come back as data for compliance review.
    pub async fn validate_session(
        &self,
        ctx: &RequestContext,
        class_session_id: &str,
    ) -> Result<ChainValidationReport, LedgerError> {
        let records = self
            .db
            .get_session_records(&ctx.tenant_id, class_session_id)
            .await?;

        Ok(validate_chain(&records))
    }

    pub async fn get_record(
        &self,
        ctx: &RequestContext,
        record_id: &str,
    ) -> Result<AttendanceRecord, LedgerError> {
        self.db
            .get_attendance_record(&ctx.tenant_id, record_id)
            .await?
            .ok_or_else(|| LedgerError::record_not_found(record_id))
    }
}
