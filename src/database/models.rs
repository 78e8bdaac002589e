use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::chain::hash::RecordPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CorrectionStatus {
    Pending,
    Approved,
    Rejected,
}

impl CorrectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionStatus::Pending => "pending",
            CorrectionStatus::Approved => "approved",
            CorrectionStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for CorrectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's attendance for one class session, chained to its
/// predecessor in the session's creation-order chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: String,
    pub tenant_id: String,
    pub class_session_id: String,
    pub student_id: String,
    pub status: AttendanceStatus,
    pub notes: String,
    pub minutes_late: Option<i64>,
    pub minutes_left_early: Option<i64>,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
    pub edited_by: Option<String>,
    pub edited_at: Option<DateTime<Utc>>,
    pub edit_count: i64,
    pub hash: Option<String>,
    pub previous_hash: Option<String>,
    pub chain_position: i64,
}

impl AttendanceRecord {
    /// The normalized payload covered by this record's chain digest.
    pub fn payload(&self) -> RecordPayload {
        RecordPayload {
            tenant_id: self.tenant_id.clone(),
            class_session_id: self.class_session_id.clone(),
            student_id: self.student_id.clone(),
            status: self.status,
            recorded_by: self.recorded_by.clone(),
            recorded_at: self.recorded_at,
            notes: self.notes.clone(),
        }
    }
}

/// A proposed change to an attendance record awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CorrectionRequest {
    pub id: String,
    pub tenant_id: String,
    pub attendance_record_id: String,
    pub class_session_id: String,
    pub original_status: AttendanceStatus,
    pub original_notes: String,
    pub corrected_status: AttendanceStatus,
    pub corrected_notes: String,
    pub reason: String,
    pub status: CorrectionStatus,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
}
