//! Attendance Hash Engine
//!
//! Computes the digest binding an attendance record's content to its
//! position in a class session's chain.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::database::models::AttendanceStatus;

/// Normalized attendance payload covered by the chain digest.
///
/// Chain digests cover identity, status, and provenance; auxiliary fields
/// such as minutes-late are outside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    pub tenant_id: String,
    pub class_session_id: String,
    pub student_id: String,
    pub status: AttendanceStatus,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
    pub notes: String,
}

impl RecordPayload {
    /// Create canonical string representation for hashing
    ///
    /// Field order is fixed, and `recorded_at` is rendered as RFC 3339 UTC at
    /// whole-second precision so the canonical form survives storage
    /// round-trips that truncate subsecond precision.
    pub fn canonical_string(&self) -> String {
        format!(
            "tenant_id:{}|class_session_id:{}|student_id:{}|status:{}|recorded_by:{}|recorded_at:{}|notes:{}",
            self.tenant_id,
            self.class_session_id,
            self.student_id,
            self.status.as_str(),
            self.recorded_by,
            self.recorded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.notes,
        )
    }
}

/// Compute the chained SHA256 digest for a record
///
/// The first record of a chain has no previous-hash contribution; every
/// later record appends `||` and the predecessor's digest before hashing.
/// Output is lowercase hex, 64 characters.
pub fn compute_hash(payload: &RecordPayload, previous_hash: Option<&str>) -> String {
    let input = match previous_hash {
        Some(prev) => format!("{}||{}", payload.canonical_string(), prev),
        None => payload.canonical_string(),
    };

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
