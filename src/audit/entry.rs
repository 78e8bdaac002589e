//! Audit Entry
//!
//! Immutable record of one state-changing action, with a deterministic
//! digest over the before/after snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub target: String,
    pub scope: String,
    pub diff_hash: String,
    pub correlation_id: String,
    pub occurred_at: DateTime<Utc>,
}

/// Namespaced audit actions emitted by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    AttendanceRecorded,
    CorrectionProposed,
    CorrectionApplied,
    CorrectionRejected,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AttendanceRecorded => "attendance.recorded",
            AuditAction::CorrectionProposed => "attendance.correction_proposed",
            AuditAction::CorrectionApplied => "attendance.correction_applied",
            AuditAction::CorrectionRejected => "attendance.correction_rejected",
        }
    }
}

/// Render JSON with object keys sorted recursively
///
/// Semantically identical snapshots canonicalize to identical strings no
/// matter the key insertion order they were built with.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        Value::String((*key).clone()),
                        canonical_json(&map[key.as_str()])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", rendered.join(","))
        }
        other => other.to_string(),
    }
}

/// Deterministic digest over a before/after snapshot pair
pub fn diff_hash(before: Option<&Value>, after: Option<&Value>) -> String {
    let before_canonical = before.map(canonical_json).unwrap_or_else(|| "null".to_string());
    let after_canonical = after.map(canonical_json).unwrap_or_else(|| "null".to_string());

    let mut hasher = Sha256::new();
    hasher.update(before_canonical.as_bytes());
    hasher.update(b"||");
    hasher.update(after_canonical.as_bytes());
    hex::encode(hasher.finalize())
}
