//! Chain Validator
//!
//! Walks a session's records oldest-first, recomputing digests to detect
//! tampering or linkage breaks. Read-only; suspect records are reported as
//! data, never repaired.

use serde::{Deserialize, Serialize};

use crate::chain::hash::compute_hash;
use crate::database::models::AttendanceRecord;

/// Why a record was flagged during chain validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    MissingHash,
    PreviousHashMismatch,
    HashMismatch,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::MissingHash => "missing hash",
            InvalidReason::PreviousHashMismatch => "previous hash mismatch",
            InvalidReason::HashMismatch => "hash mismatch - possible tampering",
        }
    }
}

/// One suspect record, with enough context for a reviewer to reconcile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedRecord {
    pub record_id: String,
    pub reason: InvalidReason,
    pub computed_hash: Option<String>,
    pub stored_hash: Option<String>,
    pub expected_previous_hash: Option<String>,
    pub stored_previous_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainValidationReport {
    pub is_valid: bool,
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: Vec<FlaggedRecord>,
}

/// Validate a session's chain
///
/// `records` must be pre-sorted by creation order, oldest first. The walk
/// advances on each record's stored hash rather than the recomputed one, so
/// a single corrupted record does not cascade flags onto every later record.
pub fn validate_chain(records: &[AttendanceRecord]) -> ChainValidationReport {
    let mut expected_previous_hash: Option<String> = None;
    let mut invalid_records = Vec::new();

    for record in records {
        let stored_hash = match record.hash.as_deref().filter(|h| !h.is_empty()) {
            Some(hash) => hash,
            None => {
                invalid_records.push(FlaggedRecord {
                    record_id: record.id.clone(),
                    reason: InvalidReason::MissingHash,
                    computed_hash: None,
                    stored_hash: None,
                    expected_previous_hash: expected_previous_hash.clone(),
                    stored_previous_hash: record.previous_hash.clone(),
                });
                // A record without a hash cannot anchor downstream links.
                continue;
            }
        };

        if record.previous_hash.as_deref() != expected_previous_hash.as_deref() {
            invalid_records.push(FlaggedRecord {
                record_id: record.id.clone(),
                reason: InvalidReason::PreviousHashMismatch,
                computed_hash: None,
                stored_hash: Some(stored_hash.to_string()),
                expected_previous_hash: expected_previous_hash.clone(),
                stored_previous_hash: record.previous_hash.clone(),
            });
        } else {
            let computed = compute_hash(&record.payload(), expected_previous_hash.as_deref());
            if computed != stored_hash {
                invalid_records.push(FlaggedRecord {
                    record_id: record.id.clone(),
                    reason: InvalidReason::HashMismatch,
                    computed_hash: Some(computed),
                    stored_hash: Some(stored_hash.to_string()),
                    expected_previous_hash: expected_previous_hash.clone(),
                    stored_previous_hash: record.previous_hash.clone(),
                });
            }
        }

        expected_previous_hash = Some(stored_hash.to_string());
    }

    let total_records = records.len();
    let valid_records = total_records - invalid_records.len();

    ChainValidationReport {
        is_valid: invalid_records.is_empty(),
        total_records,
        valid_records,
        invalid_records,
    }
}
