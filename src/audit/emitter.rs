//! Audit Emitter
//!
//! Synchronous append to the audit sink. Fire-and-forget from the caller's
//! perspective, but emission failures surface as errors: compliance review
//! depends on a complete trail.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::audit::entry::{diff_hash, AuditAction, AuditEntry};
use crate::database::Database;
use crate::error::LedgerError;

/// One state-changing action to be recorded.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub actor: String,
    pub action: AuditAction,
    pub target: String,
    pub scope: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub correlation_id: Option<String>,
}

#[derive(Clone)]
pub struct AuditEmitter {
    db: Database,
}

impl AuditEmitter {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append one audit entry. Entries are never updated or deleted.
    pub async fn record_audit(&self, event: AuditEvent) -> Result<AuditEntry, LedgerError> {
        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            actor: event.actor,
            action: event.action.as_str().to_string(),
            target: event.target,
            scope: event.scope,
            diff_hash: diff_hash(event.before.as_ref(), event.after.as_ref()),
            correlation_id: event
                .correlation_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            occurred_at: Utc::now(),
        };

        self.db
            .insert_audit_entry(&entry)
            .await
            .map_err(|e| LedgerError::AuditError(format!("Failed to append audit entry: {}", e)))?;

        debug!(
            "Appended audit entry {} ({} on {} by {})",
            entry.id, entry.action, entry.target, entry.actor
        );

        Ok(entry)
    }
}
