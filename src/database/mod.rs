pub mod models;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::audit::entry::AuditEntry;
use crate::database::models::{AttendanceRecord, CorrectionRequest};

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Database { pool })
    }

    /// In-memory database for tests; a single connection so every handle
    /// sees the same database.
    pub async fn new_in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Database { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(include_str!("../../migrations/001_initial_schema.sql"))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_attendance_record(
        &self,
        tenant_id: &str,
        record_id: &str,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance_records WHERE tenant_id = ? AND id = ?",
        )
        .bind(tenant_id)
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_record_for_student(
        &self,
        tenant_id: &str,
        class_session_id: &str,
        student_id: &str,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT * FROM attendance_records
            WHERE tenant_id = ? AND class_session_id = ? AND student_id = ?
            "#,
        )
        .bind(tenant_id)
        .bind(class_session_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Records for one session in creation order, oldest first.
    pub async fn get_session_records(
        &self,
        tenant_id: &str,
        class_session_id: &str,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT * FROM attendance_records
            WHERE tenant_id = ? AND class_session_id = ?
            ORDER BY chain_position ASC
            "#,
        )
        .bind(tenant_id)
        .bind(class_session_id)
        .fetch_all(&self.pool)
        .await
    }

    /// The newest record in a session's chain, if any.
    pub async fn get_chain_head(
        &self,
        tenant_id: &str,
        class_session_id: &str,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT * FROM attendance_records
            WHERE tenant_id = ? AND class_session_id = ?
            ORDER BY chain_position DESC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(class_session_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert_attendance_record(
        &self,
        record: &AttendanceRecord,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO attendance_records (
                id, tenant_id, class_session_id, student_id, status, notes,
                minutes_late, minutes_left_early, recorded_by, recorded_at,
                edited_by, edited_at, edit_count, hash, previous_hash, chain_position
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.tenant_id)
        .bind(&record.class_session_id)
        .bind(&record.student_id)
        .bind(record.status)
        .bind(&record.notes)
        .bind(record.minutes_late)
        .bind(record.minutes_left_early)
        .bind(&record.recorded_by)
        .bind(record.recorded_at)
        .bind(&record.edited_by)
        .bind(record.edited_at)
        .bind(record.edit_count)
        .bind(&record.hash)
        .bind(&record.previous_hash)
        .bind(record.chain_position)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_correction_request(
        &self,
        tenant_id: &str,
        request_id: &str,
    ) -> Result<Option<CorrectionRequest>, sqlx::Error> {
        sqlx::query_as::<_, CorrectionRequest>(
            "SELECT * FROM correction_requests WHERE tenant_id = ? AND id = ?",
        )
        .bind(tenant_id)
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn pending_correction_exists(
        &self,
        tenant_id: &str,
        attendance_record_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM correction_requests
            WHERE tenant_id = ? AND attendance_record_id = ? AND status = 'pending'
            "#,
        )
        .bind(tenant_id)
        .bind(attendance_record_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn insert_correction_request(
        &self,
        request: &CorrectionRequest,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO correction_requests (
                id, tenant_id, attendance_record_id, class_session_id,
                original_status, original_notes, corrected_status, corrected_notes,
                reason, status, requested_by, requested_at,
                reviewed_by, reviewed_at, review_notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.tenant_id)
        .bind(&request.attendance_record_id)
        .bind(&request.class_session_id)
        .bind(request.original_status)
        .bind(&request.original_notes)
        .bind(request.corrected_status)
        .bind(&request.corrected_notes)
        .bind(&request.reason)
        .bind(request.status)
        .bind(&request.requested_by)
        .bind(request.requested_at)
        .bind(&request.reviewed_by)
        .bind(request.reviewed_at)
        .bind(&request.review_notes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_audit_entry(&self, entry: &AuditEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_entries (
                id, actor, action, target, scope, diff_hash, correlation_id, occurred_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.actor)
        .bind(&entry.action)
        .bind(&entry.target)
        .bind(&entry.scope)
        .bind(&entry.diff_hash)
        .bind(&entry.correlation_id)
        .bind(entry.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Audit entries for one resource locator, oldest first. Compliance
    /// review only; nothing in this crate makes control decisions from it.
    pub async fn get_audit_entries_for_target(
        &self,
        target: &str,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_entries WHERE target = ? ORDER BY occurred_at ASC",
        )
        .bind(target)
        .fetch_all(&self.pool)
        .await
    }
}
