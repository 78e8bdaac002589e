use attendance_ledger::attendance::{AttendanceRecorder, NewAttendance};
use attendance_ledger::audit::AuditEmitter;
use attendance_ledger::context::{ActorRole, RequestContext};
use attendance_ledger::corrections::CorrectionWorkflow;
use attendance_ledger::database::models::AttendanceStatus;
use attendance_ledger::database::Database;

pub struct TestLedger {
    pub db: Database,
    pub recorder: AttendanceRecorder,
    pub workflow: CorrectionWorkflow,
}

/// Set up an in-memory database with the full ledger wiring
pub async fn setup_test_ledger() -> TestLedger {
    let db = Database::new_in_memory()
        .await
        .expect("Failed to create test database");
    db.run_migrations().await.expect("Failed to run migrations");

    let audit = AuditEmitter::new(db.clone());
    let recorder = AttendanceRecorder::new(db.clone(), audit.clone());
    let workflow = CorrectionWorkflow::new(db.clone(), audit);

    TestLedger {
        db,
        recorder,
        workflow,
    }
}

pub fn teacher_context() -> RequestContext {
    RequestContext::new("tenant-1", "teacher-1", ActorRole::Teacher)
}

pub fn admin_context() -> RequestContext {
    RequestContext::new("tenant-1", "admin-1", ActorRole::Admin)
}

pub fn new_attendance(student_id: &str, status: AttendanceStatus) -> NewAttendance {
    NewAttendance {
        student_id: student_id.to_string(),
        status,
        notes: String::new(),
        minutes_late: None,
        minutes_left_early: None,
    }
}
