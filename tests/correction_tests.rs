use attendance_ledger::corrections::{CorrectionProposal, ReviewAction};
use attendance_ledger::database::models::{AttendanceStatus, CorrectionStatus};
use attendance_ledger::error::LedgerError;

mod common;
use common::*;

fn proposal_for(record_id: &str, status: AttendanceStatus) -> CorrectionProposal {
    CorrectionProposal {
        attendance_record_id: record_id.to_string(),
        corrected_status: status,
        corrected_notes: String::new(),
        reason: "Marked wrong student by mistake".to_string(),
    }
}

#[tokio::test]
async fn test_propose_snapshots_original_values() {
    let ledger = setup_test_ledger().await;
    let ctx = teacher_context();

    let record = ledger
        .recorder
        .record_attendance(&ctx, "session-1", new_attendance("student-0", AttendanceStatus::Absent))
        .await
        .unwrap();

    let request = ledger
        .workflow
        .propose(&ctx, proposal_for(&record.id, AttendanceStatus::Present))
        .await
        .unwrap();

    assert_eq!(request.status, CorrectionStatus::Pending);
    assert_eq!(request.original_status, AttendanceStatus::Absent);
    assert_eq!(request.corrected_status, AttendanceStatus::Present);
    assert_eq!(request.requested_by, ctx.actor_id);
    assert!(request.reviewed_by.is_none());

    // The record itself is untouched until approval.
    let unchanged = ledger.recorder.get_record(&ctx, &record.id).await.unwrap();
    assert_eq!(unchanged, record);
}

#[tokio::test]
async fn test_propose_for_unknown_record_fails() {
    let ledger = setup_test_ledger().await;
    let ctx = teacher_context();

    let err = ledger
        .workflow
        .propose(&ctx, proposal_for("no-such-record", AttendanceStatus::Present))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::NotFoundError(_)));
}

#[tokio::test]
async fn test_second_pending_proposal_is_rejected() {
    let ledger = setup_test_ledger().await;
    let ctx = teacher_context();

    let record = ledger
        .recorder
        .record_attendance(&ctx, "session-1", new_attendance("student-0", AttendanceStatus::Absent))
        .await
        .unwrap();

    ledger
        .workflow
        .propose(&ctx, proposal_for(&record.id, AttendanceStatus::Present))
        .await
        .unwrap();

    let err = ledger
        .workflow
        .propose(&ctx, proposal_for(&record.id, AttendanceStatus::Late))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::StateConflictError(_)));
    assert!(err.to_string().contains("pending correction request already exists"));
}

#[tokio::test]
async fn test_approval_applies_correction_atomically() {
    let ledger = setup_test_ledger().await;
    let teacher = teacher_context();
    let admin = admin_context();

    let record = ledger
        .recorder
        .record_attendance(&teacher, "session-1", new_attendance("student-0", AttendanceStatus::Absent))
        .await
        .unwrap();

    let request = ledger
        .workflow
        .propose(&teacher, proposal_for(&record.id, AttendanceStatus::Present))
        .await
        .unwrap();

    let outcome = ledger
        .workflow
        .review(&admin, &request.id, ReviewAction::Approve, Some("confirmed with register".to_string()))
        .await
        .unwrap();

    assert_eq!(outcome.request.status, CorrectionStatus::Approved);
    assert_eq!(outcome.request.reviewed_by.as_deref(), Some("admin-1"));
    assert!(outcome.request.reviewed_at.is_some());

    let updated = ledger.recorder.get_record(&admin, &record.id).await.unwrap();
    assert_eq!(updated.status, AttendanceStatus::Present);
    assert_eq!(updated.edit_count, 1);
    assert_eq!(updated.edited_by.as_deref(), Some("admin-1"));
    assert!(updated.edited_at.is_some());
    assert_ne!(updated.hash, record.hash);
}

#[tokio::test]
async fn test_approval_rechains_the_session() {
    let ledger = setup_test_ledger().await;
    let teacher = teacher_context();
    let admin = admin_context();

    let mut records = Vec::new();
    for i in 0..4 {
        records.push(
            ledger
                .recorder
                .record_attendance(
                    &teacher,
                    "session-1",
                    new_attendance(&format!("student-{}", i), AttendanceStatus::Present),
                )
                .await
                .unwrap(),
        );
    }

    // Correct a mid-chain record; every later record must be relinked.
    let request = ledger
        .workflow
        .propose(&teacher, proposal_for(&records[1].id, AttendanceStatus::Excused))
        .await
        .unwrap();
    ledger
        .workflow
        .review(&admin, &request.id, ReviewAction::Approve, None)
        .await
        .unwrap();

    let report = ledger.recorder.validate_session(&admin, "session-1").await.unwrap();
    assert!(report.is_valid, "chain should stay valid after an approved correction");
    assert_eq!(report.valid_records, 4);

    let tail = ledger.recorder.get_record(&admin, &records[3].id).await.unwrap();
    assert_ne!(tail.hash, records[3].hash);
}

#[tokio::test]
async fn test_rejection_leaves_the_record_untouched() {
    let ledger = setup_test_ledger().await;
    let teacher = teacher_context();
    let admin = admin_context();

    let record = ledger
        .recorder
        .record_attendance(&teacher, "session-1", new_attendance("student-0", AttendanceStatus::Absent))
        .await
        .unwrap();

    let request = ledger
        .workflow
        .propose(&teacher, proposal_for(&record.id, AttendanceStatus::Present))
        .await
        .unwrap();

    let outcome = ledger
        .workflow
        .review(&admin, &request.id, ReviewAction::Reject, Some("register confirms the absence".to_string()))
        .await
        .unwrap();

    assert_eq!(outcome.request.status, CorrectionStatus::Rejected);
    assert_eq!(outcome.request.reviewed_by.as_deref(), Some("admin-1"));

    let unchanged = ledger.recorder.get_record(&admin, &record.id).await.unwrap();
    assert_eq!(unchanged, record);

    let report = ledger.recorder.validate_session(&admin, "session-1").await.unwrap();
    assert!(report.is_valid);
}

#[tokio::test]
async fn test_terminal_request_cannot_be_reviewed_again() {
    let ledger = setup_test_ledger().await;
    let teacher = teacher_context();
    let admin = admin_context();

    let record = ledger
        .recorder
        .record_attendance(&teacher, "session-1", new_attendance("student-0", AttendanceStatus::Absent))
        .await
        .unwrap();

    let request = ledger
        .workflow
        .propose(&teacher, proposal_for(&record.id, AttendanceStatus::Present))
        .await
        .unwrap();
    ledger
        .workflow
        .review(&admin, &request.id, ReviewAction::Approve, None)
        .await
        .unwrap();

    let err = ledger
        .workflow
        .review(&admin, &request.id, ReviewAction::Reject, None)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::StateConflictError(_)));
    assert!(err.to_string().contains("already approved"));
}

#[tokio::test]
async fn test_review_of_unknown_request_fails() {
    let ledger = setup_test_ledger().await;
    let admin = admin_context();

    let err = ledger
        .workflow
        .review(&admin, "no-such-request", ReviewAction::Approve, None)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::NotFoundError(_)));
}

#[tokio::test]
async fn test_new_proposal_allowed_after_terminal_review() {
    let ledger = setup_test_ledger().await;
    let teacher = teacher_context();
    let admin = admin_context();

    let record = ledger
        .recorder
        .record_attendance(&teacher, "session-1", new_attendance("student-0", AttendanceStatus::Absent))
        .await
        .unwrap();

    let first = ledger
        .workflow
        .propose(&teacher, proposal_for(&record.id, AttendanceStatus::Present))
        .await
        .unwrap();
    ledger
        .workflow
        .review(&admin, &first.id, ReviewAction::Reject, None)
        .await
        .unwrap();

    // The pending slot is free again once the first request is terminal.
    let second = ledger
        .workflow
        .propose(&teacher, proposal_for(&record.id, AttendanceStatus::Late))
        .await
        .unwrap();
    assert_eq!(second.status, CorrectionStatus::Pending);
}

#[tokio::test]
async fn test_end_to_end_correction_scenario() {
    let ledger = setup_test_ledger().await;
    let teacher = teacher_context();
    let admin = admin_context();

    let record = ledger
        .recorder
        .record_attendance(&teacher, "session-x", new_attendance("student-s", AttendanceStatus::Absent))
        .await
        .unwrap();

    let request = ledger
        .workflow
        .propose(&teacher, proposal_for(&record.id, AttendanceStatus::Present))
        .await
        .unwrap();

    let outcome = ledger
        .workflow
        .review(&admin, &request.id, ReviewAction::Approve, None)
        .await
        .unwrap();

    assert_eq!(outcome.request.status, CorrectionStatus::Approved);
    assert_eq!(outcome.record.status, AttendanceStatus::Present);
    assert_eq!(outcome.record.edit_count, 1);
    assert_eq!(outcome.record.edited_by.as_deref(), Some("admin-1"));

    // Two audit entries against the record: creation and applied correction,
    // each with its own correlation id since none was supplied.
    let target = format!("tenant-1/attendance/{}", record.id);
    let entries = ledger.db.get_audit_entries_for_target(&target).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "attendance.recorded");
    assert_eq!(entries[1].action, "attendance.correction_applied");
    assert_ne!(entries[0].correlation_id, entries[1].correlation_id);
    assert_eq!(entries[1].actor, "admin-1");

    let report = ledger.recorder.validate_session(&admin, "session-x").await.unwrap();
    assert!(report.is_valid);
}
