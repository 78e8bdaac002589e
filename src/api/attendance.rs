use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use chrono::Utc;
use serde_json::json;

use crate::api::{context_from_headers, AppState};
use crate::attendance::NewAttendance;
use crate::error::LedgerError;
use crate::policy::EditWindowPolicy;

pub async fn record_attendance(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<NewAttendance>,
) -> Result<Json<serde_json::Value>, LedgerError> {
    let ctx = context_from_headers(&headers)?;
    let record = state.recorder.record_attendance(&ctx, &session_id, body).await?;

    Ok(Json(json!({
        "status": "recorded",
        "record": record,
    })))
}

pub async fn validate_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, LedgerError> {
    let ctx = context_from_headers(&headers)?;
    let report = state.recorder.validate_session(&ctx, &session_id).await?;

    Ok(Json(serde_json::to_value(report)?))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, LedgerError> {
    let ctx = context_from_headers(&headers)?;
    let record = state.recorder.get_record(&ctx, &record_id).await?;

    // Advisory only: corrections go through the review workflow either way.
    let now = Utc::now();
    let within_edit_window = EditWindowPolicy::is_within_edit_window(record.recorded_at, now);
    let remaining_secs = EditWindowPolicy::remaining(record.recorded_at, now).num_seconds();

    Ok(Json(json!({
        "record": record,
        "within_edit_window": within_edit_window,
        "edit_window_remaining_secs": remaining_secs,
    })))
}
