use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::{context_from_headers, AppState};
use crate::corrections::{CorrectionProposal, ReviewAction};
use crate::error::LedgerError;

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub action: ReviewAction,
    pub review_notes: Option<String>,
}

pub async fn propose_correction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CorrectionProposal>,
) -> Result<Json<serde_json::Value>, LedgerError> {
    let ctx = context_from_headers(&headers)?;
    let request = state.workflow.propose(&ctx, body).await?;

    Ok(Json(json!({
        "status": "proposed",
        "request_id": request.id,
        "request": request,
    })))
}

pub async fn review_correction(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ReviewBody>,
) -> Result<Json<serde_json::Value>, LedgerError> {
    let ctx = context_from_headers(&headers)?;
    let outcome = state
        .workflow
        .review(&ctx, &request_id, body.action, body.review_notes)
        .await?;

    Ok(Json(json!({
        "status": outcome.request.status,
        "request": outcome.request,
        "record": outcome.record,
    })))
}
