//! HTTP Surface
//!
//! Thin axum wrapper over the ledger core. Tenant and actor identity arrive
//! as gateway-supplied headers; authentication happens upstream.

pub mod attendance;
pub mod corrections;

use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::attendance::AttendanceRecorder;
use crate::context::{ActorRole, RequestContext};
use crate::corrections::CorrectionWorkflow;
use crate::error::LedgerError;

#[derive(Clone)]
pub struct AppState {
    pub recorder: AttendanceRecorder,
    pub workflow: CorrectionWorkflow,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/sessions/:session_id/attendance",
            post(attendance::record_attendance),
        )
        .route(
            "/api/sessions/:session_id/chain/validate",
            get(attendance::validate_session),
        )
        .route("/api/attendance/:record_id", get(attendance::get_record))
        .route("/api/corrections", post(corrections::propose_correction))
        .route(
            "/api/corrections/:request_id/review",
            post(corrections::review_correction),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the request context from gateway headers.
pub fn context_from_headers(headers: &HeaderMap) -> Result<RequestContext, LedgerError> {
    let tenant_id = required_header(headers, "x-tenant-id")?;
    let actor_id = required_header(headers, "x-actor-id")?;
    let role_value = required_header(headers, "x-actor-role")?;

    let actor_role = ActorRole::parse(&role_value).ok_or_else(|| {
        LedgerError::ValidationError(format!("Unknown actor role: {}", role_value))
    })?;

    Ok(RequestContext::new(tenant_id, actor_id, actor_role))
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, LedgerError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .ok_or_else(|| LedgerError::ValidationError(format!("Missing {} header", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-tenant-id", HeaderValue::from_static("tenant-1"));
        headers.insert("x-actor-id", HeaderValue::from_static("teacher-1"));
        headers.insert("x-actor-role", HeaderValue::from_static("teacher"));

        let ctx = context_from_headers(&headers).unwrap();
        assert_eq!(ctx.tenant_id, "tenant-1");
        assert_eq!(ctx.actor_id, "teacher-1");
        assert_eq!(ctx.actor_role, ActorRole::Teacher);
    }

    #[test]
    fn test_missing_header_is_a_validation_error() {
        let headers = HeaderMap::new();
        let err = context_from_headers(&headers).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("x-tenant-id", HeaderValue::from_static("tenant-1"));
        headers.insert("x-actor-id", HeaderValue::from_static("someone"));
        headers.insert("x-actor-role", HeaderValue::from_static("visitor"));

        let err = context_from_headers(&headers).unwrap_err();
        assert!(err.to_string().contains("visitor"));
    }
}
