use thiserror::Error;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::AuditError(format!("JSON serialization error: {}", err))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(format!("Database error: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("State conflict: {0}")]
    StateConflictError(String),

    #[error("Audit emission failed: {0}")]
    AuditError(String),
}

impl LedgerError {
    pub fn record_not_found(record_id: &str) -> Self {
        Self::NotFoundError(format!(
            "Attendance record {} does not exist in this tenant",
            record_id
        ))
    }

    pub fn request_not_found(request_id: &str) -> Self {
        Self::NotFoundError(format!(
            "Correction request {} does not exist in this tenant",
            request_id
        ))
    }

    pub fn reason_too_short(length: usize, minimum: usize) -> Self {
        Self::ValidationError(format!(
            "Correction reason too short: {} characters (minimum {} required)",
            length, minimum
        ))
    }
}

impl LedgerError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            LedgerError::ValidationError(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFoundError(_) => StatusCode::NOT_FOUND,
            LedgerError::StateConflictError(_) => StatusCode::CONFLICT,
            LedgerError::ConfigError(_)
            | LedgerError::DatabaseError(_)
            | LedgerError::AuditError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller; storage and audit failures
    /// are not echoed verbatim.
    pub fn user_message(&self) -> String {
        match self {
            LedgerError::ValidationError(msg)
            | LedgerError::NotFoundError(msg)
            | LedgerError::StateConflictError(msg) => msg.clone(),
            LedgerError::DatabaseError(_) => "Storage error".to_string(),
            LedgerError::AuditError(_) => "Audit emission failed".to_string(),
            LedgerError::ConfigError(_) => "Configuration error".to_string(),
        }
    }
}

impl axum::response::IntoResponse for LedgerError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = axum::Json(serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.user_message(),
            }
        }));

        (status, body).into_response()
    }
}
