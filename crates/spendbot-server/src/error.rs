use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use spendbot_core::domain::ErrorBody;

/// Errors surfaced by the expense service.
///
/// Every variant maps to one HTTP status; the body is always `{"detail": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Expense with id [{0}] was not found.")]
    NotFound(String),

    /// A date bound or field could not be parsed.
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A stored row could not be read back into a record.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Parse(_) => StatusCode::BAD_REQUEST,
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Storage(_) | ServiceError::Corrupt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
