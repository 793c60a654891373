use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    StorageError(String),

    #[error("Upstream fetch failed: {0}")]
    FetchError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::FetchError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::StorageError(_) => "storage",
            AppError::FetchError(_) => "fetch",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Client errors echo the bare message; server-side failures keep
        // the variant prefix.
        let message = match &self {
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Rejected request");
                msg.clone()
            }
            AppError::NotFound(msg) => {
                tracing::debug!(error = %msg, "Resource not found");
                msg.clone()
            }
            AppError::StorageError(e) => {
                tracing::error!(error = %e, "Note storage failed");
                self.to_string()
            }
            AppError::FetchError(e) => {
                tracing::warn!(error = %e, "Collaborator fetch failed");
                self.to_string()
            }
        };

        let body = ErrorBody {
            error: message,
            kind: self.kind(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::ValidationError("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::StorageError("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::FetchError("x".into()).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_io_errors_are_storage_errors() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.kind(), "storage");
    }
}
