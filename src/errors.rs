use axum::response::IntoResponse;
use http::StatusCode;
use thiserror::Error;

use crate::services::arima::FitError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("No data found for asset '{0}'")]
    NotFound(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Model fit error: {0}")]
    ModelFit(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Parse(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ModelFit(_) | AppError::Db(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to a browser. Store failures are not echoed back.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Db(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), self.public_message()).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<FitError> for AppError {
    fn from(value: FitError) -> Self {
        AppError::ModelFit(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Internal(format!("serialization failed: {}", value))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("dogecoin".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Parse("bad date".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::ModelFit("too short".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("join handle panicked".into());
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::NotFound("dogecoin".into());
        assert!(err.public_message().contains("dogecoin"));
    }
}
