use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use imageshare_core::ImageShareError;
use serde_json::json;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<ImageShareError> for AppError {
    fn from(err: ImageShareError) -> Self {
        match err {
            ImageShareError::AccessDenied(msg) => Self::forbidden(msg),
            ImageShareError::NotFound(msg) => Self::not_found(msg),
            ImageShareError::Conflict(msg) => Self::conflict(msg),
            ImageShareError::Validation(msg) => Self::bad_request(msg),
            ImageShareError::Unauthorized(msg) => Self::unauthorized(msg),
            other => {
                tracing::error!(error = %other, "request failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "request failed");
        Self::internal("Internal server error")
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = ?err, "database operation failed");
        Self::internal("Database operation failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (ImageShareError::AccessDenied("a".into()), StatusCode::FORBIDDEN),
            (ImageShareError::NotFound("n".into()), StatusCode::NOT_FOUND),
            (ImageShareError::Conflict("c".into()), StatusCode::CONFLICT),
            (ImageShareError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (ImageShareError::Unauthorized("u".into()), StatusCode::UNAUTHORIZED),
            (ImageShareError::Internal("i".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ImageShareError::Storage("s".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let err = AppError::from(ImageShareError::Internal("pool exhausted".into()));
        assert_eq!(err.message, "Internal server error");

        let err = AppError::from(anyhow::anyhow!("connection refused at 10.0.0.5:5432"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");

        let err = AppError::from(ImageShareError::AccessDenied(
            "You do not own this image.".into(),
        ));
        assert_eq!(err.message, "You do not own this image.");
    }
}
