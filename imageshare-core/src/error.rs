use imageshare_model::ModelError;
use thiserror::Error;

use crate::auth::crypto::AuthCryptoError;

#[derive(Error, Debug)]
pub enum ImageShareError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ImageShareError {
    /// The bare message without the variant prefix, for API payloads.
    pub fn message(&self) -> String {
        match self {
            ImageShareError::AccessDenied(msg)
            | ImageShareError::NotFound(msg)
            | ImageShareError::Conflict(msg)
            | ImageShareError::Validation(msg)
            | ImageShareError::Unauthorized(msg)
            | ImageShareError::Internal(msg)
            | ImageShareError::Storage(msg) => msg.clone(),
            ImageShareError::Io(err) => err.to_string(),
        }
    }
}

impl From<ModelError> for ImageShareError {
    fn from(err: ModelError) -> Self {
        ImageShareError::Validation(err.to_string())
    }
}

impl From<AuthCryptoError> for ImageShareError {
    fn from(err: AuthCryptoError) -> Self {
        ImageShareError::Internal(format!("crypto failure: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ImageShareError>;
