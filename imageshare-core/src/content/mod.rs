//! Image and album management on top of the access rules in
//! [`crate::access`].

mod albums;
mod dashboard;
mod images;

pub use albums::{AlbumChanges, AlbumService, NewAlbum};
pub use dashboard::{DashboardService, DashboardStats, RECENT_COMMENTS_LIMIT};
pub use images::{
    ALLOWED_CONTENT_TYPES, ImageChanges, ImageService, MAX_UPLOAD_BYTES, StoredFile, UploadImage,
};

use crate::error::{ImageShareError, Result};

/// Trim a free-text field, mapping blank input to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn required_text(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ImageShareError::Validation(format!("{field} cannot be empty.")));
    }
    if trimmed.chars().count() > max {
        return Err(ImageShareError::Validation(format!(
            "{field} must be at most {max} characters."
        )));
    }
    Ok(trimmed.to_string())
}
