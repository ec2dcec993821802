pub mod albums;
pub mod comments;
pub mod images;
pub mod shares;
pub mod user_tokens;
pub mod users;

use crate::error::ImageShareError;

/// Name of the unique constraint/index a failed insert tripped, if any.
pub(crate) fn violated_unique(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    db_err.constraint().map(str::to_owned)
}

pub(crate) fn internal(context: &str, err: sqlx::Error) -> ImageShareError {
    ImageShareError::Internal(format!("{context}: {err}"))
}

pub(crate) fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

pub(crate) fn page_bounds(page: imageshare_model::Pagination) -> (i64, i64) {
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (i64::from(page.limit), offset)
}
