//! Repository ports consumed by the domain services.
//!
//! Services only ever hold `Arc<dyn ...>` of these traits; the Postgres
//! adapters live under `database::infrastructure::postgres` and the
//! in-memory doubles under `testing`.

pub mod albums;
pub mod comments;
pub mod images;
pub mod shares;
pub mod user_tokens;
pub mod users;
