pub mod middleware;

pub use middleware::{SessionToken, require_auth};
