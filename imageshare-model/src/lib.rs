//! Data model shared by the ImageShare crates.
//!
//! Everything here is plain data: identifiers, account records, content,
//! share grants and comments. Behaviour lives in `imageshare-core`.
#![allow(missing_docs)]

pub mod comment;
pub mod content;
pub mod error;
pub mod ids;
pub mod page;
pub mod share;
pub mod user;

pub use comment::{Comment, CommentTarget};
pub use content::{Album, Image};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{AlbumID, CommentID, ImageID, ShareID, UserID};
pub use page::{Page, Pagination};
pub use share::{
    Share, ShareOutcome, ShareTarget, SharedItem, SharedItemKind,
    SharedItemRef,
};
pub use user::{PublicProfile, User, UserProfile, UserRole, UserStatus, UserSummary};
