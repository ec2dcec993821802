use chrono::{DateTime, Utc};

use crate::ids::{CommentID, ImageID, ShareID, UserID};

/// What a comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "id", rename_all = "lowercase")
)]
pub enum CommentTarget {
    Image(ImageID),
    Share(ShareID),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comment {
    pub id: CommentID,
    pub content: String,
    pub author_id: UserID,
    pub target: CommentTarget,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_authored_by(&self, user: UserID) -> bool {
        self.author_id == user
    }
}
