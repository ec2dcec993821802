use chrono::{DateTime, Utc};

use crate::ids::{AlbumID, ImageID, UserID};

/// An uploaded image file and its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Image {
    pub id: ImageID,
    pub owner_id: UserID,
    pub album_id: Option<AlbumID>,
    /// Public flag of the containing album, populated on load.
    ///
    /// Access checks read this instead of loading the album again.
    #[cfg_attr(feature = "serde", serde(default))]
    pub album_is_public: bool,
    pub title: String,
    pub description: Option<String>,
    /// Name of the stored file relative to the upload directory
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub fn is_owned_by(&self, user: UserID) -> bool {
        self.owner_id == user
    }
}

/// A named collection of images belonging to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Album {
    pub id: AlbumID,
    pub owner_id: UserID,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Album {
    pub fn is_owned_by(&self, user: UserID) -> bool {
        self.owner_id == user
    }
}
