use std::fmt;

use chrono::{DateTime, Utc};

use crate::{
    content::{Album, Image},
    ids::{AlbumID, ImageID, ShareID, UserID},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SharedItemKind {
    Image,
    Album,
}

impl SharedItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharedItemKind::Image => "image",
            SharedItemKind::Album => "album",
        }
    }
}

/// Reference to the single item a share grants.
///
/// Persisted as two nullable columns with a CHECK that exactly one is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "id", rename_all = "lowercase")
)]
pub enum SharedItemRef {
    Image(ImageID),
    Album(AlbumID),
}

impl SharedItemRef {
    pub fn kind(&self) -> SharedItemKind {
        match self {
            SharedItemRef::Image(_) => SharedItemKind::Image,
            SharedItemRef::Album(_) => SharedItemKind::Album,
        }
    }

    pub fn image_id(&self) -> Option<ImageID> {
        match self {
            SharedItemRef::Image(id) => Some(*id),
            SharedItemRef::Album(_) => None,
        }
    }

    pub fn album_id(&self) -> Option<AlbumID> {
        match self {
            SharedItemRef::Album(id) => Some(*id),
            SharedItemRef::Image(_) => None,
        }
    }
}

impl fmt::Display for SharedItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharedItemRef::Image(id) => write!(f, "image:{id}"),
            SharedItemRef::Album(id) => write!(f, "album:{id}"),
        }
    }
}

/// A loaded shareable item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedItem {
    Image(Image),
    Album(Album),
}

impl SharedItem {
    pub fn owner_id(&self) -> UserID {
        match self {
            SharedItem::Image(image) => image.owner_id,
            SharedItem::Album(album) => album.owner_id,
        }
    }

    pub fn item_ref(&self) -> SharedItemRef {
        match self {
            SharedItem::Image(image) => SharedItemRef::Image(image.id),
            SharedItem::Album(album) => SharedItemRef::Album(album.id),
        }
    }

    pub fn kind(&self) -> SharedItemKind {
        self.item_ref().kind()
    }

    /// Title of an image or name of an album
    pub fn label(&self) -> &str {
        match self {
            SharedItem::Image(image) => &image.title,
            SharedItem::Album(album) => &album.name,
        }
    }
}

impl From<Image> for SharedItem {
    fn from(image: Image) -> Self {
        SharedItem::Image(image)
    }
}

impl From<Album> for SharedItem {
    fn from(album: Album) -> Self {
        SharedItem::Album(album)
    }
}

/// A directed grant of one item from its owner to another user.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Share {
    pub id: ShareID,
    pub item: SharedItemRef,
    pub shared_by: UserID,
    pub shared_with: UserID,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Share {
    pub fn involves(&self, user: UserID) -> bool {
        self.shared_by == user || self.shared_with == user
    }
}

/// A recipient named in a share request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "value", rename_all = "lowercase")
)]
pub enum ShareTarget {
    Username(String),
    Id(UserID),
}

impl ShareTarget {
    /// Splits a comma separated recipient list, dropping blank entries.
    pub fn parse_usernames(list: &str) -> Vec<ShareTarget> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| ShareTarget::Username(name.to_string()))
            .collect()
    }
}

impl fmt::Display for ShareTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareTarget::Username(name) => f.write_str(name),
            ShareTarget::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Result of a batch share request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShareOutcome {
    pub shared_count: usize,
    pub errors: Vec<String>,
    pub success: bool,
}

impl ShareOutcome {
    pub fn record_shared(&mut self) {
        self.shared_count += 1;
        self.success = true;
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_list_drops_blanks() {
        let targets = ShareTarget::parse_usernames("bob, ghost,, ");
        assert_eq!(
            targets,
            vec![
                ShareTarget::Username("bob".into()),
                ShareTarget::Username("ghost".into())
            ]
        );
    }

    #[test]
    fn outcome_success_tracks_shared_count() {
        let mut outcome = ShareOutcome::default();
        outcome.record_error("User 'ghost' not found.");
        assert!(!outcome.success);
        outcome.record_shared();
        assert!(outcome.success);
        assert_eq!(outcome.shared_count, 1);
    }
}
