use imageshare_model::{Album, Comment, Image, Share, SharedItem, UserID};

use crate::error::{ImageShareError, Result};

/// `shared_with_user` says whether a share grants this image to `user`.
pub fn can_access_image(image: &Image, user: UserID, shared_with_user: bool) -> bool {
    image.is_owned_by(user) || shared_with_user || image.album_is_public
}

/// `shared_with_user` says whether a share grants this album to `user`.
pub fn can_access_album(album: &Album, user: UserID, shared_with_user: bool) -> bool {
    album.is_owned_by(user) || album.is_public || shared_with_user
}

pub fn can_remove_share(share: &Share, user: UserID) -> bool {
    share.involves(user)
}

pub fn can_comment_on_share(share: &Share, user: UserID) -> bool {
    share.involves(user)
}

/// `item_owner` is the owner of the image the comment is on, or of the item
/// behind the share the comment is on.
pub fn comment_visible_to(comment: &Comment, item_owner: UserID, user: UserID) -> bool {
    comment.is_authored_by(user) || item_owner == user
}

pub fn ensure_owner(item: &SharedItem, user: UserID) -> Result<()> {
    if item.owner_id() == user {
        return Ok(());
    }
    Err(ImageShareError::AccessDenied(format!(
        "You do not own this {}.",
        item.kind().as_str()
    )))
}

/// Only the owner may share an item.
pub fn ensure_can_share(item: &SharedItem, user: UserID) -> Result<()> {
    if item.owner_id() == user {
        return Ok(());
    }
    Err(ImageShareError::AccessDenied(format!(
        "You cannot share this {}.",
        item.kind().as_str()
    )))
}
