//! Access control for images, albums, shares and comments.
//!
//! Rules:
//!
//! - an image is visible to its owner, to anyone it was shared with directly,
//!   and to everyone when its album is public. Sharing an album does not
//!   expose the album's images through the image endpoints.
//! - an album is visible to its owner, to everyone when public, and to the
//!   users it was shared with.
//! - only the owner may share, edit or delete an item.
//! - a share can be removed, and commented on, by either of its two parties.
//! - a comment is visible to its author and to the owner of the content it
//!   hangs off (the image, or the item behind the share).
//!
//! [`policy`] holds these rules as pure functions; [`SharingService`] feeds
//! them from the repositories and creates/removes share grants.

pub mod policy;
mod service;

pub use service::{ShareRecipient, SharingService};
