use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imageshare_model::{Comment, CommentID, ImageID, ShareID, UserID};

use crate::error::Result;

#[async_trait]
pub trait CommentsRepository: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<Comment>;

    async fn get(&self, id: CommentID) -> Result<Option<Comment>>;

    async fn update_content(
        &self,
        id: CommentID,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment>;

    async fn delete(&self, id: CommentID) -> Result<bool>;

    /// Oldest first.
    async fn list_for_image(&self, image: ImageID) -> Result<Vec<Comment>>;

    /// Oldest first.
    async fn list_for_share(&self, share: ShareID) -> Result<Vec<Comment>>;

    /// Comments `user` wrote or that sit on content `user` owns, either
    /// directly on their image or on a share of their image or album.
    /// Newest first.
    async fn list_visible_to(&self, user: UserID, limit: u32) -> Result<Vec<Comment>>;
}
