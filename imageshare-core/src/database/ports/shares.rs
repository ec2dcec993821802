use async_trait::async_trait;
use imageshare_model::{Page, Pagination, Share, ShareID, SharedItemRef, UserID};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct NewShare {
    pub item: SharedItemRef,
    pub shared_by: UserID,
    pub shared_with: UserID,
    pub message: Option<String>,
}

#[async_trait]
pub trait SharesRepository: Send + Sync {
    /// A second share of the same item with the same recipient fails with
    /// `ImageShareError::Conflict`.
    async fn insert(&self, share: NewShare) -> Result<Share>;

    async fn get(&self, id: ShareID) -> Result<Option<Share>>;

    /// The share granting `item` to `recipient`, if any.
    async fn find(&self, item: SharedItemRef, recipient: UserID) -> Result<Option<Share>>;

    async fn exists(&self, item: SharedItemRef, recipient: UserID) -> Result<bool> {
        Ok(self.find(item, recipient).await?.is_some())
    }

    async fn delete(&self, id: ShareID) -> Result<bool>;

    /// Oldest first.
    async fn list_for_item(&self, item: SharedItemRef) -> Result<Vec<Share>>;

    /// Newest first.
    async fn list_sent(&self, sender: UserID) -> Result<Vec<Share>>;

    /// Newest first.
    async fn list_received(&self, recipient: UserID, page: Pagination) -> Result<Page<Share>>;

    async fn count_sent(&self, sender: UserID) -> Result<u64>;

    async fn count_received(&self, recipient: UserID) -> Result<u64>;
}
