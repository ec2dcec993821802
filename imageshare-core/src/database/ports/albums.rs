use async_trait::async_trait;
use imageshare_model::{Album, AlbumID, Page, Pagination, UserID};

use crate::error::Result;

#[async_trait]
pub trait AlbumsRepository: Send + Sync {
    async fn insert(&self, album: &Album) -> Result<Album>;

    async fn get(&self, id: AlbumID) -> Result<Option<Album>>;

    async fn update(&self, album: &Album) -> Result<Album>;

    /// Images in the album are detached, shares and their comments go with it.
    async fn delete(&self, id: AlbumID) -> Result<bool>;

    /// Newest first.
    async fn list_by_owner(&self, owner: UserID, page: Pagination) -> Result<Page<Album>>;

    async fn count_by_owner(&self, owner: UserID) -> Result<u64>;
}
