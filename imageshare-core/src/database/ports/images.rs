use async_trait::async_trait;
use imageshare_model::{AlbumID, Image, ImageID, Page, Pagination, UserID};

use crate::error::Result;

#[async_trait]
pub trait ImagesRepository: Send + Sync {
    async fn insert(&self, image: &Image) -> Result<Image>;

    /// Loaded with `album_is_public` populated from the containing album.
    async fn get(&self, id: ImageID) -> Result<Option<Image>>;

    /// Persist title, description and album reference.
    async fn update(&self, image: &Image) -> Result<Image>;

    async fn delete(&self, id: ImageID) -> Result<bool>;

    /// Newest first.
    async fn list_by_owner(&self, owner: UserID, page: Pagination) -> Result<Page<Image>>;

    async fn count_by_owner(&self, owner: UserID) -> Result<u64>;

    /// Newest first.
    async fn list_by_album(&self, album: AlbumID) -> Result<Vec<Image>>;

    /// Images of `owner` that are not in any album, newest first.
    async fn list_unassigned(&self, owner: UserID) -> Result<Vec<Image>>;

    /// Make the listed images the exact contents of `album`, skipping any not
    /// owned by `owner`. Everything previously in the album is unassigned.
    /// Both steps happen atomically. Returns `(detached, attached)`.
    async fn replace_album_images(
        &self,
        album: AlbumID,
        owner: UserID,
        images: &[ImageID],
    ) -> Result<(u64, u64)>;
}
