use std::{any::type_name_of_val, fmt, sync::Arc};

use chrono::Utc;
use imageshare_model::{Album, AlbumID, Image, ImageID, Page, Pagination, SharedItem, UserID};
use tracing::{info, instrument};

use super::{optional_text, required_text};
use crate::{
    access::SharingService,
    application::AppUnitOfWork,
    database::ports::{albums::AlbumsRepository, images::ImagesRepository},
    error::Result,
};

const NAME_MAX: usize = 255;

#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AlbumChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Clone)]
pub struct AlbumService {
    albums: Arc<dyn AlbumsRepository>,
    images: Arc<dyn ImagesRepository>,
    sharing: SharingService,
}

impl fmt::Debug for AlbumService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlbumService")
            .field("albums", &type_name_of_val(self.albums.as_ref()))
            .field("images", &type_name_of_val(self.images.as_ref()))
            .finish()
    }
}

impl AlbumService {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            albums: uow.albums.clone(),
            images: uow.images.clone(),
            sharing: SharingService::new(uow),
        }
    }

    #[instrument(skip(self, request), fields(owner = %owner))]
    pub async fn create(&self, owner: UserID, request: NewAlbum) -> Result<Album> {
        let now = Utc::now();
        let album = Album {
            id: AlbumID::new(),
            owner_id: owner,
            name: required_text("Name", &request.name, NAME_MAX)?,
            description: optional_text(request.description),
            is_public: request.is_public,
            created_at: now,
            updated_at: now,
        };
        let album = self.albums.insert(&album).await?;
        info!(album_id = %album.id, "album created");
        Ok(album)
    }

    pub async fn get(&self, id: AlbumID, user: UserID) -> Result<Album> {
        self.sharing.accessible_album(id, user).await
    }

    async fn owned(&self, id: AlbumID, user: UserID) -> Result<Album> {
        let album = self.sharing.load_album(id).await?;
        self.sharing
            .ensure_owner(&SharedItem::Album(album.clone()), user)?;
        Ok(album)
    }

    pub async fn update(&self, id: AlbumID, user: UserID, changes: AlbumChanges) -> Result<Album> {
        let mut album = self.owned(id, user).await?;
        if let Some(name) = changes.name {
            album.name = required_text("Name", &name, NAME_MAX)?;
        }
        if let Some(description) = changes.description {
            album.description = optional_text(Some(description));
        }
        if let Some(is_public) = changes.is_public {
            album.is_public = is_public;
        }
        album.updated_at = Utc::now();
        self.albums.update(&album).await
    }

    /// Removes the album. Its images stay with the owner, unassigned.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: AlbumID, user: UserID) -> Result<()> {
        let album = self.owned(id, user).await?;
        self.albums.delete(album.id).await?;
        info!(album_id = %album.id, "album deleted");
        Ok(())
    }

    pub async fn list_owned(&self, user: UserID, page: Pagination) -> Result<Page<Album>> {
        self.albums.list_by_owner(user, page).await
    }

    /// Replace the album's contents with `image_ids`. Ids the caller does not
    /// own are skipped.
    #[instrument(skip(self, image_ids), fields(requested = image_ids.len()))]
    pub async fn set_images(
        &self,
        id: AlbumID,
        user: UserID,
        image_ids: &[ImageID],
    ) -> Result<Vec<Image>> {
        let album = self.owned(id, user).await?;
        let (detached, attached) = self
            .images
            .replace_album_images(album.id, user, image_ids)
            .await?;
        info!(album_id = %album.id, detached, attached, "album contents replaced");
        self.images.list_by_album(album.id).await
    }

    /// The caller's images that are in no album.
    pub async fn unassigned_images(&self, user: UserID) -> Result<Vec<Image>> {
        self.images.list_unassigned(user).await
    }

    pub async fn album_images(&self, id: AlbumID, user: UserID) -> Result<Vec<Image>> {
        let album = self.get(id, user).await?;
        self.images.list_by_album(album.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ImageShareError, testing::MemoryStore};
    use imageshare_model::{ShareTarget, SharedItem};

    fn holiday(public: bool) -> NewAlbum {
        NewAlbum {
            name: "  Holiday ".into(),
            description: Some("   ".into()),
            is_public: public,
        }
    }

    #[tokio::test]
    async fn create_trims_and_validates() {
        let store = MemoryStore::new();
        let albums = AlbumService::new(&store.unit_of_work());
        let alice = store.seed_user("alice", true).await;

        let album = albums.create(alice.id, holiday(false)).await.unwrap();
        assert_eq!(album.name, "Holiday");
        assert!(album.description.is_none());

        let blank = NewAlbum {
            name: " ".into(),
            description: None,
            is_public: false,
        };
        assert!(matches!(
            albums.create(alice.id, blank).await,
            Err(ImageShareError::Validation(msg)) if msg == "Name cannot be empty."
        ));
    }

    #[tokio::test]
    async fn visibility_follows_public_flag_and_shares() {
        let store = MemoryStore::new();
        let uow = store.unit_of_work();
        let albums = AlbumService::new(&uow);
        let sharing = SharingService::new(&uow);
        let alice = store.seed_user("alice", true).await;
        let bob = store.seed_user("bob", true).await;
        let album = albums.create(alice.id, holiday(false)).await.unwrap();

        assert!(matches!(
            albums.album_images(album.id, bob.id).await,
            Err(ImageShareError::AccessDenied(_))
        ));

        sharing
            .share_item(
                &SharedItem::Album(album.clone()),
                alice.id,
                &[ShareTarget::Username("bob".into())],
                None,
            )
            .await
            .unwrap();
        assert_eq!(albums.get(album.id, bob.id).await.unwrap().id, album.id);

        let carol = store.seed_user("carol", true).await;
        albums
            .update(
                album.id,
                alice.id,
                AlbumChanges {
                    is_public: Some(true),
                    ..AlbumChanges::default()
                },
            )
            .await
            .unwrap();
        assert!(albums.get(album.id, carol.id).await.is_ok());
        assert!(matches!(
            albums.update(album.id, carol.id, AlbumChanges::default()).await,
            Err(ImageShareError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn set_images_replaces_contents_with_owned_images_only() {
        let store = MemoryStore::new();
        let albums = AlbumService::new(&store.unit_of_work());
        let alice = store.seed_user("alice", true).await;
        let bob = store.seed_user("bob", true).await;
        let album = albums.create(alice.id, holiday(false)).await.unwrap();

        let first = store.seed_image(alice.id, Some(album.id)).await;
        let second = store.seed_image(alice.id, None).await;
        let bobs = store.seed_image(bob.id, None).await;

        let contents = albums
            .set_images(album.id, alice.id, &[second.id, bobs.id])
            .await
            .unwrap();
        let ids: Vec<ImageID> = contents.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![second.id]);

        let loose = albums.unassigned_images(alice.id).await.unwrap();
        assert_eq!(loose.iter().map(|i| i.id).collect::<Vec<_>>(), vec![first.id]);

        assert!(matches!(
            albums.set_images(album.id, bob.id, &[bobs.id]).await,
            Err(ImageShareError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn failed_set_images_leaves_album_untouched() {
        let store = MemoryStore::new();
        let albums = AlbumService::new(&store.unit_of_work());
        let alice = store.seed_user("alice", true).await;
        let album = albums.create(alice.id, holiday(false)).await.unwrap();
        let kept = store.seed_image(alice.id, Some(album.id)).await;
        let other = store.seed_image(alice.id, None).await;

        store.fail_next_album_replace().await;
        assert!(matches!(
            albums.set_images(album.id, alice.id, &[other.id]).await,
            Err(ImageShareError::Internal(_))
        ));

        let contents = albums.album_images(album.id, alice.id).await.unwrap();
        assert_eq!(contents.iter().map(|i| i.id).collect::<Vec<_>>(), vec![kept.id]);
    }

    #[tokio::test]
    async fn delete_keeps_images() {
        let store = MemoryStore::new();
        let albums = AlbumService::new(&store.unit_of_work());
        let alice = store.seed_user("alice", true).await;
        let album = albums.create(alice.id, holiday(true)).await.unwrap();
        let image = store.seed_image(alice.id, Some(album.id)).await;

        albums.delete(album.id, alice.id).await.unwrap();

        let loose = albums.unassigned_images(alice.id).await.unwrap();
        assert_eq!(loose[0].id, image.id);
        assert!(matches!(
            albums.get(album.id, alice.id).await,
            Err(ImageShareError::NotFound(_))
        ));
        assert_eq!(
            albums.list_owned(alice.id, Pagination::default()).await.unwrap().total,
            0
        );
    }
}
