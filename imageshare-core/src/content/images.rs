use std::{any::type_name_of_val, fmt, sync::Arc};

use chrono::Utc;
use image::ImageFormat;
use imageshare_model::{AlbumID, Image, ImageID, Page, Pagination, SharedItem, UserID};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{optional_text, required_text};
use crate::{
    access::SharingService,
    application::AppUnitOfWork,
    database::ports::{albums::AlbumsRepository, images::ImagesRepository},
    error::{ImageShareError, Result},
    storage::ImageStorage,
};

/// Upper bound on a single upload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "image/webp"];

const TITLE_MAX: usize = 255;

#[derive(Clone)]
pub struct UploadImage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub album_id: Option<AlbumID>,
    /// Name the client gave the file, only used to derive a slug and title
    pub original_filename: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadImage")
            .field("title", &self.title)
            .field("album_id", &self.album_id)
            .field("original_filename", &self.original_filename)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Metadata edits. `album_id: Some(None)` removes the image from its album.
#[derive(Debug, Clone, Default)]
pub struct ImageChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub album_id: Option<Option<AlbumID>>,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

#[derive(Clone)]
pub struct ImageService {
    images: Arc<dyn ImagesRepository>,
    albums: Arc<dyn AlbumsRepository>,
    storage: Arc<dyn ImageStorage>,
    sharing: SharingService,
    max_upload_bytes: usize,
}

impl fmt::Debug for ImageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageService")
            .field("images", &type_name_of_val(self.images.as_ref()))
            .field("storage", &type_name_of_val(self.storage.as_ref()))
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl ImageService {
    pub fn new(uow: &AppUnitOfWork, storage: Arc<dyn ImageStorage>) -> Self {
        Self {
            images: uow.images.clone(),
            albums: uow.albums.clone(),
            storage,
            sharing: SharingService::new(uow),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Lower the upload limit. Values above [`MAX_UPLOAD_BYTES`] are clamped.
    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit.min(MAX_UPLOAD_BYTES);
        self
    }

    async fn ensure_album_owned(&self, album_id: AlbumID, owner: UserID) -> Result<()> {
        let album = self
            .albums
            .get(album_id)
            .await?
            .ok_or_else(|| ImageShareError::NotFound(format!("Album {album_id} not found.")))?;
        if !album.is_owned_by(owner) {
            return Err(ImageShareError::AccessDenied(
                "You can only add images to your own albums.".into(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self, upload), fields(owner = %owner, size = upload.bytes.len()))]
    pub async fn upload(&self, owner: UserID, upload: UploadImage) -> Result<Image> {
        if upload.bytes.is_empty() {
            return Err(ImageShareError::Validation("Please upload an image file.".into()));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(ImageShareError::Validation(format!(
                "The file is too large. Maximum size is {} MB.",
                self.max_upload_bytes / (1024 * 1024)
            )));
        }
        let format = sniff_format(&upload.bytes)?;

        if let Some(album_id) = upload.album_id {
            self.ensure_album_owned(album_id, owner).await?;
        }

        let stem = file_stem(&upload.original_filename);
        let title = match optional_text(upload.title) {
            Some(title) => required_text("Title", &title, TITLE_MAX)?,
            None if stem.is_empty() => "Untitled".to_string(),
            None => stem.chars().take(TITLE_MAX).collect(),
        };
        let filename = format!("{}-{}.{}", slugify(stem), Uuid::now_v7(), extension(format));

        self.storage.save(&filename, &upload.bytes).await?;

        let now = Utc::now();
        let record = Image {
            id: ImageID::new(),
            owner_id: owner,
            album_id: upload.album_id,
            album_is_public: false,
            title,
            description: optional_text(upload.description),
            filename,
            content_type: format.to_mime_type().to_string(),
            size_bytes: i64::try_from(upload.bytes.len()).unwrap_or(i64::MAX),
            created_at: now,
            updated_at: now,
        };

        match self.images.insert(&record).await {
            Ok(image) => {
                info!(image_id = %image.id, filename = %image.filename, "image uploaded");
                Ok(image)
            }
            Err(err) => {
                if let Err(cleanup) = self.storage.delete(&record.filename).await {
                    warn!(filename = %record.filename, %cleanup, "orphaned upload");
                }
                Err(err)
            }
        }
    }

    pub async fn get(&self, id: ImageID, user: UserID) -> Result<Image> {
        self.sharing.accessible_image(id, user).await
    }

    async fn owned(&self, id: ImageID, user: UserID) -> Result<Image> {
        let image = self.sharing.load_image(id).await?;
        self.sharing
            .ensure_owner(&SharedItem::Image(image.clone()), user)?;
        Ok(image)
    }

    pub async fn update(&self, id: ImageID, user: UserID, changes: ImageChanges) -> Result<Image> {
        let mut image = self.owned(id, user).await?;

        if let Some(title) = changes.title {
            image.title = required_text("Title", &title, TITLE_MAX)?;
        }
        if let Some(description) = changes.description {
            image.description = optional_text(Some(description));
        }
        if let Some(album_id) = changes.album_id {
            if let Some(album_id) = album_id {
                self.ensure_album_owned(album_id, user).await?;
            }
            image.album_id = album_id;
        }

        image.updated_at = Utc::now();
        self.images.update(&image).await
    }

    /// Deletes the record and its stored file. Shares and comments on the
    /// image go with it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ImageID, user: UserID) -> Result<()> {
        let image = self.owned(id, user).await?;
        self.images.delete(image.id).await?;
        if let Err(err) = self.storage.delete(&image.filename).await {
            warn!(filename = %image.filename, %err, "image row deleted but file remains");
        }
        info!(image_id = %image.id, "image deleted");
        Ok(())
    }

    pub async fn list_owned(&self, user: UserID, page: Pagination) -> Result<Page<Image>> {
        self.images.list_by_owner(user, page).await
    }

    /// Bytes for serving, gated like [`ImageService::get`].
    pub async fn open(&self, id: ImageID, user: UserID) -> Result<StoredFile> {
        let image = self.get(id, user).await?;
        self.read_file(image).await
    }

    /// Bytes of an image reached through its album. Access to the album is
    /// enough, so recipients of an album share can load its images.
    pub async fn open_in_album(
        &self,
        album: AlbumID,
        id: ImageID,
        user: UserID,
    ) -> Result<StoredFile> {
        let album = self.sharing.accessible_album(album, user).await?;
        let image = self.sharing.load_image(id).await?;
        if image.album_id != Some(album.id) {
            return Err(ImageShareError::NotFound(format!(
                "Image {id} is not in album {}.",
                album.id
            )));
        }
        self.read_file(image).await
    }

    async fn read_file(&self, image: Image) -> Result<StoredFile> {
        let bytes = self.storage.read(&image.filename).await?;
        Ok(StoredFile {
            bytes,
            content_type: image.content_type,
            filename: image.filename,
        })
    }
}

fn sniff_format(bytes: &[u8]) -> Result<ImageFormat> {
    let invalid = || {
        ImageShareError::Validation(
            "Please upload a valid image (JPEG, PNG, GIF, WEBP).".into(),
        )
    };
    let format = image::guess_format(bytes).map_err(|_| invalid())?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP => Ok(format),
        _ => Err(invalid()),
    }
}

fn extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        _ => "webp",
    }
}

fn file_stem(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.trim(),
        _ => base.trim(),
    }
}

/// Lowercase ASCII slug, `image` when nothing usable is left.
fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "image".to_string()
    } else {
        slug.chars().take(60).collect::<String>().trim_end_matches('-').to_string()
    }
}
