use async_trait::async_trait;
use imageshare_model::{AlbumID, Image, ImageID, Page, Pagination, UserID};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{count_to_u64, internal, page_bounds};
use crate::database::ports::images::ImagesRepository;
use crate::error::{ImageShareError, Result};

/// Every read joins the album so `album_is_public` is populated.
const SELECT_IMAGE: &str = r#"
    SELECT i.id, i.owner_id, i.album_id, COALESCE(a.is_public, FALSE) AS album_is_public,
           i.title, i.description, i.filename, i.content_type, i.size_bytes,
           i.created_at, i.updated_at
    FROM images i
    LEFT JOIN albums a ON a.id = i.album_id
"#;

#[derive(Debug, Clone)]
pub struct PostgresImagesRepository {
    pool: PgPool,
}

impl PostgresImagesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<Image> {
        let read =
            |e: sqlx::Error| ImageShareError::Internal(format!("Failed to read image row: {e}"));
        let id: Uuid = row.try_get("id").map_err(read)?;
        let owner_id: Uuid = row.try_get("owner_id").map_err(read)?;
        let album_id: Option<Uuid> = row.try_get("album_id").map_err(read)?;

        Ok(Image {
            id: ImageID(id),
            owner_id: UserID(owner_id),
            album_id: album_id.map(AlbumID),
            album_is_public: row.try_get("album_is_public").map_err(read)?,
            title: row.try_get("title").map_err(read)?,
            description: row.try_get("description").map_err(read)?,
            filename: row.try_get("filename").map_err(read)?,
            content_type: row.try_get("content_type").map_err(read)?,
            size_bytes: row.try_get("size_bytes").map_err(read)?,
            created_at: row.try_get("created_at").map_err(read)?,
            updated_at: row.try_get("updated_at").map_err(read)?,
        })
    }

    async fn fetch(&self, id: ImageID) -> Result<Image> {
        self.get(id)
            .await?
            .ok_or_else(|| ImageShareError::NotFound(format!("Image {id} not found")))
    }
}

#[async_trait]
impl ImagesRepository for PostgresImagesRepository {
    async fn insert(&self, image: &Image) -> Result<Image> {
        sqlx::query(
            r#"
            INSERT INTO images (
                id, owner_id, album_id, title, description, filename,
                content_type, size_bytes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(image.id.to_uuid())
        .bind(image.owner_id.to_uuid())
        .bind(image.album_id.map(|a| a.to_uuid()))
        .bind(&image.title)
        .bind(&image.description)
        .bind(&image.filename)
        .bind(&image.content_type)
        .bind(image.size_bytes)
        .bind(image.created_at)
        .bind(image.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| internal("Failed to insert image", e))?;

        self.fetch(image.id).await
    }

    async fn get(&self, id: ImageID) -> Result<Option<Image>> {
        let sql = format!("{SELECT_IMAGE} WHERE i.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to load image", e))?;
        row.map(|row| Self::map_row(&row)).transpose()
    }

    async fn update(&self, image: &Image) -> Result<Image> {
        let result = sqlx::query(
            r#"
            UPDATE images
            SET title = $2, description = $3, album_id = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(image.id.to_uuid())
        .bind(&image.title)
        .bind(&image.description)
        .bind(image.album_id.map(|a| a.to_uuid()))
        .bind(image.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| internal("Failed to update image", e))?;

        if result.rows_affected() == 0 {
            return Err(ImageShareError::NotFound(format!("Image {} not found", image.id)));
        }
        self.fetch(image.id).await
    }

    async fn delete(&self, id: ImageID) -> Result<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id.to_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| internal("Failed to delete image", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner: UserID, page: Pagination) -> Result<Page<Image>> {
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "{SELECT_IMAGE} WHERE i.owner_id = $1 \
             ORDER BY i.created_at DESC, i.id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.to_uuid())
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list images", e))?;

        let items = rows.iter().map(Self::map_row).collect::<Result<Vec<_>>>()?;
        let total = self.count_by_owner(owner).await?;
        Ok(Page::new(items, page, total))
    }

    async fn count_by_owner(&self, owner: UserID) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM images WHERE owner_id = $1")
            .bind(owner.to_uuid())
            .fetch_one(self.pool())
            .await
            .map_err(|e| internal("Failed to count images", e))?;
        Ok(count_to_u64(count))
    }

    async fn list_by_album(&self, album: AlbumID) -> Result<Vec<Image>> {
        let sql = format!(
            "{SELECT_IMAGE} WHERE i.album_id = $1 ORDER BY i.created_at DESC, i.id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(album.to_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list album images", e))?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn list_unassigned(&self, owner: UserID) -> Result<Vec<Image>> {
        let sql = format!(
            "{SELECT_IMAGE} WHERE i.owner_id = $1 AND i.album_id IS NULL \
             ORDER BY i.created_at DESC, i.id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.to_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list unassigned images", e))?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn replace_album_images(
        &self,
        album: AlbumID,
        owner: UserID,
        images: &[ImageID],
    ) -> Result<(u64, u64)> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| internal("Failed to start transaction", e))?;

        let detached = sqlx::query(
            "UPDATE images SET album_id = NULL, updated_at = NOW() WHERE album_id = $1",
        )
        .bind(album.to_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| internal("Failed to detach album images", e))?
        .rows_affected();

        let attached = if images.is_empty() {
            0
        } else {
            let ids: Vec<Uuid> = images.iter().map(ImageID::to_uuid).collect();
            sqlx::query(
                r#"
                UPDATE images
                SET album_id = $1, updated_at = NOW()
                WHERE owner_id = $2 AND id = ANY($3)
                "#,
            )
            .bind(album.to_uuid())
            .bind(owner.to_uuid())
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| internal("Failed to attach album images", e))?
            .rows_affected()
        };

        tx.commit()
            .await
            .map_err(|e| internal("Failed to commit album contents", e))?;
        Ok((detached, attached))
    }
}
