use async_trait::async_trait;
use chrono::Utc;
use imageshare_model::{
    AlbumID, ImageID, Page, Pagination, Share, ShareID, SharedItemRef, UserID,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{count_to_u64, internal, page_bounds, violated_unique};
use crate::database::ports::shares::{NewShare, SharesRepository};
use crate::error::{ImageShareError, Result};

const SHARE_COLUMNS: &str =
    "id, image_id, album_id, shared_by, shared_with, message, created_at";

#[derive(Debug, Clone)]
pub struct PostgresSharesRepository {
    pool: PgPool,
}

impl PostgresSharesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<Share> {
        let read =
            |e: sqlx::Error| ImageShareError::Internal(format!("Failed to read share row: {e}"));
        let id: Uuid = row.try_get("id").map_err(read)?;
        let image_id: Option<Uuid> = row.try_get("image_id").map_err(read)?;
        let album_id: Option<Uuid> = row.try_get("album_id").map_err(read)?;
        let shared_by: Uuid = row.try_get("shared_by").map_err(read)?;
        let shared_with: Uuid = row.try_get("shared_with").map_err(read)?;

        let item = match (image_id, album_id) {
            (Some(image), None) => SharedItemRef::Image(ImageID(image)),
            (None, Some(album)) => SharedItemRef::Album(AlbumID(album)),
            _ => {
                return Err(ImageShareError::Internal(format!(
                    "Share {id} must reference exactly one image or album"
                )));
            }
        };

        Ok(Share {
            id: ShareID(id),
            item,
            shared_by: UserID(shared_by),
            shared_with: UserID(shared_with),
            message: row.try_get("message").map_err(read)?,
            created_at: row.try_get("created_at").map_err(read)?,
        })
    }

    fn item_columns(item: SharedItemRef) -> (Option<Uuid>, Option<Uuid>) {
        (
            item.image_id().map(|id| id.to_uuid()),
            item.album_id().map(|id| id.to_uuid()),
        )
    }
}

#[async_trait]
impl SharesRepository for PostgresSharesRepository {
    async fn insert(&self, share: NewShare) -> Result<Share> {
        let (image_id, album_id) = Self::item_columns(share.item);
        let sql = format!(
            "INSERT INTO shares ({SHARE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SHARE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(ShareID::new().to_uuid())
            .bind(image_id)
            .bind(album_id)
            .bind(share.shared_by.to_uuid())
            .bind(share.shared_with.to_uuid())
            .bind(&share.message)
            .bind(Utc::now())
            .fetch_one(self.pool())
            .await
            .map_err(|e| match violated_unique(&e).as_deref() {
                Some("shares_image_recipient_key" | "shares_album_recipient_key") => {
                    ImageShareError::Conflict(format!(
                        "{} is already shared with {}",
                        share.item, share.shared_with
                    ))
                }
                _ => internal("Failed to create share", e),
            })?;

        Self::map_row(&row)
    }

    async fn get(&self, id: ShareID) -> Result<Option<Share>> {
        let sql = format!("SELECT {SHARE_COLUMNS} FROM shares WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to load share", e))?;
        row.map(|row| Self::map_row(&row)).transpose()
    }

    async fn find(&self, item: SharedItemRef, recipient: UserID) -> Result<Option<Share>> {
        let (image_id, album_id) = Self::item_columns(item);
        let sql = format!(
            "SELECT {SHARE_COLUMNS} FROM shares \
             WHERE image_id IS NOT DISTINCT FROM $1 \
               AND album_id IS NOT DISTINCT FROM $2 \
               AND shared_with = $3"
        );
        let row = sqlx::query(&sql)
            .bind(image_id)
            .bind(album_id)
            .bind(recipient.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to look up share", e))?;
        row.map(|row| Self::map_row(&row)).transpose()
    }

    async fn delete(&self, id: ShareID) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shares WHERE id = $1")
            .bind(id.to_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| internal("Failed to delete share", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_item(&self, item: SharedItemRef) -> Result<Vec<Share>> {
        let (image_id, album_id) = Self::item_columns(item);
        let sql = format!(
            "SELECT {SHARE_COLUMNS} FROM shares \
             WHERE image_id IS NOT DISTINCT FROM $1 AND album_id IS NOT DISTINCT FROM $2 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(image_id)
            .bind(album_id)
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list item shares", e))?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn list_sent(&self, sender: UserID) -> Result<Vec<Share>> {
        let sql = format!(
            "SELECT {SHARE_COLUMNS} FROM shares WHERE shared_by = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(sender.to_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list sent shares", e))?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn list_received(&self, recipient: UserID, page: Pagination) -> Result<Page<Share>> {
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT {SHARE_COLUMNS} FROM shares WHERE shared_with = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(recipient.to_uuid())
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list received shares", e))?;

        let items = rows.iter().map(Self::map_row).collect::<Result<Vec<_>>>()?;
        let total = self.count_received(recipient).await?;
        Ok(Page::new(items, page, total))
    }

    async fn count_sent(&self, sender: UserID) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shares WHERE shared_by = $1")
            .bind(sender.to_uuid())
            .fetch_one(self.pool())
            .await
            .map_err(|e| internal("Failed to count sent shares", e))?;
        Ok(count_to_u64(count))
    }

    async fn count_received(&self, recipient: UserID) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shares WHERE shared_with = $1")
            .bind(recipient.to_uuid())
            .fetch_one(self.pool())
            .await
            .map_err(|e| internal("Failed to count received shares", e))?;
        Ok(count_to_u64(count))
    }
}
