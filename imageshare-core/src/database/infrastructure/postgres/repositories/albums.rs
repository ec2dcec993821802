use async_trait::async_trait;
use imageshare_model::{Album, AlbumID, Page, Pagination, UserID};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{count_to_u64, internal, page_bounds};
use crate::database::ports::albums::AlbumsRepository;
use crate::error::{ImageShareError, Result};

const ALBUM_COLUMNS: &str =
    "id, owner_id, name, description, is_public, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresAlbumsRepository {
    pool: PgPool,
}

impl PostgresAlbumsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<Album> {
        let read =
            |e: sqlx::Error| ImageShareError::Internal(format!("Failed to read album row: {e}"));
        let id: Uuid = row.try_get("id").map_err(read)?;
        let owner_id: Uuid = row.try_get("owner_id").map_err(read)?;
        Ok(Album {
            id: AlbumID(id),
            owner_id: UserID(owner_id),
            name: row.try_get("name").map_err(read)?,
            description: row.try_get("description").map_err(read)?,
            is_public: row.try_get("is_public").map_err(read)?,
            created_at: row.try_get("created_at").map_err(read)?,
            updated_at: row.try_get("updated_at").map_err(read)?,
        })
    }
}

#[async_trait]
impl AlbumsRepository for PostgresAlbumsRepository {
    async fn insert(&self, album: &Album) -> Result<Album> {
        let sql = format!(
            "INSERT INTO albums ({ALBUM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ALBUM_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(album.id.to_uuid())
            .bind(album.owner_id.to_uuid())
            .bind(&album.name)
            .bind(&album.description)
            .bind(album.is_public)
            .bind(album.created_at)
            .bind(album.updated_at)
            .fetch_one(self.pool())
            .await
            .map_err(|e| internal("Failed to insert album", e))?;
        Self::map_row(&row)
    }

    async fn get(&self, id: AlbumID) -> Result<Option<Album>> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to load album", e))?;
        row.map(|row| Self::map_row(&row)).transpose()
    }

    async fn update(&self, album: &Album) -> Result<Album> {
        let sql = format!(
            "UPDATE albums SET name = $2, description = $3, is_public = $4, updated_at = $5 \
             WHERE id = $1 RETURNING {ALBUM_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(album.id.to_uuid())
            .bind(&album.name)
            .bind(&album.description)
            .bind(album.is_public)
            .bind(album.updated_at)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to update album", e))?
            .ok_or_else(|| ImageShareError::NotFound(format!("Album {} not found", album.id)))?;
        Self::map_row(&row)
    }

    async fn delete(&self, id: AlbumID) -> Result<bool> {
        let result = sqlx::query("DELETE FROM albums WHERE id = $1")
            .bind(id.to_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| internal("Failed to delete album", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner: UserID, page: Pagination) -> Result<Page<Album>> {
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT {ALBUM_COLUMNS} FROM albums WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.to_uuid())
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list albums", e))?;

        let items = rows.iter().map(Self::map_row).collect::<Result<Vec<_>>>()?;
        let total = self.count_by_owner(owner).await?;
        Ok(Page::new(items, page, total))
    }

    async fn count_by_owner(&self, owner: UserID) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM albums WHERE owner_id = $1")
            .bind(owner.to_uuid())
            .fetch_one(self.pool())
            .await
            .map_err(|e| internal("Failed to count albums", e))?;
        Ok(count_to_u64(count))
    }
}
