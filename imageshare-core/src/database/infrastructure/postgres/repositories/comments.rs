use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imageshare_model::{Comment, CommentID, CommentTarget, ImageID, ShareID, UserID};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::internal;
use crate::database::ports::comments::CommentsRepository;
use crate::error::{ImageShareError, Result};

const COMMENT_COLUMNS: &str =
    "c.id, c.content, c.author_id, c.image_id, c.share_id, c.created_at, c.updated_at";

#[derive(Debug, Clone)]
pub struct PostgresCommentsRepository {
    pool: PgPool,
}

impl PostgresCommentsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<Comment> {
        let read =
            |e: sqlx::Error| ImageShareError::Internal(format!("Failed to read comment row: {e}"));
        let id: Uuid = row.try_get("id").map_err(read)?;
        let author_id: Uuid = row.try_get("author_id").map_err(read)?;
        let image_id: Option<Uuid> = row.try_get("image_id").map_err(read)?;
        let share_id: Option<Uuid> = row.try_get("share_id").map_err(read)?;

        let target = match (image_id, share_id) {
            (Some(image), None) => CommentTarget::Image(ImageID(image)),
            (None, Some(share)) => CommentTarget::Share(ShareID(share)),
            _ => {
                return Err(ImageShareError::Internal(format!(
                    "Comment {id} must reference exactly one image or share"
                )));
            }
        };

        Ok(Comment {
            id: CommentID(id),
            content: row.try_get("content").map_err(read)?,
            author_id: UserID(author_id),
            target,
            created_at: row.try_get("created_at").map_err(read)?,
            updated_at: row.try_get("updated_at").map_err(read)?,
        })
    }

    async fn fetch(&self, id: CommentID) -> Result<Comment> {
        self.get(id)
            .await?
            .ok_or_else(|| ImageShareError::NotFound(format!("Comment {id} not found")))
    }
}

#[async_trait]
impl CommentsRepository for PostgresCommentsRepository {
    async fn insert(&self, comment: &Comment) -> Result<Comment> {
        let (image_id, share_id) = match comment.target {
            CommentTarget::Image(id) => (Some(id.to_uuid()), None),
            CommentTarget::Share(id) => (None, Some(id.to_uuid())),
        };
        sqlx::query(
            r#"
            INSERT INTO comments (
                id, content, author_id, image_id, share_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(comment.id.to_uuid())
        .bind(&comment.content)
        .bind(comment.author_id.to_uuid())
        .bind(image_id)
        .bind(share_id)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| internal("Failed to insert comment", e))?;

        self.fetch(comment.id).await
    }

    async fn get(&self, id: CommentID) -> Result<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to load comment", e))?;
        row.map(|row| Self::map_row(&row)).transpose()
    }

    async fn update_content(
        &self,
        id: CommentID,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let result = sqlx::query("UPDATE comments SET content = $2, updated_at = $3 WHERE id = $1")
            .bind(id.to_uuid())
            .bind(content)
            .bind(now)
            .execute(self.pool())
            .await
            .map_err(|e| internal("Failed to update comment", e))?;

        if result.rows_affected() == 0 {
            return Err(ImageShareError::NotFound(format!("Comment {id} not found")));
        }
        self.fetch(id).await
    }

    async fn delete(&self, id: CommentID) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.to_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| internal("Failed to delete comment", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_image(&self, image: ImageID) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.image_id = $1 \
             ORDER BY c.created_at ASC, c.id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(image.to_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list image comments", e))?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn list_for_share(&self, share: ShareID) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.share_id = $1 \
             ORDER BY c.created_at ASC, c.id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(share.to_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list share comments", e))?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn list_visible_to(&self, user: UserID, limit: u32) -> Result<Vec<Comment>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            LEFT JOIN images i ON i.id = c.image_id
            LEFT JOIN shares s ON s.id = c.share_id
            LEFT JOIN images si ON si.id = s.image_id
            LEFT JOIN albums sa ON sa.id = s.album_id
            WHERE c.author_id = $1
               OR i.owner_id = $1
               OR si.owner_id = $1
               OR sa.owner_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $2
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(user.to_uuid())
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list visible comments", e))?;
        rows.iter().map(Self::map_row).collect()
    }
}
