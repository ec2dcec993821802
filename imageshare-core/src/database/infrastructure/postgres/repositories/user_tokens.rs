use async_trait::async_trait;
use imageshare_model::UserID;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::internal;
use crate::database::ports::user_tokens::{
    NewUserToken, TokenKind, UserTokenRecord, UserTokensRepository,
};
use crate::error::{ImageShareError, Result};

#[derive(Debug, Clone)]
pub struct PostgresUserTokensRepository {
    pool: PgPool,
}

impl PostgresUserTokensRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow, kind: TokenKind) -> Result<UserTokenRecord> {
        let read =
            |e: sqlx::Error| ImageShareError::Internal(format!("Failed to read user token: {e}"));
        let user_id: Uuid = row.try_get("user_id").map_err(read)?;
        let token_hash: String = row.try_get("token_hash").map_err(read)?;
        Ok(UserTokenRecord {
            user_id: UserID(user_id),
            kind,
            token_hash: token_hash.trim_end().to_string(),
            expires_at: row.try_get("expires_at").map_err(read)?,
            created_at: row.try_get("created_at").map_err(read)?,
        })
    }
}

#[async_trait]
impl UserTokensRepository for PostgresUserTokensRepository {
    async fn insert(&self, token: NewUserToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_tokens (token_hash, kind, user_id, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.token_hash)
        .bind(token.kind.as_str())
        .bind(token.user_id.to_uuid())
        .bind(token.expires_at)
        .execute(self.pool())
        .await
        .map_err(|e| internal("Failed to store user token", e))?;
        Ok(())
    }

    async fn find(&self, kind: TokenKind, token_hash: &str) -> Result<Option<UserTokenRecord>> {
        let row = sqlx::query(
            r#"
            SELECT token_hash, user_id, expires_at, created_at
            FROM user_tokens
            WHERE kind = $1 AND token_hash = $2
            "#,
        )
        .bind(kind.as_str())
        .bind(token_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| internal("Failed to look up user token", e))?;

        row.map(|row| Self::map_row(&row, kind)).transpose()
    }

    async fn delete(&self, kind: TokenKind, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE kind = $1 AND token_hash = $2")
            .bind(kind.as_str())
            .bind(token_hash)
            .execute(self.pool())
            .await
            .map_err(|e| internal("Failed to delete user token", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: UserID, kind: TokenKind) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND kind = $2")
            .bind(user_id.to_uuid())
            .bind(kind.as_str())
            .execute(self.pool())
            .await
            .map_err(|e| internal("Failed to delete user tokens", e))?;
        Ok(result.rows_affected())
    }
}
