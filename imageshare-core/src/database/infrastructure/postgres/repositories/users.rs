use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imageshare_model::{
    PublicProfile, User, UserID, UserProfile, UserRole, UserStatus, UserSummary,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::warn;
use uuid::Uuid;

use super::{internal, violated_unique};
use crate::database::ports::users::{NewUser, UsersRepository};
use crate::error::{ImageShareError, Result};

const USER_COLUMNS: &str = "id, email, username, is_verified, roles, created_at";

#[derive(Debug, Clone)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_user(row: &PgRow) -> Result<User> {
        let read =
            |e: sqlx::Error| ImageShareError::Internal(format!("Failed to read user row: {e}"));

        let id: Uuid = row.try_get("id").map_err(read)?;
        let roles: Vec<String> = row.try_get("roles").map_err(read)?;
        let roles = roles
            .iter()
            .filter_map(|tag| match tag.parse::<UserRole>() {
                Ok(role) => Some(role),
                Err(err) => {
                    warn!(user_id = %id, %err, "ignoring unknown role tag");
                    None
                }
            })
            .collect();

        Ok(User {
            id: UserID(id),
            email: row.try_get("email").map_err(read)?,
            username: row.try_get("username").map_err(read)?,
            is_verified: row.try_get("is_verified").map_err(read)?,
            roles,
            created_at: row.try_get("created_at").map_err(read)?,
        })
    }

    fn map_summary(row: &PgRow) -> Result<UserSummary> {
        let read =
            |e: sqlx::Error| ImageShareError::Internal(format!("Failed to read user summary: {e}"));
        let id: Uuid = row.try_get("id").map_err(read)?;
        Ok(UserSummary {
            id: UserID(id),
            username: row.try_get("username").map_err(read)?,
            email: row.try_get("email").map_err(read)?,
        })
    }

    fn map_profile(row: &PgRow) -> Result<UserProfile> {
        let read =
            |e: sqlx::Error| ImageShareError::Internal(format!("Failed to read profile row: {e}"));
        let user_id: Uuid = row.try_get("user_id").map_err(read)?;
        let status: String = row.try_get("status").map_err(read)?;
        let last_seen_at: Option<DateTime<Utc>> = row.try_get("last_seen_at").map_err(read)?;

        Ok(UserProfile {
            user_id: UserID(user_id),
            display_name: row.try_get("display_name").map_err(read)?,
            bio: row.try_get("bio").map_err(read)?,
            location: row.try_get("location").map_err(read)?,
            website: row.try_get("website").map_err(read)?,
            is_public: row.try_get("is_public").map_err(read)?,
            status: status.parse().unwrap_or(UserStatus::Offline),
            last_seen_at,
            created_at: row.try_get("created_at").map_err(read)?,
            updated_at: row.try_get("updated_at").map_err(read)?,
        })
    }

    async fn fetch_user(&self, predicate: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate} LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to load user", e))?;
        row.map(|row| Self::map_user(&row)).transpose()
    }
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn create(&self, user: NewUser) -> Result<User> {
        let roles: Vec<String> = user.roles.iter().map(|r| r.as_str().to_string()).collect();
        let sql = format!(
            "INSERT INTO users (id, email, username, password_hash, roles) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(UserID::new().to_uuid())
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&roles)
            .fetch_one(self.pool())
            .await
            .map_err(|e| match violated_unique(&e).as_deref() {
                Some("users_email_key") => {
                    ImageShareError::Conflict("User with this email already exists".into())
                }
                Some("users_username_key") => {
                    ImageShareError::Conflict("Username already taken".into())
                }
                _ => internal("Failed to create user", e),
            })?;

        Self::map_user(&row)
    }

    async fn get_by_id(&self, id: UserID) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to load user", e))?;
        row.map(|row| Self::map_user(&row)).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_user("LOWER(username) = LOWER($1)", username).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_user("LOWER(email) = LOWER($1)", email).await
    }

    async fn password_hash(&self, id: UserID) -> Result<Option<String>> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE id = $1")
            .bind(id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to load password hash", e))?;
        row.map(|row| row.try_get::<String, _>("password_hash"))
            .transpose()
            .map_err(|e| internal("Failed to read password hash", e))
    }

    async fn update_password(&self, id: UserID, password_hash: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.to_uuid())
        .bind(password_hash)
        .execute(self.pool())
        .await
        .map_err(|e| internal("Failed to update password", e))?;

        if result.rows_affected() == 0 {
            return Err(ImageShareError::NotFound(format!("User with ID {id} not found.")));
        }
        Ok(())
    }

    async fn mark_verified(&self, id: UserID) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.to_uuid())
        .execute(self.pool())
        .await
        .map_err(|e| internal("Failed to mark user verified", e))?;

        if result.rows_affected() == 0 {
            return Err(ImageShareError::NotFound(format!("User with ID {id} not found.")));
        }
        Ok(())
    }

    async fn set_roles(&self, id: UserID, roles: &[UserRole]) -> Result<User> {
        let tags: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
        let sql = format!(
            "UPDATE users SET roles = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.to_uuid())
            .bind(&tags)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| internal("Failed to update roles", e))?
            .ok_or_else(|| ImageShareError::NotFound(format!("User with ID {id} not found.")))?;
        Self::map_user(&row)
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(|e| internal("Failed to list users", e))?;
        rows.iter().map(Self::map_user).collect()
    }

    async fn list_verified(&self, except: UserID) -> Result<Vec<UserSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, email
            FROM users
            WHERE is_verified AND id <> $1
            ORDER BY username ASC
            "#,
        )
        .bind(except.to_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| internal("Failed to list users", e))?;

        rows.iter().map(Self::map_summary).collect()
    }

    async fn search_verified(
        &self,
        except: UserID,
        query: &str,
        limit: u32,
    ) -> Result<Vec<UserSummary>> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        let rows = sqlx::query(
            r#"
            SELECT id, username, email
            FROM users
            WHERE is_verified
              AND id <> $1
              AND (LOWER(username) LIKE $2 ESCAPE '\' OR LOWER(email) LIKE $2 ESCAPE '\')
            ORDER BY username ASC
            LIMIT $3
            "#,
        )
        .bind(except.to_uuid())
        .bind(pattern)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(|e| internal("Failed to search users", e))?;

        rows.iter().map(Self::map_summary).collect()
    }

    async fn get_profile(&self, id: UserID) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, display_name, bio, location, website, is_public,
                   status, last_seen_at, created_at, updated_at
            FROM user_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| internal("Failed to load profile", e))?;

        row.map(|row| Self::map_profile(&row)).transpose()
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        let row = sqlx::query(
            r#"
            INSERT INTO user_profiles (
                user_id, display_name, bio, location, website, is_public,
                status, last_seen_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                bio = EXCLUDED.bio,
                location = EXCLUDED.location,
                website = EXCLUDED.website,
                is_public = EXCLUDED.is_public,
                status = EXCLUDED.status,
                last_seen_at = EXCLUDED.last_seen_at,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, display_name, bio, location, website, is_public,
                      status, last_seen_at, created_at, updated_at
            "#,
        )
        .bind(profile.user_id.to_uuid())
        .bind(&profile.display_name)
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(&profile.website)
        .bind(profile.is_public)
        .bind(profile.status.as_str())
        .bind(profile.last_seen_at)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| internal("Failed to save profile", e))?;

        Self::map_profile(&row)
    }

    async fn list_online(&self, since: DateTime<Utc>) -> Result<Vec<PublicProfile>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.username, u.email,
                   p.user_id, p.display_name, p.bio, p.location, p.website, p.is_public,
                   p.status, p.last_seen_at, p.created_at, p.updated_at
            FROM user_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.status = 'online' AND p.last_seen_at > $1
            ORDER BY p.last_seen_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(|e| internal("Failed to list online users", e))?;

        rows.iter()
            .map(|row| {
                Ok(PublicProfile {
                    user: Self::map_summary(row)?,
                    profile: Self::map_profile(row)?,
                })
            })
            .collect()
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
