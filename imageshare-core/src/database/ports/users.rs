use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imageshare_model::{PublicProfile, User, UserID, UserProfile, UserRole, UserSummary};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<UserRole>,
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a new unverified account.
    ///
    /// A duplicate email yields `Conflict("User with this email already
    /// exists")`, a duplicate username `Conflict("Username already taken")`.
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn get_by_id(&self, id: UserID) -> Result<Option<User>>;

    /// Case-insensitive lookup.
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Case-insensitive lookup.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn password_hash(&self, id: UserID) -> Result<Option<String>>;

    async fn update_password(&self, id: UserID, password_hash: &str) -> Result<()>;

    async fn mark_verified(&self, id: UserID) -> Result<()>;

    /// Replace the account's role tags. `NotFound` for an unknown id.
    async fn set_roles(&self, id: UserID, roles: &[UserRole]) -> Result<User>;

    /// Every account, ordered by username.
    async fn list_all(&self) -> Result<Vec<User>>;

    /// Verified users other than `except`, ordered by username.
    async fn list_verified(&self, except: UserID) -> Result<Vec<UserSummary>>;

    /// Verified users other than `except` whose username or email contains
    /// `query` (case-insensitive), ordered by username.
    async fn search_verified(
        &self,
        except: UserID,
        query: &str,
        limit: u32,
    ) -> Result<Vec<UserSummary>>;

    async fn get_profile(&self, id: UserID) -> Result<Option<UserProfile>>;

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile>;

    /// Profiles with status `online` last seen after `since`, most recently
    /// seen first.
    async fn list_online(&self, since: DateTime<Utc>) -> Result<Vec<PublicProfile>>;
}
