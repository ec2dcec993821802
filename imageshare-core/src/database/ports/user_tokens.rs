use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imageshare_model::UserID;

use crate::error::Result;

/// The three kinds of single-purpose secrets issued to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Session,
    EmailVerification,
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Session => "session",
            TokenKind::EmailVerification => "email_verification",
            TokenKind::PasswordReset => "password_reset",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUserToken {
    pub user_id: UserID,
    pub kind: TokenKind,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTokenRecord {
    pub user_id: UserID,
    pub kind: TokenKind,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Hashed sessions, email verification and password reset tokens.
#[async_trait]
pub trait UserTokensRepository: Send + Sync {
    async fn insert(&self, token: NewUserToken) -> Result<()>;

    /// Lookup by digest, including expired rows so callers can tell
    /// "expired" from "unknown".
    async fn find(&self, kind: TokenKind, token_hash: &str) -> Result<Option<UserTokenRecord>>;

    /// Returns `true` when a row was removed.
    async fn delete(&self, kind: TokenKind, token_hash: &str) -> Result<bool>;

    async fn delete_for_user(&self, user_id: UserID, kind: TokenKind) -> Result<u64>;
}
