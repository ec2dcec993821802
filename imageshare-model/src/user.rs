use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};

use crate::{error::ModelError, ids::UserID};

/// Role tags carried by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UserRole {
    #[cfg_attr(feature = "serde", serde(rename = "ROLE_USER"))]
    User,
    #[cfg_attr(feature = "serde", serde(rename = "ROLE_ADMIN"))]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "ROLE_USER",
            UserRole::Admin => "ROLE_ADMIN",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_USER" => Ok(UserRole::User),
            "ROLE_ADMIN" => Ok(UserRole::Admin),
            other => Err(ModelError::InvalidValue(format!(
                "unknown role '{other}'"
            ))),
        }
    }
}

/// A registered account.
///
/// Carries no password hash; that only travels between the
/// users repository and the credential checks in `imageshare-core`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    pub id: UserID,
    pub email: String,
    /// Lowercase, 3-30 chars, alphanumeric + underscore
    pub username: String,
    pub is_verified: bool,
    pub roles: Vec<UserRole>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// The slice of a user exposed to other users (share pickers, recipients).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserSummary {
    pub id: UserID,
    pub username: String,
    pub email: String,
}

/// Presence flag stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UserStatus {
    Online,
    #[default]
    Offline,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "online",
            UserStatus::Offline => "offline",
        }
    }
}

impl FromStr for UserStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(UserStatus::Online),
            "offline" => Ok(UserStatus::Offline),
            other => Err(ModelError::InvalidValue(format!(
                "unknown status '{other}'"
            ))),
        }
    }
}

/// Public-facing profile, created lazily on first access.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserProfile {
    pub user_id: UserID,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub is_public: bool,
    pub status: UserStatus,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: UserID, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            display_name: None,
            bio: None,
            location: None,
            website: None,
            is_public: false,
            status: UserStatus::Offline,
            last_seen_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A profile together with the account it belongs to, as shown to other
/// users.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PublicProfile {
    pub user: UserSummary,
    pub profile: UserProfile,
}
