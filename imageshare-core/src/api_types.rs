//! JSON payloads exchanged over the v1 API.

use chrono::{DateTime, Utc};
use imageshare_model::{AlbumID, ImageID, Pagination, ShareID, UserID, UserStatus, UserSummary};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    access::ShareRecipient,
    accounts::{IssuedSession, ProfileChanges},
    content::{AlbumChanges, ImageChanges, NewAlbum},
};

/// Standard API envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(error),
            message: None,
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ===== Auth =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserSummary,
}

impl From<IssuedSession> for LoginResponse {
    fn from(session: IssuedSession) -> Self {
        Self {
            token: session.token,
            expires_at: session.expires_at,
            user: session.user.summary(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    pub user_id: UserID,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendVerificationRequest {
    pub user_id: UserID,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub password: String,
    pub password_confirmation: String,
}

// ===== Users =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            display_name: req.display_name,
            bio: req.bio,
            location: req.location,
            website: req.website,
            is_public: req.is_public,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub status: UserStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<PageQuery> for Pagination {
    fn from(query: PageQuery) -> Self {
        Pagination::new(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(Pagination::DEFAULT_LIMIT),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

// ===== Images and albums =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateImageRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `null` takes the image out of its album
    #[serde(default, deserialize_with = "double_option")]
    pub album_id: Option<Option<AlbumID>>,
}

impl From<UpdateImageRequest> for ImageChanges {
    fn from(req: UpdateImageRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            album_id: req.album_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAlbumRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

impl From<CreateAlbumRequest> for NewAlbum {
    fn from(req: CreateAlbumRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            is_public: req.is_public,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAlbumRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl From<UpdateAlbumRequest> for AlbumChanges {
    fn from(req: UpdateAlbumRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            is_public: req.is_public,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetAlbumImagesRequest {
    #[serde(default)]
    pub image_ids: Vec<ImageID>,
}

// ===== Sharing =====

/// `usernames` is a comma separated list, as typed into the share form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRequest {
    pub usernames: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientResponse {
    pub share_id: ShareID,
    pub user: UserSummary,
    pub message: Option<String>,
    pub shared_at: DateTime<Utc>,
}

impl From<ShareRecipient> for RecipientResponse {
    fn from(recipient: ShareRecipient) -> Self {
        Self {
            share_id: recipient.share.id,
            user: recipient.user,
            message: recipient.share.message,
            shared_at: recipient.share.created_at,
        }
    }
}

// ===== Comments =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_skips_absent_fields() {
        let ok = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(ok, json!({"status": "success", "data": 3}));

        let err = serde_json::to_value(
            ApiResponse::<()>::error("nope".into()).with_message("try again".into()),
        )
        .unwrap();
        assert_eq!(
            err,
            json!({"status": "error", "error": "nope", "message": "try again"})
        );
    }

    #[test]
    fn album_id_null_differs_from_missing() {
        let missing: UpdateImageRequest = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert_eq!(missing.album_id, None);

        let cleared: UpdateImageRequest =
            serde_json::from_value(json!({"album_id": null})).unwrap();
        assert_eq!(cleared.album_id, Some(None));

        let id = AlbumID::new();
        let moved: UpdateImageRequest =
            serde_json::from_value(json!({"album_id": id.to_string()})).unwrap();
        assert_eq!(moved.album_id, Some(Some(id)));
    }

    #[test]
    fn page_query_is_normalized() {
        let page: Pagination = PageQuery {
            page: Some(0),
            limit: Some(500),
        }
        .into();
        assert_eq!(page, Pagination::new(1, Pagination::MAX_LIMIT));
        assert_eq!(Pagination::from(PageQuery::default()), Pagination::default());
    }
}
