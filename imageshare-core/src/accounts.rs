//! Registration, verification, sessions, password resets and profiles.

use std::{any::type_name_of_val, fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use imageshare_model::{PublicProfile, User, UserID, UserProfile, UserRole, UserStatus};
use tracing::{info, instrument, warn};

use crate::{
    application::AppUnitOfWork,
    auth::{AuthCrypto, EmailAddress, Password, Username, generate_token},
    database::ports::{
        user_tokens::{NewUserToken, TokenKind, UserTokensRepository},
        users::{NewUser, UsersRepository},
    },
    error::{ImageShareError, Result},
    mail::{MailTemplate, Mailer, OutgoingMail},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const NOT_VERIFIED: &str = "Please verify your email before logging in.";

/// How recently an online user must have been seen to be listed.
pub const ONLINE_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub struct AccountSettings {
    /// Base URL of the client, used to build links in emails
    pub frontend_url: String,
    pub session_ttl: Duration,
    pub verification_ttl: Duration,
    pub reset_ttl: Duration,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".into(),
            session_ttl: Duration::days(7),
            verification_ttl: Duration::hours(24),
            reset_ttl: Duration::hours(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// A freshly issued bearer session. `token` is only ever returned here.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Profile edits. `None` leaves a field alone, an empty string clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UsersRepository>,
    tokens: Arc<dyn UserTokensRepository>,
    crypto: Arc<AuthCrypto>,
    mailer: Arc<dyn Mailer>,
    settings: AccountSettings,
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("tokens", &type_name_of_val(self.tokens.as_ref()))
            .field("mailer", &type_name_of_val(self.mailer.as_ref()))
            .field("settings", &self.settings)
            .finish()
    }
}

impl AccountService {
    pub fn new(uow: &AppUnitOfWork, crypto: Arc<AuthCrypto>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            users: uow.users.clone(),
            tokens: uow.user_tokens.clone(),
            crypto,
            mailer,
            settings: AccountSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AccountSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &AccountSettings {
        &self.settings
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterUser) -> Result<User> {
        let email = EmailAddress::parse(&request.email)?;
        let username = Username::parse(&request.username)?;
        let password = Password::parse(&request.password)?;

        if self.users.get_by_email(email.as_str()).await?.is_some() {
            return Err(ImageShareError::Conflict("User with this email already exists".into()));
        }
        if self.users.get_by_username(username.as_str()).await?.is_some() {
            return Err(ImageShareError::Conflict("Username already taken".into()));
        }

        let password_hash = self.crypto.hash_password(password.expose())?;
        let user = self
            .users
            .create(NewUser {
                email: email.into_string(),
                username: username.into_string(),
                password_hash,
                roles: vec![UserRole::User],
            })
            .await?;

        info!(user_id = %user.id, "user registered");

        if let Err(err) = self.send_verification(&user).await {
            warn!(user_id = %user.id, %err, "could not send verification email");
        }

        Ok(user)
    }

    async fn send_verification(&self, user: &User) -> Result<()> {
        self.tokens
            .delete_for_user(user.id, TokenKind::EmailVerification)
            .await?;

        let token = generate_token()?;
        self.tokens
            .insert(NewUserToken {
                user_id: user.id,
                kind: TokenKind::EmailVerification,
                token_hash: self.crypto.hash_token(&token),
                expires_at: Utc::now() + self.settings.verification_ttl,
            })
            .await?;

        let action_url = format!(
            "{}/verify-email?user={}&token={}",
            self.settings.frontend_url.trim_end_matches('/'),
            user.id,
            token
        );
        self.mailer
            .send(OutgoingMail {
                to: user.email.clone(),
                username: user.username.clone(),
                template: MailTemplate::EmailVerification {
                    user_id: user.id,
                    token,
                },
                action_url,
            })
            .await
    }

    async fn unverified_user(&self, user_id: UserID) -> Result<User> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| {
                ImageShareError::NotFound(format!("User with ID {user_id} not found."))
            })?;
        if user.is_verified {
            return Err(ImageShareError::Conflict("Email is already verified.".into()));
        }
        Ok(user)
    }

    pub async fn verify_email(&self, user_id: UserID, token: &str) -> Result<User> {
        let mut user = self.unverified_user(user_id).await?;

        let invalid =
            || ImageShareError::Validation("Invalid or expired verification link.".into());
        let hash = self.crypto.hash_token(token.trim());
        let record = self
            .tokens
            .find(TokenKind::EmailVerification, &hash)
            .await?
            .filter(|record| record.user_id == user_id)
            .ok_or_else(invalid)?;

        if record.is_expired(Utc::now()) {
            self.tokens.delete(TokenKind::EmailVerification, &hash).await?;
            return Err(invalid());
        }

        self.users.mark_verified(user_id).await?;
        self.tokens
            .delete_for_user(user_id, TokenKind::EmailVerification)
            .await?;
        user.is_verified = true;

        info!(user_id = %user_id, "email verified");
        Ok(user)
    }

    pub async fn resend_verification(&self, user_id: UserID) -> Result<()> {
        let user = self.unverified_user(user_id).await?;
        self.send_verification(&user).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession> {
        let unauthorized = || ImageShareError::Unauthorized(INVALID_CREDENTIALS.into());

        let user = self
            .users
            .get_by_email(email.trim())
            .await?
            .ok_or_else(unauthorized)?;
        let stored = self
            .users
            .password_hash(user.id)
            .await?
            .ok_or_else(unauthorized)?;

        // Malformed stored hashes read as a mismatch.
        let matches = self
            .crypto
            .verify_password(password, &stored)
            .unwrap_or(false);
        if !matches {
            warn!(user_id = %user.id, "failed login");
            return Err(unauthorized());
        }
        if !user.is_verified {
            return Err(ImageShareError::Unauthorized(NOT_VERIFIED.into()));
        }

        let token = generate_token()?;
        let expires_at = Utc::now() + self.settings.session_ttl;
        self.tokens
            .insert(NewUserToken {
                user_id: user.id,
                kind: TokenKind::Session,
                token_hash: self.crypto.hash_token(&token),
                expires_at,
            })
            .await?;

        info!(user_id = %user.id, "session issued");
        Ok(IssuedSession {
            token,
            expires_at,
            user,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<bool> {
        let hash = self.crypto.hash_token(token);
        self.tokens.delete(TokenKind::Session, &hash).await
    }

    /// Resolve a bearer token to its user. Expired sessions are removed.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let unauthorized = || ImageShareError::Unauthorized("Invalid or expired session".into());
        if token.trim().is_empty() {
            return Err(unauthorized());
        }

        let hash = self.crypto.hash_token(token);
        let record = self
            .tokens
            .find(TokenKind::Session, &hash)
            .await?
            .ok_or_else(unauthorized)?;

        if record.is_expired(Utc::now()) {
            self.tokens.delete(TokenKind::Session, &hash).await?;
            return Err(unauthorized());
        }

        self.users
            .get_by_id(record.user_id)
            .await?
            .ok_or_else(unauthorized)
    }

    /// Always succeeds so callers cannot probe which emails exist.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let Some(user) = self.users.get_by_email(email.trim()).await? else {
            return Ok(());
        };

        self.tokens
            .delete_for_user(user.id, TokenKind::PasswordReset)
            .await?;
        let token = generate_token()?;
        self.tokens
            .insert(NewUserToken {
                user_id: user.id,
                kind: TokenKind::PasswordReset,
                token_hash: self.crypto.hash_token(&token),
                expires_at: Utc::now() + self.settings.reset_ttl,
            })
            .await?;

        let action_url = format!(
            "{}/reset-password?token={}",
            self.settings.frontend_url.trim_end_matches('/'),
            token
        );
        let mail = OutgoingMail {
            to: user.email.clone(),
            username: user.username.clone(),
            template: MailTemplate::PasswordReset { token },
            action_url,
        };
        if let Err(err) = self.mailer.send(mail).await {
            warn!(user_id = %user.id, %err, "could not send password reset email");
        }
        Ok(())
    }

    pub async fn confirm_password_reset(
        &self,
        token: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<()> {
        let password = Password::confirmed(password, confirmation)?;

        let invalid = || ImageShareError::Validation("Invalid or expired reset token.".into());
        let hash = self.crypto.hash_token(token.trim());
        let record = self
            .tokens
            .find(TokenKind::PasswordReset, &hash)
            .await?
            .ok_or_else(invalid)?;

        if record.is_expired(Utc::now()) {
            self.tokens.delete(TokenKind::PasswordReset, &hash).await?;
            return Err(invalid());
        }

        let password_hash = self.crypto.hash_password(password.expose())?;
        self.users
            .update_password(record.user_id, &password_hash)
            .await?;
        self.tokens
            .delete_for_user(record.user_id, TokenKind::PasswordReset)
            .await?;
        let revoked = self
            .tokens
            .delete_for_user(record.user_id, TokenKind::Session)
            .await?;

        info!(user_id = %record.user_id, revoked_sessions = revoked, "password reset");
        Ok(())
    }

    /// The user's profile, created on first access.
    pub async fn profile(&self, user_id: UserID) -> Result<UserProfile> {
        if let Some(profile) = self.users.get_profile(user_id).await? {
            return Ok(profile);
        }
        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(ImageShareError::NotFound(format!("User with ID {user_id} not found.")));
        }
        self.users
            .upsert_profile(&UserProfile::new(user_id, Utc::now()))
            .await
    }

    pub async fn update_profile(
        &self,
        user_id: UserID,
        changes: ProfileChanges,
    ) -> Result<UserProfile> {
        let mut profile = self.profile(user_id).await?;

        if let Some(value) = changes.display_name {
            profile.display_name = bounded("Display name", value, 100)?;
        }
        if let Some(value) = changes.bio {
            profile.bio = bounded("Bio", value, 1000)?;
        }
        if let Some(value) = changes.location {
            profile.location = bounded("Location", value, 100)?;
        }
        if let Some(value) = changes.website {
            let website = bounded("Website", value, 255)?;
            if let Some(url) = &website
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(ImageShareError::Validation(
                    "Website must start with http:// or https://".into(),
                ));
            }
            profile.website = website;
        }
        if let Some(is_public) = changes.is_public {
            profile.is_public = is_public;
        }

        profile.updated_at = Utc::now();
        self.users.upsert_profile(&profile).await
    }

    pub async fn set_status(&self, user_id: UserID, status: UserStatus) -> Result<UserProfile> {
        let mut profile = self.profile(user_id).await?;
        let now = Utc::now();
        profile.status = status;
        profile.last_seen_at = Some(now);
        profile.updated_at = now;
        self.users.upsert_profile(&profile).await
    }

    /// Another user's profile, if they are verified and made it public.
    pub async fn public_profile(&self, username: &str) -> Result<PublicProfile> {
        let user = self
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| ImageShareError::NotFound("User not found".into()))?;
        if !user.is_verified {
            return Err(ImageShareError::AccessDenied(
                "User profile is not available".into(),
            ));
        }
        match self.users.get_profile(user.id).await? {
            Some(profile) if profile.is_public => Ok(PublicProfile {
                user: user.summary(),
                profile,
            }),
            _ => Err(ImageShareError::AccessDenied("Profile is not public".into())),
        }
    }

    /// Users marked online and seen within the last few minutes.
    pub async fn online_users(&self) -> Result<Vec<PublicProfile>> {
        let since = Utc::now() - Duration::minutes(ONLINE_WINDOW_MINUTES);
        self.users.list_online(since).await
    }
}

/// Trim, map empty to `None`, and enforce a character limit.
fn bounded(field: &str, value: String, max: usize) -> Result<Option<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(ImageShareError::Validation(format!(
            "{field} must be at most {max} characters."
        )));
    }
    Ok(Some(trimmed.to_string()))
}
