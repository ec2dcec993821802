use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imageshare_model::{
    Album, AlbumID, Comment, CommentID, CommentTarget, Image, ImageID, Page, Pagination, Share,
    PublicProfile, ShareID, SharedItemRef, User, UserID, UserProfile, UserRole, UserStatus,
    UserSummary,
};
use tokio::sync::Mutex;

use crate::{
    application::AppUnitOfWork,
    database::ports::{
        albums::AlbumsRepository,
        comments::CommentsRepository,
        images::ImagesRepository,
        shares::{NewShare, SharesRepository},
        user_tokens::{NewUserToken, TokenKind, UserTokenRecord, UserTokensRepository},
        users::{NewUser, UsersRepository},
    },
    error::{ImageShareError, Result},
    mail::{MailTemplate, Mailer, OutgoingMail},
    storage::ImageStorage,
};

#[derive(Default)]
struct State {
    users: Vec<(User, String)>,
    profiles: HashMap<UserID, UserProfile>,
    tokens: Vec<UserTokenRecord>,
    albums: Vec<Album>,
    images: Vec<Image>,
    shares: Vec<Share>,
    comments: Vec<Comment>,
    conflict_next_share: bool,
    fail_next_album_replace: bool,
    fail_next_user_lookup: bool,
}

impl State {
    fn album_public(&self, album: Option<AlbumID>) -> bool {
        album
            .and_then(|id| self.albums.iter().find(|a| a.id == id))
            .is_some_and(|a| a.is_public)
    }

    fn hydrate(&self, image: &Image) -> Image {
        let mut image = image.clone();
        image.album_is_public = self.album_public(image.album_id);
        image
    }

    fn item_owner(&self, item: SharedItemRef) -> Option<UserID> {
        match item {
            SharedItemRef::Image(id) => self.images.iter().find(|i| i.id == id).map(|i| i.owner_id),
            SharedItemRef::Album(id) => self.albums.iter().find(|a| a.id == id).map(|a| a.owner_id),
        }
    }

    fn drop_shares_where(&mut self, pred: impl Fn(&Share) -> bool) {
        let removed: Vec<ShareID> = self.shares.iter().filter(|s| pred(s)).map(|s| s.id).collect();
        self.shares.retain(|s| !removed.contains(&s.id));
        self.comments
            .retain(|c| !matches!(c.target, CommentTarget::Share(id) if removed.contains(&id)));
    }
}

fn paginate<T: Clone>(newest_first: Vec<T>, page: Pagination) -> Page<T> {
    let total = newest_first.len() as u64;
    let items = newest_first
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.limit as usize)
        .collect();
    Page::new(items, page, total)
}

/// Implements every repository port over one mutex-guarded state so that
/// cascades and joins behave like the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unit_of_work(self: &Arc<Self>) -> AppUnitOfWork {
        AppUnitOfWork {
            users: self.clone(),
            user_tokens: self.clone(),
            images: self.clone(),
            albums: self.clone(),
            shares: self.clone(),
            comments: self.clone(),
        }
    }

    /// Insert an account directly, bypassing registration.
    pub async fn seed_user(&self, username: &str, verified: bool) -> User {
        let user = User {
            id: UserID::new(),
            email: format!("{username}@example.com"),
            username: username.to_lowercase(),
            is_verified: verified,
            roles: vec![UserRole::User],
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .await
            .users
            .push((user.clone(), "not-a-real-hash".into()));
        user
    }

    pub async fn seed_album(&self, owner: UserID, is_public: bool) -> Album {
        let now = Utc::now();
        let album = Album {
            id: AlbumID::new(),
            owner_id: owner,
            name: "Holiday".into(),
            description: None,
            is_public,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.albums.push(album.clone());
        album
    }

    pub async fn seed_image(&self, owner: UserID, album: Option<AlbumID>) -> Image {
        let now = Utc::now();
        let id = ImageID::new();
        let image = Image {
            id,
            owner_id: owner,
            album_id: album,
            album_is_public: false,
            title: "Sunset".into(),
            description: None,
            filename: format!("sunset-{id}.png"),
            content_type: "image/png".into(),
            size_bytes: 68,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.lock().await;
        state.images.push(image.clone());
        state.hydrate(&image)
    }

    pub async fn all_shares(&self) -> Vec<Share> {
        self.state.lock().await.shares.clone()
    }

    pub async fn all_comments(&self) -> Vec<Comment> {
        self.state.lock().await.comments.clone()
    }

    pub async fn tokens_of(&self, user: UserID, kind: TokenKind) -> Vec<UserTokenRecord> {
        self.state
            .lock()
            .await
            .tokens
            .iter()
            .filter(|t| t.user_id == user && t.kind == kind)
            .cloned()
            .collect()
    }

    /// Force the token with digest `token_hash` to be expired.
    pub async fn expire_token(&self, kind: TokenKind, token_hash: &str) {
        let mut state = self.state.lock().await;
        for token in state.tokens.iter_mut() {
            if token.kind == kind && token.token_hash == token_hash {
                token.expires_at = Utc::now() - chrono::Duration::seconds(1);
            }
        }
    }

    /// Make the next album contents replacement fail without changing anything.
    pub async fn fail_next_album_replace(&self) {
        self.state.lock().await.fail_next_album_replace = true;
    }

    /// Make the next user lookup by id fail.
    pub async fn fail_next_user_lookup(&self) {
        self.state.lock().await.fail_next_user_lookup = true;
    }

    /// Make the next share insert fail as if the unique index fired.
    pub async fn fail_next_share_insert_with_conflict(&self) {
        self.state.lock().await.conflict_next_share = true;
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|(u, _)| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(ImageShareError::Conflict("User with this email already exists".into()));
        }
        if state
            .users
            .iter()
            .any(|(u, _)| u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(ImageShareError::Conflict("Username already taken".into()));
        }
        let created = User {
            id: UserID::new(),
            email: user.email,
            username: user.username,
            is_verified: false,
            roles: user.roles,
            created_at: Utc::now(),
        };
        state.users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    async fn get_by_id(&self, id: UserID) -> Result<Option<User>> {
        let mut state = self.state.lock().await;
        if std::mem::take(&mut state.fail_next_user_lookup) {
            return Err(ImageShareError::Internal("user lookup failed".into()));
        }
        Ok(state.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.username.eq_ignore_ascii_case(username))
            .map(|(u, _)| u.clone()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.email.eq_ignore_ascii_case(email))
            .map(|(u, _)| u.clone()))
    }

    async fn password_hash(&self, id: UserID) -> Result<Option<String>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|(u, _)| u.id == id).map(|(_, h)| h.clone()))
    }

    async fn update_password(&self, id: UserID, password_hash: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let (_, hash) = state
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or_else(|| ImageShareError::NotFound(format!("User with ID {id} not found.")))?;
        *hash = password_hash.to_string();
        Ok(())
    }

    async fn mark_verified(&self, id: UserID) -> Result<()> {
        let mut state = self.state.lock().await;
        let (user, _) = state
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or_else(|| ImageShareError::NotFound(format!("User with ID {id} not found.")))?;
        user.is_verified = true;
        Ok(())
    }

    async fn set_roles(&self, id: UserID, roles: &[UserRole]) -> Result<User> {
        let mut state = self.state.lock().await;
        let (user, _) = state
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or_else(|| ImageShareError::NotFound(format!("User with ID {id} not found.")))?;
        user.roles = roles.to_vec();
        Ok(user.clone())
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state.users.iter().map(|(u, _)| u.clone()).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn list_verified(&self, except: UserID) -> Result<Vec<UserSummary>> {
        let state = self.state.lock().await;
        let mut out: Vec<UserSummary> = state
            .users
            .iter()
            .filter(|(u, _)| u.is_verified && u.id != except)
            .map(|(u, _)| u.summary())
            .collect();
        out.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(out)
    }

    async fn search_verified(
        &self,
        except: UserID,
        query: &str,
        limit: u32,
    ) -> Result<Vec<UserSummary>> {
        let needle = query.to_lowercase();
        let mut out = self.list_verified(except).await?;
        out.retain(|u| {
            u.username.to_lowercase().contains(&needle) || u.email.to_lowercase().contains(&needle)
        });
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn get_profile(&self, id: UserID) -> Result<Option<UserProfile>> {
        Ok(self.state.lock().await.profiles.get(&id).cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        let mut state = self.state.lock().await;
        let stored = match state.profiles.get(&profile.user_id) {
            Some(existing) => UserProfile {
                created_at: existing.created_at,
                ..profile.clone()
            },
            None => profile.clone(),
        };
        state.profiles.insert(profile.user_id, stored.clone());
        Ok(stored)
    }

    async fn list_online(&self, since: DateTime<Utc>) -> Result<Vec<PublicProfile>> {
        let state = self.state.lock().await;
        let mut online: Vec<PublicProfile> = state
            .profiles
            .values()
            .filter(|p| p.status == UserStatus::Online)
            .filter(|p| p.last_seen_at.is_some_and(|seen| seen > since))
            .filter_map(|profile| {
                let (user, _) = state.users.iter().find(|(u, _)| u.id == profile.user_id)?;
                Some(PublicProfile {
                    user: user.summary(),
                    profile: profile.clone(),
                })
            })
            .collect();
        online.sort_by(|a, b| b.profile.last_seen_at.cmp(&a.profile.last_seen_at));
        Ok(online)
    }
}

#[async_trait]
impl UserTokensRepository for MemoryStore {
    async fn insert(&self, token: NewUserToken) -> Result<()> {
        self.state.lock().await.tokens.push(UserTokenRecord {
            user_id: token.user_id,
            kind: token.kind,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn find(&self, kind: TokenKind, token_hash: &str) -> Result<Option<UserTokenRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .iter()
            .find(|t| t.kind == kind && t.token_hash == token_hash)
            .cloned())
    }

    async fn delete(&self, kind: TokenKind, token_hash: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.tokens.len();
        state.tokens.retain(|t| !(t.kind == kind && t.token_hash == token_hash));
        Ok(state.tokens.len() < before)
    }

    async fn delete_for_user(&self, user_id: UserID, kind: TokenKind) -> Result<u64> {
        let mut state = self.state.lock().await;
        let before = state.tokens.len();
        state.tokens.retain(|t| !(t.user_id == user_id && t.kind == kind));
        Ok((before - state.tokens.len()) as u64)
    }
}

#[async_trait]
impl ImagesRepository for MemoryStore {
    async fn insert(&self, image: &Image) -> Result<Image> {
        let mut state = self.state.lock().await;
        state.images.push(image.clone());
        Ok(state.hydrate(image))
    }

    async fn get(&self, id: ImageID) -> Result<Option<Image>> {
        let state = self.state.lock().await;
        Ok(state.images.iter().find(|i| i.id == id).map(|i| state.hydrate(i)))
    }

    async fn update(&self, image: &Image) -> Result<Image> {
        let mut state = self.state.lock().await;
        let stored = state
            .images
            .iter_mut()
            .find(|i| i.id == image.id)
            .ok_or_else(|| ImageShareError::NotFound(format!("Image {} not found", image.id)))?;
        stored.title = image.title.clone();
        stored.description = image.description.clone();
        stored.album_id = image.album_id;
        stored.updated_at = image.updated_at;
        let stored = stored.clone();
        Ok(state.hydrate(&stored))
    }

    async fn delete(&self, id: ImageID) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.images.len();
        state.images.retain(|i| i.id != id);
        if state.images.len() == before {
            return Ok(false);
        }
        state.drop_shares_where(|s| s.item == SharedItemRef::Image(id));
        state
            .comments
            .retain(|c| c.target != CommentTarget::Image(id));
        Ok(true)
    }

    async fn list_by_owner(&self, owner: UserID, page: Pagination) -> Result<Page<Image>> {
        let state = self.state.lock().await;
        let owned: Vec<Image> = state
            .images
            .iter()
            .rev()
            .filter(|i| i.owner_id == owner)
            .map(|i| state.hydrate(i))
            .collect();
        Ok(paginate(owned, page))
    }

    async fn count_by_owner(&self, owner: UserID) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.images.iter().filter(|i| i.owner_id == owner).count() as u64)
    }

    async fn list_by_album(&self, album: AlbumID) -> Result<Vec<Image>> {
        let state = self.state.lock().await;
        Ok(state
            .images
            .iter()
            .rev()
            .filter(|i| i.album_id == Some(album))
            .map(|i| state.hydrate(i))
            .collect())
    }

    async fn list_unassigned(&self, owner: UserID) -> Result<Vec<Image>> {
        let state = self.state.lock().await;
        Ok(state
            .images
            .iter()
            .rev()
            .filter(|i| i.owner_id == owner && i.album_id.is_none())
            .cloned()
            .collect())
    }

    async fn replace_album_images(
        &self,
        album: AlbumID,
        owner: UserID,
        images: &[ImageID],
    ) -> Result<(u64, u64)> {
        let mut state = self.state.lock().await;
        if std::mem::take(&mut state.fail_next_album_replace) {
            return Err(ImageShareError::Internal("album contents write failed".into()));
        }
        let mut detached = 0;
        let mut attached = 0;
        for image in state.images.iter_mut() {
            if image.owner_id == owner && images.contains(&image.id) {
                if image.album_id != Some(album) {
                    attached += 1;
                }
                image.album_id = Some(album);
            } else if image.album_id == Some(album) {
                image.album_id = None;
                detached += 1;
            }
        }
        Ok((detached, attached))
    }
}

#[async_trait]
impl AlbumsRepository for MemoryStore {
    async fn insert(&self, album: &Album) -> Result<Album> {
        self.state.lock().await.albums.push(album.clone());
        Ok(album.clone())
    }

    async fn get(&self, id: AlbumID) -> Result<Option<Album>> {
        let state = self.state.lock().await;
        Ok(state.albums.iter().find(|a| a.id == id).cloned())
    }

    async fn update(&self, album: &Album) -> Result<Album> {
        let mut state = self.state.lock().await;
        let stored = state
            .albums
            .iter_mut()
            .find(|a| a.id == album.id)
            .ok_or_else(|| ImageShareError::NotFound(format!("Album {} not found", album.id)))?;
        stored.name = album.name.clone();
        stored.description = album.description.clone();
        stored.is_public = album.is_public;
        stored.updated_at = album.updated_at;
        Ok(stored.clone())
    }

    async fn delete(&self, id: AlbumID) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.albums.len();
        state.albums.retain(|a| a.id != id);
        if state.albums.len() == before {
            return Ok(false);
        }
        for image in state.images.iter_mut().filter(|i| i.album_id == Some(id)) {
            image.album_id = None;
        }
        state.drop_shares_where(|s| s.item == SharedItemRef::Album(id));
        Ok(true)
    }

    async fn list_by_owner(&self, owner: UserID, page: Pagination) -> Result<Page<Album>> {
        let state = self.state.lock().await;
        let owned: Vec<Album> = state
            .albums
            .iter()
            .rev()
            .filter(|a| a.owner_id == owner)
            .cloned()
            .collect();
        Ok(paginate(owned, page))
    }

    async fn count_by_owner(&self, owner: UserID) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.albums.iter().filter(|a| a.owner_id == owner).count() as u64)
    }
}

#[async_trait]
impl SharesRepository for MemoryStore {
    async fn insert(&self, share: NewShare) -> Result<Share> {
        let mut state = self.state.lock().await;
        let duplicate = state
            .shares
            .iter()
            .any(|s| s.item == share.item && s.shared_with == share.shared_with);
        if duplicate || std::mem::take(&mut state.conflict_next_share) {
            return Err(ImageShareError::Conflict(format!(
                "{} is already shared with {}",
                share.item, share.shared_with
            )));
        }
        let created = Share {
            id: ShareID::new(),
            item: share.item,
            shared_by: share.shared_by,
            shared_with: share.shared_with,
            message: share.message,
            created_at: Utc::now(),
        };
        state.shares.push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: ShareID) -> Result<Option<Share>> {
        let state = self.state.lock().await;
        Ok(state.shares.iter().find(|s| s.id == id).cloned())
    }

    async fn find(&self, item: SharedItemRef, recipient: UserID) -> Result<Option<Share>> {
        let state = self.state.lock().await;
        Ok(state
            .shares
            .iter()
            .find(|s| s.item == item && s.shared_with == recipient)
            .cloned())
    }

    async fn delete(&self, id: ShareID) -> Result<bool> {
        let mut state = self.state.lock().await;
        let existed = state.shares.iter().any(|s| s.id == id);
        state.drop_shares_where(|s| s.id == id);
        Ok(existed)
    }

    async fn list_for_item(&self, item: SharedItemRef) -> Result<Vec<Share>> {
        let state = self.state.lock().await;
        Ok(state.shares.iter().filter(|s| s.item == item).cloned().collect())
    }

    async fn list_sent(&self, sender: UserID) -> Result<Vec<Share>> {
        let state = self.state.lock().await;
        Ok(state
            .shares
            .iter()
            .rev()
            .filter(|s| s.shared_by == sender)
            .cloned()
            .collect())
    }

    async fn list_received(&self, recipient: UserID, page: Pagination) -> Result<Page<Share>> {
        let state = self.state.lock().await;
        let received: Vec<Share> = state
            .shares
            .iter()
            .rev()
            .filter(|s| s.shared_with == recipient)
            .cloned()
            .collect();
        Ok(paginate(received, page))
    }

    async fn count_sent(&self, sender: UserID) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.shares.iter().filter(|s| s.shared_by == sender).count() as u64)
    }

    async fn count_received(&self, recipient: UserID) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.shares.iter().filter(|s| s.shared_with == recipient).count() as u64)
    }
}

#[async_trait]
impl CommentsRepository for MemoryStore {
    async fn insert(&self, comment: &Comment) -> Result<Comment> {
        self.state.lock().await.comments.push(comment.clone());
        Ok(comment.clone())
    }

    async fn get(&self, id: CommentID) -> Result<Option<Comment>> {
        let state = self.state.lock().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_content(
        &self,
        id: CommentID,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let mut state = self.state.lock().await;
        let comment = state
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ImageShareError::NotFound(format!("Comment {id} not found")))?;
        comment.content = content.to_string();
        comment.updated_at = now;
        Ok(comment.clone())
    }

    async fn delete(&self, id: CommentID) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        Ok(state.comments.len() < before)
    }

    async fn list_for_image(&self, image: ImageID) -> Result<Vec<Comment>> {
        let state = self.state.lock().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.target == CommentTarget::Image(image))
            .cloned()
            .collect())
    }

    async fn list_for_share(&self, share: ShareID) -> Result<Vec<Comment>> {
        let state = self.state.lock().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.target == CommentTarget::Share(share))
            .cloned()
            .collect())
    }

    async fn list_visible_to(&self, user: UserID, limit: u32) -> Result<Vec<Comment>> {
        let state = self.state.lock().await;
        Ok(state
            .comments
            .iter()
            .rev()
            .filter(|c| {
                if c.author_id == user {
                    return true;
                }
                let owner = match c.target {
                    CommentTarget::Image(id) => state.item_owner(SharedItemRef::Image(id)),
                    CommentTarget::Share(id) => state
                        .shares
                        .iter()
                        .find(|s| s.id == id)
                        .and_then(|s| state.item_owner(s.item)),
                };
                owner == Some(user)
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Captures outgoing mail instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::default(),
            fail: true,
        })
    }

    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }

    /// Token of the most recent verification mail to `email`.
    pub async fn verification_token(&self, email: &str) -> Option<String> {
        self.sent.lock().await.iter().rev().find_map(|mail| match &mail.template {
            MailTemplate::EmailVerification { token, .. } if mail.to == email => {
                Some(token.clone())
            }
            _ => None,
        })
    }

    /// Token of the most recent password reset mail to `email`.
    pub async fn reset_token(&self, email: &str) -> Option<String> {
        self.sent.lock().await.iter().rev().find_map(|mail| match &mail.template {
            MailTemplate::PasswordReset { token } if mail.to == email => Some(token.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        if self.fail {
            return Err(ImageShareError::Internal("smtp unavailable".into()));
        }
        self.sent.lock().await.push(mail);
        Ok(())
    }
}

/// Keeps uploaded bytes in a map keyed by filename.
#[derive(Debug, Default)]
pub struct MemoryImageStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    fail_deletes: AtomicBool,
}

impl MemoryImageStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn contains(&self, filename: &str) -> bool {
        self.files.lock().await.contains_key(filename)
    }

    pub async fn len(&self) -> usize {
        self.files.lock().await.len()
    }

    /// Make every later delete fail with a storage error.
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageStorage for MemoryImageStorage {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        self.files
            .lock()
            .await
            .insert(filename.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .await
            .get(filename)
            .cloned()
            .ok_or_else(|| ImageShareError::NotFound(format!("Image file {filename} is missing")))
    }

    async fn delete(&self, filename: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ImageShareError::Storage(format!("cannot remove {filename}")));
        }
        self.files.lock().await.remove(filename);
        Ok(())
    }
}
