use std::{any::type_name_of_val, fmt, sync::Arc};

use imageshare_model::{
    Album, AlbumID, Comment, Image, ImageID, Page, Pagination, Share, ShareID, ShareOutcome,
    ShareTarget, SharedItem, SharedItemRef, User, UserID, UserSummary,
};
use tracing::{debug, info, instrument};

use super::policy;
use crate::{
    application::AppUnitOfWork,
    database::ports::{
        albums::AlbumsRepository,
        images::ImagesRepository,
        shares::{NewShare, SharesRepository},
        users::UsersRepository,
    },
    error::{ImageShareError, Result},
};

/// Searches shorter than this return nothing.
pub const MIN_SEARCH_LENGTH: usize = 2;
const SEARCH_LIMIT: u32 = 10;

/// A share of one item together with the user it was granted to.
#[derive(Debug, Clone)]
pub struct ShareRecipient {
    pub share: Share,
    pub user: UserSummary,
}

/// Resolves access decisions against the stores and manages share grants.
#[derive(Clone)]
pub struct SharingService {
    users: Arc<dyn UsersRepository>,
    images: Arc<dyn ImagesRepository>,
    albums: Arc<dyn AlbumsRepository>,
    shares: Arc<dyn SharesRepository>,
}

impl fmt::Debug for SharingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharingService")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("images", &type_name_of_val(self.images.as_ref()))
            .field("albums", &type_name_of_val(self.albums.as_ref()))
            .field("shares", &type_name_of_val(self.shares.as_ref()))
            .finish()
    }
}

/// Outcome of resolving one share target.
enum Resolved {
    Skip,
    Rejected(String),
    User { user: User, label: String },
}

impl SharingService {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            users: uow.users.clone(),
            images: uow.images.clone(),
            albums: uow.albums.clone(),
            shares: uow.shares.clone(),
        }
    }

    pub async fn load_image(&self, id: ImageID) -> Result<Image> {
        self.images
            .get(id)
            .await?
            .ok_or_else(|| ImageShareError::NotFound(format!("Image {id} not found.")))
    }

    pub async fn load_album(&self, id: AlbumID) -> Result<Album> {
        self.albums
            .get(id)
            .await?
            .ok_or_else(|| ImageShareError::NotFound(format!("Album {id} not found.")))
    }

    pub async fn load_share(&self, id: ShareID) -> Result<Share> {
        self.shares
            .get(id)
            .await?
            .ok_or_else(|| ImageShareError::NotFound(format!("Share {id} not found.")))
    }

    pub async fn load_item(&self, item: SharedItemRef) -> Result<SharedItem> {
        match item {
            SharedItemRef::Image(id) => self.load_image(id).await.map(SharedItem::Image),
            SharedItemRef::Album(id) => self.load_album(id).await.map(SharedItem::Album),
        }
    }

    pub async fn can_access_image(&self, image: &Image, user: UserID) -> Result<bool> {
        if policy::can_access_image(image, user, false) {
            return Ok(true);
        }
        let shared = self.shares.exists(SharedItemRef::Image(image.id), user).await?;
        Ok(policy::can_access_image(image, user, shared))
    }

    pub async fn can_access_album(&self, album: &Album, user: UserID) -> Result<bool> {
        if policy::can_access_album(album, user, false) {
            return Ok(true);
        }
        let shared = self.shares.exists(SharedItemRef::Album(album.id), user).await?;
        Ok(policy::can_access_album(album, user, shared))
    }

    /// Load an image and fail with `AccessDenied` unless `user` may view it.
    pub async fn accessible_image(&self, id: ImageID, user: UserID) -> Result<Image> {
        let image = self.load_image(id).await?;
        if !self.can_access_image(&image, user).await? {
            return Err(ImageShareError::AccessDenied(
                "You do not have access to this image.".into(),
            ));
        }
        Ok(image)
    }

    /// Load an album and fail with `AccessDenied` unless `user` may view it.
    pub async fn accessible_album(&self, id: AlbumID, user: UserID) -> Result<Album> {
        let album = self.load_album(id).await?;
        if !self.can_access_album(&album, user).await? {
            return Err(ImageShareError::AccessDenied(
                "You do not have access to this album.".into(),
            ));
        }
        Ok(album)
    }

    pub fn ensure_owner(&self, item: &SharedItem, user: UserID) -> Result<()> {
        policy::ensure_owner(item, user)
    }

    /// Share `item` with every target.
    ///
    /// A caller who does not own the item fails the whole call. Problems with
    /// individual targets are collected in [`ShareOutcome::errors`] and the
    /// remaining targets are still processed.
    #[instrument(
        skip(self, item, targets, message),
        fields(item = %item.item_ref(), targets = targets.len())
    )]
    pub async fn share_item(
        &self,
        item: &SharedItem,
        owner: UserID,
        targets: &[ShareTarget],
        message: Option<String>,
    ) -> Result<ShareOutcome> {
        policy::ensure_can_share(item, owner)?;

        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        let item_ref = item.item_ref();
        let mut outcome = ShareOutcome::default();

        for target in targets {
            let (user, label) = match self.resolve_target(target, owner).await {
                Resolved::Skip => continue,
                Resolved::Rejected(error) => {
                    debug!(%target, %error, "share target rejected");
                    outcome.record_error(error);
                    continue;
                }
                Resolved::User { user, label } => (user, label),
            };

            match self.shares.exists(item_ref, user.id).await {
                Ok(true) => {
                    outcome.record_error(format!("Already shared with '{label}'."));
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    outcome.record_error(format!("Error sharing with {label}: {}", err.message()));
                    continue;
                }
            }

            let new_share = NewShare {
                item: item_ref,
                shared_by: owner,
                shared_with: user.id,
                message: message.clone(),
            };
            match self.shares.insert(new_share).await {
                Ok(share) => {
                    info!(share_id = %share.id, recipient = %user.id, "item shared");
                    outcome.record_shared();
                }
                Err(ImageShareError::Conflict(_)) => {
                    outcome.record_error(format!("Already shared with '{label}'."));
                }
                Err(err) => {
                    outcome.record_error(format!("Error sharing with {label}: {}", err.message()));
                }
            }
        }

        Ok(outcome)
    }

    async fn resolve_target(&self, target: &ShareTarget, owner: UserID) -> Resolved {
        let (found, label) = match target {
            ShareTarget::Username(raw) => {
                let name = raw.trim();
                if name.is_empty() {
                    return Resolved::Skip;
                }
                match self.users.get_by_username(name).await {
                    Ok(Some(user)) => (user, name.to_string()),
                    Ok(None) => return Resolved::Rejected(format!("User '{name}' not found.")),
                    Err(err) => {
                        return Resolved::Rejected(format!(
                            "Error sharing with {name}: {}",
                            err.message()
                        ));
                    }
                }
            }
            ShareTarget::Id(id) => match self.users.get_by_id(*id).await {
                Ok(Some(user)) => {
                    let label = user.username.clone();
                    (user, label)
                }
                Ok(None) => return Resolved::Rejected(format!("User with ID {id} not found.")),
                Err(err) => {
                    return Resolved::Rejected(format!(
                        "Error sharing with user ID {id}: {}",
                        err.message()
                    ));
                }
            },
        };

        if found.id == owner {
            return Resolved::Rejected("Cannot share with yourself.".into());
        }
        if !found.is_verified {
            return Resolved::Rejected(format!("User '{label}' is not verified."));
        }
        Resolved::User { user: found, label }
    }

    /// Delete a share. Only its sender or recipient may do so.
    pub async fn remove_share(&self, share: &Share, current_user: UserID) -> Result<bool> {
        if !policy::can_remove_share(share, current_user) {
            return Err(ImageShareError::AccessDenied(
                "You cannot remove this share.".into(),
            ));
        }
        let removed = self.shares.delete(share.id).await?;
        if !removed {
            return Err(ImageShareError::NotFound(format!("Share {} not found.", share.id)));
        }
        info!(share_id = %share.id, user = %current_user, "share removed");
        Ok(true)
    }

    /// Owner-side revoke: drop the share of `item` held by `recipient`.
    pub async fn revoke_recipient(
        &self,
        item: &SharedItem,
        owner: UserID,
        recipient: UserID,
    ) -> Result<()> {
        policy::ensure_owner(item, owner)?;
        let share = self
            .find_share_for(item.item_ref(), recipient)
            .await?
            .ok_or_else(|| {
                ImageShareError::NotFound(format!(
                    "This {} is not shared with that user.",
                    item.kind().as_str()
                ))
            })?;
        self.remove_share(&share, owner).await?;
        Ok(())
    }

    pub fn can_comment_on_share(&self, share: &Share, user: UserID) -> bool {
        policy::can_comment_on_share(share, user)
    }

    pub fn comment_visible_to(&self, comment: &Comment, item_owner: UserID, user: UserID) -> bool {
        policy::comment_visible_to(comment, item_owner, user)
    }

    /// Verified users `user` could share with.
    pub async fn available_users(&self, user: UserID) -> Result<Vec<UserSummary>> {
        self.users.list_verified(user).await
    }

    pub async fn search_users(&self, user: UserID, query: &str) -> Result<Vec<UserSummary>> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LENGTH {
            return Ok(Vec::new());
        }
        self.users.search_verified(user, query, SEARCH_LIMIT).await
    }

    /// Who `item` is shared with, oldest grant first.
    pub async fn recipients(&self, item: SharedItemRef) -> Result<Vec<ShareRecipient>> {
        let shares = self.shares.list_for_item(item).await?;
        let mut recipients = Vec::with_capacity(shares.len());
        for share in shares {
            if let Some(user) = self.users.get_by_id(share.shared_with).await? {
                recipients.push(ShareRecipient {
                    user: user.summary(),
                    share,
                });
            }
        }
        Ok(recipients)
    }

    pub async fn shares_sent(&self, user: UserID) -> Result<Vec<Share>> {
        self.shares.list_sent(user).await
    }

    pub async fn shares_received(&self, user: UserID, page: Pagination) -> Result<Page<Share>> {
        self.shares.list_received(user, page).await
    }

    pub async fn find_share_for(&self, item: SharedItemRef, user: UserID) -> Result<Option<Share>> {
        self.shares.find(item, user).await
    }
}

#[cfg(test)]
mod tests {
    use imageshare_model::UserRole;

    use super::*;
    use crate::testing::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        sharing: SharingService,
        alice: User,
        bob: User,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let sharing = SharingService::new(&store.unit_of_work());
        let alice = store.seed_user("alice", true).await;
        let bob = store.seed_user("bob", true).await;
        Fixture { store, sharing, alice, bob }
    }

    fn names(list: &str) -> Vec<ShareTarget> {
        ShareTarget::parse_usernames(list)
    }

    #[tokio::test]
    async fn shares_with_existing_user_and_reports_missing_one() {
        let fx = fixture().await;
        let image = fx.store.seed_image(fx.alice.id, None).await;
        let item = SharedItem::Image(image.clone());

        let outcome = fx
            .sharing
            .share_item(&item, fx.alice.id, &names("bob, ghost"), None)
            .await
            .unwrap();

        assert_eq!(outcome.shared_count, 1);
        assert!(outcome.success);
        assert_eq!(outcome.errors, vec!["User 'ghost' not found.".to_string()]);

        let shares = fx.store.all_shares().await;
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].shared_by, fx.alice.id);
        assert_eq!(shares[0].shared_with, fx.bob.id);
        assert_eq!(shares[0].item, SharedItemRef::Image(image.id));
    }

    #[tokio::test]
    async fn non_owner_cannot_share_even_with_valid_targets() {
        let fx = fixture().await;
        let image = fx.store.seed_image(fx.alice.id, None).await;

        let err = fx
            .sharing
            .share_item(&SharedItem::Image(image), fx.bob.id, &names("alice"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ImageShareError::AccessDenied(_)));
        assert!(fx.store.all_shares().await.is_empty());
    }

    #[tokio::test]
    async fn per_target_errors_follow_check_order() {
        let fx = fixture().await;
        fx.store.seed_user("carol", false).await;
        let album = fx.store.seed_album(fx.alice.id, false).await;
        let item = SharedItem::Album(album);

        let first = fx
            .sharing
            .share_item(&item, fx.alice.id, &names("bob"), None)
            .await
            .unwrap();
        assert_eq!(first.shared_count, 1);

        let second = fx
            .sharing
            .share_item(&item, fx.alice.id, &names(" ,alice, carol, Bob, "), None)
            .await
            .unwrap();
        assert_eq!(second.shared_count, 0);
        assert!(!second.success);
        assert_eq!(
            second.errors,
            vec![
                "Cannot share with yourself.".to_string(),
                "User 'carol' is not verified.".to_string(),
                "Already shared with 'Bob'.".to_string(),
            ]
        );
        assert_eq!(fx.store.all_shares().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_user_id_target_is_reported_by_id() {
        let fx = fixture().await;
        let image = fx.store.seed_image(fx.alice.id, None).await;
        let ghost = UserID::new();

        let outcome = fx
            .sharing
            .share_item(
                &SharedItem::Image(image),
                fx.alice.id,
                &[ShareTarget::Id(ghost), ShareTarget::Id(fx.bob.id)],
                Some("  look  ".into()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.errors, vec![format!("User with ID {ghost} not found.")]);
        assert_eq!(outcome.shared_count, 1);
        assert_eq!(fx.store.all_shares().await[0].message.as_deref(), Some("look"));
    }

    #[tokio::test]
    async fn id_target_lookup_failure_names_the_id() {
        let fx = fixture().await;
        let image = fx.store.seed_image(fx.alice.id, None).await;
        fx.store.fail_next_user_lookup().await;

        let outcome = fx
            .sharing
            .share_item(
                &SharedItem::Image(image),
                fx.alice.id,
                &[ShareTarget::Id(fx.bob.id)],
                None,
            )
            .await
            .unwrap();

        assert_eq!(
            outcome.errors,
            vec![format!("Error sharing with user ID {}: user lookup failed", fx.bob.id)]
        );
        assert_eq!(outcome.shared_count, 0);
    }

    #[tokio::test]
    async fn insert_conflict_is_reported_as_already_shared() {
        let fx = fixture().await;
        let image = fx.store.seed_image(fx.alice.id, None).await;
        fx.store.fail_next_share_insert_with_conflict().await;

        let outcome = fx
            .sharing
            .share_item(&SharedItem::Image(image), fx.alice.id, &names("bob"), None)
            .await
            .unwrap();

        assert_eq!(outcome.errors, vec!["Already shared with 'bob'.".to_string()]);
        assert_eq!(outcome.shared_count, 0);
    }

    #[tokio::test]
    async fn image_access_covers_owner_share_and_public_album() {
        let fx = fixture().await;
        let carol = fx.store.seed_user("carol", true).await;
        let private = fx.store.seed_image(fx.alice.id, None).await;
        let public_album = fx.store.seed_album(fx.alice.id, true).await;
        let public = fx.store.seed_image(fx.alice.id, Some(public_album.id)).await;

        assert!(fx.sharing.can_access_image(&private, fx.alice.id).await.unwrap());
        assert!(!fx.sharing.can_access_image(&private, fx.bob.id).await.unwrap());
        assert!(fx.sharing.can_access_image(&public, carol.id).await.unwrap());

        fx.sharing
            .share_item(&SharedItem::Image(private.clone()), fx.alice.id, &names("bob"), None)
            .await
            .unwrap();
        assert!(fx.sharing.can_access_image(&private, fx.bob.id).await.unwrap());
        assert!(!fx.sharing.can_access_image(&private, carol.id).await.unwrap());
    }

    #[tokio::test]
    async fn album_share_does_not_grant_its_images() {
        let fx = fixture().await;
        let album = fx.store.seed_album(fx.alice.id, false).await;
        let image = fx.store.seed_image(fx.alice.id, Some(album.id)).await;

        fx.sharing
            .share_item(&SharedItem::Album(album.clone()), fx.alice.id, &names("bob"), None)
            .await
            .unwrap();

        assert!(fx.sharing.can_access_album(&album, fx.bob.id).await.unwrap());
        assert!(!fx.sharing.can_access_image(&image, fx.bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn remove_share_requires_a_party() {
        let fx = fixture().await;
        let carol = fx.store.seed_user("carol", true).await;
        let image = fx.store.seed_image(fx.alice.id, None).await;
        fx.sharing
            .share_item(&SharedItem::Image(image), fx.alice.id, &names("bob"), None)
            .await
            .unwrap();
        let share = fx.store.all_shares().await.remove(0);

        let err = fx.sharing.remove_share(&share, carol.id).await.unwrap_err();
        assert!(matches!(err, ImageShareError::AccessDenied(_)));

        assert!(fx.sharing.remove_share(&share, fx.bob.id).await.unwrap());
        assert!(fx.store.all_shares().await.is_empty());
    }

    #[tokio::test]
    async fn user_search_needs_two_characters_and_skips_self_and_unverified() {
        let fx = fixture().await;
        fx.store.seed_user("bobby", false).await;

        assert!(fx.sharing.search_users(fx.alice.id, "b").await.unwrap().is_empty());
        let found = fx.sharing.search_users(fx.alice.id, "bo").await.unwrap();
        assert_eq!(found.iter().map(|u| u.username.as_str()).collect::<Vec<_>>(), ["bob"]);

        let available = fx.sharing.available_users(fx.bob.id).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, fx.alice.id);
        assert!(fx.alice.has_role(UserRole::User));
    }

    #[tokio::test]
    async fn recipients_and_listings() {
        let fx = fixture().await;
        let carol = fx.store.seed_user("carol", true).await;
        let image = fx.store.seed_image(fx.alice.id, None).await;
        let item = SharedItem::Image(image.clone());
        fx.sharing
            .share_item(&item, fx.alice.id, &names("bob, carol"), None)
            .await
            .unwrap();

        let recipients = fx.sharing.recipients(item.item_ref()).await.unwrap();
        let usernames: Vec<_> = recipients.iter().map(|r| r.user.username.clone()).collect();
        assert_eq!(usernames, ["bob", "carol"]);

        assert_eq!(fx.sharing.shares_sent(fx.alice.id).await.unwrap().len(), 2);
        let received = fx
            .sharing
            .shares_received(carol.id, Pagination::default())
            .await
            .unwrap();
        assert_eq!(received.total, 1);
        assert!(
            fx.sharing
                .find_share_for(item.item_ref(), fx.bob.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn owner_revokes_one_recipient() {
        let fx = fixture().await;
        let carol = fx.store.seed_user("carol", true).await;
        let album = fx.store.seed_album(fx.alice.id, false).await;
        let item = SharedItem::Album(album);
        fx.sharing
            .share_item(&item, fx.alice.id, &names("bob, carol"), None)
            .await
            .unwrap();

        let err = fx
            .sharing
            .revoke_recipient(&item, fx.bob.id, carol.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ImageShareError::AccessDenied(_)));

        fx.sharing
            .revoke_recipient(&item, fx.alice.id, fx.bob.id)
            .await
            .unwrap();
        let left = fx.store.all_shares().await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].shared_with, carol.id);

        let err = fx
            .sharing
            .revoke_recipient(&item, fx.alice.id, fx.bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ImageShareError::NotFound(_)));
    }
}
