//! Account overview for administrators and role management.

use std::{any::type_name_of_val, fmt, sync::Arc};

use imageshare_model::{
    Album, Image, Page, Pagination, SharedItemKind, User, UserID, UserRole,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    application::AppUnitOfWork,
    database::ports::{
        albums::AlbumsRepository, images::ImagesRepository, shares::SharesRepository,
        users::UsersRepository,
    },
    error::{ImageShareError, Result},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    pub total_images: u64,
    pub total_albums: u64,
    /// Image shares the user has sent
    pub shared_images: u64,
    /// Album shares the user has sent
    pub shared_albums: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserOverview {
    pub user: User,
    pub stats: ContentStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    pub user: User,
    pub images: Page<Image>,
    pub albums: Page<Album>,
}

#[derive(Clone)]
pub struct AdminService {
    users: Arc<dyn UsersRepository>,
    images: Arc<dyn ImagesRepository>,
    albums: Arc<dyn AlbumsRepository>,
    shares: Arc<dyn SharesRepository>,
}

impl fmt::Debug for AdminService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminService")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .finish_non_exhaustive()
    }
}

fn require_admin(user: &User) -> Result<()> {
    if user.has_role(UserRole::Admin) {
        return Ok(());
    }
    Err(ImageShareError::AccessDenied("Admin access required.".into()))
}

impl AdminService {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            users: uow.users.clone(),
            images: uow.images.clone(),
            albums: uow.albums.clone(),
            shares: uow.shares.clone(),
        }
    }

    /// Every account with its content counts.
    pub async fn user_overviews(&self, admin: &User) -> Result<Vec<UserOverview>> {
        require_admin(admin)?;
        let users = self.users.list_all().await?;
        let mut overviews = Vec::with_capacity(users.len());
        for user in users {
            let stats = self.stats(user.id).await?;
            overviews.push(UserOverview { user, stats });
        }
        Ok(overviews)
    }

    async fn stats(&self, user: UserID) -> Result<ContentStats> {
        let (total_images, total_albums, sent) = tokio::try_join!(
            self.images.count_by_owner(user),
            self.albums.count_by_owner(user),
            self.shares.list_sent(user),
        )?;
        let mut stats = ContentStats {
            total_images,
            total_albums,
            ..Default::default()
        };
        for share in sent {
            match share.item.kind() {
                SharedItemKind::Image => stats.shared_images += 1,
                SharedItemKind::Album => stats.shared_albums += 1,
            }
        }
        Ok(stats)
    }

    /// One account with a page of its images and albums.
    pub async fn user_detail(
        &self,
        admin: &User,
        id: UserID,
        page: Pagination,
    ) -> Result<UserDetail> {
        require_admin(admin)?;
        let user = self
            .users
            .get_by_id(id)
            .await?
            .ok_or_else(|| ImageShareError::NotFound("User not found".into()))?;
        let (images, albums) = tokio::try_join!(
            self.images.list_by_owner(id, page),
            self.albums.list_by_owner(id, page),
        )?;
        Ok(UserDetail {
            user,
            images,
            albums,
        })
    }

    /// Grant or revoke the admin role. Operator tooling, so no caller check.
    #[instrument(skip(self))]
    pub async fn set_admin(&self, username: &str, admin: bool) -> Result<User> {
        let user = self
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| ImageShareError::NotFound(format!("User '{username}' not found.")))?;

        let mut roles: Vec<UserRole> = user
            .roles
            .iter()
            .copied()
            .filter(|role| *role != UserRole::Admin)
            .collect();
        if !roles.contains(&UserRole::User) {
            roles.insert(0, UserRole::User);
        }
        if admin {
            roles.push(UserRole::Admin);
        }

        let updated = self.users.set_roles(user.id, &roles).await?;
        info!(user_id = %updated.id, admin, "admin role updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use imageshare_model::{ShareTarget, SharedItem};

    use super::*;
    use crate::{access::SharingService, testing::MemoryStore};

    #[tokio::test]
    async fn overview_counts_content_and_sent_shares() {
        let store = MemoryStore::new();
        let uow = store.unit_of_work();
        let admin_service = AdminService::new(&uow);
        let sharing = SharingService::new(&uow);
        let root = store.seed_user("root", true).await;
        let alice = store.seed_user("alice", true).await;
        store.seed_user("bob", true).await;
        let root = admin_service.set_admin(&root.username, true).await.unwrap();

        let album = store.seed_album(alice.id, false).await;
        let image = store.seed_image(alice.id, Some(album.id)).await;
        store.seed_image(alice.id, None).await;
        let bob = [ShareTarget::Username("bob".into())];
        sharing
            .share_item(&SharedItem::Image(image), alice.id, &bob, None)
            .await
            .unwrap();
        sharing
            .share_item(&SharedItem::Album(album), alice.id, &bob, None)
            .await
            .unwrap();

        let err = admin_service.user_overviews(&alice).await.unwrap_err();
        assert!(matches!(err, ImageShareError::AccessDenied(_)));

        let overviews = admin_service.user_overviews(&root).await.unwrap();
        let names: Vec<_> = overviews.iter().map(|o| o.user.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob", "root"]);
        assert_eq!(
            overviews[0].stats,
            ContentStats {
                total_images: 2,
                total_albums: 1,
                shared_images: 1,
                shared_albums: 1,
            }
        );
        assert_eq!(overviews[1].stats, ContentStats::default());
    }

    #[tokio::test]
    async fn detail_is_admin_only_and_reports_unknown_users() {
        let store = MemoryStore::new();
        let admin_service = AdminService::new(&store.unit_of_work());
        let alice = store.seed_user("alice", true).await;
        store.seed_user("root", true).await;
        let root = admin_service.set_admin("root", true).await.unwrap();
        store.seed_album(alice.id, true).await;
        store.seed_image(alice.id, None).await;

        let err = admin_service
            .user_detail(&alice, root.id, Pagination::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ImageShareError::AccessDenied(_)));

        let detail = admin_service
            .user_detail(&root, alice.id, Pagination::default())
            .await
            .unwrap();
        assert_eq!(detail.user.id, alice.id);
        assert_eq!(detail.images.total, 1);
        assert_eq!(detail.albums.total, 1);

        let err = admin_service
            .user_detail(&root, UserID::new(), Pagination::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ImageShareError::NotFound(msg) if msg == "User not found"));
    }

    #[tokio::test]
    async fn admin_role_is_granted_once_and_revoked() {
        let store = MemoryStore::new();
        let admin_service = AdminService::new(&store.unit_of_work());
        store.seed_user("alice", true).await;

        admin_service.set_admin("alice", true).await.unwrap();
        let granted = admin_service.set_admin("Alice", true).await.unwrap();
        assert_eq!(granted.roles, vec![UserRole::User, UserRole::Admin]);

        let revoked = admin_service.set_admin("alice", false).await.unwrap();
        assert_eq!(revoked.roles, vec![UserRole::User]);

        let err = admin_service.set_admin("ghost", true).await.unwrap_err();
        assert!(matches!(err, ImageShareError::NotFound(_)));
    }
}
