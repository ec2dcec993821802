use std::{any::type_name_of_val, fmt, sync::Arc};

use imageshare_model::{Comment, UserID};
use serde::Serialize;

use crate::{
    application::AppUnitOfWork,
    database::ports::{
        albums::AlbumsRepository, comments::CommentsRepository, images::ImagesRepository,
        shares::SharesRepository,
    },
    error::Result,
};

pub const RECENT_COMMENTS_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_images: u64,
    pub total_albums: u64,
    /// Shares the user has sent
    pub shared_items: u64,
    pub received_shares: u64,
    pub recent_comments: Vec<Comment>,
}

#[derive(Clone)]
pub struct DashboardService {
    images: Arc<dyn ImagesRepository>,
    albums: Arc<dyn AlbumsRepository>,
    shares: Arc<dyn SharesRepository>,
    comments: Arc<dyn CommentsRepository>,
}

impl fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardService")
            .field("comments", &type_name_of_val(self.comments.as_ref()))
            .finish_non_exhaustive()
    }
}

impl DashboardService {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            images: uow.images.clone(),
            albums: uow.albums.clone(),
            shares: uow.shares.clone(),
            comments: uow.comments.clone(),
        }
    }

    pub async fn stats(&self, user: UserID) -> Result<DashboardStats> {
        let (total_images, total_albums, shared_items, received_shares, recent_comments) =
            tokio::try_join!(
                self.images.count_by_owner(user),
                self.albums.count_by_owner(user),
                self.shares.count_sent(user),
                self.shares.count_received(user),
                self.comments.list_visible_to(user, RECENT_COMMENTS_LIMIT),
            )?;

        Ok(DashboardStats {
            total_images,
            total_albums,
            shared_items,
            received_shares,
            recent_comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{access::SharingService, testing::MemoryStore};
    use imageshare_model::{ShareTarget, SharedItem};

    #[tokio::test]
    async fn counts_reflect_owned_content_and_shares() {
        let store = MemoryStore::new();
        let uow = store.unit_of_work();
        let dashboard = DashboardService::new(&uow);
        let sharing = SharingService::new(&uow);
        let alice = store.seed_user("alice", true).await;
        let bob = store.seed_user("bob", true).await;
        store.seed_album(alice.id, false).await;
        let image = store.seed_image(alice.id, None).await;
        store.seed_image(alice.id, None).await;

        sharing
            .share_item(
                &SharedItem::Image(image),
                alice.id,
                &[ShareTarget::Username("bob".into())],
                None,
            )
            .await
            .unwrap();

        let stats = dashboard.stats(alice.id).await.unwrap();
        assert_eq!(
            (stats.total_images, stats.total_albums, stats.shared_items, stats.received_shares),
            (2, 1, 1, 0)
        );

        let stats = dashboard.stats(bob.id).await.unwrap();
        assert_eq!((stats.total_images, stats.received_shares), (0, 1));
        assert!(stats.recent_comments.is_empty());
    }
}
