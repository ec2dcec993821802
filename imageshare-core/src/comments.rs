//! Comments on images and on share grants.

use std::{any::type_name_of_val, fmt, sync::Arc};

use chrono::Utc;
use imageshare_model::{Comment, CommentID, CommentTarget, ImageID, ShareID, UserID};
use tracing::{debug, info, instrument};

use crate::{
    access::SharingService,
    application::AppUnitOfWork,
    database::ports::comments::CommentsRepository,
    error::{ImageShareError, Result},
};

const MAX_COMMENT_CHARS: usize = 2000;

fn comment_body(raw: &str) -> Result<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ImageShareError::Validation("Comment cannot be empty.".into()));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(ImageShareError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters."
        )));
    }
    Ok(content.to_string())
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentsRepository>,
    sharing: SharingService,
}

impl fmt::Debug for CommentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentService")
            .field("comments", &type_name_of_val(self.comments.as_ref()))
            .field("sharing", &self.sharing)
            .finish()
    }
}

impl CommentService {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            comments: uow.comments.clone(),
            sharing: SharingService::new(uow),
        }
    }

    async fn insert(&self, author: UserID, target: CommentTarget, raw: &str) -> Result<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: CommentID::new(),
            content: comment_body(raw)?,
            author_id: author,
            target,
            created_at: now,
            updated_at: now,
        };
        let comment = self.comments.insert(&comment).await?;
        info!(comment_id = %comment.id, author = %author, "comment added");
        Ok(comment)
    }

    #[instrument(skip(self, content))]
    pub async fn add_to_image(
        &self,
        image: ImageID,
        author: UserID,
        content: &str,
    ) -> Result<Comment> {
        let image = self.sharing.accessible_image(image, author).await?;
        self.insert(author, CommentTarget::Image(image.id), content).await
    }

    #[instrument(skip(self, content))]
    pub async fn add_to_share(
        &self,
        share: ShareID,
        author: UserID,
        content: &str,
    ) -> Result<Comment> {
        let share = self.sharing.load_share(share).await?;
        if !self.sharing.can_comment_on_share(&share, author) {
            return Err(ImageShareError::AccessDenied(
                "You cannot comment on this share.".into(),
            ));
        }
        self.insert(author, CommentTarget::Share(share.id), content).await
    }

    async fn authored(&self, id: CommentID, user: UserID) -> Result<Comment> {
        let comment = self
            .comments
            .get(id)
            .await?
            .ok_or_else(|| ImageShareError::NotFound(format!("Comment {id} not found.")))?;
        if !comment.is_authored_by(user) {
            return Err(ImageShareError::AccessDenied(
                "You can only change your own comments.".into(),
            ));
        }
        Ok(comment)
    }

    pub async fn edit(&self, id: CommentID, user: UserID, content: &str) -> Result<Comment> {
        let comment = self.authored(id, user).await?;
        let content = comment_body(content)?;
        self.comments
            .update_content(comment.id, &content, Utc::now())
            .await
    }

    pub async fn delete(&self, id: CommentID, user: UserID) -> Result<()> {
        let comment = self.authored(id, user).await?;
        self.comments.delete(comment.id).await?;
        debug!(comment_id = %comment.id, "comment deleted");
        Ok(())
    }

    /// Comments on an image the caller can see, oldest first.
    pub async fn for_image(&self, image: ImageID, user: UserID) -> Result<Vec<Comment>> {
        let image = self.sharing.accessible_image(image, user).await?;
        let comments = self.comments.list_for_image(image.id).await?;
        Ok(comments
            .into_iter()
            .filter(|c| self.sharing.comment_visible_to(c, image.owner_id, user))
            .collect())
    }

    pub async fn for_share(&self, share: ShareID, user: UserID) -> Result<Vec<Comment>> {
        let share = self.sharing.load_share(share).await?;
        if !share.involves(user) {
            return Err(ImageShareError::AccessDenied(
                "You are not part of this share.".into(),
            ));
        }
        let item_owner = self.sharing.load_item(share.item).await?.owner_id();
        let comments = self.comments.list_for_share(share.id).await?;
        Ok(comments
            .into_iter()
            .filter(|c| self.sharing.comment_visible_to(c, item_owner, user))
            .collect())
    }

    /// Comments the user wrote or that sit on their content, newest first.
    pub async fn visible_to(&self, user: UserID, limit: u32) -> Result<Vec<Comment>> {
        self.comments.list_visible_to(user, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use imageshare_model::{Share, ShareTarget, SharedItem, User};

    struct Fixture {
        store: Arc<MemoryStore>,
        comments: CommentService,
        alice: User,
        bob: User,
        mallory: User,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let comments = CommentService::new(&store.unit_of_work());
        Fixture {
            alice: store.seed_user("alice", true).await,
            bob: store.seed_user("bob", true).await,
            mallory: store.seed_user("mallory", true).await,
            comments,
            store,
        }
    }

    async fn share_with_bob(fx: &Fixture, item: SharedItem) -> Share {
        let sharing = SharingService::new(&fx.store.unit_of_work());
        sharing
            .share_item(&item, fx.alice.id, &[ShareTarget::Id(fx.bob.id)], None)
            .await
            .unwrap();
        fx.store.all_shares().await.pop().unwrap()
    }

    #[tokio::test]
    async fn blank_comment_is_rejected() {
        let fx = fixture().await;
        let image = fx.store.seed_image(fx.alice.id, None).await;
        let err = fx
            .comments
            .add_to_image(image.id, fx.alice.id, "   \n")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ImageShareError::Validation(msg) if msg == "Comment cannot be empty."
        ));
    }

    #[tokio::test]
    async fn image_comments_require_access() {
        let fx = fixture().await;
        let image = fx.store.seed_image(fx.alice.id, None).await;

        assert!(matches!(
            fx.comments.add_to_image(image.id, fx.mallory.id, "hi").await,
            Err(ImageShareError::AccessDenied(_))
        ));

        share_with_bob(&fx, SharedItem::Image(image.clone())).await;
        let comment = fx
            .comments
            .add_to_image(image.id, fx.bob.id, "  lovely  ")
            .await
            .unwrap();
        assert_eq!(comment.content, "lovely");

        // Owner sees the recipient's comment.
        let seen = fx.comments.for_image(image.id, fx.alice.id).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert!(fx.comments.for_image(image.id, fx.mallory.id).await.is_err());
    }

    #[tokio::test]
    async fn public_album_viewer_only_sees_own_comments() {
        let fx = fixture().await;
        let album = fx.store.seed_album(fx.alice.id, true).await;
        let image = fx.store.seed_image(fx.alice.id, Some(album.id)).await;

        fx.comments.add_to_image(image.id, fx.bob.id, "from bob").await.unwrap();
        fx.comments
            .add_to_image(image.id, fx.mallory.id, "from mallory")
            .await
            .unwrap();

        let for_mallory = fx.comments.for_image(image.id, fx.mallory.id).await.unwrap();
        assert_eq!(for_mallory.len(), 1);
        assert_eq!(for_mallory[0].content, "from mallory");
        assert_eq!(fx.comments.for_image(image.id, fx.alice.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn share_comments_are_limited_to_participants() {
        let fx = fixture().await;
        let album = fx.store.seed_album(fx.alice.id, false).await;
        let share = share_with_bob(&fx, SharedItem::Album(album)).await;

        fx.comments.add_to_share(share.id, fx.bob.id, "thanks!").await.unwrap();
        fx.comments.add_to_share(share.id, fx.alice.id, "enjoy").await.unwrap();
        assert!(matches!(
            fx.comments.add_to_share(share.id, fx.mallory.id, "me too").await,
            Err(ImageShareError::AccessDenied(_))
        ));

        let thread = fx.comments.for_share(share.id, fx.alice.id).await.unwrap();
        let bodies: Vec<&str> = thread.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(bodies, ["thanks!", "enjoy"]);

        // Bob is not the item owner, so he sees only his own comment.
        let thread = fx.comments.for_share(share.id, fx.bob.id).await.unwrap();
        assert_eq!(thread.len(), 1);
        assert!(fx.comments.for_share(share.id, fx.mallory.id).await.is_err());
    }

    #[tokio::test]
    async fn only_author_edits_or_deletes() {
        let fx = fixture().await;
        let image = fx.store.seed_image(fx.alice.id, None).await;
        let comment = fx
            .comments
            .add_to_image(image.id, fx.alice.id, "first")
            .await
            .unwrap();

        assert!(matches!(
            fx.comments.edit(comment.id, fx.bob.id, "hijack").await,
            Err(ImageShareError::AccessDenied(_))
        ));
        let edited = fx.comments.edit(comment.id, fx.alice.id, "second").await.unwrap();
        assert_eq!(edited.content, "second");

        assert!(fx.comments.delete(comment.id, fx.bob.id).await.is_err());
        fx.comments.delete(comment.id, fx.alice.id).await.unwrap();
        assert!(fx.store.all_comments().await.is_empty());

        let recent = fx.comments.visible_to(fx.alice.id, 5).await.unwrap();
        assert!(recent.is_empty());
    }
}
