use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::{
    infrastructure::postgres::{
        PostgresAlbumsRepository, PostgresCommentsRepository, PostgresImagesRepository,
        PostgresSharesRepository, PostgresUserTokensRepository, PostgresUsersRepository,
    },
    ports::{
        albums::AlbumsRepository, comments::CommentsRepository, images::ImagesRepository,
        shares::SharesRepository, user_tokens::UserTokensRepository, users::UsersRepository,
    },
    postgres::PostgresDatabase,
};

/// Aggregates all repository ports used by application services.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub users: Arc<dyn UsersRepository>,
    pub user_tokens: Arc<dyn UserTokensRepository>,
    pub images: Arc<dyn ImagesRepository>,
    pub albums: Arc<dyn AlbumsRepository>,
    pub shares: Arc<dyn SharesRepository>,
    pub comments: Arc<dyn CommentsRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("user_tokens", &type_name_of_val(self.user_tokens.as_ref()))
            .field("images", &type_name_of_val(self.images.as_ref()))
            .field("albums", &type_name_of_val(self.albums.as_ref()))
            .field("shares", &type_name_of_val(self.shares.as_ref()))
            .field("comments", &type_name_of_val(self.comments.as_ref()))
            .finish()
    }
}

impl AppUnitOfWork {
    /// Compose the Postgres-backed adapters over one shared pool.
    pub fn from_postgres(db: &PostgresDatabase) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(PostgresUsersRepository::new(pool.clone())),
            user_tokens: Arc::new(PostgresUserTokensRepository::new(pool.clone())),
            images: Arc::new(PostgresImagesRepository::new(pool.clone())),
            albums: Arc::new(PostgresAlbumsRepository::new(pool.clone())),
            shares: Arc::new(PostgresSharesRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentsRepository::new(pool)),
        }
    }
}
