//! PostgreSQL adapters implementing the database ports.

pub mod repositories;

pub use repositories::albums::PostgresAlbumsRepository;
pub use repositories::comments::PostgresCommentsRepository;
pub use repositories::images::PostgresImagesRepository;
pub use repositories::shares::PostgresSharesRepository;
pub use repositories::user_tokens::PostgresUserTokensRepository;
pub use repositories::users::PostgresUsersRepository;
