pub mod admin;
pub mod albums;
pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod health;
pub mod images;
pub mod shares;
pub mod users;
