//! # ImageShare Core
//!
//! Domain services, repository ports and PostgreSQL adapters for the
//! ImageShare backend.
//!
//! ## Overview
//!
//! - [`access`]: who may view, comment on and share an image or album.
//!   Every ownership and share check lives here.
//! - [`admin`]: per-user content overview for administrators
//! - [`accounts`]: registration, email verification, sessions, password
//!   resets and profiles
//! - [`content`]: image uploads and albums
//! - [`comments`]: comments on images and on shares
//! - [`database`]: repository ports and their Postgres implementations
//!
//! ## Feature Flags
//!
//! - `test-utils`: in-memory repositories and a recording mailer
//! - `e2e`: tests that require a running PostgreSQL

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod access;
pub mod admin;
pub mod accounts;
pub mod api_routes;
pub mod api_types;
pub mod application;
pub mod auth;
pub mod comments;
pub mod content;
pub mod database;
pub mod error;
pub mod mail;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{ImageShareError, Result};
pub use imageshare_model as model;

/// Embedded schema migrations, applied at startup and by `#[sqlx::test]`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
