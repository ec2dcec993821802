use std::{fmt, sync::Arc};

use chrono::Duration;
use imageshare_core::{
    access::SharingService,
    admin::AdminService,
    accounts::{AccountService, AccountSettings},
    application::unit_of_work::AppUnitOfWork,
    auth::AuthCrypto,
    comments::CommentService,
    content::{AlbumService, DashboardService, ImageService},
    database::PostgresDatabase,
    mail::Mailer,
    storage::ImageStorage,
};

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub unit_of_work: Arc<AppUnitOfWork>,
    /// Absent when the stores are in memory
    pub postgres: Option<Arc<PostgresDatabase>>,
    pub accounts: Arc<AccountService>,
    pub sharing: Arc<SharingService>,
    pub images: Arc<ImageService>,
    pub albums: Arc<AlbumService>,
    pub comments: Arc<CommentService>,
    pub dashboard: Arc<DashboardService>,
    pub admin: Arc<AdminService>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("postgres", &self.postgres.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        unit_of_work: Arc<AppUnitOfWork>,
        crypto: Arc<AuthCrypto>,
        mailer: Arc<dyn Mailer>,
        storage: Arc<dyn ImageStorage>,
    ) -> Self {
        let uow = unit_of_work.as_ref();
        let settings = AccountSettings {
            frontend_url: config.frontend_url.clone(),
            session_ttl: Duration::hours(config.session_ttl_hours),
            ..AccountSettings::default()
        };

        Self {
            accounts: Arc::new(AccountService::new(uow, crypto, mailer).with_settings(settings)),
            sharing: Arc::new(SharingService::new(uow)),
            images: Arc::new(
                ImageService::new(uow, storage).with_max_upload_bytes(config.max_upload_bytes),
            ),
            albums: Arc::new(AlbumService::new(uow)),
            comments: Arc::new(CommentService::new(uow)),
            dashboard: Arc::new(DashboardService::new(uow)),
            admin: Arc::new(AdminService::new(uow)),
            postgres: None,
            unit_of_work,
            config,
        }
    }

    pub fn with_postgres(mut self, postgres: Arc<PostgresDatabase>) -> Self {
        self.postgres = Some(postgres);
        self
    }
}
