#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use axum_test::TestServer;
use imageshare_core::{
    admin::AdminService,
    api_routes::v1,
    auth::AuthCrypto,
    storage::LocalImageStorage,
    testing::{MemoryStore, RecordingMailer},
};
use imageshare_server::{AppState, create_app, infra::config::Config};
use serde_json::{Value, json};
use tempfile::TempDir;

/// Smallest byte sequence `image::guess_format` reads as PNG
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub uploads: TempDir,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn test_config(uploads: &TempDir) -> Result<Config> {
    let upload_dir = uploads.path().display().to_string();
    Config::resolve(None, move |key| match key {
        "UPLOAD_DIR" => Some(upload_dir.clone()),
        "DEV_MODE" => Some("true".into()),
        "AUTH_PASSWORD_PEPPER" => Some("test-pepper".into()),
        "AUTH_TOKEN_KEY" => Some("test-token-key".into()),
        _ => None,
    })
}

pub fn build_test_app() -> Result<TestApp> {
    let uploads = tempfile::tempdir().context("failed to create upload directory")?;
    let config = test_config(&uploads)?;

    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let crypto = Arc::new(
        AuthCrypto::insecure_fast(
            config.auth_password_pepper.as_bytes(),
            config.auth_token_key.as_bytes(),
        )
        .map_err(|err| anyhow!("failed to build crypto: {err}"))?,
    );
    let storage = Arc::new(LocalImageStorage::new(uploads.path()));

    let state = AppState::new(
        Arc::new(config),
        Arc::new(store.unit_of_work()),
        crypto,
        mailer.clone(),
        storage,
    );
    let server = TestServer::new(create_app(state)).map_err(|err| anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        store,
        mailer,
        uploads,
    })
}

impl TestApp {
    /// Register, verify through the captured email, and log in.
    pub async fn register_verified(&self, username: &str) -> Result<Session> {
        let email = format!("{username}@example.com");
        let password = "correct horse battery";

        let response = self
            .server
            .post(v1::auth::REGISTER)
            .json(&json!({
                "email": email,
                "username": username,
                "password": password,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        let user_id = body["data"]["id"]
            .as_str()
            .context("user id missing")?
            .to_string();

        let token = self
            .mailer
            .verification_token(&email)
            .await
            .context("no verification mail captured")?;
        self.server
            .post(v1::auth::VERIFY_EMAIL)
            .json(&json!({ "user_id": user_id, "token": token }))
            .await
            .assert_status_ok();

        let token = self.login(&email, password).await?;
        Ok(Session { token, user_id })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .server
            .post(v1::auth::LOGIN)
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        Ok(body["data"]["token"]
            .as_str()
            .context("token missing")?
            .to_string())
    }

    /// Upload the test PNG and return the image id.
    pub async fn upload_png(&self, session: &Session, title: &str) -> Result<String> {
        use axum_test::multipart::{MultipartForm, Part};

        let form = MultipartForm::new().add_text("title", title).add_part(
            "image",
            Part::bytes(PNG.to_vec())
                .file_name("photo.png")
                .mime_type("image/png"),
        );
        let response = self
            .server
            .post(v1::images::COLLECTION)
            .add_header("Authorization", bearer(&session.token))
            .multipart(form)
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        Ok(body["data"]["id"]
            .as_str()
            .context("image id missing")?
            .to_string())
    }

    pub async fn create_album(
        &self,
        session: &Session,
        name: &str,
        is_public: bool,
    ) -> Result<String> {
        let response = self
            .server
            .post(v1::albums::COLLECTION)
            .add_header("Authorization", bearer(&session.token))
            .json(&json!({ "name": name, "is_public": is_public }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        Ok(body["data"]["id"]
            .as_str()
            .context("album id missing")?
            .to_string())
    }

    /// Same path as the `user grant-admin` command.
    pub async fn grant_admin(&self, username: &str) -> Result<()> {
        AdminService::new(&self.store.unit_of_work())
            .set_admin(username, true)
            .await
            .map_err(|err| anyhow!("failed to grant admin: {err}"))?;
        Ok(())
    }
}
