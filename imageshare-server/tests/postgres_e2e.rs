#![cfg(feature = "e2e")]

use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::http::StatusCode;
use axum_test::TestServer;
use imageshare_core::{
    api_routes::{fill, v1},
    application::unit_of_work::AppUnitOfWork,
    auth::AuthCrypto,
    database::postgres::PostgresDatabase,
    storage::LocalImageStorage,
    testing::RecordingMailer,
};
use imageshare_server::{AppState, create_app};
use serde_json::{Value, json};
use sqlx::PgPool;

#[path = "support/mod.rs"]
mod support;
use support::{PNG, bearer, test_config};

struct PgApp {
    server: TestServer,
    mailer: Arc<RecordingMailer>,
    _uploads: tempfile::TempDir,
}

fn build_pg_app(pool: PgPool) -> Result<PgApp> {
    let uploads = tempfile::tempdir()?;
    let config = test_config(&uploads)?;
    let db = Arc::new(PostgresDatabase::from_pool(pool));
    let mailer = RecordingMailer::new();
    let crypto = Arc::new(
        AuthCrypto::insecure_fast(
            config.auth_password_pepper.as_bytes(),
            config.auth_token_key.as_bytes(),
        )
        .map_err(|err| anyhow!("failed to build crypto: {err}"))?,
    );

    let state = AppState::new(
        Arc::new(config),
        Arc::new(AppUnitOfWork::from_postgres(&db)),
        crypto,
        mailer.clone(),
        Arc::new(LocalImageStorage::new(uploads.path())),
    )
    .with_postgres(db);
    let server = TestServer::new(create_app(state)).map_err(|err| anyhow!(err.to_string()))?;

    Ok(PgApp {
        server,
        mailer,
        _uploads: uploads,
    })
}

async fn register_and_login(app: &PgApp, username: &str) -> Result<String> {
    let email = format!("{username}@example.com");
    let response = app
        .server
        .post(v1::auth::REGISTER)
        .json(&json!({ "email": email, "username": username, "password": "correct horse battery" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let user_id = response.json::<Value>()["data"]["id"]
        .as_str()
        .ok_or_else(|| anyhow!("user id missing"))?
        .to_string();
    let token = app
        .mailer
        .verification_token(&email)
        .await
        .ok_or_else(|| anyhow!("no verification mail"))?;
    app.server
        .post(v1::auth::VERIFY_EMAIL)
        .json(&json!({ "user_id": user_id, "token": token }))
        .await
        .assert_status_ok();

    let response = app
        .server
        .post(v1::auth::LOGIN)
        .json(&json!({ "email": email, "password": "correct horse battery" }))
        .await;
    response.assert_status_ok();
    Ok(response.json::<Value>()["data"]["token"]
        .as_str()
        .ok_or_else(|| anyhow!("token missing"))?
        .to_string())
}

#[sqlx::test(migrator = "imageshare_core::MIGRATOR")]
async fn share_image_with_bob_and_ghost(pool: PgPool) -> Result<()> {
    let app = build_pg_app(pool)?;
    let alice = register_and_login(&app, "alice").await?;
    let bob = register_and_login(&app, "bob").await?;

    let form = axum_test::multipart::MultipartForm::new()
        .add_text("title", "Harbour")
        .add_part(
            "image",
            axum_test::multipart::Part::bytes(PNG.to_vec())
                .file_name("harbour.png")
                .mime_type("image/png"),
        );
    let response = app
        .server
        .post(v1::images::COLLECTION)
        .add_header("Authorization", bearer(&alice))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::CREATED);
    let image_id = response.json::<Value>()["data"]["id"]
        .as_str()
        .ok_or_else(|| anyhow!("image id missing"))?
        .to_string();
    let image_path = fill(v1::images::ITEM, &[("id", image_id.as_str())]);

    app.server
        .get(&image_path)
        .add_header("Authorization", bearer(&bob))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .post(&fill(v1::images::SHARES, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&alice))
        .json(&json!({ "usernames": "bob, ghost", "message": "look" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["shared_count"], 1);
    assert_eq!(body["data"]["errors"], json!(["User 'ghost' not found."]));

    app.server
        .get(&image_path)
        .add_header("Authorization", bearer(&bob))
        .await
        .assert_status_ok();

    let response = app
        .server
        .get(v1::shares::RECEIVED)
        .add_header("Authorization", bearer(&bob))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["message"], "look");
    Ok(())
}

#[sqlx::test(migrator = "imageshare_core::MIGRATOR")]
async fn health_reports_database_ok(pool: PgPool) -> Result<()> {
    let app = build_pg_app(pool)?;
    let response = app.server.get(v1::HEALTH).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["database"], "ok");
    Ok(())
}
