use anyhow::Result;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use imageshare_core::api_routes::{fill, v1};
use serde_json::{Value, json};

#[path = "support/mod.rs"]
mod support;
use support::{bearer, build_test_app};

#[tokio::test]
async fn upload_list_update_and_delete() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    let image_id = app.upload_png(&alice, "Lighthouse").await?;
    let path = fill(v1::images::ITEM, &[("id", image_id.as_str())]);

    let response = app
        .server
        .get(v1::images::COLLECTION)
        .add_header("Authorization", bearer(&alice.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);
    let filename = body["data"]["items"][0]["filename"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(app.uploads.path().join(&filename).exists());

    let response = app
        .server
        .put(&path)
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "title": "Lighthouse at dusk", "description": "Long exposure" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Lighthouse at dusk");

    app.server
        .delete(&path)
        .add_header("Authorization", bearer(&alice.token))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(!app.uploads.path().join(&filename).exists());
    app.server
        .get(&path)
        .add_header("Authorization", bearer(&alice.token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn non_image_upload_is_rejected() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(b"#!/bin/sh\necho hi\n".to_vec())
            .file_name("evil.png")
            .mime_type("image/png"),
    );
    let response = app
        .server
        .post(v1::images::COLLECTION)
        .add_header("Authorization", bearer(&alice.token))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["error"]["message"],
        "Please upload a valid image (JPEG, PNG, GIF, WEBP)."
    );
    Ok(())
}

#[tokio::test]
async fn public_album_exposes_its_images() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    let carol = app.register_verified("carol").await?;
    let image_id = app.upload_png(&alice, "Market").await?;

    let response = app
        .server
        .post(v1::albums::COLLECTION)
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "name": "Open house", "is_public": true }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let album_id = response.json::<Value>()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let images_path = fill(v1::albums::IMAGES, &[("id", album_id.as_str())]);

    // Carol cannot put her own view into alice's album.
    app.server
        .put(&images_path)
        .add_header("Authorization", bearer(&carol.token))
        .json(&json!({ "image_ids": [image_id] }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&images_path)
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "image_ids": [image_id] }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"][0]["album_is_public"], true);

    let response = app
        .server
        .get(&images_path)
        .add_header("Authorization", bearer(&carol.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"][0]["id"], image_id.as_str());

    app.server
        .get(&fill(v1::images::FILE, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&carol.token))
        .await
        .assert_status_ok();

    // Viewing is not editing.
    app.server
        .delete(&fill(v1::images::ITEM, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&carol.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn comments_and_dashboard() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    let bob = app.register_verified("bob").await?;
    let image_id = app.upload_png(&alice, "Bridge").await?;
    let comments_path = fill(v1::images::COMMENTS, &[("id", image_id.as_str())]);

    app.server
        .post(&comments_path)
        .add_header("Authorization", bearer(&bob.token))
        .json(&json!({ "content": "Can I see?" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .post(&fill(v1::images::SHARES, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "usernames": "bob" }))
        .await
        .assert_status_ok();

    let response = app
        .server
        .post(&comments_path)
        .add_header("Authorization", bearer(&bob.token))
        .json(&json!({ "content": "  Great shot  " }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let comment_id = response.json::<Value>()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    app.server
        .post(&comments_path)
        .add_header("Authorization", bearer(&bob.token))
        .json(&json!({ "content": "   " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let comment_path = fill(v1::comments::ITEM, &[("id", comment_id.as_str())]);
    app.server
        .put(&comment_path)
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "content": "edited by owner" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .get(&comments_path)
        .add_header("Authorization", bearer(&alice.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"][0]["content"], "Great shot");

    let response = app
        .server
        .get(v1::dashboard::STATS)
        .add_header("Authorization", bearer(&alice.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total_images"], 1);
    assert_eq!(body["data"]["shared_items"], 1);
    assert_eq!(body["data"]["recent_comments"][0]["content"], "Great shot");

    let response = app
        .server
        .get(v1::comments::COLLECTION)
        .add_query_param("limit", 10)
        .add_header("Authorization", bearer(&bob.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    app.server
        .delete(&comment_path)
        .add_header("Authorization", bearer(&bob.token))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    Ok(())
}
