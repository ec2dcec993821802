use anyhow::Result;
use axum::http::StatusCode;
use imageshare_core::api_routes::{fill, v1};
use serde_json::{Value, json};

#[path = "support/mod.rs"]
mod support;
use support::{bearer, build_test_app};

#[tokio::test]
async fn share_with_bob_and_ghost() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    let bob = app.register_verified("bob").await?;
    let image_id = app.upload_png(&alice, "Harbour").await?;
    let image_path = fill(v1::images::ITEM, &[("id", image_id.as_str())]);

    let response = app
        .server
        .get(&image_path)
        .add_header("Authorization", bearer(&bob.token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "You do not have access to this image.");

    let response = app
        .server
        .post(&fill(v1::images::SHARES, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "usernames": "bob, ghost", "message": "From the trip" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["shared_count"], 1);
    assert_eq!(body["data"]["errors"], json!(["User 'ghost' not found."]));
    assert_eq!(body["data"]["success"], true);

    // Exactly one share, from alice to bob.
    let shares = app.store.all_shares().await;
    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0].shared_by.to_string(), alice.user_id);
    assert_eq!(shares[0].shared_with.to_string(), bob.user_id);

    app.server
        .get(&image_path)
        .add_header("Authorization", bearer(&bob.token))
        .await
        .assert_status_ok();

    let response = app
        .server
        .get(&fill(v1::images::FILE, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&bob.token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/png");
    assert_eq!(response.as_bytes().as_ref(), support::PNG);

    let response = app
        .server
        .get(v1::shares::RECEIVED)
        .add_header("Authorization", bearer(&bob.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["message"], "From the trip");
    Ok(())
}

#[tokio::test]
async fn sharing_twice_is_a_per_target_error() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    app.register_verified("bob").await?;
    let image_id = app.upload_png(&alice, "Pier").await?;
    let path = fill(v1::images::SHARES, &[("id", image_id.as_str())]);

    for _ in 0..2 {
        app.server
            .post(&path)
            .add_header("Authorization", bearer(&alice.token))
            .json(&json!({ "usernames": "bob" }))
            .await
            .assert_status_ok();
    }

    let response = app
        .server
        .post(&path)
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "usernames": "bob, alice" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["shared_count"], 0);
    assert_eq!(
        body["data"]["errors"],
        json!(["Already shared with 'bob'.", "Cannot share with yourself."])
    );
    assert_eq!(app.store.all_shares().await.len(), 1);

    let response = app
        .server
        .get(&path)
        .add_header("Authorization", bearer(&alice.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"][0]["user"]["username"], "bob");
    Ok(())
}

#[tokio::test]
async fn non_owner_share_is_forbidden() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    let mallory = app.register_verified("mallory").await?;
    let image_id = app.upload_png(&alice, "Private").await?;

    let response = app
        .server
        .post(&fill(v1::images::SHARES, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&mallory.token))
        .json(&json!({ "usernames": "ghost" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "You cannot share this image.");

    app.server
        .get(&fill(v1::images::SHARES, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&mallory.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert!(app.store.all_shares().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn only_participants_remove_shares() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    let bob = app.register_verified("bob").await?;
    let mallory = app.register_verified("mallory").await?;

    let response = app
        .server
        .post(v1::albums::COLLECTION)
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "name": "Trip" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let album_id = response.json::<Value>()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    app.server
        .post(&fill(v1::albums::SHARES, &[("id", album_id.as_str())]))
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "usernames": "bob" }))
        .await
        .assert_status_ok();
    let share_id = app.store.all_shares().await[0].id.to_string();
    let share_path = fill(v1::shares::ITEM, &[("id", share_id.as_str())]);

    // Bob and alice can talk on the share; mallory cannot.
    app.server
        .post(&fill(v1::shares::COMMENTS, &[("id", share_id.as_str())]))
        .add_header("Authorization", bearer(&bob.token))
        .json(&json!({ "content": "Thanks!" }))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .get(&fill(v1::shares::COMMENTS, &[("id", share_id.as_str())]))
        .add_header("Authorization", bearer(&mallory.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&share_path)
        .add_header("Authorization", bearer(&mallory.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&share_path)
        .add_header("Authorization", bearer(&bob.token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&fill(v1::albums::ITEM, &[("id", album_id.as_str())]))
        .add_header("Authorization", bearer(&bob.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .delete(&share_path)
        .add_header("Authorization", bearer(&alice.token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn user_search_excludes_self_and_short_queries() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    app.register_verified("bobby").await?;
    app.register_verified("bob").await?;

    let response = app
        .server
        .get(v1::users::SEARCH)
        .add_query_param("q", "bo")
        .add_header("Authorization", bearer(&alice.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let response = app
        .server
        .get(v1::users::SEARCH)
        .add_query_param("q", "b")
        .add_header("Authorization", bearer(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"], json!([]));

    let response = app
        .server
        .get(v1::users::AVAILABLE)
        .add_header("Authorization", bearer(&alice.token))
        .await;
    let body: Value = response.json();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["username"].as_str())
        .collect();
    assert!(!names.contains(&"alice"));
    assert_eq!(names.len(), 2);
    Ok(())
}

#[tokio::test]
async fn album_recipient_loads_images_through_the_album() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    let bob = app.register_verified("bob").await?;
    let carol = app.register_verified("carol").await?;
    let album_id = app.create_album(&alice, "Weekend", false).await?;
    let inside = app.upload_png(&alice, "Dunes").await?;
    let outside = app.upload_png(&alice, "Kitchen").await?;

    app.server
        .put(&fill(v1::albums::IMAGES, &[("id", album_id.as_str())]))
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "image_ids": [inside] }))
        .await
        .assert_status_ok();
    app.server
        .post(&fill(v1::albums::SHARES, &[("id", album_id.as_str())]))
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "usernames": "bob" }))
        .await
        .assert_status_ok();

    let response = app
        .server
        .get(&fill(v1::albums::IMAGES, &[("id", album_id.as_str())]))
        .add_header("Authorization", bearer(&bob.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"][0]["id"], inside.as_str());

    // The image itself was never shared with bob.
    app.server
        .get(&fill(v1::images::FILE, &[("id", inside.as_str())]))
        .add_header("Authorization", bearer(&bob.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let album_file = |image: &str| {
        fill(
            v1::albums::IMAGE_FILE,
            &[("id", album_id.as_str()), ("image_id", image)],
        )
    };
    let response = app
        .server
        .get(&album_file(inside.as_str()))
        .add_header("Authorization", bearer(&bob.token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/png");
    assert_eq!(response.as_bytes().as_ref(), support::PNG);

    app.server
        .get(&album_file(outside.as_str()))
        .add_header("Authorization", bearer(&bob.token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&album_file(inside.as_str()))
        .add_header("Authorization", bearer(&carol.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn owner_revokes_one_recipient() -> Result<()> {
    let app = build_test_app()?;
    let alice = app.register_verified("alice").await?;
    let bob = app.register_verified("bob").await?;
    app.register_verified("carol").await?;
    let image_id = app.upload_png(&alice, "Quay").await?;

    app.server
        .post(&fill(v1::images::SHARES, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&alice.token))
        .json(&json!({ "usernames": "bob, carol" }))
        .await
        .assert_status_ok();

    let revoke = fill(
        v1::images::SHARE_RECIPIENT,
        &[("id", image_id.as_str()), ("user_id", bob.user_id.as_str())],
    );
    app.server
        .delete(&revoke)
        .add_header("Authorization", bearer(&bob.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .delete(&revoke)
        .add_header("Authorization", bearer(&alice.token))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .delete(&revoke)
        .add_header("Authorization", bearer(&alice.token))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .get(&fill(v1::images::ITEM, &[("id", image_id.as_str())]))
        .add_header("Authorization", bearer(&bob.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert_eq!(app.store.all_shares().await.len(), 1);
    Ok(())
}
