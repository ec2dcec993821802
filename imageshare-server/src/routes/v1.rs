use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    auth::require_auth,
    handlers::{admin, albums, auth, comments, dashboard, health, images, shares, users},
};

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create all v1 API routes. Paths are relative to `/api/v1`.
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Public authentication endpoints
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/resend-verification", post(auth::resend_verification))
        .route("/auth/password/reset", post(auth::request_password_reset))
        .route(
            "/auth/password/reset/confirm",
            post(auth::confirm_password_reset),
        )
        .merge(create_protected_routes(state))
}

/// Routes that require a bearer session
fn create_protected_routes(state: AppState) -> Router<AppState> {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/auth/logout", post(auth::logout))
        // Users
        .route(
            "/users/me/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/users/me/status", post(users::set_status))
        .route("/users/available", get(users::available_users))
        .route("/users/search", get(users::search_users))
        .route("/users/online", get(users::online_users))
        .route("/users/{username}/profile", get(users::public_profile))
        .route("/dashboard/stats", get(dashboard::stats))
        // Images
        .route(
            "/images",
            get(images::list_images)
                .post(images::upload_image)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/images/{id}",
            get(images::get_image)
                .put(images::update_image)
                .delete(images::delete_image),
        )
        .route("/images/unassigned", get(images::unassigned_images))
        .route("/images/{id}/file", get(images::serve_image_file))
        .route(
            "/images/{id}/shares",
            get(images::image_recipients).post(images::share_image),
        )
        .route(
            "/images/{id}/shares/{user_id}",
            delete(images::revoke_image_share),
        )
        .route(
            "/images/{id}/comments",
            get(comments::image_comments).post(comments::add_image_comment),
        )
        // Albums
        .route(
            "/albums",
            get(albums::list_albums).post(albums::create_album),
        )
        .route(
            "/albums/{id}",
            get(albums::get_album)
                .put(albums::update_album)
                .delete(albums::delete_album),
        )
        .route(
            "/albums/{id}/images",
            get(albums::album_images).put(albums::set_album_images),
        )
        .route(
            "/albums/{id}/shares",
            get(albums::album_recipients).post(albums::share_album),
        )
        .route(
            "/albums/{id}/shares/{user_id}",
            delete(albums::revoke_album_share),
        )
        .route(
            "/albums/{id}/images/{image_id}/file",
            get(albums::serve_album_image_file),
        )
        // Shares
        .route("/shares/received", get(shares::received))
        .route("/shares/sent", get(shares::sent))
        .route("/shares/{id}", delete(shares::remove_share))
        .route(
            "/shares/{id}/comments",
            get(comments::share_comments).post(comments::add_share_comment),
        )
        // Comments
        .route("/comments", get(comments::visible_comments))
        .route(
            "/comments/{id}",
            put(comments::edit_comment).delete(comments::delete_comment),
        )
        // Administration
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}", get(admin::user_detail))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
