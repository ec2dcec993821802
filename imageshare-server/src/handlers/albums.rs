use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use imageshare_core::api_types::{
    ApiResponse, CreateAlbumRequest, PageQuery, RecipientResponse, SetAlbumImagesRequest,
    ShareRequest, UpdateAlbumRequest,
};
use imageshare_model::{
    Album, AlbumID, Image, ImageID, Page, ShareOutcome, ShareTarget, SharedItem, SharedItemRef,
    User, UserID,
};

use super::images::file_response;
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list_albums(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Page<Album>>>> {
    let page = state.albums.list_owned(user.id, query.into()).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn create_album(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAlbumRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Album>>)> {
    let album = state.albums.create(user.id, request.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(album))))
}

pub async fn get_album(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<AlbumID>,
) -> AppResult<Json<ApiResponse<Album>>> {
    let album = state.albums.get(id, user.id).await?;
    Ok(Json(ApiResponse::success(album)))
}

pub async fn update_album(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<AlbumID>,
    Json(request): Json<UpdateAlbumRequest>,
) -> AppResult<Json<ApiResponse<Album>>> {
    let album = state.albums.update(id, user.id, request.into()).await?;
    Ok(Json(ApiResponse::success(album)))
}

pub async fn delete_album(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<AlbumID>,
) -> AppResult<StatusCode> {
    state.albums.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn album_images(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<AlbumID>,
) -> AppResult<Json<ApiResponse<Vec<Image>>>> {
    let images = state.albums.album_images(id, user.id).await?;
    Ok(Json(ApiResponse::success(images)))
}

pub async fn set_album_images(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<AlbumID>,
    Json(request): Json<SetAlbumImagesRequest>,
) -> AppResult<Json<ApiResponse<Vec<Image>>>> {
    let images = state
        .albums
        .set_images(id, user.id, &request.image_ids)
        .await?;
    Ok(Json(ApiResponse::success(images)))
}

pub async fn share_album(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<AlbumID>,
    Json(request): Json<ShareRequest>,
) -> AppResult<Json<ApiResponse<ShareOutcome>>> {
    let album = state.sharing.load_album(id).await?;
    let targets = ShareTarget::parse_usernames(&request.usernames);
    let outcome = state
        .sharing
        .share_item(&SharedItem::Album(album), user.id, &targets, request.message)
        .await?;
    let message = format!("Album shared with {} user(s).", outcome.shared_count);
    Ok(Json(ApiResponse::success(outcome).with_message(message)))
}

pub async fn album_recipients(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<AlbumID>,
) -> AppResult<Json<ApiResponse<Vec<RecipientResponse>>>> {
    let album = state.sharing.load_album(id).await?;
    state
        .sharing
        .ensure_owner(&SharedItem::Album(album), user.id)?;
    let recipients = state.sharing.recipients(SharedItemRef::Album(id)).await?;
    Ok(Json(ApiResponse::success(
        recipients.into_iter().map(RecipientResponse::from).collect(),
    )))
}

/// Image bytes for anyone who can see the album, including share recipients.
pub async fn serve_album_image_file(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((id, image_id)): Path<(AlbumID, ImageID)>,
) -> AppResult<Response> {
    let file = state.images.open_in_album(id, image_id, user.id).await?;
    Ok(file_response(file))
}

pub async fn revoke_album_share(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((id, recipient)): Path<(AlbumID, UserID)>,
) -> AppResult<StatusCode> {
    let album = state.sharing.load_album(id).await?;
    state
        .sharing
        .revoke_recipient(&SharedItem::Album(album), user.id, recipient)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
