use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use imageshare_core::{
    api_types::{
        ApiResponse, PageQuery, RecipientResponse, ShareRequest, UpdateImageRequest,
    },
    content::{StoredFile, UploadImage},
};
use imageshare_model::{
    AlbumID, Image, ImageID, Page, ShareOutcome, ShareTarget, SharedItem, SharedItemRef, User,
    UserID,
};
use tracing::info;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

pub async fn list_images(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Page<Image>>>> {
    let page = state.images.list_owned(user.id, query.into()).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// Multipart fields: `image` (the file), optional `title`, `description` and
/// `album_id`.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<Image>>)> {
    let mut upload = UploadImage {
        title: None,
        description: None,
        album_id: None,
        original_filename: String::new(),
        bytes: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("Invalid upload: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" | "file" => {
                upload.original_filename = field.file_name().unwrap_or_default().to_string();
                upload.bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(format!("Invalid upload: {err}")))?
                    .to_vec();
            }
            "title" | "description" | "album_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(format!("Invalid upload: {err}")))?;
                match name.as_str() {
                    "title" => upload.title = Some(value),
                    "description" => upload.description = Some(value),
                    _ if value.trim().is_empty() => {}
                    _ => {
                        let album_id: AlbumID = value
                            .parse()
                            .map_err(|_| AppError::bad_request("Invalid album id"))?;
                        upload.album_id = Some(album_id);
                    }
                }
            }
            _ => {}
        }
    }

    let image = state.images.upload(user.id, upload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(image).with_message("Image uploaded successfully.".to_string())),
    ))
}

pub async fn get_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ImageID>,
) -> AppResult<Json<ApiResponse<Image>>> {
    let image = state.images.get(id, user.id).await?;
    Ok(Json(ApiResponse::success(image)))
}

pub async fn update_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ImageID>,
    Json(request): Json<UpdateImageRequest>,
) -> AppResult<Json<ApiResponse<Image>>> {
    let image = state.images.update(id, user.id, request.into()).await?;
    Ok(Json(ApiResponse::success(image)))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ImageID>,
) -> AppResult<StatusCode> {
    state.images.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn serve_image_file(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ImageID>,
) -> AppResult<Response> {
    let file = state.images.open(id, user.id).await?;
    Ok(file_response(file))
}

pub(crate) fn file_response(file: StoredFile) -> Response {
    let disposition = format!("inline; filename=\"{}\"", file.filename);
    (
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        file.bytes,
    )
        .into_response()
}

/// The caller's images that are in no album.
pub async fn unassigned_images(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ApiResponse<Vec<Image>>>> {
    let images = state.albums.unassigned_images(user.id).await?;
    Ok(Json(ApiResponse::success(images)))
}

pub async fn share_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ImageID>,
    Json(request): Json<ShareRequest>,
) -> AppResult<Json<ApiResponse<ShareOutcome>>> {
    let image = state.sharing.load_image(id).await?;
    let targets = ShareTarget::parse_usernames(&request.usernames);
    let outcome = state
        .sharing
        .share_item(&SharedItem::Image(image), user.id, &targets, request.message)
        .await?;

    info!(
        image_id = %id,
        shared = outcome.shared_count,
        failed = outcome.errors.len(),
        "image share batch"
    );
    let message = format!("Image shared with {} user(s).", outcome.shared_count);
    Ok(Json(ApiResponse::success(outcome).with_message(message)))
}

/// Recipients of an image. Owner only.
pub async fn image_recipients(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ImageID>,
) -> AppResult<Json<ApiResponse<Vec<RecipientResponse>>>> {
    let image = state.sharing.load_image(id).await?;
    state
        .sharing
        .ensure_owner(&SharedItem::Image(image), user.id)?;
    let recipients = state.sharing.recipients(SharedItemRef::Image(id)).await?;
    Ok(Json(ApiResponse::success(
        recipients.into_iter().map(RecipientResponse::from).collect(),
    )))
}

/// Owner-side revoke of one recipient's access.
pub async fn revoke_image_share(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((id, recipient)): Path<(ImageID, UserID)>,
) -> AppResult<StatusCode> {
    let image = state.sharing.load_image(id).await?;
    state
        .sharing
        .revoke_recipient(&SharedItem::Image(image), user.id, recipient)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
