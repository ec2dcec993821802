use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use imageshare_core::{
    api_types::{ApiResponse, CommentRequest, LimitQuery},
    content::RECENT_COMMENTS_LIMIT,
};
use imageshare_model::{Comment, CommentID, ImageID, Pagination, ShareID, User};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn image_comments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ImageID>,
) -> AppResult<Json<ApiResponse<Vec<Comment>>>> {
    let comments = state.comments.for_image(id, user.id).await?;
    Ok(Json(ApiResponse::success(comments)))
}

pub async fn add_image_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ImageID>,
    Json(request): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    let comment = state
        .comments
        .add_to_image(id, user.id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}

pub async fn share_comments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ShareID>,
) -> AppResult<Json<ApiResponse<Vec<Comment>>>> {
    let comments = state.comments.for_share(id, user.id).await?;
    Ok(Json(ApiResponse::success(comments)))
}

pub async fn add_share_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ShareID>,
    Json(request): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    let comment = state
        .comments
        .add_to_share(id, user.id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}

/// Newest comments the caller wrote or received on their content.
pub async fn visible_comments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<ApiResponse<Vec<Comment>>>> {
    let limit = query
        .limit
        .unwrap_or(RECENT_COMMENTS_LIMIT)
        .clamp(1, Pagination::MAX_LIMIT);
    let comments = state.comments.visible_to(user.id, limit).await?;
    Ok(Json(ApiResponse::success(comments)))
}

pub async fn edit_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<CommentID>,
    Json(request): Json<CommentRequest>,
) -> AppResult<Json<ApiResponse<Comment>>> {
    let comment = state.comments.edit(id, user.id, &request.content).await?;
    Ok(Json(ApiResponse::success(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<CommentID>,
) -> AppResult<StatusCode> {
    state.comments.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
