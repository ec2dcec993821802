use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use imageshare_core::api_types::{ApiResponse, SearchQuery, SetStatusRequest, UpdateProfileRequest};
use imageshare_model::{PublicProfile, User, UserProfile, UserSummary};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let profile = state.accounts.profile(user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let profile = state.accounts.update_profile(user.id, request.into()).await?;
    Ok(Json(
        ApiResponse::success(profile).with_message("Profile updated.".to_string()),
    ))
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<SetStatusRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let profile = state.accounts.set_status(user.id, request.status).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// Verified users the caller could share with.
pub async fn available_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ApiResponse<Vec<UserSummary>>>> {
    let users = state.sharing.available_users(user.id).await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn search_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<UserSummary>>>> {
    let users = state.sharing.search_users(user.id, &query.q).await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<ApiResponse<PublicProfile>>> {
    let profile = state.accounts.public_profile(&username).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// Users online within the last few minutes, most recently seen first.
pub async fn online_users(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<PublicProfile>>>> {
    let users = state.accounts.online_users().await?;
    Ok(Json(ApiResponse::success(users)))
}
