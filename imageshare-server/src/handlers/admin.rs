use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use imageshare_core::{
    admin::{UserDetail, UserOverview},
    api_types::{ApiResponse, PageQuery},
};
use imageshare_model::{User, UserID};

use crate::infra::{app_state::AppState, errors::AppResult};

/// Every account with content and sharing counts. Admins only.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ApiResponse<Vec<UserOverview>>>> {
    let users = state.admin.user_overviews(&user).await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn user_detail(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<UserID>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    let detail = state.admin.user_detail(&user, id, query.into()).await?;
    Ok(Json(ApiResponse::success(detail)))
}
