use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use imageshare_core::api_types::{ApiResponse, PageQuery};
use imageshare_model::{Page, Share, ShareID, User};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn received(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Page<Share>>>> {
    let page = state.sharing.shares_received(user.id, query.into()).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn sent(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ApiResponse<Vec<Share>>>> {
    let shares = state.sharing.shares_sent(user.id).await?;
    Ok(Json(ApiResponse::success(shares)))
}

/// Sender revokes or recipient declines.
pub async fn remove_share(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<ShareID>,
) -> AppResult<StatusCode> {
    let share = state.sharing.load_share(id).await?;
    state.sharing.remove_share(&share, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
