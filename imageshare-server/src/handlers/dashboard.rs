use axum::{Extension, Json, extract::State};
use imageshare_core::{api_types::ApiResponse, content::DashboardStats};
use imageshare_model::User;

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let stats = state.dashboard.stats(user.id).await?;
    Ok(Json(ApiResponse::success(stats)))
}
