use axum::{Extension, Json, extract::State, http::StatusCode};
use imageshare_core::{
    accounts::RegisterUser,
    api_types::{
        ApiResponse, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
        PasswordResetRequest, RegisterRequest, ResendVerificationRequest, VerifyEmailRequest,
    },
};
use imageshare_model::UserSummary;

use crate::{
    auth::SessionToken,
    infra::{app_state::AppState, errors::AppResult},
};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserSummary>>)> {
    let user = state
        .accounts
        .register(RegisterUser {
            email: request.email,
            username: request.username,
            password: request.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(user.summary()).with_message(
                "Registration successful. Please check your email to verify your account."
                    .to_string(),
            ),
        ),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let session = state
        .accounts
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(ApiResponse::success(session.into())))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> AppResult<StatusCode> {
    state.accounts.logout(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> AppResult<Json<ApiResponse<UserSummary>>> {
    let user = state
        .accounts
        .verify_email(request.user_id, &request.token)
        .await?;
    Ok(Json(
        ApiResponse::success(user.summary())
            .with_message("Your email address has been verified.".to_string()),
    ))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    Json(request): Json<ResendVerificationRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.accounts.resend_verification(request.user_id).await?;
    Ok(Json(ApiResponse::success(()).with_message(
        "A new verification email has been sent.".to_string(),
    )))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.accounts.request_password_reset(&request.email).await?;
    Ok(Json(ApiResponse::success(()).with_message(
        "If an account exists for that email, a reset link has been sent.".to_string(),
    )))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .accounts
        .confirm_password_reset(
            &request.token,
            &request.password,
            &request.password_confirmation,
        )
        .await?;
    Ok(Json(
        ApiResponse::success(()).with_message("Your password has been reset.".to_string()),
    ))
}
