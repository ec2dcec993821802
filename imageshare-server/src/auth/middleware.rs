use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Raw bearer token of the authenticated request, kept for logout.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Resolves the bearer session and stores the [`imageshare_model::User`] and
/// [`SessionToken`] in request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = extract_bearer_token(&request)?;
    let user = state.accounts.authenticate(&token).await.map_err(|err| {
        debug!(error = %err, "rejected bearer token");
        AppError::from(err)
    })?;

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(SessionToken(token));
    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> AppResult<String> {
    let missing = || AppError::unauthorized("Authentication required");
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(missing)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(header: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(
            extract_bearer_token(&request_with(Some("Bearer abc123"))).unwrap(),
            "abc123"
        );
    }

    #[test]
    fn malformed_headers_are_unauthorized() {
        for header in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer   ")] {
            let err = extract_bearer_token(&request_with(header)).unwrap_err();
            assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
        }
    }
}
