//! Authentication endpoints

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{error::AppResult, models::Role};

use super::JsonBody;

/// Login request
#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Issued access token
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    pub role: Role,
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/token",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Missing credentials", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn issue_token(
    State(state): State<crate::AppState>,
    WithRejection(Json(request), _): JsonBody<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    request.validate()?;

    let issued = state
        .services
        .auth
        .login(&request.username, &request.password)?;

    Ok(Json(TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
        role: issued.claims.role,
    }))
}
