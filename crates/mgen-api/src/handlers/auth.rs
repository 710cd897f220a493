//! Account handlers: registration, login and profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use mgen_models::User;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 256, message = "must be 8 to 256 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Token plus the account it was issued for.
#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub user: User,
}

/// Register a new account and log it in.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;

    let user = state
        .accounts
        .create(&request.email, request.name.trim(), &request.password)
        .await
        .map_err(|e| match e {
            mgen_store::StoreError::Conflict(_) => ApiError::Conflict("Email already registered".to_string()),
            other => other.into(),
        })?;
    let access_token = state.jwt.issue(&user)?;

    info!(user_id = %user.id, "Registered user");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            access_token,
            user,
        }),
    ))
}

/// Exchange credentials for an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    request.validate()?;

    let user = state
        .accounts
        .verify_password(&request.email, &request.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
    let access_token = state.jwt.issue(&user)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        access_token,
        user,
    }))
}

/// Current user's profile.
pub async fn profile(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<User>> {
    let found = state
        .accounts
        .find_by_id(&user.uid)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(found))
}
