//! Account routes: registration, login, profile and password management.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Email, UserId, Username};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth, token_from_headers};
use crate::models::user::{Profile, User};
use crate::services::AccountService;
use crate::state::AppState;

use super::parse_body;

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UsernameResponse {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub date_of_birth: Option<NaiveDate>,
}

/// Account with its profile, as returned by the account endpoints.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub profile: ProfileResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    fn new(user: User, profile: Option<Profile>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile: ProfileResponse {
                date_of_birth: profile.and_then(|p| p.date_of_birth),
            },
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an account and its profile row.
///
/// POST /accounts/register
///
/// # Errors
///
/// Returns 400 on missing/invalid fields or a taken username.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let req: RegisterRequest = parse_body(body)?;

    let (user, profile) = AccountService::new(state.pool())
        .register(&req.username, &req.email, &req.password, req.date_of_birth)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new(user, Some(profile))),
    ))
}

/// Exchange credentials for the account's token key.
///
/// POST /accounts/token
///
/// # Errors
///
/// Returns 401 on bad credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<TokenResponse>> {
    let req: LoginRequest = parse_body(body)?;

    let token = AccountService::new(state.pool())
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(TokenResponse { token }))
}

/// Guest-tolerant username lookup. Always 200.
///
/// GET /accounts/username
pub async fn username(OptionalAuth(user): OptionalAuth) -> Json<UsernameResponse> {
    let username = user.map_or_else(|| "guest".to_owned(), |u| u.username.to_string());
    Json(UsernameResponse { username })
}

/// Current account with its profile.
///
/// GET /accounts/me
///
/// # Errors
///
/// Returns 401 without a valid token.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserResponse>> {
    let profile = UserRepository::new(state.pool()).get_profile(user.id).await?;
    Ok(Json(UserResponse::new(user, profile)))
}

/// Partial update of account fields and date of birth.
///
/// PUT /accounts/me
///
/// # Errors
///
/// Returns 400 on a malformed email and 401 without a valid token.
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<UserResponse>> {
    let req: UpdateAccountRequest = parse_body(body)?;

    let (user, profile) = AccountService::new(state.pool())
        .update_account(
            user.id,
            req.first_name.as_deref(),
            req.last_name.as_deref(),
            req.email.as_deref(),
            req.date_of_birth,
        )
        .await?;

    Ok(Json(UserResponse::new(user, Some(profile))))
}

/// Change the password. Rotates the token and returns the new one.
///
/// PUT /accounts/password
///
/// # Errors
///
/// Returns 400 if the new passwords differ or the old one is wrong; in both
/// cases the existing token stays valid.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<TokenResponse>> {
    let req: ChangePasswordRequest = parse_body(body)?;

    let token = AccountService::new(state.pool())
        .change_password(
            user.id,
            &req.old_password,
            &req.new_password1,
            &req.new_password2,
        )
        .await?;

    Ok(Json(TokenResponse { token }))
}

/// Invalidate the presented token.
///
/// DELETE /accounts/token
///
/// # Errors
///
/// Returns 401 without a valid token.
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let key = token_from_headers(&headers).ok_or(AppError::Unauthenticated)?;

    AccountService::new(state.pool()).logout(key).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete the account. Profile, cart, tokens and orders cascade.
///
/// DELETE /accounts/me
///
/// # Errors
///
/// Returns 401 without a valid token.
pub async fn delete_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    AccountService::new(state.pool()).delete_account(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
