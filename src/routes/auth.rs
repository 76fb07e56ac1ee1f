/// Authentication routes: registration, login, token refresh, and logout.
/// Thin glue over the session layer; request/response shaping only.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::accounts::Role;
use crate::auth::session;
use crate::configuration::JwtSettings;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub account_id: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// POST /api/v1/authentication/register
///
/// Creates an account. Returns the account summary; no tokens are issued
/// until the caller logs in.
///
/// # Errors
/// - 400: invalid username, weak password, or unknown role
/// - 409: username already taken
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let role = Role::parse(&form.role)?;
    let summary = session::register(pool.get_ref(), &form.username, &form.password, role).await?;

    Ok(HttpResponse::Created().json(summary))
}

/// POST /api/v1/authentication/login
///
/// Authenticates a username/password pair and returns an access token and a
/// refresh token. Unknown usernames and wrong passwords are deliberately
/// indistinguishable in the response.
///
/// # Errors
/// - 401: invalid credentials
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let tokens = session::login(
        pool.get_ref(),
        jwt_config.get_ref(),
        &form.username,
        &form.password,
    )
    .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
        account_id: tokens.account_id.to_string(),
    }))
}

/// POST /api/v1/authentication/refresh
///
/// Exchanges a refresh token for a new access token. The refresh token is
/// not rotated; an expired one is deleted as a side effect of the failed
/// attempt.
///
/// # Errors
/// - 401: no matching refresh token, or the stored token has expired
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let access_token =
        session::refresh(pool.get_ref(), jwt_config.get_ref(), &form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { access_token }))
}

/// POST /api/v1/authentication/logout
///
/// Deletes the presented refresh token, ending the session. Access tokens
/// already issued stay valid until their own expiry, but can no longer be
/// used to establish an identity.
///
/// # Errors
/// - 401: no matching refresh token
pub async fn logout(
    form: web::Json<LogoutRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    session::logout(pool.get_ref(), &form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(LogoutResponse {
        message: "Successfully logged out".to_string(),
    }))
}
