/// Session lifecycle orchestration: register, login, refresh, logout.
///
/// Each operation is a single pass over the account store, the token codec,
/// and the refresh token store; failures propagate as `AppError` members
/// with no local recovery.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::accounts::{self, Account, Role};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{jwt, refresh_token};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::validators::is_valid_username;

/// Registration result: the new account's identity and status flags.
/// No credential is issued at registration.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub enabled: bool,
    pub account_non_locked: bool,
    pub account_non_expired: bool,
    pub credentials_non_expired: bool,
}

impl AccountSummary {
    fn from_account(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.clone(),
            role: account.role,
            enabled: account.enabled,
            account_non_locked: account.account_non_locked,
            account_non_expired: account.account_non_expired,
            credentials_non_expired: account.credentials_non_expired,
        }
    }
}

/// Login result: both credentials plus the account identity.
#[derive(Debug)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub account_id: Uuid,
}

/// Create a new account.
///
/// # Errors
/// `UsernameTaken` if the username already exists (checked up front, and
/// enforced again by the store's unique constraint under concurrency).
pub async fn register(
    pool: &PgPool,
    username: &str,
    password: &str,
    role: Role,
) -> Result<AccountSummary, AppError> {
    let username = is_valid_username(username)?;

    if accounts::exists_by_username(pool, &username).await? {
        return Err(AppError::Auth(AuthError::UsernameTaken));
    }

    let password_hash = hash_password(password)?;
    let account = Account::new(username, password_hash, role);
    accounts::insert(pool, &account).await?;

    tracing::info!(
        account_id = %account.id,
        role = %account.role,
        "Account registered"
    );

    Ok(AccountSummary::from_account(&account))
}

/// Authenticate a username/password pair and issue a session.
///
/// An unknown username and a wrong password both surface as
/// `InvalidCredentials`; a caller cannot tell them apart.
///
/// Any refresh token previously issued to the account is revoked before the
/// new one is persisted, so at most one session per account can refresh.
pub async fn login(
    pool: &PgPool,
    config: &JwtSettings,
    username: &str,
    password: &str,
) -> Result<SessionTokens, AppError> {
    let account = accounts::find_by_username(pool, username)
        .await?
        .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    if !verify_password(password, &account.password_hash)? {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let access_token = jwt::issue_access(&account.id, account.role, config)?;
    let refresh_token_value = jwt::issue_renewal(&account.id, account.role, config)?;
    let expires_at = jwt::expires_at(&refresh_token_value, config)?;

    let revoked = refresh_token::delete_for_account(pool, &account.id).await?;
    if revoked > 0 {
        tracing::info!(account_id = %account.id, revoked, "Revoked prior refresh tokens");
    }

    refresh_token::create(pool, &account.id, &refresh_token_value, expires_at).await?;

    tracing::info!(account_id = %account.id, "Login succeeded");

    Ok(SessionTokens {
        access_token,
        refresh_token: refresh_token_value,
        account_id: account.id,
    })
}

/// Mint a new access token from a refresh token.
///
/// The new token is bound to the STORED row's account, re-read from the
/// account store; nothing beyond the subject is trusted from the presented
/// token. The refresh token itself is not rotated.
///
/// # Errors
/// - `RefreshTokenNotFound` if the subject cannot be extracted or no stored
///   refresh token exists for it.
/// - `TokenInvalid` if the stored token has expired; the row is deleted as
///   a side effect, so a retry yields `RefreshTokenNotFound`.
pub async fn refresh(
    pool: &PgPool,
    config: &JwtSettings,
    presented: &str,
) -> Result<String, AppError> {
    let subject = jwt::subject_of(presented, config)
        .map_err(|_| AppError::Auth(AuthError::RefreshTokenNotFound))?;

    let stored = refresh_token::find_by_account(pool, &subject)
        .await?
        .ok_or(AppError::Auth(AuthError::RefreshTokenNotFound))?;

    if stored.is_expired(chrono::Utc::now()) {
        refresh_token::delete(pool, &stored.id).await?;
        tracing::info!(account_id = %stored.account_id, "Expired refresh token deleted");
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }

    let account = accounts::find_by_id(pool, &stored.account_id)
        .await?
        .ok_or(AppError::Auth(AuthError::UnknownAccount))?;

    let access_token = jwt::issue_access(&account.id, account.role, config)?;

    tracing::info!(account_id = %account.id, "Access token refreshed");

    Ok(access_token)
}

/// Revoke a session by deleting its refresh token.
///
/// This is the only revocation mechanism: access tokens already issued stay
/// valid until their own short expiry, but request verification refuses to
/// establish an identity once the refresh token is gone.
pub async fn logout(pool: &PgPool, presented: &str) -> Result<(), AppError> {
    let stored = refresh_token::find_by_token(pool, presented)
        .await?
        .ok_or(AppError::Auth(AuthError::RefreshTokenNotFound))?;

    refresh_token::delete(pool, &stored.id).await?;

    tracing::info!(account_id = %stored.account_id, "Session revoked");

    Ok(())
}
