/// Refresh token store.
///
/// Lifecycle policy over the refresh_tokens table: rows are created on
/// login, read on refresh and on every request verification, and deleted on
/// logout or when found expired. An expired row is never usable; it is
/// deleted on detection, not flagged.
///
/// The token column's UNIQUE constraint is the only mutual-exclusion
/// mechanism; a violation there surfaces as `DuplicateToken`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

/// A stored refresh token. The token string is immutable once issued.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub token: String,
    pub account_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Expired at or before `now`; the boundary instant counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

type RefreshTokenRow = (Uuid, String, Uuid, DateTime<Utc>, DateTime<Utc>, DateTime<Utc>);

fn from_row(row: RefreshTokenRow) -> RefreshTokenRecord {
    RefreshTokenRecord {
        id: row.0,
        token: row.1,
        account_id: row.2,
        expires_at: row.3,
        created_at: row.4,
        updated_at: row.5,
    }
}

/// Persist a newly issued refresh token.
///
/// # Errors
/// `DuplicateToken` if the token string already exists.
pub async fn create(
    pool: &PgPool,
    account_id: &Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<RefreshTokenRecord, AppError> {
    let now = Utc::now();
    let record = RefreshTokenRecord {
        id: Uuid::new_v4(),
        token: token.to_string(),
        account_id: *account_id,
        expires_at,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, token, account_id, expires_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(record.id)
    .bind(&record.token)
    .bind(record.account_id)
    .bind(record.expires_at)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(record)
}

/// The current refresh token for an account, or none. At most one row is
/// live per account because login revokes prior tokens before creating a
/// new one.
pub async fn find_by_account(
    pool: &PgPool,
    account_id: &Uuid,
) -> Result<Option<RefreshTokenRecord>, AppError> {
    let row = sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT id, token, account_id, expires_at, created_at, updated_at
        FROM refresh_tokens
        WHERE account_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_row))
}

pub async fn find_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<RefreshTokenRecord>, AppError> {
    let row = sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT id, token, account_id, expires_at, created_at, updated_at
        FROM refresh_tokens
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_row))
}

/// Delete a refresh token row. Idempotent: deleting an already-deleted row
/// succeeds with no effect.
pub async fn delete(pool: &PgPool, id: &Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete every refresh token owned by an account. Returns the number of
/// rows removed. Used by login to revoke prior sessions before issuing a
/// new token.
pub async fn delete_for_account(pool: &PgPool, account_id: &Uuid) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE account_id = $1")
        .bind(account_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
