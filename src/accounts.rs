/// Account store adapter.
///
/// The account record and the queries that read and write it. The session
/// layer only ever touches accounts through the four operations here:
/// existence check and lookup by username, lookup by id, and insert.
/// Accounts are never deleted.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, ValidationError};

/// Closed role enumeration.
///
/// Each role maps to an explicit set of authority strings embedded in the
/// access credential's claims; there is no dynamic resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Case-insensitive parse, mirroring how clients submit the role tag.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(ValidationError::InvalidFormat(format!(
                "role (allowed values: USER, ADMIN, got {})",
                value
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// The authority strings this role grants.
    pub fn authorities(&self) -> &'static [&'static str] {
        match self {
            Role::User => &["ROLE_USER"],
            Role::Admin => &["ROLE_ADMIN"],
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account row. The username is unique and immutable after creation.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
    pub account_non_locked: bool,
    pub account_non_expired: bool,
    pub credentials_non_expired: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// A new account with default-enabled status flags.
    pub fn new(username: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role,
            enabled: true,
            account_non_locked: true,
            account_non_expired: true,
            credentials_non_expired: true,
            created_at: now,
            updated_at: now,
        }
    }
}

fn from_row(row: &PgRow) -> Result<Account, AppError> {
    let role_tag: String = row.try_get("role")?;
    let role = Role::parse(&role_tag)
        .map_err(|_| AppError::Internal(format!("Unknown role in account store: {}", role_tag)))?;

    Ok(Account {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role,
        enabled: row.try_get("enabled")?,
        account_non_locked: row.try_get("account_non_locked")?,
        account_non_expired: row.try_get("account_non_expired")?,
        credentials_non_expired: row.try_get("credentials_non_expired")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn exists_by_username(pool: &PgPool, username: &str) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)",
    )
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Account>, AppError> {
    let row = sqlx::query("SELECT * FROM accounts WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    row.map(|r| from_row(&r)).transpose()
}

pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> Result<Option<Account>, AppError> {
    let row = sqlx::query("SELECT * FROM accounts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| from_row(&r)).transpose()
}

pub async fn insert(pool: &PgPool, account: &Account) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, username, password_hash, role, enabled,
            account_non_locked, account_non_expired, credentials_non_expired,
            created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(account.id)
    .bind(&account.username)
    .bind(&account.password_hash)
    .bind(account.role.as_str())
    .bind(account.enabled)
    .bind(account.account_non_locked)
    .bind(account.account_non_expired)
    .bind(account.credentials_non_expired)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(Role::parse("USER").unwrap(), Role::User);
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse("Admin").unwrap(), Role::Admin);
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::parse("SUPERUSER").is_err());
        assert!(Role::parse("").is_err());
    }

    #[test]
    fn role_authorities_mapping() {
        assert_eq!(Role::User.authorities(), &["ROLE_USER"]);
        assert_eq!(Role::Admin.authorities(), &["ROLE_ADMIN"]);
    }

    #[test]
    fn new_account_has_default_flags() {
        let account = Account::new("alice".to_string(), "$2b$hash".to_string(), Role::User);

        assert!(account.enabled);
        assert!(account.account_non_locked);
        assert!(account.account_non_expired);
        assert!(account.credentials_non_expired);
        assert_eq!(account.username, "alice");
    }
}
