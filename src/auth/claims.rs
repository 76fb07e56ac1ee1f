/// Token claims.
///
/// One claims layout serves both access and refresh tokens; the `refresh`
/// discriminator is present (and true) only on refresh tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::Role;
use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account ID as UUID string)
    pub sub: String,
    /// Authority strings granted by the account's role
    pub roles: Vec<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Refresh discriminator; only refresh tokens carry it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<bool>,
}

impl Claims {
    /// Claims for an access token.
    pub fn access(account_id: Uuid, role: Role, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: account_id.to_string(),
            roles: role.authorities().iter().map(|a| a.to_string()).collect(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
            refresh: None,
        }
    }

    /// Claims for a refresh token: same layout, longer expiry, discriminator set.
    pub fn renewal(account_id: Uuid, role: Role, expiry_seconds: i64, issuer: String) -> Self {
        let mut claims = Self::access(account_id, role, expiry_seconds, issuer);
        claims.refresh = Some(true);
        claims
    }

    /// Extract the account ID from the subject claim.
    pub fn account_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::MalformedCredential))
    }

    /// Whether the token has expired. The boundary is exclusive: a token
    /// whose expiry equals the current instant is already expired.
    pub fn is_expired(&self) -> bool {
        self.exp <= chrono::Utc::now().timestamp()
    }

    pub fn is_renewal(&self) -> bool {
        self.refresh.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_claims_creation() {
        let account_id = Uuid::new_v4();
        let claims = Claims::access(account_id, Role::User, 3600, "test".to_string());

        assert_eq!(claims.sub, account_id.to_string());
        assert_eq!(claims.roles, vec!["ROLE_USER"]);
        assert_eq!(claims.iss, "test");
        assert!(!claims.is_expired());
        assert!(!claims.is_renewal());
    }

    #[test]
    fn renewal_claims_carry_the_discriminator() {
        let claims = Claims::renewal(Uuid::new_v4(), Role::Admin, 604800, "test".to_string());

        assert_eq!(claims.refresh, Some(true));
        assert!(claims.is_renewal());
        assert_eq!(claims.roles, vec!["ROLE_ADMIN"]);
    }

    #[test]
    fn account_id_extraction() {
        let account_id = Uuid::new_v4();
        let claims = Claims::access(account_id, Role::User, 3600, "test".to_string());

        assert_eq!(claims.account_id().unwrap(), account_id);
    }

    #[test]
    fn invalid_subject_is_malformed() {
        let mut claims = Claims::access(Uuid::new_v4(), Role::User, 3600, "test".to_string());
        claims.sub = "not-a-uuid".to_string();

        assert!(claims.account_id().is_err());
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let mut claims = Claims::access(Uuid::new_v4(), Role::User, 3600, "test".to_string());

        claims.exp = chrono::Utc::now().timestamp();
        assert!(claims.is_expired());

        claims.exp = chrono::Utc::now().timestamp() + 60;
        assert!(!claims.is_expired());
    }
}
