/// Token codec.
///
/// Turns (subject, role, lifetime) into a signed opaque string and a
/// presented string back into verified claims. Both access and refresh
/// tokens use the same HS256 key and encoding; they differ only in lifetime
/// and the refresh discriminator claim.
///
/// Decoding verifies the signature and issuer but NOT expiry; expiry is a
/// separate judgment so that an expired-but-authentic token can still have
/// its subject read (the stored refresh row's own expiry governs refresh).

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode as jwt_decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::accounts::Role;
use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Generate a new access token for an account.
pub fn issue_access(
    account_id: &Uuid,
    role: Role,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::access(
        *account_id,
        role,
        config.access_token_expiry,
        config.issuer.clone(),
    );

    sign(&claims, config)
}

/// Generate a new refresh token for an account: long expiry, discriminator set.
pub fn issue_renewal(
    account_id: &Uuid,
    role: Role,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::renewal(
        *account_id,
        role,
        config.refresh_token_expiry,
        config.issuer.clone(),
    );

    sign(&claims, config)
}

fn sign(claims: &Claims, config: &JwtSettings) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Decode and verify a presented token.
///
/// # Errors
/// `MalformedCredential` if the signature does not verify, the issuer does
/// not match, or the encoding is corrupt.
pub fn decode(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked by callers against their own clocks; see is_expired.
    validation.validate_exp = false;
    validation.set_issuer(&[&config.issuer]);

    jwt_decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Token failed to decode: {}", e);
        AppError::Auth(AuthError::MalformedCredential)
    })
}

/// Whether a token's expiry has passed.
///
/// A decode failure is a hard failure, not `false`: expiry is only
/// meaningful for an otherwise well-formed token.
pub fn is_expired(token: &str, config: &JwtSettings) -> Result<bool, AppError> {
    decode(token, config).map(|claims| claims.is_expired())
}

/// True iff the refresh discriminator claim is present and true.
pub fn is_renewal_token(token: &str, config: &JwtSettings) -> Result<bool, AppError> {
    decode(token, config).map(|claims| claims.is_renewal())
}

/// Extract the subject account ID.
pub fn subject_of(token: &str, config: &JwtSettings) -> Result<Uuid, AppError> {
    decode(token, config)?.account_id()
}

/// The token's expiry claim as a UTC timestamp.
pub fn expires_at(token: &str, config: &JwtSettings) -> Result<DateTime<Utc>, AppError> {
    let claims = decode(token, config)?;
    DateTime::<Utc>::from_timestamp(claims.exp, 0)
        .ok_or(AppError::Auth(AuthError::MalformedCredential))
}
