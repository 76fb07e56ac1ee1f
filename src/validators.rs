/// Input validators for registration fields.
/// Length limits cap the work an attacker can force per request, and the
/// pattern checks reject content that has no business in a username.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 64;

lazy_static! {
    // Leading alphanumeric, then alphanumerics plus . _ -
    static ref USERNAME_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*$").unwrap();

    // Comment markers, statement separators, and stored-procedure prefixes.
    // The charset check above already excludes quotes and whitespace, so
    // these are the only SQL fragments the username alphabet can express.
    static ref SQL_INJECTION_PATTERNS: Regex =
        Regex::new(r"(--|;|/\*|\*/|xp_|sp_)").unwrap();
}

/// Validates a username.
/// - Checks length constraints
/// - Checks the allowed character set
/// - Rejects control characters and SQL comment/separator patterns
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort(
            "username".to_string(),
            MIN_USERNAME_LENGTH,
        ));
    }

    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if trimmed.contains('\0') || trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("username".to_string()));
    }

    if SQL_INJECTION_PATTERNS.is_match(trimmed) {
        return Err(ValidationError::PossibleSQLInjection);
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}
