// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for account data.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::PasswordRequirements;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_NAME_LENGTH: usize = 100;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MAX_PASSWORD_LENGTH: usize = 128;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});
static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^<>/\\{}()\[\];]*$").expect("valid name regex"));
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_.-]+$").expect("valid username regex"));

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Normalise an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email must not be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email must be at most {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Email format is invalid".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a display name
pub fn validate_name(name: &str) -> ValidationResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidName(
            "Name must not be empty".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    if !NAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidName(
            "Name contains invalid characters".to_string(),
        ));
    }

    Ok(trimmed)
}

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.len() < MIN_USERNAME_LENGTH || username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "Username may contain only lowercase letters, digits, '_', '.' and '-'".to_string(),
        ));
    }

    Ok(username)
}

/// Validate a password against the length bounds and `requirements`
pub fn validate_password<'a>(
    password: &'a str,
    requirements: &PasswordRequirements,
) -> ValidationResult<&'a str> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    if !crate::auth::validate_password_strength(password, requirements) {
        return Err(ValidationError::InvalidPassword(describe(requirements)));
    }

    Ok(password)
}

fn describe(req: &PasswordRequirements) -> String {
    let mut parts = Vec::new();
    if req.require_uppercase {
        parts.push("an uppercase letter");
    }
    if req.require_lowercase {
        parts.push("a lowercase letter");
    }
    if req.require_digit {
        parts.push("a digit");
    }
    if req.require_special {
        parts.push("a special character");
    }

    let mut msg = format!("Password must be at least {} characters", req.min_length);
    if !parts.is_empty() {
        msg.push_str(" and contain ");
        msg.push_str(&parts.join(", "));
    }
    msg
}

/// Derive a username candidate from the local part of an email address.
///
/// Characters outside the username alphabet are dropped and the result is
/// padded with `user` when it would be too short.
pub fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut base: String = local
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .take(MAX_USERNAME_LENGTH - 4)
        .collect();
    if base.len() < MIN_USERNAME_LENGTH {
        base.insert_str(0, "user");
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last+tag@example.co.uk").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ada Lovelace ").unwrap(), "Ada Lovelace");
        assert!(validate_name("   ").is_err());
        assert!(validate_name("<script>").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ada_l").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("Ada").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn test_validate_password() {
        let defaults = PasswordRequirements::default();
        assert!(validate_password("secret123", &defaults).is_ok());
        assert!(validate_password("short", &defaults).is_err());
        assert!(validate_password(&"x".repeat(129), &defaults).is_err());

        let strict = PasswordRequirements {
            min_length: 10,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        };
        let err = validate_password("secret123", &strict).unwrap_err();
        assert!(err.to_string().contains("at least 10 characters"));
        assert!(validate_password("SecureP@ssw0rd", &strict).is_ok());
    }

    #[test]
    fn test_username_from_email() {
        assert_eq!(username_from_email("Ada.Lovelace@example.com"), "ada.lovelace");
        assert_eq!(username_from_email("a@b.com"), "usera");
        assert_eq!(username_from_email("jo+news@b.com"), "jonews");
        assert!(validate_username(&username_from_email(&format!("{}@b.com", "x".repeat(60)))).is_ok());
    }
}
