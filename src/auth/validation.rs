//! Input validation for staff accounts.
//!
//! This module provides normalization and validation for names,
//! email addresses, and new passwords.

use thiserror::Error;

/// Default minimum password length for new passwords.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum name length.
pub const MAX_NAME_LENGTH: usize = 120;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is empty.
    #[error("name cannot be empty")]
    NameEmpty,

    /// Name is too long.
    #[error("name must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong,

    /// Email is empty.
    #[error("email is required")]
    EmailEmpty,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format: {0}")]
    EmailInvalidFormat(String),

    /// Password is empty or whitespace only.
    #[error("password is required")]
    PasswordEmpty,

    /// Password is shorter than the configured minimum.
    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,
}

/// Normalize an email address for storage and lookup (trimmed, lowercase).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize a person or room name: trim and collapse inner whitespace.
///
/// # Examples
///
/// ```
/// use vetagenda::auth::validation::normalize_name;
///
/// assert_eq!(normalize_name("  Ana   Maria  Souza "), "Ana Maria Souza");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validate an already-normalized name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameEmpty);
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

fn is_domain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-')
}

/// Validate an email address.
///
/// Accepts `local@domain.tld` where the local part uses `[A-Za-z0-9._%+-]`,
/// the domain uses `[A-Za-z0-9.-]` and the top-level domain is at least two
/// letters.
///
/// # Examples
///
/// ```
/// use vetagenda::auth::validation::validate_email;
///
/// assert!(validate_email("recepcao@vta.com").is_ok());
/// assert!(validate_email("recepcao@vta").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailEmpty);
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    let invalid = || ValidationError::EmailInvalidFormat(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || !local.chars().all(is_local_char) {
        return Err(invalid());
    }
    if !domain.chars().all(is_domain_char) {
        return Err(invalid());
    }

    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    Ok(())
}

/// Validate a new password against the length policy.
///
/// Only applies when a password is being set; verification of existing
/// passwords never goes through this check.
pub fn validate_new_password(password: &str, min_length: usize) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::PasswordEmpty);
    }
    let length = password.chars().count();
    if length < min_length {
        return Err(ValidationError::PasswordTooShort(min_length));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Admin@VTA.com "), "admin@vta.com");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Consultório   1"), "Consultório 1");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Dra. Helena").is_ok());
        assert_eq!(validate_name(""), Err(ValidationError::NameEmpty));
        assert_eq!(validate_name("  "), Err(ValidationError::NameEmpty));
        assert_eq!(
            validate_name(&"a".repeat(MAX_NAME_LENGTH + 1)),
            Err(ValidationError::NameTooLong)
        );
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email("a_b%c-d@clinic-vet.com.br").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert_eq!(validate_email(""), Err(ValidationError::EmailEmpty));
        for email in [
            "invalid",
            "@example.com",
            "user@",
            "user@example",
            "user@example.c",
            "user@example.c0m",
            "user name@example.com",
            "user@exa mple.com",
            "user@@example.com",
            "user@.com",
        ] {
            assert!(
                matches!(
                    validate_email(email),
                    Err(ValidationError::EmailInvalidFormat(_))
                ),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_email(&email), Err(ValidationError::EmailTooLong));
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("senha123", 8).is_ok());
        assert_eq!(
            validate_new_password("", 8),
            Err(ValidationError::PasswordEmpty)
        );
        assert_eq!(
            validate_new_password("     ", 1),
            Err(ValidationError::PasswordEmpty)
        );
        assert_eq!(
            validate_new_password("short", 8),
            Err(ValidationError::PasswordTooShort(8))
        );
        assert_eq!(
            validate_new_password(&"a".repeat(MAX_PASSWORD_LENGTH + 1), 8),
            Err(ValidationError::PasswordTooLong)
        );
    }

    #[test]
    fn test_password_length_counts_characters() {
        // Eight characters, more than eight bytes.
        assert!(validate_new_password("ãçéíõúàê", 8).is_ok());
    }
}
