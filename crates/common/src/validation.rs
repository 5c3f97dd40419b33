//! Field rules shared by input structs.
//!
//! Functions here plug into `#[validate(custom(function = ...))]`.

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_-]{3,150}$").expect("valid username regex")
});

static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(#[0-9A-Fa-f]{3}|#[0-9A-Fa-f]{6}|linear-gradient\([^;{}]*\))$")
        .expect("valid color regex")
});

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// 3 to 150 characters of letters, digits, underscores and hyphens.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(error(
            "username",
            "Username can only contain letters, numbers, underscores, and hyphens (3-150 characters)",
        ))
    }
}

/// At least 8 characters and not entirely numeric.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(error(
            "password_length",
            "Password must be at least 8 characters long",
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(error(
            "password_numeric",
            "Password cannot be entirely numeric",
        ));
    }
    Ok(())
}

/// Hex color or CSS linear gradient.
pub fn validate_background(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || COLOR_RE.is_match(value) {
        Ok(())
    } else {
        Err(error("background", "Unsupported background value"))
    }
}

/// Rejects strings that are empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Content cannot be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob_the-builder2").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("émile").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("12345678901").is_err());
    }

    #[test]
    fn test_background_rules() {
        assert!(validate_background("").is_ok());
        assert!(validate_background("#fff").is_ok());
        assert!(validate_background("#1a2B3c").is_ok());
        assert!(validate_background("linear-gradient(135deg, #667eea 0%, #764ba2 100%)").is_ok());
        assert!(validate_background("red; background: url(x)").is_err());
    }

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("hi").is_ok());
        assert!(validate_not_blank("   \n").is_err());
    }
}
