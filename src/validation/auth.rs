use crate::error::{AppError, Result};

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub const MISSING_FIELDS_MESSAGE: &str =
    "All fields are mandatory. Please provide your username, email and password.";

pub const WEAK_PASSWORD_MESSAGE: &str = "Password needs to have at least 6 chars and must contain at least one number, one lowercase and one uppercase letter.";

pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter both, email and password to login.";

/// Returns `true` when the password is at least six characters long and
/// contains a digit, a lowercase letter and an uppercase letter.
pub fn is_strong(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
}

/// Validates a signup password.
pub fn validate_password(password: &str) -> Result<()> {
    if !is_strong(password) {
        return Err(AppError::UserInput(WEAK_PASSWORD_MESSAGE.to_string()));
    }
    Ok(())
}

/// Presence check run before any signup work. Only the last name, email and
/// password are checked here; the remaining fields are left to the store
/// schema.
pub fn validate_signup_presence(last_name: &str, email: &str, password: &str) -> Result<()> {
    if last_name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::UserInput(MISSING_FIELDS_MESSAGE.to_string()));
    }
    Ok(())
}

/// Presence check for login. Empty credentials are answered as a server error;
/// absent ones are left to the credential lookup.
pub fn validate_login_presence(email: Option<&str>, password: Option<&str>) -> Result<()> {
    if email == Some("") || password == Some("") {
        return Err(AppError::MissingCredentials(
            MISSING_CREDENTIALS_MESSAGE.to_string(),
        ));
    }
    Ok(())
}
