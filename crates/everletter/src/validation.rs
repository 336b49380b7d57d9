//! Username format rules shared by signup and profile updates.
//!
//! Only the local rules live here. Uniqueness needs the profile table and is
//! checked by [`crate::profiles::ProfileService`] after these pass.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;

static USERNAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").expect("username pattern is a valid regex")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username must be at least 3 characters long")]
    TooShort,

    #[error("Username cannot be longer than 20 characters")]
    TooLong,

    #[error("Username can only contain letters, numbers, and underscores")]
    InvalidCharacters,
}

/// Checks length and character set of a username.
pub fn validate_username(username: &str) -> Result<(), UsernameError> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(UsernameError::TooShort);
    }
    if len > USERNAME_MAX_LEN {
        return Err(UsernameError::TooLong);
    }
    if !USERNAME_CHARS.is_match(username) {
        return Err(UsernameError::InvalidCharacters);
    }
    Ok(())
}

/// A username that still looks like an auth identifier rather than a chosen name.
pub fn is_placeholder_username(username: &str, user_id: &str, email: Option<&str>) -> bool {
    username.is_empty()
        || username == user_id
        || email.is_some_and(|e| username == e)
        || username.contains('@')
}
