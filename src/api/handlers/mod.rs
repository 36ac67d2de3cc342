//! API handlers and shared input validation.

pub mod auth;
pub mod health;
pub mod users;

use regex::Regex;
use uuid::Uuid;

use crate::credentials::password::MAX_PASSWORD_BYTES;

const PASSWORD_MIN_CHARS: usize = 6;
const PASSWORD_MAX_CHARS: usize = 20;

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Passwords must be 6 to 20 characters long and fit in bcrypt's input.
pub fn valid_password(password: &str) -> bool {
    (PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&password.chars().count())
        && password.len() <= MAX_PASSWORD_BYTES
}

/// Reset tokens are always UUID v4; anything else is rejected before touching the store.
pub(crate) fn parse_reset_token(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim())
        .ok()
        .filter(|token| token.get_version_num() == 4)
}
