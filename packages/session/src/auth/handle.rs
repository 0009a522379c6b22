//! Validation of linked source-hosting usernames.
//!
//! A handle is 1 to 39 ASCII letters, digits or hyphens. It starts and ends with a
//! letter or digit and never has two hyphens in a row. Case is preserved.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

pub const MAX_HANDLE_LEN: usize = 39;

static HANDLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*$").expect("handle pattern is valid")
});

/// Validate a user-typed handle, returning it trimmed.
pub fn validate_handle(input: &str) -> Result<&str, ValidationError> {
    let handle = input.trim();
    if handle.is_empty() {
        return Err(ValidationError::Empty);
    }
    if !HANDLE_RE.is_match(handle) {
        return Err(ValidationError::Malformed);
    }
    // The pattern only admits ASCII, so bytes are characters here.
    if handle.len() > MAX_HANDLE_LEN {
        return Err(ValidationError::TooLong {
            len: handle.len(),
            max: MAX_HANDLE_LEN,
        });
    }
    Ok(handle)
}
