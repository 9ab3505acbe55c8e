//! Business rules on top of the store: validation, uniqueness checks and
//! password hashing. Handlers call these instead of touching `DbHandle`.

pub mod board;
pub mod user;

pub use board::{BoardService, CreateBoard};
pub use user::{RegisterUser, UserService};

use crate::errors::ServiceError;

const MAX_TITLE_LEN: usize = 200;

/// Trim a title and reject empty or oversized values.
pub(crate) fn clean_title(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, MAX_TITLE_LEN
        )));
    }
    Ok(trimmed.to_string())
}
