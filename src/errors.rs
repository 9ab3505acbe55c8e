//! Typed error hierarchy for the project board.
//!
//! Two enums cover the two layers that report typed failures:
//! - `ArrayCodecError`: decoding a stored UUID-array literal
//! - `ServiceError`: user and board operations

use thiserror::Error;

/// Errors from decoding a UUID-array column value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArrayCodecError {
    #[error("unsupported data type for uuid array: {found}")]
    UnsupportedSourceType { found: &'static str },

    #[error("malformed uuid array literal: {reason}")]
    MalformedLiteral { reason: &'static str },

    #[error("invalid UUID in array: {element:?} ({reason})")]
    InvalidElement { element: String, reason: String },
}

/// Errors from the user and board services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("email already registered: {email}")]
    EmailAlreadyRegistered { email: String },

    #[error("User {id} not found")]
    UserNotFound { id: uuid::Uuid },

    #[error("Board {id} not found")]
    BoardNotFound { id: uuid::Uuid },

    #[error("User {user_id} is already a member of board {board_id}")]
    AlreadyMember {
        board_id: uuid::Uuid,
        user_id: uuid::Uuid,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0:#}")]
    Database(#[source] anyhow::Error),
}

impl ServiceError {
    /// Recover a `ServiceError` raised inside a `DbHandle::call` closure.
    /// Anything else is a storage failure.
    pub fn from_db(err: anyhow::Error) -> Self {
        match err.downcast::<ServiceError>() {
            Ok(service_err) => service_err,
            Err(other) => ServiceError::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_element_carries_offending_text() {
        let err = ArrayCodecError::InvalidElement {
            element: "nope".to_string(),
            reason: "invalid length".to_string(),
        };
        assert!(err.to_string().contains("invalid UUID in array"));
        assert!(err.to_string().contains("\"nope\""));
    }

    #[test]
    fn unsupported_source_type_names_the_kind() {
        let err = ArrayCodecError::UnsupportedSourceType { found: "integer" };
        assert_eq!(err.to_string(), "unsupported data type for uuid array: integer");
    }

    #[test]
    fn from_db_recovers_service_error() {
        let raised: anyhow::Error = ServiceError::EmailAlreadyRegistered {
            email: "a@b.c".to_string(),
        }
        .into();
        match ServiceError::from_db(raised) {
            ServiceError::EmailAlreadyRegistered { email } => assert_eq!(email, "a@b.c"),
            other => panic!("Expected EmailAlreadyRegistered, got {other:?}"),
        }
    }

    #[test]
    fn from_db_wraps_plain_failures_as_database() {
        let raised = anyhow::anyhow!("disk I/O error");
        let err = ServiceError::from_db(raised);
        assert!(matches!(err, ServiceError::Database(_)));
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ArrayCodecError::MalformedLiteral { reason: "x" });
        assert_std_error(&ServiceError::InvalidInput("x".into()));
    }
}
