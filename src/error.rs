//! Error types for Dreamboard.

use thiserror::Error;

use crate::auth::validation::Violations;
use crate::auth::PasswordError;

/// Common error type for Dreamboard.
#[derive(Error, Debug)]
pub enum DreamboardError {
    /// Input failed one or more field rules. Never reaches storage.
    #[error("validation error: {0}")]
    Validation(Violations),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness, foreign-key, not-null or check constraint was violated.
    ///
    /// Recoverable: the caller is expected to translate it (for example a
    /// duplicate email on signup).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Password encoding error.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    ///
    /// Any storage failure that is not a constraint violation.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DreamboardError {
    /// Check whether this is a storage constraint violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DreamboardError::ConstraintViolation(_))
    }

    /// Check whether this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DreamboardError::NotFound(_))
    }
}

impl From<Violations> for DreamboardError {
    fn from(violations: Violations) -> Self {
        DreamboardError::Validation(violations)
    }
}

// Constraint failures are split out so callers can tell "duplicate email"
// apart from "database is down".
impl From<sqlx::Error> for DreamboardError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation()
                || db_err.is_foreign_key_violation()
                || db_err.is_check_violation()
                || matches!(db_err.kind(), sqlx::error::ErrorKind::NotNullViolation)
            {
                return DreamboardError::ConstraintViolation(db_err.message().to_string());
            }
        }
        DreamboardError::Database(e.to_string())
    }
}

/// Result type alias for Dreamboard operations.
pub type Result<T> = std::result::Result<T, DreamboardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validation::{FieldViolation, ValidationError};

    #[test]
    fn test_not_found_error_display() {
        let err = DreamboardError::NotFound("board".to_string());
        assert_eq!(err.to_string(), "board not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_constraint_violation_display() {
        let err = DreamboardError::ConstraintViolation("UNIQUE constraint failed".to_string());
        assert_eq!(
            err.to_string(),
            "constraint violation: UNIQUE constraint failed"
        );
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_validation_error_from_violations() {
        let mut violations = Violations::new();
        violations.push(FieldViolation::new("email", ValidationError::EmailRequired));
        let err: DreamboardError = violations.into();

        assert!(matches!(err, DreamboardError::Validation(_)));
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DreamboardError = io_err.into();
        assert!(matches!(err, DreamboardError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        let err: DreamboardError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DreamboardError::Database(_)));
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(DreamboardError::Auth("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
