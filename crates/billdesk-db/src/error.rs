//! # Database Errors
//!
//! SQLite failures are sorted into the few kinds callers branch on. The API
//! layer turns `NotFound` into 404, `UniqueViolation` into 409 and domain
//! errors into 400; everything else is a 500 whose detail goes to the log.

use billdesk_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The row addressed by an update or delete does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `field` is `table.column` as SQLite names it, e.g. `users.email`.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// CHECK, NOT NULL or FOREIGN KEY failure.
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The file could not be opened, or the pool is closed or exhausted.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    // composite keys are reported as "t.a, t.b"
                    DbError::duplicate(field, "unknown")
                } else if msg.contains("constraint failed") {
                    DbError::ConstraintViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionFailed("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_column() {
        let err = DbError::duplicate("bills.bill_number", "B-1000");
        assert!(matches!(
            &err,
            DbError::UniqueViolation { field, .. } if field == "bills.bill_number"
        ));
        assert_eq!(err.to_string(), "Duplicate bills.bill_number: 'B-1000' already exists");
    }

    #[test]
    fn test_domain_errors_are_transparent() {
        let err: DbError = ValidationError::required("name").into();
        assert_eq!(err.to_string(), "Missing required field: name");
    }

    #[test]
    fn test_pool_errors() {
        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
