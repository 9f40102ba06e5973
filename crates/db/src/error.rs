//! Storage errors surfaced to callers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("foreign key constraint violated: {0}")]
    ForeignKey(String),
    #[error("database: {0}")]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKey(db_err.message().to_string());
            }
        }
        StoreError::Sqlx(err)
    }
}
