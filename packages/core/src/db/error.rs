//! Storage errors raised while opening the org tree database or driving its
//! transactions. Row-level failures inside a transaction are reported through
//! the store traits as `anyhow::Error` instead.

use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// libsql could not open the database file
    #[error("Cannot open org tree database at {path}: {source}")]
    Open {
        path: PathBuf,
        source: libsql::Error,
    },

    #[error("Database path {path} does not name a file")]
    InvalidPath { path: PathBuf },

    #[error("No permission to create the database directory for {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Could not create the database directory: {0}")]
    CreateDirectory(#[from] std::io::Error),

    /// `nodes`, `node_closure` or one of their indexes could not be created
    #[error("Schema bootstrap failed: {0}")]
    Schema(String),

    #[error("`{pragma}` failed: {message}")]
    Pragma { pragma: String, message: String },

    #[error("Connection error: {0}")]
    Connection(#[from] libsql::Error),

    /// BEGIN, COMMIT or ROLLBACK was rejected
    #[error("Could not {action} transaction: {message}")]
    Transaction {
        action: &'static str,
        message: String,
    },
}

impl DatabaseError {
    pub fn open(path: PathBuf, source: libsql::Error) -> Self {
        Self::Open { path, source }
    }

    pub fn invalid_path(path: PathBuf) -> Self {
        Self::InvalidPath { path }
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    pub fn schema(what: &str, err: impl Display) -> Self {
        Self::Schema(format!("{}: {}", what, err))
    }

    pub fn pragma(pragma: &str, err: impl Display) -> Self {
        Self::Pragma {
            pragma: pragma.to_string(),
            message: err.to_string(),
        }
    }

    /// `action` is one of `begin`, `commit`, `roll back`
    pub fn transaction(action: &'static str, err: impl Display) -> Self {
        Self::Transaction {
            action,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_step() {
        let err = DatabaseError::transaction("commit", "database is locked");
        assert_eq!(err.to_string(), "Could not commit transaction: database is locked");

        let err = DatabaseError::schema("node_closure table", "disk I/O error");
        assert_eq!(err.to_string(), "Schema bootstrap failed: node_closure table: disk I/O error");

        let err = DatabaseError::pragma("PRAGMA foreign_keys = ON", "not an error");
        assert!(err.to_string().starts_with("`PRAGMA foreign_keys = ON` failed"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "read-only file system");
        let err: DatabaseError = io.into();
        assert!(matches!(err, DatabaseError::CreateDirectory(_)));
    }
}
