//! Error types for Prumo

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The stored profile changed between read and write. Retry the interaction.
    #[error("Profile for user {user_id} was modified concurrently (expected version {expected_version})")]
    ProfileConflict { user_id: i64, expected_version: i64 },
}

impl Error {
    /// Whether the caller may retry the operation that produced this error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ProfileConflict { .. } => true,
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_conflict_is_retryable() {
        let err = Error::ProfileConflict {
            user_id: 7,
            expected_version: 3,
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("user 7"));
    }

    #[test]
    fn test_other_errors_are_not_retryable() {
        assert!(!Error::NotFound("profile".into()).is_retryable());
        assert!(!Error::Config("bad intent".into()).is_retryable());
    }

    #[test]
    fn test_busy_database_is_retryable() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::DatabaseBusy,
                extended_code: 5,
            },
            None,
        );
        assert!(Error::Database(busy).is_retryable());
    }
}
