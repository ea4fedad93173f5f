//! # Database Error Types
//!
//! ```text
//! sqlx::Error ─────────┐
//! MigrateError ────────┼──► DbError ──► ApiError (CLI)
//! CoreError (labels) ──┘
//! ```
//!
//! A stored value that will not decode is reported with the order it came
//! from, so a bad row can be found and cleared.

use shiplabel_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The store could not be opened (unwritable directory, bad path).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// All connections busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value could not be read back as label records.
    #[error("Invalid stored metadata for order {order_id}: {source}")]
    InvalidMeta {
        order_id: i64,
        #[source]
        source: CoreError,
    },

    /// Label records could not be encoded for storage.
    #[error("Could not encode labels: {0}")]
    Encoding(#[from] CoreError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Attaches the order id to a core decoding failure.
    pub fn invalid_meta(order_id: i64, source: CoreError) -> Self {
        DbError::InvalidMeta { order_id, source }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
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
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_encoding_failure_converts() {
        let err: DbError = CoreError::MalformedLabelMeta {
            reason: "x".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Encoding(_)));
    }

    #[test]
    fn test_invalid_meta_message_names_order() {
        let err = DbError::invalid_meta(
            17,
            CoreError::MalformedLabelMeta {
                reason: "not JSON".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Invalid stored metadata for order 17: Malformed label metadata: not JSON"
        );
    }
}
