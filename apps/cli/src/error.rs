//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the CLI                                │
//! │                                                                         │
//! │  Command Function  ── Result<T, ApiError>                               │
//! │         │                                                               │
//! │         ├── Reading form.json failed?  io::Error ──────────┐           │
//! │         ├── Not a form snapshot?       serde_json::Error ──┤           │
//! │         ├── Metadata undecodable?      CoreError ──────────┤           │
//! │         ├── Query failed?              DbError ────────────┤           │
//! │         │                                                  ▼           │
//! │         │                                              ApiError        │
//! │         ▼                                                  │           │
//! │  Success → JSON on stdout              JSON on stderr, exit 1 ◄┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation findings are not errors: a form full of mistakes still
//! evaluates successfully and reports them.

use serde::Serialize;
use shiplabel_core::CoreError;
use shiplabel_db::DbError;

/// Error printed when a command fails.
///
/// ```json
/// {
///   "code": "INVALID_INPUT",
///   "message": "form.json: expected value at line 1 column 1"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Order or file not found
    NotFound,

    /// Input could not be parsed (form snapshot, label file, argument)
    InvalidInput,

    /// Stored label metadata is unreadable
    MalformedMeta,

    /// Database operation failed
    DatabaseError,

    /// Reading or writing a file failed
    IoError,

    /// Anything else
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::InvalidMeta { order_id, source } => ApiError::new(
                ErrorCode::MalformedMeta,
                format!("Labels stored on order {} are unreadable: {}", order_id, source),
            ),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Encoding(e) => ApiError::internal(e.to_string()),
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedLabelMeta { reason } => ApiError::invalid_input(format!(
                "Not a list of label records: {}",
                reason
            )),
            CoreError::Serialization(e) => ApiError::internal(e.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ApiError::new(ErrorCode::NotFound, err.to_string()),
            _ => ApiError::new(ErrorCode::IoError, err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_code_and_message() {
        let err = ApiError::not_found("Order", "1042");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Order not found: 1042");
    }

    #[test]
    fn test_invalid_meta_maps_to_malformed() {
        let err: ApiError = DbError::invalid_meta(
            7,
            CoreError::MalformedLabelMeta {
                reason: "not JSON".to_string(),
            },
        )
        .into();
        assert_eq!(err.code, ErrorCode::MalformedMeta);
        assert!(err.message.contains("order 7"));
    }

    #[test]
    fn test_query_failure_hides_details() {
        let err: ApiError = DbError::QueryFailed("no such table: order_meta".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err: ApiError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_bad_json_is_invalid_input() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}
