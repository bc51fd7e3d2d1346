//! # Application Error Types
//!
//! This module defines common error types used throughout the meal-prep backend.
//! It provides structured error handling for the storage layers, the meal import
//! pipeline and the HTTP handlers.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::observability::record_error_metrics;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (request bodies, path ids, dates, etc.)
    Validation(String),
    /// The requested row or document does not exist
    NotFound(String),
    /// Database operation errors
    Database(String),
    /// Cache backend errors
    Cache(String),
    /// A meal record could not be imported; carries the natural key
    Import { id_meal: String, message: String },
    /// File system errors
    FileSystem(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::NotFound(msg) => write!(f, "[NOT_FOUND] {}", msg),
            AppError::Database(msg) => write!(f, "[DATABASE] {}", msg),
            AppError::Cache(msg) => write!(f, "[CACHE] {}", msg),
            AppError::Import { id_meal, message } => {
                write!(f, "[IMPORT] idMeal={}: {}", id_meal, message)
            }
            AppError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status code this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Import { .. }
            | AppError::FileSystem(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in error metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) => "database",
            AppError::Cache(_) => "cache",
            AppError::Import { .. } => "import",
            AppError::FileSystem(_) => "filesystem",
            AppError::Internal(_) => "internal",
        }
    }

    /// Message safe to hand back to an HTTP client
    ///
    /// Storage errors are logged in full but only summarised in the response body.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Import { id_meal, .. } => format!("failed to import meal {}", id_meal),
            AppError::Database(_) => "db error".to_string(),
            AppError::Cache(_) => "cache error".to_string(),
            AppError::Config(_) | AppError::FileSystem(_) | AppError::Internal(_) => {
                "internal error".to_string()
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Data-access helpers wrap sqlx errors with context; keep them classified.
        if err.downcast_ref::<sqlx::Error>().is_some() {
            return AppError::Database(format!("{:#}", err));
        }
        AppError::Internal(format!("{:#}", err))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("invalid JSON: {}", err))
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            match &self {
                AppError::Database(_) => {
                    error_logging::log_database_error(&self, "request", None, None)
                }
                _ => error_logging::log_internal_error(&self, "http", "request", None),
            }
            record_error_metrics(self.kind(), "http");
        }
        let body = Json(serde_json::json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log database operation errors with contextual information
    pub fn log_database_error(
        error: &impl std::fmt::Display,
        operation: &str,
        entity_id: Option<i64>,
        additional_context: Option<&[(&str, &dyn std::fmt::Display)]>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            entity_id = ?entity_id,
            additional_context = ?additional_context.map(|ctx| ctx.iter().map(|(k,v)| format!("{}={}", k, v)).collect::<Vec<_>>().join(", ")),
            "Database operation failed"
        );
    }

    /// Log meal import errors with the offending natural key
    pub fn log_import_error(
        error: &impl std::fmt::Display,
        id_meal: &str,
        imported_so_far: usize,
    ) {
        error!(
            error = %error,
            id_meal = %id_meal,
            imported_so_far = %imported_so_far,
            "Meal import failed"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "File system operation failed"
        );
    }

    /// Log internal application errors with component context
    pub fn log_internal_error(
        error: &impl std::fmt::Display,
        component: &str,
        operation: &str,
        entity_id: Option<i64>,
    ) {
        error!(
            error = %error,
            component = %component,
            operation = %operation,
            entity_id = ?entity_id,
            "Internal application error"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_tags() {
        assert_eq!(
            AppError::Validation("invalid id".to_string()).to_string(),
            "[VALIDATION] invalid id"
        );
        let err = AppError::Import {
            id_meal: "52772".to_string(),
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "[IMPORT] idMeal=52772: connection reset");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_storage_details() {
        let err = AppError::Database("password authentication failed for user".into());
        assert_eq!(err.public_message(), "db error");

        let err = AppError::Import {
            id_meal: "1".into(),
            message: "duplicate key".into(),
        };
        assert_eq!(err.public_message(), "failed to import meal 1");
    }

    #[test]
    fn test_anyhow_sqlx_is_classified_as_database() {
        let err: anyhow::Error =
            anyhow::Error::new(sqlx::Error::RowNotFound).context("Failed to read recipe");
        match AppError::from(err) {
            AppError::Database(msg) => assert!(msg.contains("Failed to read recipe")),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
