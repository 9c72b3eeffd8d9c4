use thiserror::Error;

/// Centralized error types for the quiz core
///
/// Storage, session and routing errors are converted to this enum so the
/// transport layer has a single type to log and map to a generic reply.
/// Input-validation problems inside the wizard are *not* errors: the wizard
/// re-prompts and stays on the same step.
///
/// # Example
///
/// ```no_run
/// use pyqcore::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(#[source] anyhow::Error),

    /// Wizard draft (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// A classification field name outside the six known columns
    #[error("Unknown classification field: {0}")]
    UnknownField(String),

    /// An action token that does not follow the `verb` / `verb:literal` grammar
    #[error("Invalid action token: {0}")]
    InvalidAction(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_display() {
        let err = AppError::UnknownField("chapter".to_string());
        assert_eq!(err.to_string(), "Unknown classification field: chapter");
    }

    #[test]
    fn test_rusqlite_error_converts() {
        let err: AppError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, AppError::Database(_)));
    }
}
