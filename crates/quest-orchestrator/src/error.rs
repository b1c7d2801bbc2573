//! Error types for the Quest orchestrator.
//!
//! This module defines the error hierarchy for configuration loading,
//! catalog loading, lesson navigation, and run orchestration. Every error
//! is recovered at the orchestrator or CLI boundary; a failed run degrades
//! to an error message and a retry, never a crashed session.

use std::path::PathBuf;

use quest_executor::ExecutorError;

/// A specialized `Result` type for Quest orchestrator operations.
pub type Result<T> = std::result::Result<T, QuestError>;

/// Errors that can occur while running Quest.
#[derive(Debug, thiserror::Error)]
pub enum QuestError {
    // ========================================================================
    // Run Errors
    // ========================================================================
    /// No source code was submitted for execution.
    ///
    /// The message is surfaced verbatim to the host; no network call is made.
    #[error("no code to execute")]
    EmptyInput,

    /// The execution client failed.
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your quest.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Catalog Errors
    // ========================================================================
    /// Catalog file was not found at the specified path.
    #[error("Lesson catalog not found: '{path}'\n\nSuggestion: Check the 'catalog' field in quest.json or omit it to use the built-in lessons")]
    CatalogNotFound {
        /// Path where the catalog was expected.
        path: PathBuf,
    },

    /// Catalog file contains invalid JSON.
    #[error("Invalid JSON in catalog file '{path}': {message}\n\nSuggestion: Validate the catalog file with a JSON linter")]
    CatalogParseError {
        /// Path to the catalog file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Catalog content violates a structural requirement.
    #[error("Invalid lesson catalog: {message}\n\nSuggestion: Every level needs at least one lesson, every lesson at least one step, and lesson ids must be unique")]
    CatalogValidationError {
        /// Description of the validation failure.
        message: String,
    },

    // ========================================================================
    // Navigation Errors
    // ========================================================================
    /// An explicit jump targeted a lesson index outside the level.
    #[error("Invalid lesson navigation: level '{level}' has {lesson_count} lessons, index {lesson_index} is out of range")]
    InvalidNavigation {
        /// The targeted level.
        level: String,
        /// The requested lesson index.
        lesson_index: usize,
        /// Number of lessons in the targeted level.
        lesson_count: usize,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuestError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `CatalogNotFound` error.
    #[must_use]
    pub fn catalog_not_found(path: impl Into<PathBuf>) -> Self {
        Self::CatalogNotFound { path: path.into() }
    }

    /// Creates a new `CatalogParseError`.
    #[must_use]
    pub fn catalog_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CatalogParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `CatalogValidationError`.
    #[must_use]
    pub fn catalog_validation(message: impl Into<String>) -> Self {
        Self::CatalogValidationError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidNavigation` error.
    #[must_use]
    pub fn invalid_navigation(
        level: impl std::fmt::Display,
        lesson_index: usize,
        lesson_count: usize,
    ) -> Self {
        Self::InvalidNavigation {
            level: level.to_string(),
            lesson_index,
            lesson_count,
        }
    }

    /// Returns `true` if this error came from a failed execution attempt.
    ///
    /// Run failures are recoverable: the host shows the message and lets the
    /// learner retry. Everything else indicates a setup problem.
    #[must_use]
    pub const fn is_run_failure(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::Executor(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_message_is_exact() {
        assert_eq!(QuestError::EmptyInput.to_string(), "no code to execute");
    }

    #[test]
    fn config_errors_include_suggestion() {
        let err = QuestError::config_parse("/tmp/quest.json", "expected value at line 1");
        let msg = err.to_string();
        assert!(msg.contains("quest.json"));
        assert!(msg.contains("Suggestion"));

        let err = QuestError::config_validation("timeout must be greater than 0", "Set timeoutSecs to at least 1");
        assert!(err.to_string().contains("Set timeoutSecs to at least 1"));
    }

    #[test]
    fn catalog_not_found_names_path() {
        let err = QuestError::catalog_not_found("/lessons/catalog.json");
        assert!(err.to_string().contains("/lessons/catalog.json"));
    }

    #[test]
    fn invalid_navigation_reports_bounds() {
        let err = QuestError::invalid_navigation("beginner", 5, 2);
        let msg = err.to_string();
        assert!(msg.contains("beginner"));
        assert!(msg.contains('5'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn executor_errors_convert_transparently() {
        let err: QuestError = ExecutorError::network("connection refused").into();
        assert!(err.to_string().contains("connection refused"));
        assert!(err.is_run_failure());
    }

    #[test]
    fn run_failure_classification() {
        assert!(QuestError::EmptyInput.is_run_failure());
        assert!(!QuestError::catalog_validation("duplicate id").is_run_failure());
    }
}
