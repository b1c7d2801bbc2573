//! Quest Execution Client
//!
//! Remote code execution over HTTP with response caching.
//!
//! This crate provides the types and client used to submit learner source
//! code to a remote execution service and normalize its responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod client;

pub use client::ExecutionClient;

/// Errors that can occur while executing code remotely.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The network call could not complete (timeout, DNS, connection refused).
    #[error("network error: {message}\n\nSuggestion: Check your connection and the service URL, then retry")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The service responded but reported a server-side failure status.
    #[error("execution service error (HTTP {status}): {message}\n\nSuggestion: Retry later; the execution service may be experiencing issues")]
    RemoteExecution {
        /// HTTP status code returned by the service.
        status: u16,
        /// Response body or status description.
        message: String,
    },

    /// The service returned a body that does not match the expected schema.
    #[error("invalid response from execution service: {message}\n\nSuggestion: Verify the configured base URL points at a compatible execution service")]
    InvalidResponse {
        /// Description of the schema mismatch.
        message: String,
    },

    /// No runtime version is configured for the requested language.
    #[error("unknown language: '{language}'\n\nSuggestion: Add a version for '{language}' to languageVersions in quest.json")]
    UnknownLanguage {
        /// The unrecognized language identifier.
        language: String,
    },
}

impl ExecutorError {
    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a new `RemoteExecution` error.
    #[must_use]
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteExecution {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Creates a new `UnknownLanguage` error.
    #[must_use]
    pub fn unknown_language(language: impl Into<String>) -> Self {
        Self::UnknownLanguage {
            language: language.into(),
        }
    }

    /// Returns `true` if this error is transient and a retry may succeed.
    ///
    /// The client itself never retries; retry policy belongs to the caller.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RemoteExecution { .. })
    }
}

/// A request to run source code against the remote execution service.
///
/// Immutable once built; construct a new request for each change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Language identifier (e.g. "python", "javascript", "java").
    pub language: String,
    /// The source code to execute.
    pub source_code: String,
    /// Standard input supplied to the program.
    pub stdin: String,
}

impl ExecutionRequest {
    /// Creates a request with empty stdin.
    #[must_use]
    pub fn new(language: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source_code: source_code.into(),
            stdin: String::new(),
        }
    }

    /// Sets the standard input for the program.
    #[must_use]
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    /// Returns the cache key for this request.
    ///
    /// stdin is deliberately excluded: two runs with identical code but
    /// different stdin share a cache slot. See [`CacheKey`].
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.language, &self.source_code)
    }
}

/// Normalized output of a remote execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error; non-empty implies the run failed.
    pub stderr: String,
    /// Process exit code, when the service reports one.
    pub exit_code: Option<i64>,
}

impl ExecutionResult {
    /// Returns `true` if the executed program wrote to stderr.
    ///
    /// Non-empty stderr is treated as failure regardless of the exit code.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.stderr.is_empty()
    }
}

/// Cache key for execution results.
///
/// Derived from (language, source code) only. Excluding stdin means a
/// program whose output depends on its input returns the first cached
/// result on resubmission. This mirrors the assumption that submitted
/// programs are pure and deterministic; it is a documented limitation,
/// not a bug to silently fix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    language: String,
    source_code: String,
}

impl CacheKey {
    /// Creates a cache key from a language id and source code.
    #[must_use]
    pub fn new(language: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source_code: source_code.into(),
        }
    }
}

/// Abstraction over code execution backends.
///
/// [`ExecutionClient`] is the production implementation; tests substitute
/// in-memory fakes. `&mut self` enforces at most one in-flight execution
/// per session.
#[allow(async_fn_in_trait)]
pub trait CodeExecutor {
    /// Executes the given request and returns the normalized result.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutorError`] when the run cannot complete or the
    /// service reports a failure.
    async fn execute(&mut self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecutorError>;
}
