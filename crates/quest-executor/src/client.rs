//! HTTP client for the remote execution service.
//!
//! This module provides [`ExecutionClient`], which submits source code to a
//! piston-style execution endpoint and caches results keyed by
//! (language, source code).

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{CacheKey, CodeExecutor, ExecutionRequest, ExecutionResult, ExecutorError};

/// Default request timeout for the execution service.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns the default language-to-runtime-version mapping.
///
/// These are the runtime versions the execution service is asked to use
/// when the configuration does not override them.
#[must_use]
pub fn default_language_versions() -> HashMap<String, String> {
    [
        ("python", "3.10.0"),
        ("javascript", "18.15.0"),
        ("java", "15.0.2"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Client for a remote code execution service.
///
/// Results are cached for the lifetime of the client, keyed by
/// (language, source code). A cache hit returns the stored result with no
/// network call; identical code is assumed to produce identical output.
/// The cache is unbounded, which is acceptable for a single interactive
/// session; long-lived deployments should bound it.
#[derive(Debug)]
pub struct ExecutionClient {
    /// Underlying HTTP client, configured with the request timeout.
    http: reqwest::Client,
    /// Base endpoint of the execution service (e.g. `https://emkc.org/api/v2/piston`).
    base_url: String,
    /// Language id to runtime version mapping sent with each request.
    versions: HashMap<String, String>,
    /// Cached results from previous executions.
    cache: HashMap<CacheKey, ExecutionResult>,
}

impl ExecutionClient {
    /// Creates a client for the given service base URL with the default
    /// timeout and language versions.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ExecutorError> {
        Self::with_options(base_url, default_language_versions(), DEFAULT_TIMEOUT)
    }

    /// Creates a client with explicit language versions and timeout.
    ///
    /// The version mapping is configuration data: the client sends whatever
    /// version accompanies the language id, it never computes one.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Network`] if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        versions: HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, ExecutorError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecutorError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            versions,
            cache: HashMap::new(),
        })
    }

    /// Returns the number of cached execution results.
    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Returns the runtime version configured for a language, if any.
    #[must_use]
    pub fn version_for(&self, language: &str) -> Option<&str> {
        self.versions.get(language).map(String::as_str)
    }
}

impl CodeExecutor for ExecutionClient {
    /// Executes the request against the remote service.
    ///
    /// Cache hits return immediately with no network call. On a miss a
    /// single POST is issued; the client never retries.
    ///
    /// # Errors
    ///
    /// - [`ExecutorError::UnknownLanguage`] if no version is configured for
    ///   the request's language (checked before any network activity).
    /// - [`ExecutorError::Network`] on transport failure or timeout.
    /// - [`ExecutorError::RemoteExecution`] on a non-success HTTP status.
    /// - [`ExecutorError::InvalidResponse`] if the body does not match the
    ///   expected schema.
    #[instrument(skip_all, fields(language = %request.language))]
    async fn execute(
        &mut self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, ExecutorError> {
        let version = self
            .versions
            .get(&request.language)
            .ok_or_else(|| ExecutorError::unknown_language(&request.language))?
            .clone();

        let key = request.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!("cache hit, skipping network call");
            return Ok(cached.clone());
        }

        let url = format!("{}/execute", self.base_url);
        let body = ExecuteRequestBody {
            language: &request.language,
            version: &version,
            files: vec![FileEntry {
                content: &request.source_code,
            }],
            stdin: &request.stdin,
        };

        debug!(url = %url, version = %version, "submitting code to execution service");
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExecutorError::network(format!("request timed out: {e}"))
                } else {
                    ExecutorError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(ExecutorError::remote(status.as_u16(), message));
        }

        let parsed: ExecuteResponseBody = response
            .json()
            .await
            .map_err(|e| ExecutorError::invalid_response(e.to_string()))?;

        let result = ExecutionResult {
            stdout: parsed.run.output,
            stderr: parsed.run.stderr,
            exit_code: parsed.run.code,
        };

        debug!(
            stdout_bytes = result.stdout.len(),
            has_stderr = result.is_failure(),
            "execution completed, caching result"
        );
        self.cache.insert(key, result.clone());
        Ok(result)
    }
}

/// Request body sent to the execution service.
#[derive(Debug, Serialize)]
struct ExecuteRequestBody<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<FileEntry<'a>>,
    stdin: &'a str,
}

/// A single source file in the request payload.
#[derive(Debug, Serialize)]
struct FileEntry<'a> {
    content: &'a str,
}

/// Response body from the execution service.
///
/// Parsed strictly: a missing or mistyped `run` section fails the call with
/// [`ExecutorError::InvalidResponse`] rather than propagating undefined
/// values. Extra fields the service includes are ignored.
#[derive(Debug, Deserialize)]
struct ExecuteResponseBody {
    run: RunSection,
}

/// The `run` section of the execution response.
#[derive(Debug, Deserialize)]
struct RunSection {
    /// Combined program output.
    output: String,
    /// Standard error, empty when the program succeeded.
    #[serde(default)]
    stderr: String,
    /// Process exit code, when reported.
    #[serde(default)]
    code: Option<i64>,
}
