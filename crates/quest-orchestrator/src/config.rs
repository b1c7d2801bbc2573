//! Configuration types for Quest.
//!
//! This module provides the configuration structure controlling the remote
//! execution service endpoint, request timeout, language runtime versions,
//! and lesson catalog source.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QuestError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "quest.json";

/// Default base URL of the remote execution service.
fn default_base_url() -> String {
    "https://emkc.org/api/v2/piston".to_string()
}

/// Default request timeout in seconds.
const fn default_timeout_secs() -> u64 {
    10
}

/// Default language selected when the host does not specify one.
fn default_language() -> String {
    "python".to_string()
}

/// Default language-to-runtime-version mapping.
fn default_language_versions() -> HashMap<String, String> {
    quest_executor::client::default_language_versions()
}

/// Main configuration for Quest.
///
/// Controls the execution service endpoint, timeout, and which runtime
/// version string accompanies each language id. The version mapping is
/// plain configuration data; the execution client never computes versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base endpoint of the remote execution service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for a single execution request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Language selected when the host does not specify one.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Runtime version sent with each language id.
    #[serde(default = "default_language_versions")]
    pub language_versions: HashMap<String, String>,

    /// Path to a lesson catalog file; the built-in catalog is used when absent.
    #[serde(default)]
    pub catalog: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            default_language: default_language(),
            language_versions: default_language_versions(),
            catalog: None,
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `quest.json` in the current directory. If found, loads and
    /// validates the configuration. If not found, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            QuestError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `quest.json` exists in the directory but contains
    /// invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::ConfigParseError` if the file exists but contains
    /// invalid JSON, or `QuestError::ConfigValidationError` if the values are
    /// invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(QuestError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| QuestError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// Checks that:
    /// - `base_url` is not empty
    /// - `timeout_secs` is greater than 0
    /// - `language_versions` is not empty
    /// - `default_language` has a version mapping
    ///
    /// # Errors
    ///
    /// Returns `QuestError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(QuestError::config_validation(
                "baseUrl must not be empty",
                "Provide the execution service URL in your quest.json",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(QuestError::config_validation(
                "timeoutSecs must be greater than 0",
                "Set timeoutSecs to at least 1 second in your quest.json",
            ));
        }

        if self.language_versions.is_empty() {
            return Err(QuestError::config_validation(
                "languageVersions must not be empty",
                "Provide at least one language-to-version entry in your quest.json",
            ));
        }

        if !self.language_versions.contains_key(&self.default_language) {
            return Err(QuestError::config_validation(
                format!(
                    "defaultLanguage '{}' has no languageVersions entry",
                    self.default_language
                ),
                "Add the default language to languageVersions in your quest.json",
            ));
        }

        Ok(())
    }

    /// Returns the request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url, "https://emkc.org/api/v2/piston");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.default_language, "python");
        assert_eq!(
            config.language_versions.get("python").map(String::as_str),
            Some("3.10.0")
        );
        assert!(config.catalog.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from_file(Path::new("/nonexistent/quest.json")).unwrap();
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let json = r#"{"baseUrl": "http://localhost:2000"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.base_url, "http://localhost:2000");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.default_language, "python");
    }

    #[test]
    fn camel_case_field_names() {
        let json = r#"{
            "baseUrl": "http://localhost:2000",
            "timeoutSecs": 5,
            "defaultLanguage": "javascript",
            "languageVersions": {"javascript": "18.15.0"},
            "catalog": "lessons.json"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.default_language, "javascript");
        assert_eq!(config.catalog.as_deref(), Some("lessons.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let config = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, QuestError::ConfigValidationError { .. }));
        assert!(err.to_string().contains("timeoutSecs"));
    }

    #[test]
    fn empty_base_url_fails_validation() {
        let config = Config {
            base_url: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_language_must_have_version() {
        let config = Config {
            default_language: "rust".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rust"));
    }

    #[test]
    fn timeout_converts_to_duration() {
        let config = Config::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }
}
