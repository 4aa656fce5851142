//! Application configuration.
//!
//! Values come from defaults, then environment variables, then explicit
//! `with_*` overrides (the CLI's flags). The resulting [`AppConfig`] is passed
//! to the application explicitly; nothing reads the environment later.

use crate::errors::ConfigError;
use crate::llm::ModelTag;
use crate::solver::DEFAULT_CLINGO;
use crate::terminal::DEFAULT_BUBBLE_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Variable holding the OpenAI API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Variable selecting the model tag.
pub const ENV_MODEL: &str = "EXPLAID_MODEL";
/// Variable overriding the API endpoint.
pub const ENV_ENDPOINT: &str = "EXPLAID_ENDPOINT";
/// Variable overriding the request timeout in seconds.
pub const ENV_TIMEOUT: &str = "EXPLAID_TIMEOUT_SECONDS";
/// Variable pointing at the clingo executable.
pub const ENV_CLINGO: &str = "EXPLAID_CLINGO";
/// Variable overriding the spinner frame interval in milliseconds.
pub const ENV_FRAME_INTERVAL: &str = "EXPLAID_FRAME_INTERVAL_MS";

const MIN_BUBBLE_WIDTH: usize = 10;

/// Configuration for one explaid invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// The language model to ask.
    #[serde(default)]
    pub model: ModelTag,
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key; never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Model request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// The clingo executable.
    #[serde(default = "default_clingo_path")]
    pub clingo_path: PathBuf,
    /// Delay between spinner frames in milliseconds.
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
    /// Text width of the subset summary bubble.
    #[serde(default = "default_bubble_width")]
    pub bubble_width: usize,
}

fn default_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_clingo_path() -> PathBuf {
    PathBuf::from(DEFAULT_CLINGO)
}

fn default_frame_interval() -> u64 {
    70
}

fn default_bubble_width() -> usize {
    DEFAULT_BUBBLE_WIDTH
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelTag::default(),
            endpoint: default_endpoint(),
            api_key: None,
            timeout_seconds: default_timeout(),
            clingo_path: default_clingo_path(),
            frame_interval_ms: default_frame_interval(),
            bubble_width: default_bubble_width(),
        }
    }
}

impl AppConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        config.api_key = var(ENV_API_KEY);
        if let Some(model) = var(ENV_MODEL) {
            config.model = model.parse()?;
        }
        if let Some(endpoint) = var(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Some(timeout) = var(ENV_TIMEOUT) {
            config.timeout_seconds = parse_number(ENV_TIMEOUT, &timeout)?;
        }
        if let Some(clingo) = var(ENV_CLINGO) {
            config.clingo_path = PathBuf::from(clingo);
        }
        if let Some(interval) = var(ENV_FRAME_INTERVAL) {
            config.frame_interval_ms = parse_number(ENV_FRAME_INTERVAL, &interval)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: ModelTag) -> Self {
        self.model = model;
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the clingo executable.
    #[must_use]
    pub fn with_clingo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.clingo_path = path.into();
        self
    }

    /// Sets the spinner frame interval.
    #[must_use]
    pub fn with_frame_interval_ms(mut self, ms: u64) -> Self {
        self.frame_interval_ms = ms;
        self
    }

    /// Sets the bubble width.
    #[must_use]
    pub fn with_bubble_width(mut self, width: usize) -> Self {
        self.bubble_width = width;
        self
    }

    /// Model request timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Spinner frame interval as Duration.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::invalid("timeout_seconds", "must be positive"));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::invalid("frame_interval_ms", "must be positive"));
        }
        if self.bubble_width < MIN_BUBBLE_WIDTH {
            return Err(ConfigError::invalid(
                "bubble_width",
                format!("must be at least {MIN_BUBBLE_WIDTH}"),
            ));
        }
        if self.clingo_path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("clingo_path", "must not be empty"));
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, format!("'{raw}' is not a number: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model, ModelTag::Gpt4oMini);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.frame_interval(), Duration::from_millis(70));
        assert_eq!(config.clingo_path, PathBuf::from("clingo"));
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_MODEL, "gpt-4o"),
            (ENV_CLINGO, "/opt/clingo/bin/clingo"),
            (ENV_TIMEOUT, "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, ModelTag::Gpt4o);
        assert_eq!(config.clingo_path, PathBuf::from("/opt/clingo/bin/clingo"));
        assert_eq!(config.timeout_seconds, 5);
    }

    #[test]
    fn test_blank_variables_are_ignored() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_FRAME_INTERVAL, "fast")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_FRAME_INTERVAL));
    }

    #[test]
    fn test_unknown_model_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_MODEL, "gpt-3")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownModel(_)));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let err = AppConfig::new().with_frame_interval_ms(0).validate().unwrap_err();
        assert!(err.to_string().contains("frame_interval_ms"));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = AppConfig::new().with_api_key("sk-secret");
        let json = serde_json::to_string(&config).unwrap();

        assert!(!json.contains("sk-secret"));
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.api_key, None);
        assert_eq!(back.bubble_width, DEFAULT_BUBBLE_WIDTH);
    }
}
