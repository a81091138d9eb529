//! Configuration management for the Metrics Advisor client.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable overrides
//! - CLI argument overrides
//! - Validation and defaults

use crate::core::{MetricsAdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Environment variable holding the service endpoint.
pub const ENDPOINT_ENV: &str = "METRICS_ADVISOR_ENDPOINT";
/// Environment variable holding the subscription key.
pub const SUBSCRIPTION_KEY_ENV: &str = "METRICS_ADVISOR_SUBSCRIPTION_KEY";
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "METRICS_ADVISOR_API_KEY";

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Client connection options
    pub client: ClientOptions,
    /// List paging defaults
    pub paging: PagingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// Options consumed when constructing a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Service endpoint, e.g. `https://myresource.cognitiveservices.azure.com`
    pub endpoint: String,
    /// Key pair credential
    pub credential: KeyCredential,
    /// Service API version
    pub service_version: ServiceVersion,
    /// HTTP logging detail
    pub http_log_detail: HttpLogDetailLevel,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Subscription key and API key pair.
///
/// Both keys are redacted from `Debug` and `Display` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyCredential {
    subscription_key: String,
    api_key: String,
}

/// Supported service API versions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceVersion {
    /// `v1.0`
    #[default]
    #[serde(rename = "v1.0")]
    V1_0,
}

/// How much of each HTTP exchange is logged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpLogDetailLevel {
    #[default]
    None,
    Basic,
    Headers,
    Body,
    BodyAndHeaders,
}

/// Paging defaults for list operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size used when the caller does not set one
    pub default_page_size: usize,
    /// Upper bound applied to any requested page size
    pub max_page_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Include targets, thread ids and line numbers
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            endpoint: String::new(),
            credential: KeyCredential::default(),
            service_version: ServiceVersion::V1_0,
            http_log_detail: HttpLogDetailLevel::None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        PagingConfig {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl KeyCredential {
    /// Create a credential from a subscription key and an API key
    pub fn new(subscription_key: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let credential = KeyCredential {
            subscription_key: subscription_key.into(),
            api_key: api_key.into(),
        };
        credential.validate()?;
        Ok(credential)
    }

    /// Subscription key
    pub fn subscription_key(&self) -> &str {
        &self.subscription_key
    }

    /// API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Rotate the subscription key
    pub fn update_key(&mut self, subscription_key: impl Into<String>) -> Result<()> {
        let key = subscription_key.into();
        if key.is_empty() {
            return Err(MetricsAdvisorError::invalid_argument("subscription key cannot be empty"));
        }
        self.subscription_key = key;
        Ok(())
    }

    /// Rotate the API key
    pub fn update_api_key(&mut self, api_key: impl Into<String>) -> Result<()> {
        let key = api_key.into();
        if key.is_empty() {
            return Err(MetricsAdvisorError::invalid_argument("api key cannot be empty"));
        }
        self.api_key = key;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.subscription_key.is_empty() {
            return Err(MetricsAdvisorError::config("subscription key must be set"));
        }
        if self.api_key.is_empty() {
            return Err(MetricsAdvisorError::config("api key must be set"));
        }
        Ok(())
    }
}

impl fmt::Debug for KeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCredential")
            .field("subscription_key", &redact(&self.subscription_key))
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl fmt::Display for KeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subscription_key={} api_key={}",
            redact(&self.subscription_key),
            redact(&self.api_key)
        )
    }
}

/// Replace a secret with a fixed marker, keeping "unset" visible.
pub(crate) fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl ServiceVersion {
    /// Wire representation of the version
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceVersion::V1_0 => "v1.0",
        }
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.client.endpoint.trim();
        if endpoint.is_empty() {
            return Err(MetricsAdvisorError::config("endpoint must be set"));
        }
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(MetricsAdvisorError::config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }

        self.client.credential.validate()?;

        if self.client.timeout.is_zero() {
            return Err(MetricsAdvisorError::config("timeout must be greater than 0"));
        }

        if self.paging.default_page_size == 0 {
            return Err(MetricsAdvisorError::config("default_page_size must be greater than 0"));
        }
        if self.paging.default_page_size > self.paging.max_page_size {
            return Err(MetricsAdvisorError::config(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.paging.default_page_size, self.paging.max_page_size
            )));
        }

        Ok(())
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| MetricsAdvisorError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Apply endpoint and key overrides from the process environment
    pub fn from_env(self) -> Self {
        self.from_lookup(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            self.config.client.endpoint = endpoint;
        }
        if let Some(key) = lookup(SUBSCRIPTION_KEY_ENV).filter(|v| !v.is_empty()) {
            self.config.client.credential.subscription_key = key;
        }
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.config.client.credential.api_key = key;
        }
        self
    }

    /// Set the service endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.client.endpoint = endpoint.into();
        self
    }

    /// Set the key credential
    pub fn credential(mut self, credential: KeyCredential) -> Self {
        self.config.client.credential = credential;
        self
    }

    /// Set the service API version
    pub fn service_version(mut self, version: ServiceVersion) -> Self {
        self.config.client.service_version = version;
        self
    }

    /// Set HTTP logging detail
    pub fn http_log_detail(mut self, level: HttpLogDetailLevel) -> Self {
        self.config.client.http_log_detail = level;
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.client.timeout = timeout;
        self
    }

    /// Set default page size
    pub fn default_page_size(mut self, size: usize) -> Self {
        self.config.paging.default_page_size = size;
        self
    }

    /// Set max page size
    pub fn max_page_size(mut self, size: usize) -> Self {
        self.config.paging.max_page_size = size;
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Return the configuration without validating it.
    ///
    /// Commands that never reach the service still need paging and logging
    /// settings from a partially filled config file.
    pub fn build_unvalidated(self) -> Config {
        self.config
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
