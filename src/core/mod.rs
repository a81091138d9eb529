//! Core domain types for the Metrics Advisor client.
//!
//! This module contains the composite dimension key, identifiers, errors
//! and client configuration shared by every other module.

pub mod config;
pub mod dimension_key;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ClientOptions, Config, ConfigBuilder, KeyCredential, ServiceVersion};
pub use dimension_key::DimensionKey;
pub use error::{MetricsAdvisorError, Result};
pub use types::{
    AlertConfigurationId, CredentialId, DataFeedGranularity, DataFeedId, DataFeedStatus,
    DetectionConfigurationId, FeedbackId, HookId, MetricId,
};
