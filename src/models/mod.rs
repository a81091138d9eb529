//! Administration entities: data feeds, detection and alert configurations,
//! hooks, credentials and feedback.
//!
//! Every "kind" of entity is a tagged enum so serialized payloads carry their
//! discriminant, and every entity exposes `validate()` with the rules the service
//! enforces on create and update.

pub mod alert;
pub mod credential;
pub mod data_feed;
pub mod detection;
pub mod feedback;
pub mod hook;

pub use alert::{
    AnomalyAlertConfiguration, MetricAlertConfiguration, MetricAlertConfigurationsOperator,
    MetricAnomalyAlertScope,
};
pub use credential::DataSourceCredential;
pub use data_feed::{
    DataFeed, DataFeedIngestionSettings, DataFeedOptions, DataFeedSchema, DataFeedSource,
    DataFeedSourceType,
};
pub use detection::{
    AnomalyDetectionConfiguration, AnomalyDetectorDirection, ChangeThresholdCondition,
    DetectionConditionOperator, DetectionConditions, HardThresholdCondition,
    MetricWholeSeriesDetectionCondition, SmartDetectionCondition, SuppressCondition,
};
pub use feedback::{FeedbackKind, FeedbackType, MetricFeedback};
pub use hook::NotificationHook;

use crate::core::{MetricsAdvisorError, Result};

/// Reject empty or whitespace-only required fields
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MetricsAdvisorError::validation(format!("{} is required", field)));
    }
    Ok(())
}
