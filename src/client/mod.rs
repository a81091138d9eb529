//! Administration and query surface of the Metrics Advisor service.
//!
//! [`AdministrationClient`] is the seam every consumer codes against. The crate
//! ships [`InMemoryAdministrationClient`], which enforces the service's
//! validation and referential rules without any network transport.

pub mod memory;
pub mod paging;
pub mod series;

pub use memory::InMemoryAdministrationClient;
pub use paging::{collect_all, paginate, ListOptions, Page};
pub use series::{MetricSeriesData, MetricSeriesDefinition, SeriesPoint, SeriesPointRecord, SeriesSummary};

use crate::core::{
    AlertConfigurationId, CredentialId, DataFeedGranularity, DataFeedId, DataFeedStatus,
    DetectionConfigurationId, DimensionKey, FeedbackId, HookId, MetricId, Result,
};
use crate::models::{
    AnomalyAlertConfiguration, AnomalyDetectionConfiguration, DataFeed, DataFeedSourceType,
    DataSourceCredential, FeedbackType, MetricFeedback, NotificationHook,
};
use chrono::{DateTime, Utc};

/// Filters for [`AdministrationClient::list_data_feeds`]
#[derive(Debug, Clone, Default)]
pub struct DataFeedFilter {
    /// Substring match on the feed name
    pub name: Option<String>,
    pub source_type: Option<DataFeedSourceType>,
    pub granularity: Option<DataFeedGranularity>,
    pub status: Option<DataFeedStatus>,
}

impl DataFeedFilter {
    pub fn matches(&self, feed: &DataFeed) -> bool {
        self.name.as_deref().map_or(true, |n| feed.name.contains(n))
            && self.source_type.map_or(true, |t| feed.source.source_type() == t)
            && self.granularity.map_or(true, |g| feed.granularity == g)
            && self.status.map_or(true, |s| feed.status == s)
    }
}

/// Filters for [`AdministrationClient::list_feedback`]
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    /// Feedback whose dimension filter contains all of these pairs
    pub dimension_filter: Option<DimensionKey>,
    pub feedback_type: Option<FeedbackType>,
    /// Only feedback whose time range overlaps `[start_time, end_time]`
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl FeedbackFilter {
    pub fn matches(&self, feedback: &MetricFeedback) -> bool {
        if let Some(filter) = &self.dimension_filter {
            if !feedback.common.dimension_filter.contains(filter) {
                return false;
            }
        }
        if let Some(kind) = self.feedback_type {
            if feedback.feedback_type() != kind {
                return false;
            }
        }
        if self.start_time.is_none() && self.end_time.is_none() {
            return true;
        }
        match feedback.time_range() {
            Some((from, to)) => {
                let starts_before_window_end = match (from, self.end_time) {
                    (Some(from), Some(end)) => from <= end,
                    _ => true,
                };
                let ends_after_window_start = match (to, self.start_time) {
                    (Some(to), Some(start)) => to >= start,
                    _ => true,
                };
                starts_before_window_end && ends_after_window_start
            },
            None => false,
        }
    }
}

/// Create, read, update, delete and list operations for every administration
/// entity, plus series ingestion and queries.
#[async_trait::async_trait]
pub trait AdministrationClient: Send + Sync {
    /// Create a data feed; metric ids are assigned in the returned copy.
    async fn create_data_feed(&self, feed: DataFeed) -> Result<DataFeed>;

    async fn get_data_feed(&self, id: &DataFeedId) -> Result<DataFeed>;

    async fn update_data_feed(&self, feed: DataFeed) -> Result<DataFeed>;

    /// Delete a data feed together with its detection configurations, the
    /// alert configurations using them, its feedback and its series.
    async fn delete_data_feed(&self, id: &DataFeedId) -> Result<()>;

    async fn list_data_feeds(&self, filter: &DataFeedFilter, options: &ListOptions) -> Result<Page<DataFeed>>;

    async fn create_detection_configuration(
        &self,
        config: AnomalyDetectionConfiguration,
    ) -> Result<AnomalyDetectionConfiguration>;

    async fn get_detection_configuration(
        &self,
        id: &DetectionConfigurationId,
    ) -> Result<AnomalyDetectionConfiguration>;

    async fn update_detection_configuration(
        &self,
        config: AnomalyDetectionConfiguration,
    ) -> Result<AnomalyDetectionConfiguration>;

    async fn delete_detection_configuration(&self, id: &DetectionConfigurationId) -> Result<()>;

    async fn list_detection_configurations(
        &self,
        metric_id: &MetricId,
        options: &ListOptions,
    ) -> Result<Page<AnomalyDetectionConfiguration>>;

    async fn create_alert_configuration(
        &self,
        config: AnomalyAlertConfiguration,
    ) -> Result<AnomalyAlertConfiguration>;

    async fn get_alert_configuration(&self, id: &AlertConfigurationId) -> Result<AnomalyAlertConfiguration>;

    async fn update_alert_configuration(
        &self,
        config: AnomalyAlertConfiguration,
    ) -> Result<AnomalyAlertConfiguration>;

    async fn delete_alert_configuration(&self, id: &AlertConfigurationId) -> Result<()>;

    async fn list_alert_configurations(
        &self,
        detection_configuration_id: &DetectionConfigurationId,
        options: &ListOptions,
    ) -> Result<Page<AnomalyAlertConfiguration>>;

    async fn create_hook(&self, hook: NotificationHook) -> Result<NotificationHook>;

    async fn get_hook(&self, id: &HookId) -> Result<NotificationHook>;

    async fn update_hook(&self, hook: NotificationHook) -> Result<NotificationHook>;

    async fn delete_hook(&self, id: &HookId) -> Result<()>;

    /// List hooks, optionally filtered by a name substring.
    async fn list_hooks(&self, name: Option<&str>, options: &ListOptions) -> Result<Page<NotificationHook>>;

    async fn create_credential(&self, credential: DataSourceCredential) -> Result<DataSourceCredential>;

    async fn get_credential(&self, id: &CredentialId) -> Result<DataSourceCredential>;

    async fn update_credential(&self, credential: DataSourceCredential) -> Result<DataSourceCredential>;

    async fn delete_credential(&self, id: &CredentialId) -> Result<()>;

    async fn list_credentials(&self, options: &ListOptions) -> Result<Page<DataSourceCredential>>;

    async fn add_feedback(&self, feedback: MetricFeedback) -> Result<MetricFeedback>;

    async fn get_feedback(&self, id: &FeedbackId) -> Result<MetricFeedback>;

    async fn list_feedback(
        &self,
        metric_id: &MetricId,
        filter: &FeedbackFilter,
        options: &ListOptions,
    ) -> Result<Page<MetricFeedback>>;

    /// Store points; a repeated timestamp overwrites the earlier value.
    /// Returns the number of points written.
    async fn ingest_points(&self, points: Vec<SeriesPointRecord>) -> Result<usize>;

    /// Series of a metric whose key contains every pair of `dimension_filter`.
    async fn list_metric_series_definitions(
        &self,
        metric_id: &MetricId,
        dimension_filter: &DimensionKey,
        options: &ListOptions,
    ) -> Result<Page<MetricSeriesDefinition>>;

    /// Points for each requested series within `[start, end]`. Unknown series
    /// come back with no points.
    async fn get_metric_series_data(
        &self,
        metric_id: &MetricId,
        series_keys: &[DimensionKey],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MetricSeriesData>>;

    /// Distinct values seen for one dimension of a metric, sorted.
    async fn list_dimension_values(
        &self,
        metric_id: &MetricId,
        dimension_name: &str,
        options: &ListOptions,
    ) -> Result<Page<String>>;
}
