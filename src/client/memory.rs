//! In-memory implementation of [`AdministrationClient`].
//!
//! Entities live in `DashMap`s keyed by id. Every mutation takes a single async
//! write lock so that uniqueness checks, reference checks and cascading deletes
//! observe a consistent view. Reads never take the lock.

use super::paging::paginate;
use super::series::{MetricSeriesData, MetricSeriesDefinition, SeriesPoint, SeriesPointRecord};
use super::{AdministrationClient, DataFeedFilter, FeedbackFilter, ListOptions, Page};
use crate::core::config::PagingConfig;
use crate::core::{
    AlertConfigurationId, Config, CredentialId, DataFeedId, DetectionConfigurationId,
    DimensionKey, FeedbackId, HookId, MetricId, MetricsAdvisorError, Result,
};
use crate::models::{
    AnomalyAlertConfiguration, AnomalyDetectionConfiguration, DataFeed, DataSourceCredential,
    FeedbackKind, MetricFeedback, NotificationHook,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tokio::sync::Mutex;

/// Entity and series counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdministrationStats {
    pub data_feeds: usize,
    pub metrics: usize,
    pub detection_configurations: usize,
    pub alert_configurations: usize,
    pub hooks: usize,
    pub credentials: usize,
    pub feedback: usize,
    pub series: usize,
    pub points: usize,
}

/// Service double holding every entity in memory.
pub struct InMemoryAdministrationClient {
    paging: PagingConfig,
    data_feeds: DashMap<DataFeedId, DataFeed>,
    /// Owning data feed of each metric.
    metric_feeds: DashMap<MetricId, DataFeedId>,
    detection_configs: DashMap<DetectionConfigurationId, AnomalyDetectionConfiguration>,
    alert_configs: DashMap<AlertConfigurationId, AnomalyAlertConfiguration>,
    hooks: DashMap<HookId, NotificationHook>,
    credentials: DashMap<CredentialId, DataSourceCredential>,
    feedback: DashMap<FeedbackId, MetricFeedback>,
    series: DashMap<(MetricId, DimensionKey), BTreeMap<DateTime<Utc>, f64>>,
    write_lock: Mutex<()>,
}

impl Default for InMemoryAdministrationClient {
    fn default() -> Self {
        Self::new(PagingConfig::default())
    }
}

impl InMemoryAdministrationClient {
    /// Create an empty client with the given paging defaults.
    pub fn new(paging: PagingConfig) -> Self {
        Self {
            paging,
            data_feeds: DashMap::new(),
            metric_feeds: DashMap::new(),
            detection_configs: DashMap::new(),
            alert_configs: DashMap::new(),
            hooks: DashMap::new(),
            credentials: DashMap::new(),
            feedback: DashMap::new(),
            series: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a client from validated configuration.
    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            endpoint = %config.client.endpoint,
            version = config.client.service_version.as_str(),
            "Creating in-memory administration client"
        );
        Ok(Self::new(config.paging.clone()))
    }

    pub fn stats(&self) -> AdministrationStats {
        AdministrationStats {
            data_feeds: self.data_feeds.len(),
            metrics: self.metric_feeds.len(),
            detection_configurations: self.detection_configs.len(),
            alert_configurations: self.alert_configs.len(),
            hooks: self.hooks.len(),
            credentials: self.credentials.len(),
            feedback: self.feedback.len(),
            series: self.series.len(),
            points: self.series.iter().map(|e| e.value().len()).sum(),
        }
    }

    fn ensure_metric(&self, metric_id: &MetricId) -> Result<DataFeedId> {
        self.metric_feeds
            .get(metric_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| MetricsAdvisorError::not_found("metric", metric_id.as_str()))
    }

    fn ensure_credential_reference(&self, feed: &DataFeed) -> Result<()> {
        match feed.source.credential_id() {
            Some(id) if !self.credentials.contains_key(id) => {
                Err(MetricsAdvisorError::not_found("credential", id.as_str()))
            },
            _ => Ok(()),
        }
    }

    fn ensure_feed_name_free(&self, name: &str, except: Option<&DataFeedId>) -> Result<()> {
        let taken = self
            .data_feeds
            .iter()
            .any(|e| e.name == name && Some(e.key()) != except);
        if taken {
            return Err(MetricsAdvisorError::conflict(format!(
                "a data feed named '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn ensure_hook_name_free(&self, name: &str, except: Option<&HookId>) -> Result<()> {
        let taken = self
            .hooks
            .iter()
            .any(|e| e.name() == name && Some(e.key()) != except);
        if taken {
            return Err(MetricsAdvisorError::conflict(format!(
                "a hook named '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn ensure_credential_name_free(&self, name: &str, except: Option<&CredentialId>) -> Result<()> {
        let taken = self
            .credentials
            .iter()
            .any(|e| e.name() == name && Some(e.key()) != except);
        if taken {
            return Err(MetricsAdvisorError::conflict(format!(
                "a credential named '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn ensure_alert_references(&self, config: &AnomalyAlertConfiguration) -> Result<()> {
        if let Some(missing) = config
            .detection_configuration_ids()
            .find(|id| !self.detection_configs.contains_key(*id))
        {
            return Err(MetricsAdvisorError::not_found(
                "detection configuration",
                missing.as_str(),
            ));
        }
        if let Some(missing) = config.hook_ids.iter().find(|id| !self.hooks.contains_key(*id)) {
            return Err(MetricsAdvisorError::not_found("hook", missing.as_str()));
        }
        Ok(())
    }

    fn ensure_feedback_detection(&self, feedback: &MetricFeedback) -> Result<()> {
        let FeedbackKind::Anomaly {
            detection_configuration_id: Some(detection_id),
            ..
        } = &feedback.kind
        else {
            return Ok(());
        };
        let config = self
            .detection_configs
            .get(detection_id)
            .ok_or_else(|| MetricsAdvisorError::not_found("detection configuration", detection_id.as_str()))?;
        if config.metric_id != feedback.common.metric_id {
            return Err(MetricsAdvisorError::validation(format!(
                "detection configuration {} does not belong to metric {}",
                detection_id, feedback.common.metric_id
            )));
        }
        Ok(())
    }

    /// Dimension column names of the feed that owns `metric_id`.
    fn feed_dimensions(&self, metric_id: &MetricId) -> Result<HashSet<String>> {
        let feed_id = self.ensure_metric(metric_id)?;
        let feed = self
            .data_feeds
            .get(&feed_id)
            .ok_or_else(|| MetricsAdvisorError::not_found("data feed", feed_id.as_str()))?;
        Ok(feed.schema.dimensions.iter().map(|d| d.name.clone()).collect())
    }
}

fn sort_by_name<T>(items: &mut [T], name: impl Fn(&T) -> &str, id: impl Fn(&T) -> Option<&str>) {
    items.sort_by(|a, b| name(a).cmp(name(b)).then_with(|| id(a).cmp(&id(b))));
}

#[async_trait::async_trait]
impl AdministrationClient for InMemoryAdministrationClient {
    async fn create_data_feed(&self, mut feed: DataFeed) -> Result<DataFeed> {
        feed.validate()?;
        let _guard = self.write_lock.lock().await;

        self.ensure_feed_name_free(&feed.name, None)?;
        self.ensure_credential_reference(&feed)?;

        let id = DataFeedId::new_random();
        feed.id = Some(id.clone());
        feed.created_time = Some(Utc::now());
        for metric in &mut feed.schema.metrics {
            let metric_id = MetricId::new_random();
            self.metric_feeds.insert(metric_id.clone(), id.clone());
            metric.id = Some(metric_id);
        }

        self.data_feeds.insert(id.clone(), feed.clone());
        tracing::info!(
            data_feed_id = %id,
            name = %feed.name,
            source = %feed.source.source_type(),
            metrics = feed.schema.metrics.len(),
            "Created data feed"
        );
        Ok(feed)
    }

    async fn get_data_feed(&self, id: &DataFeedId) -> Result<DataFeed> {
        tracing::debug!(data_feed_id = %id, "Getting data feed");
        self.data_feeds
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| MetricsAdvisorError::not_found("data feed", id.as_str()))
    }

    async fn update_data_feed(&self, mut feed: DataFeed) -> Result<DataFeed> {
        feed.validate()?;
        let id = feed
            .id
            .clone()
            .ok_or_else(|| MetricsAdvisorError::invalid_argument("data feed id is required for update"))?;
        let _guard = self.write_lock.lock().await;

        let existing = self.get_data_feed(&id).await?;
        self.ensure_feed_name_free(&feed.name, Some(&id))?;
        self.ensure_credential_reference(&feed)?;

        let new_names: HashSet<&str> = feed.schema.metrics.iter().map(|m| m.name.as_str()).collect();
        if let Some(removed) = existing
            .schema
            .metrics
            .iter()
            .find(|m| !new_names.contains(m.name.as_str()))
        {
            return Err(MetricsAdvisorError::validation(format!(
                "metric '{}' cannot be removed from an existing data feed",
                removed.name
            )));
        }

        let old_dimensions: HashSet<&str> = existing.schema.dimensions.iter().map(|d| d.name.as_str()).collect();
        let new_dimensions: HashSet<&str> = feed.schema.dimensions.iter().map(|d| d.name.as_str()).collect();
        if old_dimensions != new_dimensions {
            tracing::warn!(data_feed_id = %id, "Rejected dimension column change");
            return Err(MetricsAdvisorError::validation(
                "dimension columns of an existing data feed cannot be changed",
            ));
        }

        for metric in &mut feed.schema.metrics {
            let metric_id = match existing.schema.metric_id(&metric.name) {
                Some(known) => known.clone(),
                None => {
                    let fresh = MetricId::new_random();
                    self.metric_feeds.insert(fresh.clone(), id.clone());
                    fresh
                },
            };
            metric.id = Some(metric_id);
        }
        feed.created_time = existing.created_time;

        self.data_feeds.insert(id.clone(), feed.clone());
        tracing::info!(data_feed_id = %id, name = %feed.name, "Updated data feed");
        Ok(feed)
    }

    async fn delete_data_feed(&self, id: &DataFeedId) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let (_, feed) = self
            .data_feeds
            .remove(id)
            .ok_or_else(|| MetricsAdvisorError::not_found("data feed", id.as_str()))?;

        let metric_ids: HashSet<MetricId> = feed.metric_ids().cloned().collect();
        for metric_id in &metric_ids {
            self.metric_feeds.remove(metric_id);
        }

        let detection_ids: HashSet<DetectionConfigurationId> = self
            .detection_configs
            .iter()
            .filter(|e| metric_ids.contains(&e.metric_id))
            .map(|e| e.key().clone())
            .collect();
        for detection_id in &detection_ids {
            self.detection_configs.remove(detection_id);
        }

        let alerts_before = self.alert_configs.len();
        self.alert_configs.retain(|_, alert| {
            !alert
                .detection_configuration_ids()
                .any(|d| detection_ids.contains(d))
        });
        self.feedback
            .retain(|_, f| !metric_ids.contains(&f.common.metric_id));
        self.series.retain(|(metric_id, _), _| !metric_ids.contains(metric_id));

        tracing::info!(
            data_feed_id = %id,
            detection_configurations = detection_ids.len(),
            alert_configurations = alerts_before - self.alert_configs.len(),
            "Deleted data feed"
        );
        Ok(())
    }

    async fn list_data_feeds(&self, filter: &DataFeedFilter, options: &ListOptions) -> Result<Page<DataFeed>> {
        let mut feeds: Vec<DataFeed> = self
            .data_feeds
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        sort_by_name(&mut feeds, |f| f.name.as_str(), |f| f.id.as_ref().map(DataFeedId::as_str));
        tracing::debug!(matched = feeds.len(), "Listing data feeds");
        paginate(feeds, options, &self.paging)
    }

    async fn create_detection_configuration(
        &self,
        mut config: AnomalyDetectionConfiguration,
    ) -> Result<AnomalyDetectionConfiguration> {
        config.validate()?;
        let _guard = self.write_lock.lock().await;
        self.ensure_metric(&config.metric_id)?;

        let id = DetectionConfigurationId::new_random();
        config.id = Some(id.clone());
        self.detection_configs.insert(id.clone(), config.clone());
        tracing::info!(
            detection_configuration_id = %id,
            metric_id = %config.metric_id,
            series_groups = config.series_group_conditions.len(),
            series = config.series_conditions.len(),
            "Created detection configuration"
        );
        Ok(config)
    }

    async fn get_detection_configuration(
        &self,
        id: &DetectionConfigurationId,
    ) -> Result<AnomalyDetectionConfiguration> {
        self.detection_configs
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| MetricsAdvisorError::not_found("detection configuration", id.as_str()))
    }

    async fn update_detection_configuration(
        &self,
        config: AnomalyDetectionConfiguration,
    ) -> Result<AnomalyDetectionConfiguration> {
        config.validate()?;
        let id = config.id.clone().ok_or_else(|| {
            MetricsAdvisorError::invalid_argument("detection configuration id is required for update")
        })?;
        let _guard = self.write_lock.lock().await;

        let existing = self.get_detection_configuration(&id).await?;
        if existing.metric_id != config.metric_id {
            return Err(MetricsAdvisorError::validation(
                "the metric of a detection configuration cannot be changed",
            ));
        }

        self.detection_configs.insert(id.clone(), config.clone());
        tracing::info!(detection_configuration_id = %id, "Updated detection configuration");
        Ok(config)
    }

    async fn delete_detection_configuration(&self, id: &DetectionConfigurationId) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let in_use = self
            .alert_configs
            .iter()
            .find(|e| e.detection_configuration_ids().any(|d| d == id))
            .map(|e| e.key().clone());
        if let Some(alert_id) = in_use {
            tracing::warn!(detection_configuration_id = %id, alert_configuration_id = %alert_id, "Refusing to delete detection configuration in use");
            return Err(MetricsAdvisorError::conflict(format!(
                "detection configuration {} is used by alert configuration {}",
                id, alert_id
            )));
        }

        self.detection_configs
            .remove(id)
            .ok_or_else(|| MetricsAdvisorError::not_found("detection configuration", id.as_str()))?;
        tracing::info!(detection_configuration_id = %id, "Deleted detection configuration");
        Ok(())
    }

    async fn list_detection_configurations(
        &self,
        metric_id: &MetricId,
        options: &ListOptions,
    ) -> Result<Page<AnomalyDetectionConfiguration>> {
        self.ensure_metric(metric_id)?;
        let mut configs: Vec<AnomalyDetectionConfiguration> = self
            .detection_configs
            .iter()
            .filter(|e| &e.metric_id == metric_id)
            .map(|e| e.value().clone())
            .collect();
        sort_by_name(&mut configs, |c| c.name.as_str(), |c| c.id.as_ref().map(DetectionConfigurationId::as_str));
        paginate(configs, options, &self.paging)
    }

    async fn create_alert_configuration(
        &self,
        mut config: AnomalyAlertConfiguration,
    ) -> Result<AnomalyAlertConfiguration> {
        config.validate()?;
        let _guard = self.write_lock.lock().await;
        self.ensure_alert_references(&config)?;

        let id = AlertConfigurationId::new_random();
        config.id = Some(id.clone());
        self.alert_configs.insert(id.clone(), config.clone());
        tracing::info!(
            alert_configuration_id = %id,
            hooks = config.hook_ids.len(),
            "Created alert configuration"
        );
        Ok(config)
    }

    async fn get_alert_configuration(&self, id: &AlertConfigurationId) -> Result<AnomalyAlertConfiguration> {
        self.alert_configs
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| MetricsAdvisorError::not_found("alert configuration", id.as_str()))
    }

    async fn update_alert_configuration(
        &self,
        config: AnomalyAlertConfiguration,
    ) -> Result<AnomalyAlertConfiguration> {
        config.validate()?;
        let id = config.id.clone().ok_or_else(|| {
            MetricsAdvisorError::invalid_argument("alert configuration id is required for update")
        })?;
        let _guard = self.write_lock.lock().await;

        self.get_alert_configuration(&id).await?;
        self.ensure_alert_references(&config)?;

        self.alert_configs.insert(id.clone(), config.clone());
        tracing::info!(alert_configuration_id = %id, "Updated alert configuration");
        Ok(config)
    }

    async fn delete_alert_configuration(&self, id: &AlertConfigurationId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.alert_configs
            .remove(id)
            .ok_or_else(|| MetricsAdvisorError::not_found("alert configuration", id.as_str()))?;
        tracing::info!(alert_configuration_id = %id, "Deleted alert configuration");
        Ok(())
    }

    async fn list_alert_configurations(
        &self,
        detection_configuration_id: &DetectionConfigurationId,
        options: &ListOptions,
    ) -> Result<Page<AnomalyAlertConfiguration>> {
        self.get_detection_configuration(detection_configuration_id).await?;
        let mut configs: Vec<AnomalyAlertConfiguration> = self
            .alert_configs
            .iter()
            .filter(|e| {
                e.detection_configuration_ids()
                    .any(|d| d == detection_configuration_id)
            })
            .map(|e| e.value().clone())
            .collect();
        sort_by_name(&mut configs, |c| c.name.as_str(), |c| c.id.as_ref().map(AlertConfigurationId::as_str));
        paginate(configs, options, &self.paging)
    }

    async fn create_hook(&self, mut hook: NotificationHook) -> Result<NotificationHook> {
        hook.validate()?;
        let _guard = self.write_lock.lock().await;
        self.ensure_hook_name_free(hook.name(), None)?;

        let id = HookId::new_random();
        hook.common_mut().id = Some(id.clone());
        self.hooks.insert(id.clone(), hook.clone());
        tracing::info!(hook_id = %id, name = %hook.name(), "Created hook");
        Ok(hook.redacted())
    }

    async fn get_hook(&self, id: &HookId) -> Result<NotificationHook> {
        self.hooks
            .get(id)
            .map(|e| e.value().redacted())
            .ok_or_else(|| MetricsAdvisorError::not_found("hook", id.as_str()))
    }

    async fn update_hook(&self, mut hook: NotificationHook) -> Result<NotificationHook> {
        let id = hook
            .id()
            .cloned()
            .ok_or_else(|| MetricsAdvisorError::invalid_argument("hook id is required for update"))?;
        let _guard = self.write_lock.lock().await;

        let stored = self
            .hooks
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or_else(|| MetricsAdvisorError::not_found("hook", id.as_str()))?;
        hook.keep_secrets_from(&stored);
        hook.validate()?;
        self.ensure_hook_name_free(hook.name(), Some(&id))?;

        self.hooks.insert(id.clone(), hook.clone());
        tracing::info!(hook_id = %id, "Updated hook");
        Ok(hook.redacted())
    }

    async fn delete_hook(&self, id: &HookId) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if self.alert_configs.iter().any(|e| e.hook_ids.contains(id)) {
            return Err(MetricsAdvisorError::conflict(format!(
                "hook {} is used by an alert configuration",
                id
            )));
        }
        self.hooks
            .remove(id)
            .ok_or_else(|| MetricsAdvisorError::not_found("hook", id.as_str()))?;
        tracing::info!(hook_id = %id, "Deleted hook");
        Ok(())
    }

    async fn list_hooks(&self, name: Option<&str>, options: &ListOptions) -> Result<Page<NotificationHook>> {
        let mut hooks: Vec<NotificationHook> = self
            .hooks
            .iter()
            .filter(|e| name.map_or(true, |n| e.name().contains(n)))
            .map(|e| e.value().redacted())
            .collect();
        sort_by_name(&mut hooks, NotificationHook::name, |h| h.id().map(HookId::as_str));
        paginate(hooks, options, &self.paging)
    }

    async fn create_credential(&self, mut credential: DataSourceCredential) -> Result<DataSourceCredential> {
        credential.validate()?;
        let _guard = self.write_lock.lock().await;
        self.ensure_credential_name_free(credential.name(), None)?;

        let id = CredentialId::new_random();
        credential.set_id(id.clone());
        self.credentials.insert(id.clone(), credential.clone());
        tracing::info!(credential_id = %id, kind = credential.kind(), "Created credential");
        Ok(credential.redacted())
    }

    async fn get_credential(&self, id: &CredentialId) -> Result<DataSourceCredential> {
        self.credentials
            .get(id)
            .map(|e| e.value().redacted())
            .ok_or_else(|| MetricsAdvisorError::not_found("credential", id.as_str()))
    }

    async fn update_credential(&self, mut credential: DataSourceCredential) -> Result<DataSourceCredential> {
        let id = credential
            .id()
            .cloned()
            .ok_or_else(|| MetricsAdvisorError::invalid_argument("credential id is required for update"))?;
        let _guard = self.write_lock.lock().await;

        let stored = self
            .credentials
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or_else(|| MetricsAdvisorError::not_found("credential", id.as_str()))?;
        if stored.kind() != credential.kind() {
            return Err(MetricsAdvisorError::validation(format!(
                "credential kind cannot change from {} to {}",
                stored.kind(),
                credential.kind()
            )));
        }
        credential.keep_secrets_from(&stored);
        credential.validate()?;
        self.ensure_credential_name_free(credential.name(), Some(&id))?;

        self.credentials.insert(id.clone(), credential.clone());
        tracing::info!(credential_id = %id, "Updated credential");
        Ok(credential.redacted())
    }

    async fn delete_credential(&self, id: &CredentialId) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if self
            .data_feeds
            .iter()
            .any(|e| e.source.credential_id() == Some(id))
        {
            return Err(MetricsAdvisorError::conflict(format!(
                "credential {} is used by a data feed",
                id
            )));
        }
        self.credentials
            .remove(id)
            .ok_or_else(|| MetricsAdvisorError::not_found("credential", id.as_str()))?;
        tracing::info!(credential_id = %id, "Deleted credential");
        Ok(())
    }

    async fn list_credentials(&self, options: &ListOptions) -> Result<Page<DataSourceCredential>> {
        let mut credentials: Vec<DataSourceCredential> =
            self.credentials.iter().map(|e| e.value().redacted()).collect();
        sort_by_name(&mut credentials, DataSourceCredential::name, |c| {
            c.id().map(CredentialId::as_str)
        });
        paginate(credentials, options, &self.paging)
    }

    async fn add_feedback(&self, mut feedback: MetricFeedback) -> Result<MetricFeedback> {
        feedback.validate()?;
        let _guard = self.write_lock.lock().await;

        let dimensions = self.feed_dimensions(&feedback.common.metric_id)?;
        if let Some(unknown) = feedback
            .common
            .dimension_filter
            .names()
            .find(|name| !dimensions.contains(*name))
        {
            return Err(MetricsAdvisorError::validation(format!(
                "'{}' is not a dimension of metric {}",
                unknown, feedback.common.metric_id
            )));
        }
        self.ensure_feedback_detection(&feedback)?;

        let id = FeedbackId::new_random();
        feedback.common.id = Some(id.clone());
        feedback.common.created_time = Some(Utc::now());
        self.feedback.insert(id.clone(), feedback.clone());
        tracing::info!(
            feedback_id = %id,
            metric_id = %feedback.common.metric_id,
            series = %feedback.common.dimension_filter,
            "Added feedback"
        );
        Ok(feedback)
    }

    async fn get_feedback(&self, id: &FeedbackId) -> Result<MetricFeedback> {
        self.feedback
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| MetricsAdvisorError::not_found("feedback", id.as_str()))
    }

    async fn list_feedback(
        &self,
        metric_id: &MetricId,
        filter: &FeedbackFilter,
        options: &ListOptions,
    ) -> Result<Page<MetricFeedback>> {
        self.ensure_metric(metric_id)?;
        let mut records: Vec<MetricFeedback> = self
            .feedback
            .iter()
            .filter(|e| &e.common.metric_id == metric_id && filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        records.sort_by(|a, b| {
            a.common
                .created_time
                .cmp(&b.common.created_time)
                .then_with(|| a.common.id.cmp(&b.common.id))
        });
        paginate(records, options, &self.paging)
    }

    async fn ingest_points(&self, points: Vec<SeriesPointRecord>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut dimensions: HashMap<MetricId, HashSet<String>> = HashMap::new();
        for point in &points {
            if !point.value.is_finite() {
                return Err(MetricsAdvisorError::validation(format!(
                    "point value for {} at {} is not finite",
                    point.dimensions, point.timestamp
                )));
            }
            if !dimensions.contains_key(&point.metric_id) {
                let names = self.feed_dimensions(&point.metric_id)?;
                dimensions.insert(point.metric_id.clone(), names);
            }
            let expected = &dimensions[&point.metric_id];
            let matches = point.dimensions.len() == expected.len()
                && point.dimensions.names().all(|name| expected.contains(name));
            if !matches {
                tracing::warn!(metric_id = %point.metric_id, series = %point.dimensions, "Rejected point with mismatched dimensions");
                return Err(MetricsAdvisorError::validation(format!(
                    "series key {} does not match the dimensions of metric {}",
                    point.dimensions, point.metric_id
                )));
            }
        }

        let written = points.len();
        for point in points {
            self.series
                .entry((point.metric_id, point.dimensions))
                .or_default()
                .insert(point.timestamp, point.value);
        }
        tracing::debug!(points = written, "Ingested series points");
        Ok(written)
    }

    async fn list_metric_series_definitions(
        &self,
        metric_id: &MetricId,
        dimension_filter: &DimensionKey,
        options: &ListOptions,
    ) -> Result<Page<MetricSeriesDefinition>> {
        self.ensure_metric(metric_id)?;
        let mut keys: Vec<DimensionKey> = self
            .series
            .iter()
            .filter(|e| &e.key().0 == metric_id && e.key().1.contains(dimension_filter))
            .map(|e| e.key().1.clone())
            .collect();
        keys.sort_by_cached_key(DimensionKey::to_string);

        let definitions = keys
            .into_iter()
            .map(|series_key| MetricSeriesDefinition {
                metric_id: metric_id.clone(),
                series_key,
            })
            .collect();
        paginate(definitions, options, &self.paging)
    }

    async fn get_metric_series_data(
        &self,
        metric_id: &MetricId,
        series_keys: &[DimensionKey],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MetricSeriesData>> {
        if start > end {
            return Err(MetricsAdvisorError::invalid_argument(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        self.ensure_metric(metric_id)?;
        tracing::debug!(metric_id = %metric_id, series = series_keys.len(), "Querying series data");

        let data = series_keys
            .iter()
            .map(|key| {
                let points = self
                    .series
                    .get(&(metric_id.clone(), key.clone()))
                    .map(|values| {
                        values
                            .range(start..=end)
                            .map(|(timestamp, value)| SeriesPoint {
                                timestamp: *timestamp,
                                value: *value,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                MetricSeriesData {
                    definition: MetricSeriesDefinition {
                        metric_id: metric_id.clone(),
                        series_key: key.clone(),
                    },
                    points,
                }
            })
            .collect();
        Ok(data)
    }

    async fn list_dimension_values(
        &self,
        metric_id: &MetricId,
        dimension_name: &str,
        options: &ListOptions,
    ) -> Result<Page<String>> {
        let dimensions = self.feed_dimensions(metric_id)?;
        if !dimensions.contains(dimension_name) {
            return Err(MetricsAdvisorError::invalid_argument(format!(
                "'{}' is not a dimension of metric {}",
                dimension_name, metric_id
            )));
        }

        let values: BTreeSet<String> = self
            .series
            .iter()
            .filter(|e| &e.key().0 == metric_id)
            .filter_map(|e| e.key().1.get(dimension_name).map(str::to_string))
            .collect();
        paginate(values.into_iter().collect(), options, &self.paging)
    }
}
