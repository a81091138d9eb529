//! Common test utilities and fixtures.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use metrics_advisor::client::{AdministrationClient, InMemoryAdministrationClient, SeriesPointRecord};
use metrics_advisor::core::config::PagingConfig;
use metrics_advisor::core::{DataFeedGranularity, DimensionKey, MetricId};
use metrics_advisor::models::{
    AnomalyDetectionConfiguration, AnomalyDetectorDirection, DataFeed, DataFeedIngestionSettings, DataFeedSchema,
    DataFeedSource, DetectionConditions, HardThresholdCondition, SmartDetectionCondition,
    SuppressCondition,
};

/// Test fixture builder for data feeds with sensible defaults.
pub struct TestDataFeedBuilder {
    name: String,
    metrics: Vec<String>,
    dimensions: Vec<String>,
    granularity: DataFeedGranularity,
    source: DataFeedSource,
}

impl TestDataFeedBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            metrics: vec!["cost".to_string(), "revenue".to_string()],
            dimensions: vec!["city".to_string(), "category".to_string()],
            granularity: DataFeedGranularity::Daily,
            source: DataFeedSource::PostgreSql {
                connection_string: "host=localhost;db=sales".to_string(),
                query: "select * from sales where ts = @IntervalStart".to_string(),
            },
        }
    }

    pub fn metrics(mut self, metrics: &[&str]) -> Self {
        self.metrics = metrics.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn dimensions(mut self, dimensions: &[&str]) -> Self {
        self.dimensions = dimensions.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn granularity(mut self, granularity: DataFeedGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn source(mut self, source: DataFeedSource) -> Self {
        self.source = source;
        self
    }

    pub fn build(self) -> DataFeed {
        DataFeed::new(
            self.name,
            self.source,
            self.granularity,
            DataFeedSchema::new(self.metrics, self.dimensions),
            DataFeedIngestionSettings::starting_at(day(1)),
        )
    }
}

/// Midnight UTC on the given day of January 2024.
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

pub fn key(pairs: &[(&str, &str)]) -> DimensionKey {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

pub fn smart_detection(sensitivity: f64) -> DetectionConditions {
    DetectionConditions::default().with_smart_detection(SmartDetectionCondition {
        sensitivity,
        direction: AnomalyDetectorDirection::Both,
        suppress: SuppressCondition::new(1, 100.0),
    })
}

pub fn hard_threshold(lower: f64, upper: f64) -> DetectionConditions {
    DetectionConditions::default().with_hard_threshold(HardThresholdCondition {
        lower_bound: Some(lower),
        upper_bound: Some(upper),
        direction: AnomalyDetectorDirection::Both,
        suppress: SuppressCondition::new(1, 50.0),
    })
}

pub fn client_with_page_size(default_page_size: usize) -> InMemoryAdministrationClient {
    InMemoryAdministrationClient::new(PagingConfig {
        default_page_size,
        max_page_size: 100,
    })
}

/// Create a data feed and return it with the id of its first metric.
pub async fn create_feed(client: &InMemoryAdministrationClient, name: &str) -> (DataFeed, MetricId) {
    let feed = client
        .create_data_feed(TestDataFeedBuilder::new(name).build())
        .await
        .unwrap();
    let metric_id = feed.metric_ids().next().unwrap().clone();
    (feed, metric_id)
}

pub async fn create_detection(
    client: &InMemoryAdministrationClient,
    metric_id: &MetricId,
    name: &str,
) -> AnomalyDetectionConfiguration {
    client
        .create_detection_configuration(AnomalyDetectionConfiguration::new(
            name,
            metric_id.clone(),
            smart_detection(60.0),
        ))
        .await
        .unwrap()
}

/// One point per day for `days` days on every given series.
pub fn daily_points(metric_id: &MetricId, series: &[DimensionKey], days: u32) -> Vec<SeriesPointRecord> {
    let mut points = Vec::new();
    for key in series {
        for d in 1..=days {
            points.push(SeriesPointRecord {
                metric_id: metric_id.clone(),
                dimensions: key.clone(),
                timestamp: day(d),
                value: f64::from(d) * 10.0,
            });
        }
    }
    points
}
