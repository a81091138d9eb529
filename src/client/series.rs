//! Time-series slice data addressed by metric and [`DimensionKey`].

use crate::core::{DimensionKey, MetricId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A point together with the series it belongs to, as ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPointRecord {
    pub metric_id: MetricId,
    pub dimensions: DimensionKey,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Identity of one series slice
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricSeriesDefinition {
    pub metric_id: MetricId,
    pub series_key: DimensionKey,
}

/// Points of one series within a queried window, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeriesData {
    pub definition: MetricSeriesDefinition,
    pub points: Vec<SeriesPoint>,
}

impl MetricSeriesData {
    pub fn summary(&self) -> Option<SeriesSummary> {
        SeriesSummary::from_points(&self.points)
    }
}

/// Basic statistics over a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl SeriesSummary {
    /// `None` for an empty series
    pub fn from_points(points: &[SeriesPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let (min, max, sum) = points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), p| (min.min(p.value), max.max(p.value), sum + p.value),
        );
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / points.len() as f64;
        Some(Self {
            count: points.len(),
            min,
            max,
            mean,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_summary() {
        let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
        let points = vec![
            SeriesPoint { timestamp: at(0), value: 2.0 },
            SeriesPoint { timestamp: at(1), value: 4.0 },
            SeriesPoint { timestamp: at(2), value: 9.0 },
        ];
        let summary = SeriesSummary::from_points(&points).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        assert_eq!(summary.mean, 5.0);
        assert!(SeriesSummary::from_points(&[]).is_none());
    }
}
