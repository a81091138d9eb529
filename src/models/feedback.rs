//! User feedback on detection results.

use crate::core::{DetectionConfigurationId, DimensionKey, FeedbackId, MetricId, MetricsAdvisorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyValue {
    AutoDetect,
    Anomaly,
    NotAnomaly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangePointValue {
    AutoDetect,
    ChangePoint,
    NotChangePoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    AutoDetect,
    AssignValue,
}

/// Discriminant of [`FeedbackKind`], used for list filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Anomaly,
    ChangePoint,
    Period,
    Comment,
}

/// Fields shared by every feedback kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackCommon {
    /// Assigned by the service on creation
    pub id: Option<FeedbackId>,
    pub metric_id: MetricId,
    /// Series (or series group) the feedback applies to
    pub dimension_filter: DimensionKey,
    pub created_time: Option<DateTime<Utc>>,
    pub user_principal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feedback_type", rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Mark a time range as (not) anomalous
    Anomaly {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        value: AnomalyValue,
        detection_configuration_id: Option<DetectionConfigurationId>,
    },
    ChangePoint {
        start_time: DateTime<Utc>,
        value: ChangePointValue,
    },
    /// Correct the seasonality period
    Period {
        period_type: PeriodType,
        period_value: Option<i32>,
    },
    Comment {
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        comment: String,
    },
}

/// A feedback record against a metric series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFeedback {
    #[serde(flatten)]
    pub common: FeedbackCommon,
    #[serde(flatten)]
    pub kind: FeedbackKind,
}

impl MetricFeedback {
    pub fn new(metric_id: MetricId, dimension_filter: DimensionKey, kind: FeedbackKind) -> Self {
        Self {
            common: FeedbackCommon {
                id: None,
                metric_id,
                dimension_filter,
                created_time: None,
                user_principal: None,
            },
            kind,
        }
    }

    pub fn feedback_type(&self) -> FeedbackType {
        match self.kind {
            FeedbackKind::Anomaly { .. } => FeedbackType::Anomaly,
            FeedbackKind::ChangePoint { .. } => FeedbackType::ChangePoint,
            FeedbackKind::Period { .. } => FeedbackType::Period,
            FeedbackKind::Comment { .. } => FeedbackType::Comment,
        }
    }

    /// Time range the feedback refers to; period feedback has none
    pub fn time_range(&self) -> Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        match &self.kind {
            FeedbackKind::Anomaly {
                start_time,
                end_time,
                ..
            } => Some((Some(*start_time), Some(*end_time))),
            FeedbackKind::ChangePoint { start_time, .. } => Some((Some(*start_time), Some(*start_time))),
            FeedbackKind::Comment {
                start_time,
                end_time,
                ..
            } => Some((*start_time, *end_time)),
            FeedbackKind::Period { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.common.dimension_filter.is_empty() {
            return Err(MetricsAdvisorError::validation(
                "feedback dimension filter must name at least one dimension",
            ));
        }
        match &self.kind {
            FeedbackKind::Anomaly {
                start_time,
                end_time,
                ..
            } if start_time > end_time => Err(MetricsAdvisorError::validation(format!(
                "feedback start {} is after end {}",
                start_time, end_time
            ))),
            FeedbackKind::Comment {
                start_time: Some(start),
                end_time: Some(end),
                ..
            } if start > end => Err(MetricsAdvisorError::validation(format!(
                "feedback start {} is after end {}",
                start, end
            ))),
            FeedbackKind::Comment { comment, .. } if comment.trim().is_empty() => {
                Err(MetricsAdvisorError::validation("comment feedback cannot be empty"))
            },
            FeedbackKind::Period {
                period_type,
                period_value,
            } => match (period_type, period_value) {
                (_, Some(value)) if *value < 0 => Err(MetricsAdvisorError::validation(format!(
                    "period value cannot be negative, got {}",
                    value
                ))),
                (PeriodType::AssignValue, None) => Err(MetricsAdvisorError::validation(
                    "assigned period feedback needs a period_value",
                )),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metric() -> MetricId {
        MetricId::new("metric-1").unwrap()
    }

    fn series() -> DimensionKey {
        DimensionKey::new().with("city", "redmond")
    }

    #[test]
    fn test_anomaly_range_order() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let feedback = MetricFeedback::new(
            metric(),
            series(),
            FeedbackKind::Anomaly {
                start_time: start,
                end_time: end,
                value: AnomalyValue::NotAnomaly,
                detection_configuration_id: None,
            },
        );
        assert!(feedback.validate().is_err());
    }

    #[test]
    fn test_empty_filter_rejected() {
        let feedback = MetricFeedback::new(
            metric(),
            DimensionKey::new(),
            FeedbackKind::Comment {
                start_time: None,
                end_time: None,
                comment: "spike from deploy".to_string(),
            },
        );
        assert!(feedback.validate().is_err());
    }

    #[test]
    fn test_period_feedback() {
        let assigned = |value| {
            MetricFeedback::new(
                metric(),
                series(),
                FeedbackKind::Period {
                    period_type: PeriodType::AssignValue,
                    period_value: value,
                },
            )
        };
        assert!(assigned(Some(7)).validate().is_ok());
        assert!(assigned(Some(-1)).validate().is_err());
        assert!(assigned(None).validate().is_err());
        assert_eq!(assigned(Some(7)).feedback_type(), FeedbackType::Period);
        assert!(assigned(Some(7)).time_range().is_none());
    }

    #[test]
    fn test_blank_comment_rejected() {
        let feedback = MetricFeedback::new(
            metric(),
            series(),
            FeedbackKind::Comment {
                start_time: None,
                end_time: None,
                comment: "  ".to_string(),
            },
        );
        assert!(feedback.validate().is_err());
    }
}
