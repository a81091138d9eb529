//! Anomaly detection configurations.
//!
//! A configuration attaches detection conditions to a metric at three levels:
//! the whole metric, a series group (a partial [`DimensionKey`]), and a single
//! series (a full [`DimensionKey`]). The most specific level wins.

use super::require;
use crate::core::{DetectionConfigurationId, DimensionKey, MetricId, MetricsAdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which deviation direction counts as anomalous
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyDetectorDirection {
    #[default]
    Both,
    Down,
    Up,
}

/// How multiple sub-conditions combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionConditionOperator {
    And,
    Or,
}

/// Only report once enough points in a window are anomalous
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuppressCondition {
    pub min_number: u32,
    /// Percentage in `(0, 100]`
    pub min_ratio: f64,
}

impl SuppressCondition {
    pub fn new(min_number: u32, min_ratio: f64) -> Self {
        Self {
            min_number,
            min_ratio,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.min_number == 0 {
            return Err(MetricsAdvisorError::validation("suppress min_number must be at least 1"));
        }
        if !(self.min_ratio > 0.0 && self.min_ratio <= 100.0) {
            return Err(MetricsAdvisorError::validation(format!(
                "suppress min_ratio must be in (0, 100], got {}",
                self.min_ratio
            )));
        }
        Ok(())
    }
}

/// Service-side smart detection with a sensitivity knob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartDetectionCondition {
    /// Higher values report more anomalies; `(0, 100]`
    pub sensitivity: f64,
    pub direction: AnomalyDetectorDirection,
    pub suppress: SuppressCondition,
}

/// Fixed bounds on the metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardThresholdCondition {
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub direction: AnomalyDetectorDirection,
    pub suppress: SuppressCondition,
}

/// Relative change against an earlier point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeThresholdCondition {
    pub change_percentage: f64,
    /// Number of points back to compare against
    pub shift_point: u32,
    /// Anomalous when the change stays within the range instead of leaving it
    pub within_range: bool,
    pub direction: AnomalyDetectorDirection,
    pub suppress: SuppressCondition,
}

/// A set of sub-conditions joined by an operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConditions {
    pub condition_operator: Option<DetectionConditionOperator>,
    pub smart_detection: Option<SmartDetectionCondition>,
    pub hard_threshold: Option<HardThresholdCondition>,
    pub change_threshold: Option<ChangeThresholdCondition>,
}

impl DetectionConditions {
    pub fn with_smart_detection(mut self, condition: SmartDetectionCondition) -> Self {
        self.smart_detection = Some(condition);
        self
    }

    pub fn with_hard_threshold(mut self, condition: HardThresholdCondition) -> Self {
        self.hard_threshold = Some(condition);
        self
    }

    pub fn with_change_threshold(mut self, condition: ChangeThresholdCondition) -> Self {
        self.change_threshold = Some(condition);
        self
    }

    pub fn with_operator(mut self, operator: DetectionConditionOperator) -> Self {
        self.condition_operator = Some(operator);
        self
    }

    /// Number of sub-conditions that are set
    pub fn len(&self) -> usize {
        usize::from(self.smart_detection.is_some())
            + usize::from(self.hard_threshold.is_some())
            + usize::from(self.change_threshold.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(MetricsAdvisorError::validation(
                "detection condition needs at least one of smart, hard or change threshold",
            ));
        }
        if self.len() > 1 && self.condition_operator.is_none() {
            return Err(MetricsAdvisorError::validation(
                "condition_operator is required when combining sub-conditions",
            ));
        }

        if let Some(smart) = &self.smart_detection {
            if !(smart.sensitivity > 0.0 && smart.sensitivity <= 100.0) {
                return Err(MetricsAdvisorError::validation(format!(
                    "smart detection sensitivity must be in (0, 100], got {}",
                    smart.sensitivity
                )));
            }
            smart.suppress.validate()?;
        }

        if let Some(hard) = &self.hard_threshold {
            validate_hard_threshold(hard)?;
        }

        if let Some(change) = &self.change_threshold {
            if change.change_percentage <= 0.0 {
                return Err(MetricsAdvisorError::validation(
                    "change_percentage must be greater than 0",
                ));
            }
            if change.shift_point == 0 {
                return Err(MetricsAdvisorError::validation("shift_point must be at least 1"));
            }
            change.suppress.validate()?;
        }

        Ok(())
    }
}

fn validate_hard_threshold(hard: &HardThresholdCondition) -> Result<()> {
    match (hard.direction, hard.lower_bound, hard.upper_bound) {
        (AnomalyDetectorDirection::Up, _, None) => Err(MetricsAdvisorError::validation(
            "hard threshold with direction up requires upper_bound",
        )),
        (AnomalyDetectorDirection::Down, None, _) => Err(MetricsAdvisorError::validation(
            "hard threshold with direction down requires lower_bound",
        )),
        (AnomalyDetectorDirection::Both, None, _) | (AnomalyDetectorDirection::Both, _, None) => {
            Err(MetricsAdvisorError::validation(
                "hard threshold with direction both requires lower_bound and upper_bound",
            ))
        },
        (AnomalyDetectorDirection::Both, Some(lower), Some(upper)) if lower > upper => {
            Err(MetricsAdvisorError::validation(format!(
                "lower_bound {} exceeds upper_bound {}",
                lower, upper
            )))
        },
        _ => hard.suppress.validate(),
    }
}

/// Conditions applied to every series of a metric
pub type MetricWholeSeriesDetectionCondition = DetectionConditions;

/// Conditions for all series sharing a partial key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeriesGroupDetectionCondition {
    pub series_group_key: DimensionKey,
    #[serde(flatten)]
    pub conditions: DetectionConditions,
}

/// Conditions for one specific series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSingleSeriesDetectionCondition {
    pub series_key: DimensionKey,
    #[serde(flatten)]
    pub conditions: DetectionConditions,
}

/// Detection settings for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetectionConfiguration {
    /// Assigned by the service on creation
    pub id: Option<DetectionConfigurationId>,
    pub name: String,
    pub description: Option<String>,
    pub metric_id: MetricId,
    pub whole_series: MetricWholeSeriesDetectionCondition,
    #[serde(default)]
    pub series_group_conditions: Vec<MetricSeriesGroupDetectionCondition>,
    #[serde(default)]
    pub series_conditions: Vec<MetricSingleSeriesDetectionCondition>,
}

impl AnomalyDetectionConfiguration {
    pub fn new(
        name: impl Into<String>,
        metric_id: MetricId,
        whole_series: MetricWholeSeriesDetectionCondition,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            metric_id,
            whole_series,
            series_group_conditions: Vec::new(),
            series_conditions: Vec::new(),
        }
    }

    pub fn add_series_group_condition(
        mut self,
        series_group_key: DimensionKey,
        conditions: DetectionConditions,
    ) -> Self {
        self.series_group_conditions.push(MetricSeriesGroupDetectionCondition {
            series_group_key,
            conditions,
        });
        self
    }

    pub fn add_series_condition(mut self, series_key: DimensionKey, conditions: DetectionConditions) -> Self {
        self.series_conditions.push(MetricSingleSeriesDetectionCondition {
            series_key,
            conditions,
        });
        self
    }

    /// Effective conditions for a series: exact series match, then the most
    /// specific group the series belongs to, then the whole-series default.
    pub fn condition_for(&self, series_key: &DimensionKey) -> &DetectionConditions {
        if let Some(series) = self
            .series_conditions
            .iter()
            .find(|c| &c.series_key == series_key)
        {
            return &series.conditions;
        }

        self.series_group_conditions
            .iter()
            .filter(|g| series_key.contains(&g.series_group_key))
            .max_by_key(|g| g.series_group_key.len())
            .map_or(&self.whole_series, |g| &g.conditions)
    }

    pub fn validate(&self) -> Result<()> {
        require("detection configuration name", &self.name)?;
        self.whole_series.validate()?;

        let mut groups = HashSet::new();
        for group in &self.series_group_conditions {
            if group.series_group_key.is_empty() {
                return Err(MetricsAdvisorError::validation("series group key cannot be empty"));
            }
            if !groups.insert(&group.series_group_key) {
                return Err(MetricsAdvisorError::validation(format!(
                    "duplicate series group condition for {}",
                    group.series_group_key
                )));
            }
            group.conditions.validate()?;
        }

        let mut series = HashSet::new();
        for single in &self.series_conditions {
            if single.series_key.is_empty() {
                return Err(MetricsAdvisorError::validation("series key cannot be empty"));
            }
            if !series.insert(&single.series_key) {
                return Err(MetricsAdvisorError::validation(format!(
                    "duplicate series condition for {}",
                    single.series_key
                )));
            }
            single.conditions.validate()?;
        }

        Ok(())
    }
}
