//! Anomaly alert configurations.

use super::require;
use crate::core::{
    AlertConfigurationId, DetectionConfigurationId, DimensionKey, HookId, MetricsAdvisorError,
    Result,
};
use serde::{Deserialize, Serialize};

/// How alerts from several metric configurations combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricAlertConfigurationsOperator {
    And,
    Or,
    Xor,
}

/// Which anomalies of a detection configuration may raise an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum MetricAnomalyAlertScope {
    WholeSeries,
    SeriesGroup { series_group_key: DimensionKey },
    /// Series ranked in the top `top` at least `min_top_count` times in the last `period` points
    TopN {
        top: u32,
        period: u32,
        min_top_count: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryDirection {
    Lower,
    Upper,
    Both,
}

/// Alert only on anomalies within a severity band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCondition {
    pub min: AnomalySeverity,
    pub max: AnomalySeverity,
}

/// Alert only when the value (or a companion metric) crosses a boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBoundaryCondition {
    pub direction: BoundaryDirection,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub companion_metric_id: Option<String>,
    pub trigger_for_missing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricAnomalyAlertConditions {
    pub severity: Option<SeverityCondition>,
    pub boundary: Option<MetricBoundaryCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnoozeScope {
    Metric,
    Series,
}

/// Suppress repeat alerts for a number of points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricAnomalyAlertSnoozeCondition {
    pub auto_snooze: u32,
    pub snooze_scope: SnoozeScope,
    pub only_for_successive: bool,
}

/// Alert rule bound to a single detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAlertConfiguration {
    pub detection_configuration_id: DetectionConfigurationId,
    pub scope: MetricAnomalyAlertScope,
    pub condition: Option<MetricAnomalyAlertConditions>,
    pub snooze: Option<MetricAnomalyAlertSnoozeCondition>,
    #[serde(default)]
    pub negation: bool,
}

impl MetricAlertConfiguration {
    pub fn new(detection_configuration_id: DetectionConfigurationId, scope: MetricAnomalyAlertScope) -> Self {
        Self {
            detection_configuration_id,
            scope,
            condition: None,
            snooze: None,
            negation: false,
        }
    }

    /// True when an anomaly on `series_key` falls inside this rule's scope.
    /// Top-N scopes depend on ranking and always report true here.
    pub fn covers(&self, series_key: &DimensionKey) -> bool {
        match &self.scope {
            MetricAnomalyAlertScope::WholeSeries | MetricAnomalyAlertScope::TopN { .. } => true,
            MetricAnomalyAlertScope::SeriesGroup { series_group_key } => {
                series_key.contains(series_group_key)
            },
        }
    }

    fn validate(&self) -> Result<()> {
        match &self.scope {
            MetricAnomalyAlertScope::WholeSeries => {},
            MetricAnomalyAlertScope::SeriesGroup { series_group_key } => {
                if series_group_key.is_empty() {
                    return Err(MetricsAdvisorError::validation(
                        "series group alert scope needs a non-empty key",
                    ));
                }
            },
            MetricAnomalyAlertScope::TopN {
                top,
                period,
                min_top_count,
            } => {
                if *top == 0 || *period == 0 || *min_top_count == 0 {
                    return Err(MetricsAdvisorError::validation(
                        "top-n scope values must all be greater than 0",
                    ));
                }
                if min_top_count > period {
                    return Err(MetricsAdvisorError::validation(format!(
                        "min_top_count {} cannot exceed period {}",
                        min_top_count, period
                    )));
                }
            },
        }

        if let Some(condition) = &self.condition {
            if let Some(severity) = condition.severity {
                if severity.min > severity.max {
                    return Err(MetricsAdvisorError::validation(format!(
                        "severity min {:?} is above max {:?}",
                        severity.min, severity.max
                    )));
                }
            }
            if let Some(boundary) = &condition.boundary {
                let ok = match boundary.direction {
                    BoundaryDirection::Lower => boundary.lower.is_some(),
                    BoundaryDirection::Upper => boundary.upper.is_some(),
                    BoundaryDirection::Both => boundary.lower.is_some() && boundary.upper.is_some(),
                };
                if !ok {
                    return Err(MetricsAdvisorError::validation(format!(
                        "boundary direction {:?} is missing its bound",
                        boundary.direction
                    )));
                }
            }
        }

        if let Some(snooze) = &self.snooze {
            if snooze.auto_snooze == 0 && snooze.only_for_successive {
                return Err(MetricsAdvisorError::validation(
                    "only_for_successive snooze needs auto_snooze greater than 0",
                ));
            }
        }
        Ok(())
    }
}

/// A named set of alert rules and the hooks they notify
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlertConfiguration {
    /// Assigned by the service on creation
    pub id: Option<AlertConfigurationId>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub hook_ids: Vec<HookId>,
    pub cross_metrics_operator: Option<MetricAlertConfigurationsOperator>,
    pub metric_alert_configurations: Vec<MetricAlertConfiguration>,
}

impl AnomalyAlertConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            hook_ids: Vec::new(),
            cross_metrics_operator: None,
            metric_alert_configurations: Vec::new(),
        }
    }

    pub fn add_metric_alert_configuration(mut self, config: MetricAlertConfiguration) -> Self {
        self.metric_alert_configurations.push(config);
        self
    }

    pub fn add_hook(mut self, hook_id: HookId) -> Self {
        self.hook_ids.push(hook_id);
        self
    }

    pub fn with_cross_metrics_operator(mut self, operator: MetricAlertConfigurationsOperator) -> Self {
        self.cross_metrics_operator = Some(operator);
        self
    }

    /// Detection configurations referenced by this alert configuration
    pub fn detection_configuration_ids(&self) -> impl Iterator<Item = &DetectionConfigurationId> {
        self.metric_alert_configurations
            .iter()
            .map(|c| &c.detection_configuration_id)
    }

    pub fn validate(&self) -> Result<()> {
        require("alert configuration name", &self.name)?;
        if self.metric_alert_configurations.is_empty() {
            return Err(MetricsAdvisorError::validation(
                "alert configuration needs at least one metric alert configuration",
            ));
        }
        if self.metric_alert_configurations.len() > 1 && self.cross_metrics_operator.is_none() {
            return Err(MetricsAdvisorError::validation(
                "cross_metrics_operator is required with more than one metric alert configuration",
            ));
        }
        for config in &self.metric_alert_configurations {
            config.validate()?;
        }
        Ok(())
    }
}
