use crate::core::error::{MetricsAdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest identifier accepted by the service.
const MAX_ID_LEN: usize = 64;

macro_rules! resource_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new id after validation
            pub fn new(id: impl Into<String>) -> Result<Self> {
                let id = id.into();
                if id.is_empty() {
                    return Err(MetricsAdvisorError::invalid_argument(concat!(
                        $label,
                        " cannot be empty"
                    )));
                }
                if id.len() > MAX_ID_LEN {
                    return Err(MetricsAdvisorError::invalid_argument(format!(
                        "{} cannot exceed {} characters, got {}",
                        $label,
                        MAX_ID_LEN,
                        id.len()
                    )));
                }
                Ok($name(id))
            }

            /// Generates a fresh GUID-shaped id
            pub fn new_random() -> Self {
                $name(random_guid())
            }

            /// Returns the string representation of the id
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the inner string value
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

resource_id!(
    /// Identifier of a data feed
    DataFeedId,
    "DataFeedId"
);
resource_id!(
    /// Identifier of a metric within a data feed
    MetricId,
    "MetricId"
);
resource_id!(
    /// Identifier of an anomaly detection configuration
    DetectionConfigurationId,
    "DetectionConfigurationId"
);
resource_id!(
    /// Identifier of an anomaly alert configuration
    AlertConfigurationId,
    "AlertConfigurationId"
);
resource_id!(
    /// Identifier of a notification hook
    HookId,
    "HookId"
);
resource_id!(
    /// Identifier of a data source credential
    CredentialId,
    "CredentialId"
);
resource_id!(
    /// Identifier of a feedback record
    FeedbackId,
    "FeedbackId"
);

fn random_guid() -> String {
    let bits: u128 = rand::random();
    let hex = format!("{:032x}", bits);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Interval at which a data feed produces points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFeedGranularity {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    PerMinute,
    Custom,
}

impl DataFeedGranularity {
    /// Nominal interval length in seconds, `None` for custom granularity
    pub fn seconds(&self) -> Option<u64> {
        match self {
            DataFeedGranularity::Yearly => Some(365 * 86_400),
            DataFeedGranularity::Monthly => Some(30 * 86_400),
            DataFeedGranularity::Weekly => Some(7 * 86_400),
            DataFeedGranularity::Daily => Some(86_400),
            DataFeedGranularity::Hourly => Some(3_600),
            DataFeedGranularity::PerMinute => Some(60),
            DataFeedGranularity::Custom => None,
        }
    }
}

/// Ingestion status of a data feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFeedStatus {
    #[default]
    Active,
    Paused,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_validation() {
        assert!(DataFeedId::new("").is_err());
        assert!(DataFeedId::new("a".repeat(65)).is_err());
        assert_eq!(DataFeedId::new("feed-1").unwrap().as_str(), "feed-1");
    }

    #[test]
    fn test_random_ids_are_guid_shaped() {
        let id = HookId::new_random();
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
        assert_ne!(HookId::new_random(), id);
    }

    #[test]
    fn test_granularity_seconds() {
        assert_eq!(DataFeedGranularity::Hourly.seconds(), Some(3_600));
        assert_eq!(DataFeedGranularity::Custom.seconds(), None);
    }
}
