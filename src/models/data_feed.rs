//! Data feed definitions.
//!
//! A data feed tells the service where to pull raw metric values from, how the
//! rows are shaped, and how ingestion behaves. Each supported source is one
//! variant of [`DataFeedSource`].

use super::require;
use crate::core::{
    CredentialId, DataFeedGranularity, DataFeedId, DataFeedStatus, MetricId,
    MetricsAdvisorError, Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Where a data feed reads its data from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataFeedSource {
    /// Azure Blob storage, one JSON blob per interval
    AzureBlob {
        connection_string: String,
        container: String,
        blob_template: String,
    },
    /// Azure Table storage
    AzureTable {
        connection_string: String,
        table: String,
        query: String,
    },
    /// SQL Server, by connection string or stored credential
    SqlServer {
        connection_string: Option<String>,
        credential_id: Option<CredentialId>,
        query: String,
    },
    PostgreSql {
        connection_string: String,
        query: String,
    },
    MySql {
        connection_string: String,
        query: String,
    },
    MongoDb {
        connection_string: String,
        database: String,
        command: String,
    },
    InfluxDb {
        connection_string: String,
        database: String,
        username: String,
        password: String,
        query: String,
    },
    /// Azure Data Explorer (Kusto)
    AzureDataExplorer {
        connection_string: Option<String>,
        credential_id: Option<CredentialId>,
        query: String,
    },
    AzureCosmosDb {
        connection_string: String,
        sql_query: String,
        database: String,
        collection_id: String,
    },
    AzureApplicationInsights {
        application_id: String,
        api_key: String,
        query: String,
        azure_cloud: String,
    },
    AzureLogAnalytics {
        workspace_id: String,
        query: String,
        credential_id: Option<CredentialId>,
    },
    AzureEventHubs {
        connection_string: String,
        consumer_group: String,
    },
    AzureDataLakeStorageGen2 {
        account_name: String,
        file_system_name: String,
        directory_template: String,
        file_template: String,
        account_key: Option<String>,
        credential_id: Option<CredentialId>,
    },
}

/// Discriminant of [`DataFeedSource`], used for list filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFeedSourceType {
    AzureBlob,
    AzureTable,
    SqlServer,
    PostgreSql,
    MySql,
    MongoDb,
    InfluxDb,
    AzureDataExplorer,
    AzureCosmosDb,
    AzureApplicationInsights,
    AzureLogAnalytics,
    AzureEventHubs,
    AzureDataLakeStorageGen2,
}

impl DataFeedSource {
    /// The kind of this source
    pub fn source_type(&self) -> DataFeedSourceType {
        match self {
            DataFeedSource::AzureBlob { .. } => DataFeedSourceType::AzureBlob,
            DataFeedSource::AzureTable { .. } => DataFeedSourceType::AzureTable,
            DataFeedSource::SqlServer { .. } => DataFeedSourceType::SqlServer,
            DataFeedSource::PostgreSql { .. } => DataFeedSourceType::PostgreSql,
            DataFeedSource::MySql { .. } => DataFeedSourceType::MySql,
            DataFeedSource::MongoDb { .. } => DataFeedSourceType::MongoDb,
            DataFeedSource::InfluxDb { .. } => DataFeedSourceType::InfluxDb,
            DataFeedSource::AzureDataExplorer { .. } => DataFeedSourceType::AzureDataExplorer,
            DataFeedSource::AzureCosmosDb { .. } => DataFeedSourceType::AzureCosmosDb,
            DataFeedSource::AzureApplicationInsights { .. } => {
                DataFeedSourceType::AzureApplicationInsights
            },
            DataFeedSource::AzureLogAnalytics { .. } => DataFeedSourceType::AzureLogAnalytics,
            DataFeedSource::AzureEventHubs { .. } => DataFeedSourceType::AzureEventHubs,
            DataFeedSource::AzureDataLakeStorageGen2 { .. } => {
                DataFeedSourceType::AzureDataLakeStorageGen2
            },
        }
    }

    /// Stored credential this source authenticates with, if any
    pub fn credential_id(&self) -> Option<&CredentialId> {
        match self {
            DataFeedSource::SqlServer { credential_id, .. }
            | DataFeedSource::AzureDataExplorer { credential_id, .. }
            | DataFeedSource::AzureLogAnalytics { credential_id, .. }
            | DataFeedSource::AzureDataLakeStorageGen2 { credential_id, .. } => {
                credential_id.as_ref()
            },
            _ => None,
        }
    }

    /// Check that every field the source needs is present
    pub fn validate(&self) -> Result<()> {
        match self {
            DataFeedSource::AzureBlob {
                connection_string,
                container,
                blob_template,
            } => {
                require("connection_string", connection_string)?;
                require("container", container)?;
                require("blob_template", blob_template)
            },
            DataFeedSource::AzureTable {
                connection_string,
                table,
                query,
            } => {
                require("connection_string", connection_string)?;
                require("table", table)?;
                require("query", query)
            },
            DataFeedSource::SqlServer {
                connection_string,
                credential_id,
                query,
            }
            | DataFeedSource::AzureDataExplorer {
                connection_string,
                credential_id,
                query,
            } => {
                require_auth(connection_string.as_deref(), credential_id.as_ref())?;
                require("query", query)
            },
            DataFeedSource::PostgreSql {
                connection_string,
                query,
            }
            | DataFeedSource::MySql {
                connection_string,
                query,
            } => {
                require("connection_string", connection_string)?;
                require("query", query)
            },
            DataFeedSource::MongoDb {
                connection_string,
                database,
                command,
            } => {
                require("connection_string", connection_string)?;
                require("database", database)?;
                require("command", command)
            },
            DataFeedSource::InfluxDb {
                connection_string,
                database,
                username,
                password,
                query,
            } => {
                require("connection_string", connection_string)?;
                require("database", database)?;
                require("username", username)?;
                require("password", password)?;
                require("query", query)
            },
            DataFeedSource::AzureCosmosDb {
                connection_string,
                sql_query,
                database,
                collection_id,
            } => {
                require("connection_string", connection_string)?;
                require("sql_query", sql_query)?;
                require("database", database)?;
                require("collection_id", collection_id)
            },
            DataFeedSource::AzureApplicationInsights {
                application_id,
                api_key,
                query,
                azure_cloud,
            } => {
                require("application_id", application_id)?;
                require("api_key", api_key)?;
                require("query", query)?;
                require("azure_cloud", azure_cloud)
            },
            DataFeedSource::AzureLogAnalytics {
                workspace_id,
                query,
                ..
            } => {
                require("workspace_id", workspace_id)?;
                require("query", query)
            },
            DataFeedSource::AzureEventHubs {
                connection_string,
                consumer_group,
            } => {
                require("connection_string", connection_string)?;
                require("consumer_group", consumer_group)
            },
            DataFeedSource::AzureDataLakeStorageGen2 {
                account_name,
                file_system_name,
                directory_template,
                file_template,
                account_key,
                credential_id,
            } => {
                require("account_name", account_name)?;
                require("file_system_name", file_system_name)?;
                require("directory_template", directory_template)?;
                require("file_template", file_template)?;
                require_auth(account_key.as_deref(), credential_id.as_ref())
            },
        }
    }
}

fn require_auth(secret: Option<&str>, credential_id: Option<&CredentialId>) -> Result<()> {
    match (secret.filter(|s| !s.trim().is_empty()), credential_id) {
        (None, None) => Err(MetricsAdvisorError::validation(
            "source needs either an inline secret or a credential id",
        )),
        _ => Ok(()),
    }
}

impl fmt::Display for DataFeedSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataFeedSourceType::AzureBlob => "AzureBlob",
            DataFeedSourceType::AzureTable => "AzureTable",
            DataFeedSourceType::SqlServer => "SqlServer",
            DataFeedSourceType::PostgreSql => "PostgreSql",
            DataFeedSourceType::MySql => "MySql",
            DataFeedSourceType::MongoDb => "MongoDB",
            DataFeedSourceType::InfluxDb => "InfluxDB",
            DataFeedSourceType::AzureDataExplorer => "AzureDataExplorer",
            DataFeedSourceType::AzureCosmosDb => "AzureCosmosDB",
            DataFeedSourceType::AzureApplicationInsights => "AzureApplicationInsights",
            DataFeedSourceType::AzureLogAnalytics => "AzureLogAnalytics",
            DataFeedSourceType::AzureEventHubs => "AzureEventHubs",
            DataFeedSourceType::AzureDataLakeStorageGen2 => "AzureDataLakeStorageGen2",
        };
        f.write_str(name)
    }
}

/// A metric column in the data feed schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFeedMetric {
    /// Assigned by the service on creation
    pub id: Option<MetricId>,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl DataFeedMetric {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            display_name: None,
            description: None,
        }
    }
}

/// A dimension column in the data feed schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFeedDimension {
    pub name: String,
    pub display_name: Option<String>,
}

impl DataFeedDimension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
        }
    }
}

/// Column layout of the ingested rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFeedSchema {
    pub metrics: Vec<DataFeedMetric>,
    pub dimensions: Vec<DataFeedDimension>,
    pub timestamp_column: Option<String>,
}

impl DataFeedSchema {
    /// Schema with the given metric and dimension column names
    pub fn new<M, D>(metrics: M, dimensions: D) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            metrics: metrics.into_iter().map(DataFeedMetric::new).collect(),
            dimensions: dimensions.into_iter().map(DataFeedDimension::new).collect(),
            timestamp_column: None,
        }
    }

    /// Metric id for a metric column name, once assigned
    pub fn metric_id(&self, name: &str) -> Option<&MetricId> {
        self.metrics
            .iter()
            .find(|m| m.name == name)
            .and_then(|m| m.id.as_ref())
    }

    fn validate(&self) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(MetricsAdvisorError::validation(
                "data feed schema must contain at least one metric",
            ));
        }

        let mut seen = HashSet::new();
        for name in self
            .metrics
            .iter()
            .map(|m| &m.name)
            .chain(self.dimensions.iter().map(|d| &d.name))
        {
            require("column name", name)?;
            if !seen.insert(name.as_str()) {
                return Err(MetricsAdvisorError::validation(format!(
                    "column '{}' appears more than once in the schema",
                    name
                )));
            }
        }

        if let Some(column) = &self.timestamp_column {
            if seen.contains(column.as_str()) {
                return Err(MetricsAdvisorError::validation(format!(
                    "timestamp column '{}' collides with a metric or dimension",
                    column
                )));
            }
        }
        Ok(())
    }
}

/// How and when ingestion runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFeedIngestionSettings {
    pub ingestion_start_time: DateTime<Utc>,
    /// Seconds to wait after an interval closes before ingesting it
    pub ingestion_start_offset_secs: i64,
    pub data_source_request_concurrency: Option<u32>,
    pub ingestion_retry_delay_secs: Option<i64>,
    pub stop_retry_after_secs: Option<i64>,
}

impl DataFeedIngestionSettings {
    pub fn starting_at(ingestion_start_time: DateTime<Utc>) -> Self {
        Self {
            ingestion_start_time,
            ingestion_start_offset_secs: 0,
            data_source_request_concurrency: None,
            ingestion_retry_delay_secs: None,
            stop_retry_after_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFeedRollupType {
    NoRollup,
    AutoRollup,
    AlreadyRollup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFeedAutoRollupMethod {
    None,
    Sum,
    Max,
    Min,
    Avg,
    Count,
}

/// Roll-up behaviour for aggregate series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFeedRollupSettings {
    pub rollup_type: DataFeedRollupType,
    pub rollup_method: Option<DataFeedAutoRollupMethod>,
    /// Dimension columns to roll up over (auto roll-up)
    pub auto_rollup_group_by_columns: Vec<String>,
    /// Value marking an already rolled-up row
    pub rollup_identification_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFeedMissingDataPointFillType {
    SmartFilling,
    PreviousValue,
    CustomValue,
    NoFilling,
}

/// What to do with intervals that produced no point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFeedMissingDataPointFillSettings {
    pub fill_type: DataFeedMissingDataPointFillType,
    pub custom_fill_value: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFeedAccessMode {
    #[default]
    Private,
    Public,
}

/// Optional data feed settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFeedOptions {
    pub description: Option<String>,
    pub rollup_settings: Option<DataFeedRollupSettings>,
    pub missing_data_point_fill: Option<DataFeedMissingDataPointFillSettings>,
    pub access_mode: DataFeedAccessMode,
    pub admins: Vec<String>,
    pub viewers: Vec<String>,
    pub action_link_template: Option<String>,
}

/// A data feed definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFeed {
    /// Assigned by the service on creation
    pub id: Option<DataFeedId>,
    pub name: String,
    pub source: DataFeedSource,
    pub granularity: DataFeedGranularity,
    /// Interval length in seconds when `granularity` is custom
    pub custom_granularity_value: Option<u32>,
    pub schema: DataFeedSchema,
    pub ingestion: DataFeedIngestionSettings,
    #[serde(default)]
    pub options: DataFeedOptions,
    #[serde(default)]
    pub status: DataFeedStatus,
    pub created_time: Option<DateTime<Utc>>,
}

impl DataFeed {
    /// Create an unsaved data feed with default options
    pub fn new(
        name: impl Into<String>,
        source: DataFeedSource,
        granularity: DataFeedGranularity,
        schema: DataFeedSchema,
        ingestion: DataFeedIngestionSettings,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            source,
            granularity,
            custom_granularity_value: None,
            schema,
            ingestion,
            options: DataFeedOptions::default(),
            status: DataFeedStatus::Active,
            created_time: None,
        }
    }

    /// Ids of all metrics in the schema that have been assigned one
    pub fn metric_ids(&self) -> impl Iterator<Item = &MetricId> {
        self.schema.metrics.iter().filter_map(|m| m.id.as_ref())
    }

    pub fn validate(&self) -> Result<()> {
        require("data feed name", &self.name)?;
        self.source.validate()?;
        self.schema.validate()?;

        match (self.granularity, self.custom_granularity_value) {
            (DataFeedGranularity::Custom, None | Some(0)) => {
                return Err(MetricsAdvisorError::validation(
                    "custom granularity requires a positive custom_granularity_value",
                ));
            },
            (DataFeedGranularity::Custom, Some(_)) | (_, None) => {},
            (other, Some(_)) => {
                return Err(MetricsAdvisorError::validation(format!(
                    "custom_granularity_value is only valid for custom granularity, got {:?}",
                    other
                )));
            },
        }

        if self.ingestion.ingestion_start_offset_secs < 0 {
            return Err(MetricsAdvisorError::validation(
                "ingestion_start_offset_secs cannot be negative",
            ));
        }
        if self.ingestion.data_source_request_concurrency == Some(0) {
            return Err(MetricsAdvisorError::validation(
                "data_source_request_concurrency must be greater than 0",
            ));
        }

        if let Some(rollup) = &self.options.rollup_settings {
            self.validate_rollup(rollup)?;
        }

        if let Some(fill) = &self.options.missing_data_point_fill {
            if fill.fill_type == DataFeedMissingDataPointFillType::CustomValue
                && fill.custom_fill_value.is_none()
            {
                return Err(MetricsAdvisorError::validation(
                    "custom fill type requires custom_fill_value",
                ));
            }
        }

        Ok(())
    }

    fn validate_rollup(&self, rollup: &DataFeedRollupSettings) -> Result<()> {
        match rollup.rollup_type {
            DataFeedRollupType::NoRollup => Ok(()),
            DataFeedRollupType::AlreadyRollup => match &rollup.rollup_identification_value {
                Some(value) if !value.is_empty() => Ok(()),
                _ => Err(MetricsAdvisorError::validation(
                    "already-rolled-up feeds need a rollup_identification_value",
                )),
            },
            DataFeedRollupType::AutoRollup => {
                if rollup.rollup_method.is_none() {
                    return Err(MetricsAdvisorError::validation(
                        "auto roll-up requires a rollup_method",
                    ));
                }
                for column in &rollup.auto_rollup_group_by_columns {
                    if !self.schema.dimensions.iter().any(|d| &d.name == column) {
                        return Err(MetricsAdvisorError::validation(format!(
                            "roll-up column '{}' is not a dimension of the feed",
                            column
                        )));
                    }
                }
                Ok(())
            },
        }
    }
}
