//! Command-line interface for the Metrics Advisor client.
//!
//! `check-config` validates the resolved configuration and prints a redacted
//! summary. `series` loads a data feed and its points from a JSON document into
//! the in-memory client and summarizes every series matching a dimension filter.

use crate::client::{
    collect_all, AdministrationClient, InMemoryAdministrationClient, ListOptions, SeriesPointRecord,
};
use crate::core::config::{ConfigBuilder, LogLevel};
use crate::core::{Config, DimensionKey, MetricsAdvisorError, Result};
use crate::models::DataFeed;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "METRICS_ADVISOR_LOG_LEVEL";

/// Metrics Advisor administration client
#[derive(Parser, Debug)]
#[command(name = "metrics-advisor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.config/metrics-advisor/config.yaml)
    #[arg(short, long, env = "METRICS_ADVISOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service endpoint
    #[arg(long, env = "METRICS_ADVISOR_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "METRICS_ADVISOR_DEBUG")]
    pub debug: bool,

    /// Include targets, thread ids and line numbers in log lines
    #[arg(long)]
    pub structured: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate configuration and exit
    CheckConfig,

    /// Summarize series from a JSON document holding a data feed and its points
    Series {
        /// JSON file with `data_feed` and `points`
        #[arg(short, long)]
        input: PathBuf,

        /// Only series of this metric column
        #[arg(short, long)]
        metric: Option<String>,

        /// Dimension filter as `name=value`; repeatable
        #[arg(long = "dimension", value_parser = parse_dimension)]
        dimensions: Vec<(String, String)>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Series input document.
#[derive(Debug, Deserialize)]
pub struct SeriesDocument {
    pub data_feed: DataFeed,
    pub points: Vec<DocumentPoint>,
}

/// A point addressed by metric column name rather than metric id.
#[derive(Debug, Deserialize)]
pub struct DocumentPoint {
    pub metric: String,
    pub dimensions: DimensionKey,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One line of `series` output.
#[derive(Debug, serde::Serialize, PartialEq)]
pub struct SeriesReport {
    pub metric: String,
    pub series_key: DimensionKey,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Parse `name=value` into a dimension pair.
pub fn parse_dimension(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        },
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}

fn parse_log_level(raw: &str) -> Option<LogLevel> {
    match raw.to_ascii_lowercase().as_str() {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Resolve configuration without validating it.
    ///
    /// Precedence, highest first: CLI arguments, environment variables,
    /// config file, defaults.
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = match &self.config {
            Some(path) => Some(path.clone()),
            None => dirs::config_dir()
                .map(|d| d.join("metrics-advisor").join("config.yaml"))
                .filter(|p| p.exists()),
        };

        if let Some(path) = config_path {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    builder = builder.from_yaml(&content)?;
                    tracing::debug!("Loaded configuration from: {:?}", path);
                },
                Err(e) if self.config.is_some() => {
                    return Err(MetricsAdvisorError::config(format!(
                        "Failed to read config file {:?}: {}",
                        path, e
                    )));
                },
                Err(_) => {
                    tracing::debug!("No config file found at {:?}, using defaults", path);
                },
            }
        }

        builder = builder.from_env();
        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }
        if self.debug {
            builder = builder.log_level(LogLevel::Debug);
        } else if let Some(level) = std::env::var(LOG_LEVEL_ENV).ok().as_deref().and_then(parse_log_level) {
            builder = builder.log_level(level);
        }

        Ok(builder.debug(self.debug).build_unvalidated())
    }

    /// Initialize logging from the resolved configuration.
    pub fn init_logging(&self, config: &Config) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

        let fmt_layer = if self.structured || config.logging.structured {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .compact()
        } else {
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| MetricsAdvisorError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the selected command.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config().await?;
    cli.init_logging(&config)?;

    match &cli.command {
        Command::CheckConfig => {
            config.validate()?;
            println!("Configuration is valid!");
            println!("  Endpoint: {}", config.client.endpoint);
            println!("  Credential: {}", config.client.credential);
            println!("  Service version: {}", config.client.service_version.as_str());
            println!("  Timeout: {:?}", config.client.timeout);
            println!(
                "  Page size: {} (max {})",
                config.paging.default_page_size, config.paging.max_page_size
            );
            Ok(())
        },
        Command::Series {
            input,
            metric,
            dimensions,
            json,
        } => {
            let content = tokio::fs::read_to_string(input).await?;
            let document: SeriesDocument = serde_json::from_str(&content)?;
            let filter: DimensionKey = dimensions.iter().cloned().collect();

            let client = InMemoryAdministrationClient::new(config.paging.clone());
            let reports = summarize_series(&client, document, metric.as_deref(), &filter).await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for r in &reports {
                    println!(
                        "{:<16} {:<40} count={:<6} min={:<10.3} max={:<10.3} mean={:.3}",
                        r.metric,
                        r.series_key.to_string(),
                        r.count,
                        r.min,
                        r.max,
                        r.mean
                    );
                }
            }
            Ok(())
        },
    }
}

/// Create the document's data feed, ingest its points and summarize every
/// non-empty series whose key contains `filter`.
pub async fn summarize_series<C: AdministrationClient>(
    client: &C,
    document: SeriesDocument,
    metric: Option<&str>,
    filter: &DimensionKey,
) -> Result<Vec<SeriesReport>> {
    let feed = client.create_data_feed(document.data_feed).await?;

    let mut records = Vec::with_capacity(document.points.len());
    for point in document.points {
        let metric_id = feed.schema.metric_id(&point.metric).cloned().ok_or_else(|| {
            MetricsAdvisorError::validation(format!("unknown metric column '{}'", point.metric))
        })?;
        records.push(SeriesPointRecord {
            metric_id,
            dimensions: point.dimensions,
            timestamp: point.timestamp,
            value: point.value,
        });
    }
    let (start, end) = match (
        records.iter().map(|r| r.timestamp).min(),
        records.iter().map(|r| r.timestamp).max(),
    ) {
        (Some(start), Some(end)) => (start, end),
        _ => return Ok(Vec::new()),
    };
    client.ingest_points(records).await?;

    let mut reports = Vec::new();
    for column in &feed.schema.metrics {
        if metric.is_some_and(|m| m != column.name) {
            continue;
        }
        let Some(metric_id) = column.id.as_ref() else {
            continue;
        };

        let definitions = collect_all(ListOptions::default(), |options| async move {
            client.list_metric_series_definitions(metric_id, filter, &options).await
        })
        .await?;
        let keys: Vec<DimensionKey> = definitions.into_iter().map(|d| d.series_key).collect();

        for data in client.get_metric_series_data(metric_id, &keys, start, end).await? {
            if let Some(summary) = data.summary() {
                reports.push(SeriesReport {
                    metric: column.name.clone(),
                    series_key: data.definition.series_key,
                    count: summary.count,
                    min: summary.min,
                    max: summary.max,
                    mean: summary.mean,
                });
            }
        }
    }

    tracing::info!(series = reports.len(), "Summarized series");
    Ok(reports)
}
