//! Metrics Advisor administration client.
//!
//! Typed models and an administration surface for a time-series anomaly
//! detection service: data feeds, detection and alert configurations,
//! notification hooks, data source credentials, feedback and series queries.
//!
//! # Architecture
//!
//! - `core`: composite dimension key, identifiers, errors and configuration
//! - `models`: administration entities and their validation rules
//! - `client`: the [`client::AdministrationClient`] trait, paging and an
//!   in-memory implementation
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use metrics_advisor::client::{AdministrationClient, InMemoryAdministrationClient};
//! use metrics_advisor::DimensionKey;
//!
//! #[tokio::main]
//! async fn main() -> metrics_advisor::Result<()> {
//!     let client = InMemoryAdministrationClient::default();
//!     let mut key = DimensionKey::new();
//!     key.put("city", "redmond").put("category", "shoes");
//!     let feeds = client.list_data_feeds(&Default::default(), &Default::default()).await?;
//!     println!("{} feeds, key {}", feeds.items.len(), key);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod client;
pub mod core;
pub mod models;

// Re-export core types for convenience
pub use crate::core::{Config, DimensionKey, MetricsAdvisorError, Result};
