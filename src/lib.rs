//! impfwatch - vaccination appointment availability exporter
//!
//! A pull-based Prometheus exporter: every scrape fetches the vaccination
//! center catalog of one region from the booking service, queries the next
//! available appointment for each bookable (center, vaccination type) pair
//! concurrently, and exposes the results as gauges.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Wire records and the [`Center`](models::Center) entity
//! - [`upstream`] - HTTP client for the catalog and availability endpoints
//! - [`classifier`] - Catalog records to centers with enabled/disabled types
//! - [`collector`] - The per-scrape fan-out/fan-in collection cycle
//! - [`metrics`] - Gauge descriptors, self-metrics, text exposition
//! - [`server`] - The `/metrics` HTTP endpoint
//! - [`utils`] - Common utilities and domain errors
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use impfwatch::collector::Collector;
//! use impfwatch::config::Config;
//! use impfwatch::metrics::ExporterMetrics;
//! use impfwatch::upstream::DoctolibClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = Arc::new(DoctolibClient::new(&config.upstream)?);
//!     let metrics = Arc::new(ExporterMetrics::new()?);
//!     let collector = Collector::new(client, &config.collection, Arc::clone(&metrics));
//!     let snapshot = collector.collect().await;
//!     println!("{}", metrics.render(&snapshot)?);
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod upstream;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::collector::{Collector, Sample, Snapshot};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::metrics::ExporterMetrics;
    pub use crate::models::Center;
    pub use crate::upstream::{BookingApi, DoctolibClient};
}

// Direct re-exports for convenience
pub use collector::{Collector, Sample, Snapshot};
pub use models::Center;
