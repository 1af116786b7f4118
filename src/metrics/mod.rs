//! Prometheus exposition for collection snapshots
//!
//! This module provides:
//! - the descriptors of the two exported gauge families
//!   (`impfzentrum` and `impfzentrum_next_slot_duration_days`)
//! - exporter self-metrics: scrape duration, upstream request outcomes,
//!   catalog failures
//! - rendering of a [`Snapshot`] to the Prometheus text format
//!
//! # Usage
//!
//! Build one [`ExporterMetrics`] at start-up and share it. Every scrape
//! renders into a fresh registry, so pairs that disappeared upstream vanish
//! from the next scrape.

use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

use crate::collector::{Sample, Snapshot};
use crate::error::{Error, Result};

/// Presence gauge: one series per (center, vaccination type)
pub const PRESENCE_METRIC: &str = "impfzentrum";

/// Next-slot gauge: days until the next available appointment
pub const NEXT_SLOT_METRIC: &str = "impfzentrum_next_slot_duration_days";

const PRESENCE_LABELS: [&str; 3] = ["name", "type", "disabled"];
const NEXT_SLOT_LABELS: [&str; 2] = ["name", "type"];

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Upstream endpoints tracked by the request counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamEndpoint {
    Catalog,
    Availability,
}

impl UpstreamEndpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Availability => "availability",
        }
    }
}

/// Descriptors and self-metrics of the exporter
pub struct ExporterMetrics {
    presence: Opts,
    next_slot: Opts,

    /// Registry holding the self-metrics below
    registry: Registry,
    scrape_duration: Histogram,
    upstream_requests: IntCounterVec,
    catalog_failures: IntCounter,
}

impl ExporterMetrics {
    /// Build descriptors and register self-metrics
    ///
    /// # Errors
    ///
    /// Returns `prometheus::Error` if a metric cannot be created or registered
    pub fn new() -> std::result::Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let scrape_duration = Histogram::with_opts(
            HistogramOpts::new(
                "impfwatch_scrape_duration_seconds",
                "Duration of a full collection cycle in seconds",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0]),
        )?;
        let upstream_requests = IntCounterVec::new(
            Opts::new(
                "impfwatch_upstream_requests_total",
                "Requests to the booking API by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )?;
        let catalog_failures = IntCounter::new(
            "impfwatch_catalog_failures_total",
            "Collection cycles aborted because the catalog could not be fetched",
        )?;

        registry.register(Box::new(scrape_duration.clone()))?;
        registry.register(Box::new(upstream_requests.clone()))?;
        registry.register(Box::new(catalog_failures.clone()))?;

        Ok(Self {
            presence: Opts::new(
                PRESENCE_METRIC,
                "Vaccination centers and the vaccination types they offer",
            ),
            next_slot: Opts::new(NEXT_SLOT_METRIC, "Days until the next available appointment"),
            registry,
            scrape_duration,
            upstream_requests,
            catalog_failures,
        })
    }

    /// Count one upstream request
    pub fn record_upstream(&self, endpoint: UpstreamEndpoint, success: bool) {
        let outcome = if success { "ok" } else { "error" };
        self.upstream_requests
            .with_label_values(&[endpoint.as_str(), outcome])
            .inc();
    }

    /// Count a cycle aborted in the catalog phase
    pub fn record_catalog_failure(&self) {
        self.catalog_failures.inc();
    }

    /// Record the duration of a collection cycle
    pub fn observe_scrape(&self, seconds: f64) {
        self.scrape_duration.observe(seconds);
    }

    /// Requests counted so far for an endpoint and outcome
    pub fn upstream_count(&self, endpoint: UpstreamEndpoint, success: bool) -> u64 {
        let outcome = if success { "ok" } else { "error" };
        self.upstream_requests
            .with_label_values(&[endpoint.as_str(), outcome])
            .get()
    }

    /// Catalog failures counted so far
    pub fn catalog_failure_count(&self) -> u64 {
        self.catalog_failures.get()
    }

    /// Encode a snapshot plus the self-metrics in the text format
    ///
    /// # Errors
    ///
    /// Returns `Error::Metrics` if registration or encoding fails
    pub fn render(&self, snapshot: &Snapshot) -> Result<String> {
        let scrape = Registry::new();
        let presence = GaugeVec::new(self.presence.clone(), &PRESENCE_LABELS)?;
        let next_slot = GaugeVec::new(self.next_slot.clone(), &NEXT_SLOT_LABELS)?;
        scrape.register(Box::new(presence.clone()))?;
        scrape.register(Box::new(next_slot.clone()))?;

        for sample in snapshot.samples() {
            match sample {
                Sample::Presence {
                    center,
                    vaccination,
                    disabled,
                } => {
                    let disabled = if *disabled { "true" } else { "false" };
                    presence
                        .with_label_values(&[center.as_str(), vaccination.as_str(), disabled])
                        .set(1.0);
                }
                Sample::NextSlot {
                    center,
                    vaccination,
                    days,
                } => {
                    next_slot
                        .with_label_values(&[center.as_str(), vaccination.as_str()])
                        .set(*days);
                }
            }
        }

        let mut families = scrape.gather();
        families.extend(self.registry.gather());

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::with_source("Metrics output is not UTF-8", e))
    }
}

// ============================================================================
// Tests
// ============================================================================
