//! On-demand collection cycle
//!
//! Each scrape runs one cycle in two phases:
//!
//! 1. **Catalog** (sequential): fetch the region catalog and classify it into
//!    [`Center`]s. A failure here ends the cycle with an empty snapshot.
//! 2. **Fan-out** (concurrent): one task per enabled (center, vaccination type)
//!    pair fetches availability and emits a next-slot sample when a date is
//!    found. Presence samples for enabled and disabled pairs are emitted by
//!    the orchestrator while the tasks run. Disabled pairs are never fetched.
//!
//! The cycle returns only after every task has finished or the fan-out
//! deadline has expired; unfinished tasks are aborted and count as failed.
//!
//! # Usage
//!
//! ```ignore
//! let client = Arc::new(DoctolibClient::new(&config.upstream)?);
//! let metrics = Arc::new(ExporterMetrics::new()?);
//! let collector = Collector::new(client, &config.collection, metrics);
//! let snapshot = collector.collect().await;
//! ```

pub mod sink;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::classifier::classify;
use crate::config::CollectionConfig;
use crate::metrics::{ExporterMetrics, UpstreamEndpoint};
use crate::models::Center;
use crate::upstream::availability::next_available_date;
use crate::upstream::{AvailabilityQuery, BookingApi};

pub use sink::{ChannelSink, MetricSink, Sample};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Signed, unrounded number of days from `now` until midnight UTC of `date`
pub fn days_until(now: DateTime<Utc>, date: NaiveDate) -> f64 {
    let target = date.and_time(NaiveTime::MIN).and_utc();
    (target - now).num_milliseconds() as f64 / MILLIS_PER_DAY
}

// ============================================================================
// Snapshot
// ============================================================================

/// Summary of one collection cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Catalog phase succeeded
    pub catalog_ok: bool,
    /// Centers built from the catalog
    pub centers: usize,
    /// Pairs whose availability was queried
    pub enabled_pairs: usize,
    /// Pairs reported as disabled, never queried
    pub disabled_pairs: usize,
    /// Pairs that produced a next-slot sample
    pub resolved_pairs: usize,
    /// Pairs that failed (fetch, decode, date parse, panic or deadline)
    pub failed_pairs: usize,
}

/// Every sample emitted by one completed cycle
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    samples: Vec<Sample>,
    stats: CycleStats,
}

impl Snapshot {
    pub fn new(samples: Vec<Sample>, stats: CycleStats) -> Self {
        Self { samples, stats }
    }

    /// Samples in emission order (not deterministic across runs)
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Samples ordered by label tuple
    pub fn sorted(&self) -> Vec<Sample> {
        let mut samples = self.samples.clone();
        samples.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        samples
    }

    /// Presence samples only
    pub fn presence(&self) -> impl Iterator<Item = &Sample> {
        self.samples
            .iter()
            .filter(|s| matches!(s, Sample::Presence { .. }))
    }

    /// Next-slot samples only
    pub fn next_slots(&self) -> impl Iterator<Item = &Sample> {
        self.samples
            .iter()
            .filter(|s| matches!(s, Sample::NextSlot { .. }))
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ============================================================================
// Collector
// ============================================================================

/// Result of one fan-out task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairOutcome {
    Resolved,
    NoDate,
    Failed,
}

impl CycleStats {
    fn record(&mut self, joined: Result<PairOutcome, JoinError>) {
        match joined {
            Ok(PairOutcome::Resolved) => self.resolved_pairs += 1,
            Ok(PairOutcome::NoDate) => {}
            Ok(PairOutcome::Failed) => self.failed_pairs += 1,
            Err(e) => {
                tracing::warn!(error = %e, "Availability task did not complete");
                self.failed_pairs += 1;
            }
        }
    }
}

/// Everything a fan-out task owns
struct PairFetch {
    api: Arc<dyn BookingApi>,
    metrics: Arc<ExporterMetrics>,
    permits: Arc<Semaphore>,
    sink: ChannelSink,
    center: String,
    vaccination: String,
    query: AvailabilityQuery,
    now: DateTime<Utc>,
}

impl PairFetch {
    async fn run(self) -> PairOutcome {
        let Ok(_permit) = self.permits.acquire().await else {
            return PairOutcome::Failed;
        };

        let response = match self.api.fetch_availability(&self.query).await {
            Ok(response) => {
                self.metrics
                    .record_upstream(UpstreamEndpoint::Availability, true);
                response
            }
            Err(e) => {
                self.metrics
                    .record_upstream(UpstreamEndpoint::Availability, false);
                tracing::warn!(
                    center = %self.center,
                    vaccination = %self.vaccination,
                    practice_id = self.query.practice_id,
                    motive_id = self.query.motive_id,
                    recoverable = e.is_recoverable(),
                    error = %e,
                    "Failed to get availabilities"
                );
                return PairOutcome::Failed;
            }
        };

        match next_available_date(&response) {
            Ok(Some(date)) => {
                let days = days_until(self.now, date);
                tracing::debug!(
                    center = %self.center,
                    vaccination = %self.vaccination,
                    %date,
                    days,
                    "Next slot resolved"
                );
                self.sink
                    .emit(Sample::next_slot(self.center, self.vaccination, days));
                PairOutcome::Resolved
            }
            Ok(None) => PairOutcome::NoDate,
            Err(e) => {
                tracing::warn!(
                    center = %self.center,
                    vaccination = %self.vaccination,
                    practice_id = self.query.practice_id,
                    motive_id = self.query.motive_id,
                    error = %e,
                    "Failed to parse next slot"
                );
                PairOutcome::Failed
            }
        }
    }
}

/// Runs collection cycles against the booking API
pub struct Collector {
    api: Arc<dyn BookingApi>,
    metrics: Arc<ExporterMetrics>,
    max_concurrent_fetches: usize,
    fanout_deadline: Duration,
}

impl Collector {
    /// Create a collector; nothing is fetched until [`Collector::collect`]
    pub fn new(
        api: Arc<dyn BookingApi>,
        config: &CollectionConfig,
        metrics: Arc<ExporterMetrics>,
    ) -> Self {
        Self {
            api,
            metrics,
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
            fanout_deadline: config.fanout_deadline(),
        }
    }

    /// Override the fan-out deadline
    pub fn with_fanout_deadline(mut self, deadline: Duration) -> Self {
        self.fanout_deadline = deadline;
        self
    }

    /// Run one cycle against the wall clock
    pub async fn collect(&self) -> Snapshot {
        self.collect_at(Utc::now()).await
    }

    /// Run one cycle as if it started at `now`
    ///
    /// The availability search starts at the local calendar date of `now`;
    /// next-slot values are measured from `now`.
    pub async fn collect_at(&self, now: DateTime<Utc>) -> Snapshot {
        let started = Instant::now();
        let snapshot = self.run_cycle(now).await;
        let elapsed = started.elapsed();
        self.metrics.observe_scrape(elapsed.as_secs_f64());

        let stats = snapshot.stats();
        tracing::info!(
            catalog_ok = stats.catalog_ok,
            centers = stats.centers,
            enabled_pairs = stats.enabled_pairs,
            disabled_pairs = stats.disabled_pairs,
            resolved_pairs = stats.resolved_pairs,
            failed_pairs = stats.failed_pairs,
            samples = snapshot.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Collection cycle finished"
        );

        snapshot
    }

    async fn run_cycle(&self, now: DateTime<Utc>) -> Snapshot {
        let centers = match self.api.fetch_catalog().await {
            Ok(catalog) => {
                self.metrics.record_upstream(UpstreamEndpoint::Catalog, true);
                classify(&catalog)
            }
            Err(e) => {
                self.metrics.record_upstream(UpstreamEndpoint::Catalog, false);
                self.metrics.record_catalog_failure();
                tracing::error!(error = %e, "Error fetching vaccination centers");
                return Snapshot::default();
            }
        };

        let mut stats = CycleStats {
            catalog_ok: true,
            centers: centers.len(),
            ..Default::default()
        };

        let start_date = now.with_timezone(&Local).date_naive();
        let (sink, mut rx) = ChannelSink::channel();
        let mut tasks = self.fan_out(&centers, start_date, now, &sink, &mut stats);
        drop(sink);

        self.join(&mut tasks, &mut stats).await;

        rx.close();
        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }

        Snapshot::new(samples, stats)
    }

    /// Spawn one task per enabled pair and emit all presence samples
    fn fan_out(
        &self,
        centers: &[Center],
        start_date: NaiveDate,
        now: DateTime<Utc>,
        sink: &ChannelSink,
        stats: &mut CycleStats,
    ) -> JoinSet<PairOutcome> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_fetches));
        let mut tasks = JoinSet::new();

        for center in centers {
            tracing::debug!(
                center = %center.name,
                practice_id = center.id,
                enabled = center.enabled_count(),
                disabled = center.disabled().len(),
                "Querying center"
            );

            for (&motive_id, vaccination) in center.enabled() {
                stats.enabled_pairs += 1;

                let fetch = PairFetch {
                    api: Arc::clone(&self.api),
                    metrics: Arc::clone(&self.metrics),
                    permits: Arc::clone(&permits),
                    sink: sink.clone(),
                    center: center.name.clone(),
                    vaccination: vaccination.clone(),
                    query: AvailabilityQuery {
                        start_date,
                        practice_id: center.id,
                        motive_id,
                        agenda_ids: center.agenda_ids.clone(),
                    },
                    now,
                };
                tasks.spawn(fetch.run());

                sink.emit(Sample::presence(&center.name, vaccination, false));
            }

            for vaccination in center.disabled().values() {
                stats.disabled_pairs += 1;
                sink.emit(Sample::presence(&center.name, vaccination, true));
            }
        }

        tasks
    }

    /// Wait for every task, aborting the rest once the deadline passes
    async fn join(&self, tasks: &mut JoinSet<PairOutcome>, stats: &mut CycleStats) {
        let deadline = tokio::time::Instant::now() + self.fanout_deadline;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(None) => break,
                Ok(Some(joined)) => stats.record(joined),
                Err(_) => {
                    // Tasks that finished in the meantime keep their outcome
                    while let Some(joined) = tasks.try_join_next() {
                        stats.record(joined);
                    }

                    let unfinished = tasks.len();
                    tracing::warn!(
                        unfinished,
                        deadline_secs = self.fanout_deadline.as_secs_f64(),
                        "Fan-out deadline reached, aborting remaining availability fetches"
                    );
                    stats.failed_pairs += unfinished;
                    tasks.shutdown().await;
                    break;
                }
            }
        }
    }
}
