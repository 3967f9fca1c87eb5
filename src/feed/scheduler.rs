//! Periodic ingestion scheduler.
//!
//! Runs one ingestion tick per interval on a single logical worker. Ticks
//! never overlap: a slow tick delays the next one instead of queueing more.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::types::IngestResult;
use crate::shutdown::ShutdownSignal;
use crate::{GatorError, Result};

/// Smallest interval between two ticks.
pub const MIN_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Work performed on every scheduler tick.
#[async_trait]
pub trait IngestJob: Send + Sync {
    /// Run one ingestion tick.
    async fn ingest_once(&self, shutdown: &ShutdownSignal) -> Result<IngestResult>;
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next tick.
    Idle,
    /// A tick is in progress.
    Fetching,
}

/// Counters returned when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    /// Ticks started.
    pub ticks: u64,
    /// Ticks that ended in an error other than cancellation.
    pub failures: u64,
}

/// Parse a duration string such as `"1m"`, `"1h30m"` or `"1.5s"`.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. Zero and negative
/// durations are rejected.
pub fn parse_interval(value: &str) -> Result<Duration> {
    let invalid = |why: &str| GatorError::Config(format!("invalid duration {:?}: {}", value, why));

    let trimmed = value.trim();
    let (negative, mut rest) = match trimmed.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    if rest.is_empty() {
        return Err(invalid("empty"));
    }

    let mut nanos = 0f64;
    if rest != "0" {
        while !rest.is_empty() {
            let num_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            let amount: f64 = rest[..num_len]
                .parse()
                .map_err(|_| invalid("expected a number"))?;
            rest = &rest[num_len..];

            let unit_len = rest
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(rest.len());
            let scale = match &rest[..unit_len] {
                "ns" => 1.0,
                "us" | "µs" | "μs" => 1e3,
                "ms" => 1e6,
                "s" => 1e9,
                "m" => 60e9,
                "h" => 3600e9,
                "" => return Err(invalid("missing unit")),
                _ => return Err(invalid("unknown unit")),
            };
            rest = &rest[unit_len..];

            nanos += amount * scale;
        }
    }

    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        return Err(invalid("out of range"));
    }
    if negative || nanos < 1.0 {
        return Err(GatorError::Config(format!(
            "interval must be positive, got {:?}",
            value
        )));
    }

    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Apply the minimum interval floor.
pub fn effective_interval(requested: Duration) -> Duration {
    requested.max(MIN_INTERVAL)
}

/// Periodic driver of an [`IngestJob`].
pub struct Scheduler {
    job: Arc<dyn IngestJob>,
    interval: Duration,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    /// Create a scheduler.
    ///
    /// Intervals below [`MIN_INTERVAL`] are raised to it; a zero interval is
    /// a configuration error.
    pub fn new(job: Arc<dyn IngestJob>, requested: Duration) -> Result<Self> {
        if requested.is_zero() {
            return Err(GatorError::Config("interval must be positive".to_string()));
        }

        let interval = effective_interval(requested);
        if interval != requested {
            debug!(
                "Requested interval {:?} raised to minimum {:?}",
                requested, interval
            );
        }

        let (state, _) = watch::channel(SchedulerState::Idle);
        Ok(Self {
            job,
            interval,
            state,
        })
    }

    /// Create a scheduler from a duration string.
    pub fn from_interval_str(job: Arc<dyn IngestJob>, value: &str) -> Result<Self> {
        Self::new(job, parse_interval(value)?)
    }

    /// Interval between ticks after the floor was applied.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Run until shutdown is requested.
    ///
    /// The first tick fires immediately. Tick failures are logged and the
    /// loop continues.
    pub async fn run(&self, shutdown: ShutdownSignal) -> SchedulerSummary {
        info!("Collecting feeds every {:?}", self.interval);

        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut summary = SchedulerSummary::default();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                _ = timer.tick() => {}
            }

            summary.ticks += 1;
            self.state.send_replace(SchedulerState::Fetching);
            debug!(tick = summary.ticks, "Scheduler fetching");

            let outcome = self.job.ingest_once(&shutdown).await;

            self.state.send_replace(SchedulerState::Idle);
            debug!(tick = summary.ticks, "Scheduler idle");

            match outcome {
                Ok(result) if result.is_empty() => {
                    debug!("No feeds to fetch");
                }
                Ok(result) => {
                    info!(
                        feed = result.feed_name.as_deref().unwrap_or_default(),
                        seen = result.items_seen,
                        inserted = result.items_inserted,
                        skipped = result.items_skipped,
                        failed = result.items_failed,
                        "Feed collected"
                    );
                }
                Err(GatorError::Cancelled) => {
                    debug!("Tick cancelled");
                    break;
                }
                Err(e) => {
                    summary.failures += 1;
                    warn!("Tick failed: {}", e);
                }
            }
        }

        info!(
            ticks = summary.ticks,
            failures = summary.failures,
            "Scheduler stopped"
        );
        summary
    }
}
