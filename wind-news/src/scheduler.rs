use crate::pipeline::NewsPipeline;
use crate::types::RefreshReport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// Shortest interval `run` accepts; `tokio::time::interval` rejects zero.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Fetching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Startup,
    Interval,
    Manual,
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    /// Another cycle was already running; nothing was done.
    Skipped,
}

/// Resets the fetching flag however the cycle ends, including cancellation.
struct FetchingGuard<'a>(&'a AtomicBool);

impl Drop for FetchingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Serializes refresh cycles: at most one runs at a time, and a trigger
/// that arrives mid-cycle is dropped rather than queued.
pub struct RefreshScheduler {
    pipeline: Arc<NewsPipeline>,
    is_fetching: AtomicBool,
    last_report: RwLock<Option<RefreshReport>>,
}

impl RefreshScheduler {
    pub fn new(pipeline: Arc<NewsPipeline>) -> Self {
        Self {
            pipeline,
            is_fetching: AtomicBool::new(false),
            last_report: RwLock::new(None),
        }
    }

    pub fn pipeline(&self) -> &NewsPipeline {
        &self.pipeline
    }

    pub fn state(&self) -> SchedulerState {
        if self.is_fetching.load(Ordering::SeqCst) {
            SchedulerState::Fetching
        } else {
            SchedulerState::Idle
        }
    }

    pub async fn last_report(&self) -> Option<RefreshReport> {
        self.last_report.read().await.clone()
    }

    pub async fn trigger(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        if self
            .is_fetching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Already fetching, skipping {:?} refresh", trigger);
            return RefreshOutcome::Skipped;
        }
        let _guard = FetchingGuard(&self.is_fetching);

        info!("Running {:?} refresh", trigger);
        let report = self.pipeline.run_cycle().await;
        *self.last_report.write().await = Some(report.clone());
        RefreshOutcome::Completed(report)
    }

    /// Refresh now, then once per `every` (at least [`MIN_REFRESH_INTERVAL`]).
    /// Runs until the task is dropped.
    pub async fn run(&self, every: Duration) {
        self.trigger(RefreshTrigger::Startup).await;

        let mut ticker = interval(every.max(MIN_REFRESH_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the startup refresh covered it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.trigger(RefreshTrigger::Interval).await;
        }
    }
}
