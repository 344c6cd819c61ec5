use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use watch_logging::{set_cycle, watch_error, watch_info, watch_warn};

use crate::discovery::DiscoveryCycle;
use crate::notify::{DispatchSummary, NotificationDispatcher};

#[derive(Debug, Clone)]
pub struct RunLoopSettings {
    pub base_interval: Duration,
    /// Upper bound of the uniform random delay added to every interval.
    pub jitter_max: Duration,
    /// Pause after a failed cycle.
    pub fallback_delay: Duration,
    pub retention: chrono::Duration,
    /// Evict expired postings every this many cycles; 0 disables.
    pub cleanup_every: u64,
    /// Restart the rendering engine every this many cycles; 0 disables.
    pub recycle_every: u64,
}

impl Default for RunLoopSettings {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(60),
            jitter_max: Duration::from_secs(60),
            fallback_delay: Duration::from_secs(10),
            retention: chrono::Duration::days(3),
            cleanup_every: 10,
            recycle_every: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed { found: usize, dispatch: DispatchSummary },
    Failed,
}

/// Drives discovery and notification until cancelled. Cycles run strictly
/// one after another.
pub struct RunLoop {
    discovery: DiscoveryCycle,
    dispatcher: NotificationDispatcher,
    settings: RunLoopSettings,
    cycle: u64,
}

impl RunLoop {
    pub fn new(
        discovery: DiscoveryCycle,
        dispatcher: NotificationDispatcher,
        settings: RunLoopSettings,
    ) -> Self {
        Self {
            discovery,
            dispatcher,
            settings,
            cycle: 0,
        }
    }

    pub fn discovery(&self) -> &DiscoveryCycle {
        &self.discovery
    }

    /// Cycles completed or failed so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Loops until `cancel` fires, then shuts the rendering session down.
    pub async fn run(&mut self, cancel: CancellationToken) {
        watch_info!("run loop started");
        while !cancel.is_cancelled() {
            let outcome = self.run_once().await;
            let pause = self.pause_after(outcome);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }
        watch_info!("interrupt received, stopping after {} cycles", self.cycle);
        self.discovery.shutdown().await;
    }

    /// Runs exactly `n` cycles with the usual pauses between them and returns
    /// their outcomes. The session is left running.
    pub async fn run_cycles(&mut self, n: usize) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(n);
        for i in 0..n {
            let outcome = self.run_once().await;
            outcomes.push(outcome);
            if i + 1 < n {
                tokio::time::sleep(self.pause_after(outcome)).await;
            }
        }
        outcomes
    }

    /// One full iteration: maintenance, discovery, dispatch.
    pub async fn run_once(&mut self) -> CycleOutcome {
        self.cycle += 1;
        set_cycle(self.cycle);

        if is_due(self.cycle, self.settings.recycle_every) {
            if let Err(err) = self.discovery.recycle_session().await {
                // ensure_live retries the launch below.
                watch_warn!("preventive recycle failed: {}", err);
            }
        }

        let outcome = match self.discovery.discover().await {
            Ok(postings) => {
                if postings.is_empty() {
                    watch_info!("no new postings");
                } else {
                    watch_info!("{} new posting(s)", postings.len());
                }
                let dispatch = self.dispatcher.dispatch(&postings).await;
                CycleOutcome::Completed {
                    found: postings.len(),
                    dispatch,
                }
            }
            Err(err) => {
                watch_error!("cycle failed: {}", err);
                CycleOutcome::Failed
            }
        };

        if is_due(self.cycle, self.settings.cleanup_every) {
            self.discovery.evict_expired(self.settings.retention);
        }

        outcome
    }

    /// `base_interval` plus a uniform draw from `[0, jitter_max]`.
    pub fn next_interval(&self) -> Duration {
        let jitter_ms = u64::try_from(self.settings.jitter_max.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.settings.base_interval + Duration::from_millis(extra)
    }

    fn pause_after(&self, outcome: CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Completed { .. } => self.next_interval(),
            CycleOutcome::Failed => self.settings.fallback_delay,
        }
    }
}

fn is_due(cycle: u64, every: u64) -> bool {
    every > 0 && cycle % every == 0
}
