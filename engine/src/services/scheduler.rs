//! Fixed-cadence driver for [`SignalEngine::run_cycle`].
//!
//! Two states alternate forever: `Fetching` runs one cycle and reports it,
//! `Waiting` sleeps for the poll interval. A failed cycle is reported and the
//! next tick is the retry. Shutdown is observed while fetching and while
//! waiting; a fetch cut short by shutdown reports nothing.

use crate::services::report::{CycleReporter, StopReason};
use crate::services::signal_engine::SignalEngine;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Fetching,
    Waiting,
}

pub struct Scheduler {
    engine: SignalEngine,
    poll_interval: Duration,
    max_cycles: Option<u64>,
}

impl Scheduler {
    pub fn new(engine: SignalEngine) -> Self {
        let poll_interval = engine.settings().poll_interval();
        Self {
            engine,
            poll_interval,
            max_cycles: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Stop after this many reported cycles instead of running forever.
    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = Some(max_cycles);
        self
    }

    /// Runs until shutdown is signalled or the cycle limit is hit. Returns the
    /// number of cycles that were reported.
    pub async fn run<R: CycleReporter>(
        &self,
        reporter: &mut R,
        mut shutdown: watch::Receiver<bool>,
    ) -> u64 {
        reporter.started(self.engine.settings());
        tracing::info!(
            symbol = %self.engine.settings().symbol,
            source = self.engine.source_name(),
            poll_secs = self.poll_interval.as_secs_f64(),
            "Scheduler started"
        );

        let mut state = CycleState::Fetching;
        let mut completed: u64 = 0;

        let reason = loop {
            if *shutdown.borrow() {
                break StopReason::Interrupted;
            }

            state = match state {
                CycleState::Fetching => {
                    let outcome = tokio::select! {
                        biased;
                        _ = shutdown_requested(&mut shutdown) => break StopReason::Interrupted,
                        outcome = self.engine.run_cycle() => outcome,
                    };
                    reporter.report(&outcome);
                    completed += 1;

                    if self.max_cycles.is_some_and(|max| completed >= max) {
                        break StopReason::CycleLimit;
                    }
                    CycleState::Waiting
                }
                CycleState::Waiting => {
                    reporter.waiting(self.poll_interval);
                    tokio::select! {
                        biased;
                        _ = shutdown_requested(&mut shutdown) => break StopReason::Interrupted,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                    CycleState::Fetching
                }
            };
        };

        tracing::info!(cycles = completed, ?reason, "Scheduler stopped");
        reporter.stopped(reason);
        completed
    }
}

// Resolves once `true` is published. A dropped sender means nobody can ask for
// shutdown any more, so this then never resolves.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
