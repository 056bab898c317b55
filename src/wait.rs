use crate::{
    atlas::{JobStatus, MeasurementPlatform},
    config::{Config, WaitStrategy},
    types::JobHandle,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Gates result fetching until submitted jobs are expected to be done.
pub struct CompletionWaiter<'a, P: MeasurementPlatform + ?Sized> {
    platform: &'a P,
    strategy: WaitStrategy,
    deadline: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl<'a, P: MeasurementPlatform + ?Sized> CompletionWaiter<'a, P> {
    pub fn new(cfg: &Config, platform: &'a P) -> Self {
        Self {
            platform,
            strategy: cfg.wait.strategy,
            deadline: Duration::from_secs(cfg.wait.wait_seconds),
            initial: Duration::from_secs(cfg.wait.poll_initial_seconds),
            max: Duration::from_secs(cfg.wait.poll_max_seconds),
            factor: cfg.wait.poll_backoff_factor,
        }
    }

    /// Returns the last known state of each job, in `jobs` order.
    ///
    /// The fixed strategy has no status information and reports every job as
    /// `Submitted`.
    pub fn wait(&self, jobs: &[JobHandle]) -> Vec<JobStatus> {
        if jobs.is_empty() {
            return Vec::new();
        }
        match self.strategy {
            WaitStrategy::Fixed => {
                self.wait_fixed(&jobs[0]);
                vec![JobStatus::Submitted; jobs.len()]
            }
            WaitStrategy::Poll => self.wait_polling(jobs),
        }
    }

    fn wait_fixed(&self, first: &JobHandle) {
        info!(
            "waiting {}s for measurement {} and its siblings to complete",
            self.deadline.as_secs(),
            first.measurement_id
        );
        if !self.deadline.is_zero() {
            std::thread::sleep(self.deadline);
        }
        info!("wait complete");
    }

    fn wait_polling(&self, jobs: &[JobHandle]) -> Vec<JobStatus> {
        let started = Instant::now();
        let mut states = vec![JobStatus::Submitted; jobs.len()];
        let mut delay = self.initial;

        loop {
            for (job, state) in jobs.iter().zip(states.iter_mut()) {
                if state.is_terminal() {
                    continue;
                }
                match self.platform.job_status(job.measurement_id) {
                    Ok(next) => {
                        if next != *state {
                            debug!(
                                measurement_id = job.measurement_id,
                                "status {:?} -> {:?}", state, next
                            );
                        }
                        *state = next;
                    }
                    Err(err) => {
                        warn!("status check for measurement {} failed: {err:#}", job.measurement_id);
                    }
                }
            }

            let pending = states.iter().filter(|s| !s.is_terminal()).count();
            if pending == 0 {
                info!("all {} measurement(s) finished", jobs.len());
                break;
            }

            let elapsed = started.elapsed();
            if elapsed >= self.deadline {
                warn!(
                    "{} measurement(s) still pending after {}s; fetching what is available",
                    pending,
                    self.deadline.as_secs()
                );
                break;
            }

            let sleep_for = delay.min(self.deadline - elapsed);
            info!("{pending} measurement(s) pending; next check in {}s", sleep_for.as_secs());
            std::thread::sleep(sleep_for);
            delay = backoff(delay, self.factor, self.max);
        }

        for (job, state) in jobs.iter().zip(&states) {
            if let JobStatus::Failed(reason) = state {
                warn!("measurement {} ended as failed: {reason}", job.measurement_id);
            }
        }
        states
    }
}

/// Next poll interval: `current * factor`, capped at `max`, never below 1ms.
///
/// A product that does not fit a `Duration` saturates at `max`.
pub fn backoff(current: Duration, factor: f64, max: Duration) -> Duration {
    Duration::try_from_secs_f64(current.as_secs_f64() * factor)
        .unwrap_or(max)
        .min(max)
        .max(Duration::from_millis(1))
}
