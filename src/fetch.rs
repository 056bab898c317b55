use crate::{
    atlas::MeasurementPlatform,
    pool,
    types::{JobHandle, RawResult},
};
use tracing::{info, warn};

/// Best-effort retrieval of raw results.
pub struct ResultFetcher<'a, P: MeasurementPlatform + ?Sized> {
    platform: &'a P,
    workers: usize,
}

impl<'a, P: MeasurementPlatform + ?Sized> ResultFetcher<'a, P> {
    pub fn new(platform: &'a P, workers: usize) -> Self {
        Self { platform, workers }
    }

    /// Results for one job; a remote failure yields an empty collection.
    pub fn fetch(&self, job: &JobHandle) -> Vec<RawResult> {
        info!("fetching results for measurement {}", job.measurement_id);
        match self.platform.fetch_results(job.measurement_id) {
            Ok(results) => {
                info!(
                    "retrieved {} result(s) for measurement {}",
                    results.len(),
                    job.measurement_id
                );
                results
            }
            Err(err) => {
                warn!(
                    "error fetching results for measurement {} ({} batch {}): {err:#}",
                    job.measurement_id, job.target, job.batch_index
                );
                Vec::new()
            }
        }
    }

    /// Results for every job, in `jobs` order.
    pub fn fetch_all(&self, jobs: &[JobHandle]) -> Vec<Vec<RawResult>> {
        pool::map_bounded(jobs, self.workers, |_, job| self.fetch(job))
    }
}
