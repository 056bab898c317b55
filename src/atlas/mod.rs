pub mod http;
pub mod types;

use crate::types::{MeasurementId, ProbeId, RawResult};
use anyhow::Result;

pub use http::AtlasClient;
pub use types::{JobRequest, JobStatus, ProbeDetail};

/// The measurement platform, as the campaign pipeline sees it.
pub trait MeasurementPlatform: Sync {
    fn create_job(&self, req: &JobRequest) -> Result<MeasurementId>;
    fn fetch_results(&self, id: MeasurementId) -> Result<Vec<RawResult>>;
    fn list_active_probe_ids(&self) -> Result<Vec<ProbeId>>;
    fn job_status(&self, id: MeasurementId) -> Result<JobStatus>;
}

/// Per-probe metadata lookup.
pub trait ProbeDirectory: Sync {
    fn lookup(&self, id: ProbeId) -> Result<ProbeDetail>;
}
