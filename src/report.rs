use crate::{
    atlas::JobStatus,
    types::{JobHandle, ProbeId},
    util::{now_rfc3339, sha256_hex},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReport {
    pub campaign_id: String,
    pub started: String,
    pub finished: String,
    pub targets: Vec<String>,
    pub probe_count: usize,
    pub packets: u32,
    pub jobs: Vec<JobReport>,
    pub record_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    #[serde(flatten)]
    pub handle: JobHandle,
    pub status: JobStatus,
    pub raw_results: usize,
    pub records: usize,
}

impl CampaignReport {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest: {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing manifest: {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("writing manifest: {}", path.display()))
    }

    /// Manifest for a campaign that stopped before producing results, so
    /// the measurements it created can still be collected with `fetch`.
    pub fn unfinished(
        campaign_id: String,
        started: String,
        targets: &[String],
        probe_count: usize,
        packets: u32,
        created: &[JobHandle],
    ) -> Self {
        Self {
            campaign_id,
            started,
            finished: now_rfc3339(),
            targets: targets.to_vec(),
            probe_count,
            packets,
            jobs: created
                .iter()
                .map(|handle| JobReport {
                    handle: handle.clone(),
                    status: JobStatus::Submitted,
                    raw_results: 0,
                    records: 0,
                })
                .collect(),
            record_count: 0,
        }
    }

    pub fn handles(&self) -> Vec<JobHandle> {
        self.jobs.iter().map(|j| j.handle.clone()).collect()
    }
}

/// Stable identifier of a campaign's inputs.
pub fn campaign_id(normalized_cfg: &str, targets: &[String], probes: &[ProbeId]) -> String {
    let probes = probes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    sha256_hex(format!("{}\n{}\n{}", normalized_cfg, targets.join(","), probes).as_bytes())
}
