use crate::{
    atlas::{JobStatus, MeasurementPlatform},
    config::Config,
    error::{Error, Result},
    fetch::ResultFetcher,
    normalize,
    report::{self, CampaignReport, JobReport},
    submit::CampaignSubmitter,
    types::{JobHandle, NormalizedRecord, ProbeId},
    util::now_rfc3339,
    wait::CompletionWaiter,
};
use std::time::Instant;
use tracing::{info, warn};

/// Submit → wait → fetch → normalize, for one set of targets and probes.
pub struct Campaign<'a, P: MeasurementPlatform + ?Sized> {
    cfg: Config,
    platform: &'a P,
}

pub struct CampaignOutput {
    pub records: Vec<NormalizedRecord>,
    pub report: CampaignReport,
}

impl<'a, P: MeasurementPlatform + ?Sized> Campaign<'a, P> {
    pub fn new(cfg: &Config, platform: &'a P) -> Self {
        Self {
            cfg: cfg.clone(),
            platform,
        }
    }

    pub fn run(&self, targets: &[String], probes: &[ProbeId]) -> Result<CampaignOutput> {
        if targets.is_empty() {
            return Err(Error::InvalidArgument("at least one target is required".into()));
        }
        if probes.is_empty() {
            return Err(Error::InvalidArgument("at least one probe is required".into()));
        }

        let started = now_rfc3339();
        let clock = Instant::now();
        let campaign_id = report::campaign_id(&self.cfg.normalized_for_hash(), targets, probes);
        info!(
            "campaign {} using {} probe(s) against {} target(s): {}",
            &campaign_id[..12],
            probes.len(),
            targets.len(),
            targets.join(", ")
        );

        let handles = CampaignSubmitter::new(&self.cfg, self.platform).submit_all(targets, probes)?;
        let statuses = CompletionWaiter::new(&self.cfg, self.platform).wait(&handles);
        let (records, jobs) = self.collect(&handles, statuses);

        if records.is_empty() {
            warn!(
                "no results were collected from {} measurement(s)",
                handles.len()
            );
            return Err(Error::EmptyResults { jobs: handles });
        }

        info!(
            "campaign finished: {} record(s) from {} measurement(s) in {:.1}s",
            records.len(),
            handles.len(),
            clock.elapsed().as_secs_f64()
        );

        let report = CampaignReport {
            campaign_id,
            started,
            finished: now_rfc3339(),
            targets: targets.to_vec(),
            probe_count: probes.len(),
            packets: self.cfg.campaign.packets,
            record_count: records.len(),
            jobs,
        };
        Ok(CampaignOutput { records, report })
    }

    /// Fetches and normalizes results for already submitted jobs.
    ///
    /// `statuses` pairs with `jobs`; missing entries default to `Submitted`.
    pub fn collect(
        &self,
        jobs: &[JobHandle],
        statuses: Vec<JobStatus>,
    ) -> (Vec<NormalizedRecord>, Vec<JobReport>) {
        let fetcher = ResultFetcher::new(self.platform, self.cfg.concurrency.fetch_workers);
        let raw = fetcher.fetch_all(jobs);

        let mut records = Vec::new();
        let mut reports = Vec::with_capacity(jobs.len());
        let mut statuses = statuses.into_iter();
        for (job, results) in jobs.iter().zip(raw) {
            let before = records.len();
            for result in &results {
                normalize::extend_normalized(&mut records, result);
            }
            reports.push(JobReport {
                handle: job.clone(),
                status: statuses.next().unwrap_or(JobStatus::Submitted),
                raw_results: results.len(),
                records: records.len() - before,
            });
        }
        (records, reports)
    }
}
