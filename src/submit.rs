use crate::{
    atlas::{JobRequest, MeasurementPlatform},
    batch::{self, Batch},
    config::Config,
    error::{Error, Result},
    pool,
    types::{JobHandle, ProbeId},
};
use std::time::Duration;
use tracing::{error, info};

/// Creates one measurement per (target, batch) pair.
pub struct CampaignSubmitter<'a, P: MeasurementPlatform + ?Sized> {
    platform: &'a P,
    packets: u32,
    address_family: u8,
    capacity: usize,
    description_prefix: String,
    delay: Duration,
    workers: usize,
}

impl<'a, P: MeasurementPlatform + ?Sized> CampaignSubmitter<'a, P> {
    pub fn new(cfg: &Config, platform: &'a P) -> Self {
        Self {
            platform,
            packets: cfg.campaign.packets,
            address_family: cfg.campaign.address_family,
            capacity: cfg.campaign.max_probes_per_measurement,
            description_prefix: cfg.campaign.description_prefix.clone(),
            delay: cfg.campaign.submit_delay(),
            workers: cfg.concurrency.submit_workers,
        }
    }

    pub fn describe(&self, target: &str, batch_index: usize) -> String {
        format!("{} {} (batch {})", self.description_prefix, target, batch_index)
    }

    /// Submits every batch for every target, targets outermost.
    ///
    /// The first rejected submission aborts the campaign: no further batches
    /// are started and the failure is returned, carrying the handles that were
    /// accepted before it. Handles come back in (target, batch) order
    /// regardless of worker count.
    pub fn submit_all(&self, targets: &[String], probes: &[ProbeId]) -> Result<Vec<JobHandle>> {
        let batches: Vec<Batch<'_>> = batch::partition(probes, self.capacity)?.collect();
        let plan: Vec<(&str, Batch<'_>)> = targets
            .iter()
            .flat_map(|t| batches.iter().map(move |b| (t.as_str(), *b)))
            .collect();

        info!(
            "submitting {} measurement(s): {} target(s) x {} batch(es)",
            plan.len(),
            targets.len(),
            batches.len()
        );

        pool::try_map_bounded(&plan, self.workers, |_, (target, batch)| {
            self.submit_one(target, *batch)
        })
        .map_err(|aborted| match aborted.error {
            Error::Submission {
                target,
                batch_index,
                message,
                ..
            } => Error::Submission {
                target,
                batch_index,
                message,
                created: aborted.completed,
            },
            other => other,
        })
    }

    pub fn submit_one(&self, target: &str, batch: Batch<'_>) -> Result<JobHandle> {
        info!(
            "creating ping measurement to {} with {} probes (batch {})",
            target,
            batch.len(),
            batch.index
        );
        let req = JobRequest {
            target: target.to_string(),
            packets: self.packets,
            address_family: self.address_family,
            probes: batch.probes.to_vec(),
            description: self.describe(target, batch.index),
        };

        let measurement_id = match self.platform.create_job(&req) {
            Ok(id) => id,
            Err(err) => {
                error!("measurement creation failed for {target} batch {}: {err:#}", batch.index);
                return Err(Error::Submission {
                    target: target.to_string(),
                    batch_index: batch.index,
                    message: format!("{err:#}"),
                    created: Vec::new(),
                });
            }
        };
        info!("measurement created with id {measurement_id}");

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        Ok(JobHandle {
            measurement_id,
            target: target.to_string(),
            batch_index: batch.index,
            probe_count: batch.len(),
        })
    }
}
