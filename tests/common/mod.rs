#![allow(dead_code)]

use anyhow::{anyhow, Result};
use atlas_campaign::{
    atlas::{JobRequest, JobStatus, MeasurementPlatform, ProbeDetail, ProbeDirectory},
    config::{Config, WaitStrategy},
    types::{MeasurementId, PingAttempt, ProbeId, RawResult},
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Config with every delay and wait turned off.
pub fn fast_config() -> Config {
    let mut cfg = Config::default();
    cfg.campaign.submit_delay_ms = 0;
    cfg.wait.strategy = WaitStrategy::Fixed;
    cfg.wait.wait_seconds = 0;
    cfg.wait.poll_initial_seconds = 0;
    cfg
}

pub fn attempt(rtt: Option<f64>, ttl: Option<i64>) -> PingAttempt {
    PingAttempt { rtt, ttl }
}

/// In-memory platform: every probe answers every packet with rtt 10.0, ttl 54.
#[derive(Default)]
pub struct FakePlatform {
    pub created: Mutex<Vec<JobRequest>>,
    pub results: Mutex<HashMap<MeasurementId, Vec<RawResult>>>,
    pub fetched: Mutex<Vec<MeasurementId>>,
    pub status_calls: Mutex<HashMap<MeasurementId, usize>>,
    /// Zero-based creation call that is rejected.
    pub reject_create_at: Option<usize>,
    pub fail_fetch: HashSet<MeasurementId>,
    pub probes: Vec<ProbeId>,
    /// Number of status polls a job reports `Running` before `Complete`.
    pub running_polls: usize,
}

impl FakePlatform {
    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

impl MeasurementPlatform for FakePlatform {
    fn create_job(&self, req: &JobRequest) -> Result<MeasurementId> {
        let mut created = self.created.lock().unwrap();
        if self.reject_create_at == Some(created.len()) {
            return Err(anyhow!("400 Bad Request: not enough credits"));
        }
        created.push(req.clone());
        let id = 5000 + created.len() as MeasurementId;
        let results = req
            .probes
            .iter()
            .map(|p| RawResult {
                prb_id: Some(*p),
                result: Some(
                    (0..req.packets)
                        .map(|_| attempt(Some(10.0), Some(54)))
                        .collect(),
                ),
            })
            .collect();
        self.results.lock().unwrap().insert(id, results);
        Ok(id)
    }

    fn fetch_results(&self, id: MeasurementId) -> Result<Vec<RawResult>> {
        self.fetched.lock().unwrap().push(id);
        if self.fail_fetch.contains(&id) {
            return Err(anyhow!("503 Service Unavailable"));
        }
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn list_active_probe_ids(&self) -> Result<Vec<ProbeId>> {
        Ok(self.probes.clone())
    }

    fn job_status(&self, id: MeasurementId) -> Result<JobStatus> {
        let mut calls = self.status_calls.lock().unwrap();
        let n = calls.entry(id).or_insert(0);
        *n += 1;
        if *n <= self.running_polls {
            Ok(JobStatus::Running)
        } else {
            Ok(JobStatus::Complete)
        }
    }
}

/// Directory that counts lookups and fails for chosen ids.
#[derive(Default)]
pub struct FakeDirectory {
    pub calls: Mutex<HashMap<ProbeId, usize>>,
    pub failing: HashSet<ProbeId>,
}

impl FakeDirectory {
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn calls_for(&self, id: ProbeId) -> usize {
        self.calls.lock().unwrap().get(&id).copied().unwrap_or(0)
    }
}

impl ProbeDirectory for FakeDirectory {
    fn lookup(&self, id: ProbeId) -> Result<ProbeDetail> {
        *self.calls.lock().unwrap().entry(id).or_insert(0) += 1;
        if self.failing.contains(&id) {
            return Err(anyhow!("404 Not Found"));
        }
        let detail = serde_json::json!({
            "country_code": "NL",
            "city": format!("City{id}"),
            "geometry": {"type": "Point", "coordinates": [4.5, 52.0]},
            "address_v4": format!("192.0.2.{}", id % 250),
            "address_v6": null,
            "asn_v4": 3333
        });
        Ok(serde_json::from_value(detail)?)
    }
}
