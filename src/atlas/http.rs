use super::{types::*, MeasurementPlatform, ProbeDirectory};
use crate::config::Config;
use crate::types::{MeasurementId, ProbeId, RawResult};
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// RIPE Atlas v2 REST client.
pub struct AtlasClient {
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
    http: Client,
}

impl AtlasClient {
    /// Builds a client; the API key is read from `atlas.api_key_env` and is only
    /// needed for creating measurements.
    pub fn new(cfg: &Config) -> Result<Self> {
        let api_key = std::env::var(&cfg.atlas.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::with_key(cfg, api_key)
    }

    pub fn with_key(cfg: &Config, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.atlas.request_timeout_seconds))
            .user_agent(concat!("atlas-campaign/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "building HTTP client")?;
        Ok(Self {
            base_url: cfg.atlas.base_url.trim_end_matches('/').to_string(),
            api_key,
            page_size: cfg.atlas.probe_page_size.max(1),
            http,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_json<O: for<'de> serde::Deserialize<'de>>(&self, url: &str) -> Result<O> {
        debug!("atlas GET {url}");
        let resp = self
            .http
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?;
        let resp = check_status(resp, url)?;
        resp.json::<O>()
            .with_context(|| format!("decoding JSON from {url}"))
    }
}

fn check_status(resp: Response, url: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(anyhow!("{url} returned {status}: {}", body.trim()))
}

/// Decodes result records one by one; a record that does not decode is
/// dropped with a warning and the rest are kept.
pub fn decode_results(id: MeasurementId, values: Vec<serde_json::Value>) -> Vec<RawResult> {
    let total = values.len();
    let results: Vec<RawResult> = values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<RawResult>(v) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("measurement {id}: dropping undecodable result: {e}");
                None
            }
        })
        .collect();
    if results.len() < total {
        warn!(
            "measurement {id}: decoded {} of {} result records",
            results.len(),
            total
        );
    }
    results
}

impl MeasurementPlatform for AtlasClient {
    fn create_job(&self, req: &JobRequest) -> Result<MeasurementId> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("no RIPE Atlas API key configured"))?;
        let url = self.url("measurements/");
        debug!(
            target_host = %req.target,
            probes = req.probes.len(),
            "atlas POST {url}"
        );
        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Key {key}"))
            .json(&req.to_create_body())
            .send()
            .with_context(|| format!("POST {url}"))?;
        let created: CreateResponse = check_status(resp, &url)?
            .json()
            .with_context(|| "decoding measurement creation response")?;
        created
            .measurements
            .first()
            .copied()
            .ok_or_else(|| anyhow!("measurement creation response carried no id"))
    }

    fn fetch_results(&self, id: MeasurementId) -> Result<Vec<RawResult>> {
        let url = self.url(&format!("measurements/{id}/results/?format=json"));
        let values: Vec<serde_json::Value> = self.get_json(&url)?;
        Ok(decode_results(id, values))
    }

    fn list_active_probe_ids(&self) -> Result<Vec<ProbeId>> {
        let mut ids = Vec::new();
        let mut next = Some(self.url(&format!(
            "probes/?status=1&fields=id&page_size={}",
            self.page_size
        )));
        while let Some(url) = next {
            let page: ProbePage = self.get_json(&url)?;
            ids.extend(page.results.iter().map(|p| p.id));
            next = page.next;
        }
        Ok(ids)
    }

    fn job_status(&self, id: MeasurementId) -> Result<JobStatus> {
        let url = self.url(&format!("measurements/{id}/?fields=status"));
        let info: MeasurementInfo = self.get_json(&url)?;
        Ok(JobStatus::from(&info.status))
    }
}

impl ProbeDirectory for AtlasClient {
    fn lookup(&self, id: ProbeId) -> Result<ProbeDetail> {
        let url = self.url(&format!("probes/{id}/"));
        self.get_json(&url)
    }
}
