use crate::error::Error;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Hard per-measurement probe limit enforced by RIPE Atlas.
pub const MAX_PROBES_PER_MEASUREMENT: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub atlas: Atlas,
    #[serde(default)]
    pub campaign: Campaign,
    #[serde(default)]
    pub wait: Wait,
    #[serde(default)]
    pub concurrency: Concurrency,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub enrich: Enrich,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> std::result::Result<(), Error> {
        if self.campaign.packets == 0 {
            return Err(Error::InvalidArgument("campaign.packets must be > 0".into()));
        }
        let cap = self.campaign.max_probes_per_measurement;
        if cap == 0 || cap > MAX_PROBES_PER_MEASUREMENT {
            return Err(Error::InvalidArgument(format!(
                "campaign.max_probes_per_measurement must be in 1..={MAX_PROBES_PER_MEASUREMENT}, got {cap}"
            )));
        }
        let c = &self.concurrency;
        if c.submit_workers == 0 || c.fetch_workers == 0 || c.lookup_workers == 0 {
            return Err(Error::InvalidArgument(
                "concurrency worker counts must be >= 1".into(),
            ));
        }
        let factor = self.wait.poll_backoff_factor;
        if !factor.is_finite() || factor < 1.0 {
            return Err(Error::InvalidArgument(format!(
                "wait.poll_backoff_factor must be a finite number >= 1.0, got {}",
                self.wait.poll_backoff_factor
            )));
        }
        Ok(())
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Atlas {
    pub base_url: String,
    pub api_key_env: String,
    pub request_timeout_seconds: u64,
    pub probe_page_size: u32,
}
impl Default for Atlas {
    fn default() -> Self {
        Self {
            base_url: "https://atlas.ripe.net/api/v2".into(),
            api_key_env: "RIPE_ATLAS_API_KEY".into(),
            request_timeout_seconds: 10,
            probe_page_size: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    pub packets: u32,
    pub address_family: u8,
    pub max_probes_per_measurement: usize,
    pub submit_delay_ms: u64,
    pub description_prefix: String,
}
impl Default for Campaign {
    fn default() -> Self {
        Self {
            packets: 3,
            address_family: 4,
            max_probes_per_measurement: MAX_PROBES_PER_MEASUREMENT,
            submit_delay_ms: 1000,
            description_prefix: "Ping to".into(),
        }
    }
}
impl Campaign {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategy {
    /// One blocking sleep after all submissions.
    Fixed,
    /// Per-job status polling with exponential backoff.
    Poll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Wait {
    pub strategy: WaitStrategy,
    pub wait_seconds: u64,
    pub poll_initial_seconds: u64,
    pub poll_max_seconds: u64,
    pub poll_backoff_factor: f64,
}
impl Default for Wait {
    fn default() -> Self {
        Self {
            strategy: WaitStrategy::Poll,
            wait_seconds: 300,
            poll_initial_seconds: 5,
            poll_max_seconds: 60,
            poll_backoff_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Concurrency {
    pub submit_workers: usize,
    pub fetch_workers: usize,
    pub lookup_workers: usize,
}
impl Default for Concurrency {
    fn default() -> Self {
        Self {
            submit_workers: 1,
            fetch_workers: 4,
            lookup_workers: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub out_dir: String,
    pub file_prefix: String,
    pub write_manifest: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            out_dir: "output".into(),
            file_prefix: "ping_results".into(),
            write_manifest: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Enrich {
    pub id_column: String,
    pub output_suffix: String,
}
impl Default for Enrich {
    fn default() -> Self {
        Self {
            id_column: "probe_id".into(),
            output_suffix: "_enriched".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Debug {
    pub dump_effective_config: bool,
}
