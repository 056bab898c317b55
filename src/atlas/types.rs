use crate::types::{MeasurementId, ProbeId, ProbeMetadata};
use serde::{Deserialize, Serialize};

/// Everything needed to create one one-off ping measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub target: String,
    pub packets: u32,
    pub address_family: u8,
    pub probes: Vec<ProbeId>,
    pub description: String,
}

impl JobRequest {
    /// Request body for `POST /measurements/`.
    pub fn to_create_body(&self) -> serde_json::Value {
        let value = self
            .probes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        serde_json::json!({
            "definitions": [{
                "type": "ping",
                "af": self.address_family,
                "target": self.target,
                "description": self.description,
                "packets": self.packets,
            }],
            "probes": [{
                "type": "probes",
                "value": value,
                "requested": self.probes.len(),
            }],
            "is_oneoff": true,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateResponse {
    #[serde(default)]
    pub measurements: Vec<MeasurementId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbePage {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<ProbeRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeRef {
    pub id: ProbeId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementInfo {
    pub status: MeasurementStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementStatus {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Lifecycle of one submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Running,
    Complete,
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed(_))
    }
}

impl From<&MeasurementStatus> for JobStatus {
    fn from(s: &MeasurementStatus) -> Self {
        match s.id {
            0 | 1 => JobStatus::Submitted,
            2 => JobStatus::Running,
            4 => JobStatus::Complete,
            other => JobStatus::Failed(
                s.name
                    .clone()
                    .unwrap_or_else(|| format!("status {other}")),
            ),
        }
    }
}

/// The fields of `GET /probes/{id}/` that enrichment uses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProbeDetail {
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub address_v4: Option<String>,
    #[serde(default)]
    pub address_v6: Option<String>,
    #[serde(default)]
    pub asn_v4: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Geometry {
    // GeoJSON order: [lon, lat]
    #[serde(default)]
    pub coordinates: Option<Vec<Option<f64>>>,
}

impl From<ProbeDetail> for ProbeMetadata {
    fn from(d: ProbeDetail) -> Self {
        let coords = d
            .geometry
            .and_then(|g| g.coordinates)
            .unwrap_or_default();
        let at = |i: usize| coords.get(i).copied().flatten();
        ProbeMetadata {
            country: d.country_code,
            city: d.city,
            lat: at(1),
            lon: at(0),
            ipv4: d.address_v4,
            ipv6: d.address_v6,
            asn: d.asn_v4,
        }
    }
}
