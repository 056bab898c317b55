use serde::{Deserialize, Serialize};

/// Identifier of a RIPE Atlas probe (vantage point).
pub type ProbeId = u64;

/// Identifier RIPE Atlas assigns to a created measurement.
pub type MeasurementId = u64;

/// A submitted measurement, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub measurement_id: MeasurementId,
    pub target: String,
    /// 1-based batch index within the target's probe set.
    pub batch_index: usize,
    pub probe_count: usize,
}

/// One raw result record as returned by the results endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub prb_id: Option<ProbeId>,
    #[serde(default)]
    pub result: Option<Vec<PingAttempt>>,
}

/// A single echo request/reply within a ping result.
///
/// Failed packets come back as `{"x": "*"}` or `{"error": ...}`, which decode
/// to an attempt without `rtt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PingAttempt {
    #[serde(default)]
    pub rtt: Option<f64>,
    #[serde(default)]
    pub ttl: Option<i64>,
}

/// One successful ping attempt, flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub probe_id: Option<ProbeId>,
    pub rtt: f64,
    pub hop_count: i64,
}

/// Static per-probe reference data attached during enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeMetadata {
    pub country: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub asn: Option<u64>,
}

impl ProbeMetadata {
    /// The one definition of "unknown": every field absent.
    pub const UNKNOWN: ProbeMetadata = ProbeMetadata {
        country: None,
        city: None,
        lat: None,
        lon: None,
        ipv4: None,
        ipv6: None,
        asn: None,
    };

    pub const COLUMNS: [&'static str; 7] = ["country", "city", "lat", "lon", "ipv4", "ipv6", "asn"];

    /// Cell values in `COLUMNS` order; absent fields become empty cells.
    pub fn cells(&self) -> [String; 7] {
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(ToString::to_string).unwrap_or_default()
        }
        [
            opt(&self.country),
            opt(&self.city),
            opt(&self.lat),
            opt(&self.lon),
            opt(&self.ipv4),
            opt(&self.ipv6),
            opt(&self.asn),
        ]
    }
}
