use crate::types::{NormalizedRecord, RawResult};

/// Initial TTL most likely used by the sender, from the common OS defaults.
pub fn initial_ttl(ttl: i64) -> i64 {
    if ttl <= 64 {
        64
    } else if ttl <= 128 {
        128
    } else {
        255
    }
}

/// Hops between target and probe inferred from the received TTL.
///
/// A missing TTL maps to 0, which is indistinguishable from a genuine
/// zero-hop reply.
pub fn hop_count(ttl: Option<i64>) -> i64 {
    match ttl {
        Some(ttl) => initial_ttl(ttl) - ttl,
        None => 0,
    }
}

/// Flattens raw ping results into one record per successful attempt.
pub fn normalize(results: &[RawResult]) -> Vec<NormalizedRecord> {
    let mut out = Vec::new();
    for result in results {
        extend_normalized(&mut out, result);
    }
    out
}

pub fn extend_normalized(out: &mut Vec<NormalizedRecord>, result: &RawResult) {
    let probe_id = result.prb_id;
    let Some(attempts) = result.result.as_deref() else {
        return;
    };
    for attempt in attempts {
        let Some(rtt) = attempt.rtt else {
            continue;
        };
        out.push(NormalizedRecord {
            probe_id,
            rtt,
            hop_count: hop_count(attempt.ttl),
        });
    }
}
