use atlas_campaign::{
    normalize::{hop_count, initial_ttl, normalize},
    types::{NormalizedRecord, RawResult},
};

fn sample() -> Vec<RawResult> {
    serde_json::from_str(
        r#"[
            {"prb_id": 1001, "msm_id": 1, "result": [
                {"rtt": 10.5, "ttl": 54, "size": 64},
                {"rtt": 11.2, "ttl": 54, "size": 64},
                {"rtt": 10.8, "ttl": 54, "size": 64}
            ]},
            {"prb_id": 1002, "result": [
                {"rtt": 25.3, "ttl": 120},
                {"rtt": 26.1, "ttl": 120}
            ]},
            {"prb_id": 1003, "result": [
                {"rtt": 5.5, "ttl": 63},
                {"ttl": 63},
                {"x": "*"}
            ]},
            {"prb_id": 1004, "error": "timeout"}
        ]"#,
    )
    .unwrap()
}

#[test]
fn one_record_per_successful_attempt() {
    let records = normalize(&sample());
    assert_eq!(records.len(), 6);

    assert_eq!(
        records[0],
        NormalizedRecord {
            probe_id: Some(1001),
            rtt: 10.5,
            hop_count: 10
        }
    );
    assert!(records[..3].iter().all(|r| r.probe_id == Some(1001) && r.hop_count == 10));

    let p1002: Vec<_> = records.iter().filter(|r| r.probe_id == Some(1002)).collect();
    assert_eq!(p1002.len(), 2);
    assert_eq!(p1002[0].hop_count, 8);

    let p1003: Vec<_> = records.iter().filter(|r| r.probe_id == Some(1003)).collect();
    assert_eq!(p1003.len(), 1);
    assert_eq!(p1003[0].hop_count, 1);
}

#[test]
fn attempt_order_is_preserved() {
    let rtts: Vec<f64> = normalize(&sample()).iter().map(|r| r.rtt).collect();
    assert_eq!(rtts, vec![10.5, 11.2, 10.8, 25.3, 26.1, 5.5]);
}

#[test]
fn record_without_result_field_yields_nothing() {
    let raw: Vec<RawResult> = serde_json::from_str(r#"[{"prb_id": 7}]"#).unwrap();
    assert!(normalize(&raw).is_empty());
}

#[test]
fn missing_ttl_defaults_to_zero_hops() {
    let raw: Vec<RawResult> =
        serde_json::from_str(r#"[{"prb_id": 7, "result": [{"rtt": 3.0}]}]"#).unwrap();
    let records = normalize(&raw);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].hop_count, 0);
}

#[test]
fn missing_probe_id_passes_through() {
    let raw: Vec<RawResult> =
        serde_json::from_str(r#"[{"result": [{"rtt": 3.0, "ttl": 60}]}]"#).unwrap();
    let records = normalize(&raw);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].probe_id, None);
    assert_eq!(records[0].hop_count, 4);
}

#[test]
fn ttl_buckets() {
    assert_eq!(initial_ttl(1), 64);
    assert_eq!(initial_ttl(64), 64);
    assert_eq!(initial_ttl(65), 128);
    assert_eq!(initial_ttl(128), 128);
    assert_eq!(initial_ttl(129), 255);
    assert_eq!(hop_count(Some(64)), 0);
    assert_eq!(hop_count(Some(120)), 8);
    assert_eq!(hop_count(Some(250)), 5);
    assert_eq!(hop_count(None), 0);
    assert_eq!(hop_count(Some(54)), hop_count(Some(54)));
}
