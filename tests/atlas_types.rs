use atlas_campaign::{
    atlas::{http::decode_results, types::MeasurementStatus, JobRequest, JobStatus, ProbeDetail},
    types::ProbeMetadata,
};

#[test]
fn create_body_lists_probes() {
    let req = JobRequest {
        target: "8.8.8.8".into(),
        packets: 3,
        address_family: 4,
        probes: vec![10, 20, 30],
        description: "Ping to 8.8.8.8 (batch 2)".into(),
    };
    let body = req.to_create_body();
    assert_eq!(body["probes"][0]["value"], "10,20,30");
    assert_eq!(body["probes"][0]["requested"], 3);
    assert_eq!(body["definitions"][0]["type"], "ping");
    assert_eq!(body["definitions"][0]["packets"], 3);
    assert_eq!(body["is_oneoff"], true);
}

#[test]
fn probe_detail_maps_coordinates() {
    let raw = r#"{
        "id": 1001,
        "country_code": "NL",
        "city": "Amsterdam",
        "geometry": {"type": "Point", "coordinates": [4.89, 52.37]},
        "address_v4": "192.0.2.1",
        "address_v6": null,
        "asn_v4": 3333
    }"#;
    let detail: ProbeDetail = serde_json::from_str(raw).unwrap();
    let meta = ProbeMetadata::from(detail);
    assert_eq!(meta.country.as_deref(), Some("NL"));
    assert_eq!(meta.lat, Some(52.37));
    assert_eq!(meta.lon, Some(4.89));
    assert_eq!(meta.ipv6, None);
    assert_eq!(meta.asn, Some(3333));
}

#[test]
fn probe_detail_without_geometry() {
    let detail: ProbeDetail = serde_json::from_str(r#"{"geometry": null}"#).unwrap();
    assert_eq!(ProbeMetadata::from(detail), ProbeMetadata::UNKNOWN);
}

#[test]
fn status_mapping() {
    let st = |id| JobStatus::from(&MeasurementStatus { id, name: None });
    assert_eq!(st(1), JobStatus::Submitted);
    assert_eq!(st(2), JobStatus::Running);
    assert_eq!(st(4), JobStatus::Complete);
    assert!(matches!(st(7), JobStatus::Failed(_)));
}

#[test]
fn undecodable_records_are_dropped_individually() {
    let values = vec![
        serde_json::json!({"prb_id": 11, "result": [{"rtt": 12.5, "ttl": 55}, {"x": "*"}]}),
        serde_json::json!({"prb_id": "not-a-number", "result": [{"rtt": 1.0, "ttl": 60}]}),
        serde_json::json!({"prb_id": 12, "result": "timeout"}),
        serde_json::json!({"prb_id": 13}),
    ];
    let results = decode_results(5001, values);

    let ids: Vec<Option<u64>> = results.iter().map(|r| r.prb_id).collect();
    assert_eq!(ids, vec![Some(11), Some(13)]);
    let first = results[0].result.as_ref().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].rtt, Some(12.5));
    assert_eq!(first[1].rtt, None);
    assert!(results[1].result.is_none());
}
