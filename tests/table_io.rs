use atlas_campaign::{
    table::{read_records, read_table, write_records, write_table, write_to_sink, Table, TableSink},
    types::NormalizedRecord,
};
use flate2::read::GzDecoder;
use std::io::Read;
use tempfile::TempDir;

fn records() -> Vec<NormalizedRecord> {
    vec![
        NormalizedRecord {
            probe_id: Some(1001),
            rtt: 10.5,
            hop_count: 10,
        },
        NormalizedRecord {
            probe_id: Some(1002),
            rtt: 25.3,
            hop_count: 8,
        },
        NormalizedRecord {
            probe_id: None,
            rtt: 5.5,
            hop_count: 0,
        },
    ]
}

#[test]
fn campaign_output_is_gzipped_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.csv.gz");
    write_records(&path, &records()).unwrap();

    let mut text = String::new();
    GzDecoder::new(std::fs::File::open(&path).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "probe_id,rtt,hop_count");
    assert_eq!(lines[1], "1001,10.5,10");
    assert_eq!(lines[3], ",5.5,0");

    assert_eq!(read_records(&path).unwrap(), records());
}

#[test]
fn header_written_even_without_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");
    write_records(&path, &[]).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "probe_id,rtt,hop_count");
}

#[test]
fn generic_table_survives_new_file_and_in_place_sinks() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.csv.gz");
    let mut t = Table::new(vec!["probe_id".into(), "note".into()]);
    t.rows.push(vec!["1".into(), "has, comma".into()]);
    t.rows.push(vec!["2".into(), "".into()]);
    write_table(&input, &t).unwrap();
    assert_eq!(read_table(&input).unwrap(), t);

    let copy = dir.path().join("in_enriched.csv.gz");
    let written = write_to_sink(&input, &TableSink::NewFile(copy.clone()), &t).unwrap();
    assert_eq!(written, copy);
    assert_eq!(read_table(&copy).unwrap(), t);

    let mut changed = t.clone();
    changed.headers.push("country".into());
    for row in &mut changed.rows {
        row.push("NL".into());
    }
    let written = write_to_sink(&input, &TableSink::InPlace, &changed).unwrap();
    assert_eq!(written, input);
    assert_eq!(read_table(&input).unwrap(), changed);
}
