//! Integration tests for the CSV record source.

use roas_data::{CsvRecordSource, DataError, RecordSource, records_to_frame};
use std::io::Write;

const HEADER: &str = "date,campaign_id,campaign_name,channel,impressions,clicks,cost,conversions,revenue";

fn write_csv(dir: &tempfile::TempDir, rows: &[&str]) -> std::path::PathBuf {
    let path = dir.path().join("campaigns.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    path
}

#[test]
fn test_reads_and_filters_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        &[
            "2024-01-01,1,Brand,google_ads,1000,40,80.5,2,320",
            "2024-03-01,1,Brand,google_ads,1200,45,90,3,400",
            "2024-03-02,2,Prospecting,meta_ads,5000,60,0,0,0",
            "2024-03-02,2,Prospecting,meta_ads,5000,60,120,,360",
        ],
    );

    let source = CsvRecordSource::new(&path);
    assert_eq!(source.read_all().unwrap().len(), 4);

    // 2024-01-01 falls outside a 30 day window anchored on 2024-03-02 and the
    // zero-spend row is dropped.
    let records = source.fetch(30).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.cost > 0.0));
    assert_eq!(records[1].conversions, 0.0);
    assert_eq!(records[1].roas(), Some(3.0));

    let df = records_to_frame(&records).unwrap();
    assert_eq!(df.height(), 2);
}

#[test]
fn test_missing_file() {
    let source = CsvRecordSource::new("/definitely/not/here.csv");
    let err = source.fetch(90).unwrap_err();
    assert!(matches!(err, DataError::MissingData { .. }));
}

#[test]
fn test_malformed_row_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, &["not-a-date,1,Brand,google_ads,1,1,1,1,1"]);
    let err = CsvRecordSource::new(path).fetch(90).unwrap_err();
    assert!(matches!(err, DataError::Csv(_)));
}
