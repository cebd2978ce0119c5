//! Unit tests for chunked uploads

use super::*;
use crate::storage::{tables::VENUES, ImportDatabase};
use serde_json::{json, Value};

fn venue(id: i64, name: &str) -> Record {
    match json!({ "id": id, "name": name }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_clean_upload_writes_every_batch() {
    let mut db = ImportDatabase::new_in_memory().unwrap();
    let records: Vec<Record> = (1..=7).map(|i| venue(i, "Arena")).collect();

    let report = upload_in_batches(&mut db, VENUES, &records, UploadMode::Insert, 3).await;

    assert_eq!(report.attempted, 7);
    assert_eq!(report.inserted, 7);
    assert_eq!(report.batches, 3);
    assert_eq!(report.retried_batches, 0);
    assert!(report.failed.is_empty());
    assert_eq!(db.count(VENUES, &[]).await.unwrap(), 7);
}

#[tokio::test]
async fn test_failing_batch_is_retried_per_row() {
    let mut db = ImportDatabase::new_in_memory().unwrap();
    db.insert(VENUES, &[venue(2, "Already There")]).await.unwrap();

    let records = vec![
        venue(1, "A"),
        venue(2, "Conflicts"),
        venue(3, "C"),
        venue(4, "D"),
    ];
    let report = upload_in_batches(&mut db, VENUES, &records, UploadMode::Insert, 2).await;

    assert_eq!(report.inserted, 3);
    assert_eq!(report.retried_batches, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].record["name"], json!("Conflicts"));
    assert_eq!(db.count(VENUES, &[]).await.unwrap(), 4);
}

#[tokio::test]
async fn test_upsert_mode_overwrites() {
    let mut db = ImportDatabase::new_in_memory().unwrap();
    db.insert(VENUES, &[venue(2, "Old Name")]).await.unwrap();

    let report = upload_in_batches(
        &mut db,
        VENUES,
        &[venue(2, "New Name")],
        UploadMode::Upsert { on_conflict: &["id"] },
        100,
    )
    .await;

    assert!(report.failed.is_empty());
    let rows = db.select(VENUES, &["name"], &[]).await.unwrap();
    assert_eq!(rows[0]["name"], json!("New Name"));
}

#[test]
fn test_top_errors_sorted_by_count() {
    let failed = |error: &str| FailedRecord {
        record: Record::new(),
        error: error.to_string(),
    };
    let report = UploadReport {
        failed: vec![
            failed("duplicate key"),
            failed("null value in column"),
            failed("duplicate key"),
            failed("duplicate key"),
            failed("null value in column"),
            failed("bad date"),
        ],
        ..Default::default()
    };

    let top = report.top_errors(2);
    assert_eq!(
        top,
        vec![
            ("duplicate key".to_string(), 3),
            ("null value in column".to_string(), 2)
        ]
    );
}

#[test]
fn test_merge_accumulates() {
    let mut total = UploadReport::default();
    total.merge(UploadReport {
        attempted: 10,
        inserted: 9,
        batches: 1,
        retried_batches: 1,
        failed: vec![FailedRecord {
            record: Record::new(),
            error: "x".into(),
        }],
    });
    total.merge(UploadReport {
        attempted: 5,
        inserted: 5,
        batches: 1,
        ..Default::default()
    });

    assert_eq!(total.attempted, 15);
    assert_eq!(total.inserted, 14);
    assert_eq!(total.batches, 2);
    assert_eq!(total.failed.len(), 1);
}

#[test]
fn test_failure_log_written_only_when_needed() {
    let dir = tempfile::tempdir().unwrap();

    assert!(write_failure_log(dir.path(), "games", &[]).unwrap().is_none());

    let failed = vec![FailedRecord {
        record: venue(9, "Broken"),
        error: "boom".into(),
    }];
    let path = write_failure_log(dir.path(), "games", &failed).unwrap().unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("import_failures_games_"));
    assert!(name.ends_with(".json"));

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written[0]["error"], json!("boom"));
    assert_eq!(written[0]["record"]["id"], json!(9));
}
