//! Integration tests for the SQLite record store

use std::time::Duration;

use brand_insights_rust::config::AppConfig;
use brand_insights_rust::repository::{read_records_csv, RecordStore, SqliteRecordStore};
use brand_insights_rust::{BusinessRecord, Database, InsightsError};
use tempfile::tempdir;

fn record(id: &str, name: &str, rating: Option<f64>) -> BusinessRecord {
    BusinessRecord {
        business_id: id.to_string(),
        name: name.to_string(),
        address: format!("{id} Main St"),
        postal_code: "10001".to_string(),
        business_ratings: rating,
        csat: None,
        nps: None,
        strengths: Some("friendly staff".to_string()),
        areas_for_improvement: None,
    }
}

#[test]
fn test_open_missing_store_is_unavailable() {
    let dir = tempdir().expect("Failed to create temp directory");
    let config = AppConfig::default();

    let result = Database::open(&dir.path().join("missing.db"), &config.database);
    assert!(matches!(result, Err(InsightsError::StoreUnavailable(_))));
    // Opening for reading never creates the file
    assert!(!dir.path().join("missing.db").exists());
}

#[test]
fn test_create_then_open_read_only() {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("nested").join("brand_analysis.db");
    let config = AppConfig::default();

    let writable = Database::create(&db_path, &config.database).expect("Failed to create store");
    writable
        .insert_records(&[
            record("b1", "Acme", Some(4.0)),
            record("b2", "Acme", Some(2.0)),
            record("b3", "Globex", None),
        ])
        .expect("Failed to insert records");
    drop(writable);

    let db = Database::open(&db_path, &config.database).expect("Failed to open store");
    assert_eq!(db.table(), "brand_insights");

    let mut names = db.list_distinct_names().expect("names");
    names.sort();
    assert_eq!(names, vec!["Acme", "Globex"]);

    let acme = db.fetch_records("Acme").expect("records");
    assert_eq!(acme.len(), 2);
    assert!(acme.iter().all(|r| r.name == "Acme"));

    let globex = db.fetch_records("Globex").expect("records");
    assert_eq!(globex[0].business_ratings, None);
}

#[test]
fn test_unknown_name_yields_empty_vec() {
    let dir = tempdir().expect("Failed to create temp directory");
    let config = AppConfig::default();
    let db = Database::create(&dir.path().join("test.db"), &config.database).expect("store");
    db.insert_record(&record("b1", "Acme", Some(5.0))).expect("insert");

    assert!(db.fetch_records("Nobody").expect("query").is_empty());
}

#[test]
fn test_duplicate_business_id_rejected() {
    let dir = tempdir().expect("Failed to create temp directory");
    let config = AppConfig::default();
    let db = Database::create(&dir.path().join("test.db"), &config.database).expect("store");

    db.insert_record(&record("b1", "Acme", Some(5.0))).expect("insert");
    let dup = db.insert_record(&record("b1", "Acme", Some(1.0)));
    assert!(matches!(dup, Err(InsightsError::StoreUnavailable(_))));
}

#[test]
fn test_failed_batch_is_rolled_back() {
    let dir = tempdir().expect("Failed to create temp directory");
    let config = AppConfig::default();
    let db = Database::create(&dir.path().join("test.db"), &config.database).expect("store");

    let batch = [record("b1", "Acme", Some(5.0)), record("b1", "Acme", Some(1.0))];
    assert!(db.insert_records(&batch).is_err());
    assert!(db.fetch_records("Acme").expect("query").is_empty());
}

#[test]
fn test_invalid_table_name_rejected() {
    let dir = tempdir().expect("Failed to create temp directory");
    let mut config = AppConfig::default();
    config.database.table = "records; DROP TABLE x".to_string();

    let result = Database::create(&dir.path().join("test.db"), &config.database);
    assert!(matches!(result, Err(InsightsError::InvalidConfig(_))));
}

#[test]
fn test_non_numeric_rating_reads_as_missing() {
    let dir = tempdir().expect("Failed to create temp directory");
    let config = AppConfig::default();
    let db = Database::create(&dir.path().join("test.db"), &config.database).expect("store");

    let conn = db.get_connection().expect("connection");
    conn.execute(
        "INSERT INTO brand_insights (business_id, name, business_ratings, csat) VALUES ('b1', 'Acme', 'n/a', '85')",
        [],
    )
    .expect("raw insert");

    let records = db.fetch_records("Acme").expect("records");
    assert_eq!(records[0].business_ratings, None);
    assert_eq!(records[0].csat, Some(85.0));
}

#[tokio::test]
async fn test_record_store_reads_through_pool() {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let config = AppConfig::default();

    Database::create(&db_path, &config.database)
        .expect("store")
        .insert_records(&[record("b1", "Acme", Some(3.5))])
        .expect("insert");

    let store = SqliteRecordStore::new(
        Database::open(&db_path, &config.database).expect("open"),
        Duration::from_secs(5),
    );
    assert_eq!(store.list_distinct_names().await.expect("names"), vec!["Acme"]);

    let records = store.fetch_records("Acme").await.expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].business_ratings, Some(3.5));
}

#[tokio::test]
async fn test_query_past_deadline_is_store_unavailable() {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let config = AppConfig::default();

    Database::create(&db_path, &config.database)
        .expect("store")
        .insert_records(&[record("b1", "Acme", Some(3.5))])
        .expect("insert");

    // An exclusive lock keeps readers waiting on the busy handler
    let writer = rusqlite::Connection::open(&db_path).expect("writer connection");
    writer.execute_batch("BEGIN EXCLUSIVE;").expect("lock store");

    let store = SqliteRecordStore::new(
        Database::open(&db_path, &config.database).expect("open"),
        Duration::from_millis(200),
    );
    let started = std::time::Instant::now();
    let result = store.fetch_records("Acme").await;

    assert!(
        matches!(&result, Err(InsightsError::StoreUnavailable(msg)) if msg.contains("timed out")),
        "{result:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(3));

    writer.execute_batch("ROLLBACK;").expect("unlock store");
}

#[test]
fn test_read_records_csv() {
    let dir = tempdir().expect("Failed to create temp directory");
    let csv_path = dir.path().join("records.csv");
    std::fs::write(
        &csv_path,
        "business_id,name,address,postal_code,business_ratings,csat,nps,strengths,areas_for_improvement\n\
         b1,Acme,1 Main St,10001,4.5,90,,friendly staff,parking\n\
         b2,Acme,2 Main St,10002,not rated,,,,\n",
    )
    .expect("write csv");

    let records = read_records_csv(&csv_path).expect("csv");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].business_ratings, Some(4.5));
    assert_eq!(records[0].nps, None);
    assert_eq!(records[1].business_ratings, None);
}
