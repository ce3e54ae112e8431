use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{InsightsError, Result};
use crate::metrics::MetricsCollector;
use crate::models::BusinessRecord;

/// Read access to business records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Distinct account names, in store order
    async fn list_distinct_names(&self) -> Result<Vec<String>>;
    /// All records of one account, in store order
    async fn fetch_records(&self, name: &str) -> Result<Vec<BusinessRecord>>;
}

/// [`RecordStore`] over the SQLite [`Database`], with a deadline on every query
pub struct SqliteRecordStore {
    database: Arc<Database>,
    query_timeout: Duration,
    metrics: MetricsCollector,
}

impl SqliteRecordStore {
    #[must_use]
    pub fn new(database: Database, query_timeout: Duration) -> Self {
        Self {
            database: Arc::new(database),
            query_timeout,
            metrics: MetricsCollector::default(),
        }
    }

    /// Run a blocking query on the blocking pool, bounded by the query timeout
    async fn bounded<T, F>(&self, operation: &'static str, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let database = Arc::clone(&self.database);
        let started = Instant::now();

        let outcome = match tokio::time::timeout(
            self.query_timeout,
            tokio::task::spawn_blocking(move || query(&database)),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(InsightsError::StoreUnavailable(format!(
                "{operation} aborted: {join_error}"
            ))),
            Err(_) => {
                warn!(operation, timeout_secs = self.query_timeout.as_secs_f64(), "Store query timed out");
                Err(InsightsError::StoreUnavailable(format!(
                    "{operation} timed out after {:?}",
                    self.query_timeout
                )))
            }
        };

        self.metrics
            .record_store_query(operation, started.elapsed(), outcome.is_ok());
        outcome
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn list_distinct_names(&self) -> Result<Vec<String>> {
        self.bounded("list_distinct_names", Database::list_distinct_names)
            .await
    }

    async fn fetch_records(&self, name: &str) -> Result<Vec<BusinessRecord>> {
        let name = name.to_string();
        self.bounded("fetch_records", move |db| db.fetch_records(&name))
            .await
    }
}

/// Load records from a CSV file with a header row naming the record columns
pub fn read_records_csv(path: &Path) -> Result<Vec<BusinessRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let records = reader
        .deserialize::<BusinessRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    info!(path = %path.display(), count = records.len(), "Read records from CSV");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[tokio::test]
    async fn test_sqlite_store_round_trip_through_timeout_wrapper() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("records.db");
        let config = AppConfig::default().database;

        let db = Database::create(&path, &config).expect("Failed to create database");
        let records = read_records_csv_from_str(
            "business_id,name,address,postal_code,business_ratings,csat,nps,strengths,areas_for_improvement\n\
             b1,Acme,1 Main St,10001,4.5,88,40,friendly staff,parking\n\
             b2,Acme,2 Main St,10002,,75,,,\n\
             b3,Globex,9 Elm St,20001,3,,,,\n",
        );
        db.insert_records(&records).expect("Failed to insert records");

        let store = SqliteRecordStore::new(db, Duration::from_secs(5));
        let names = store.list_distinct_names().await.expect("names");
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Acme".to_string()));

        let acme = store.fetch_records("Acme").await.expect("records");
        assert_eq!(acme.len(), 2);
        assert_eq!(acme[1].business_ratings, None);
        assert_eq!(acme[1].strengths, None);

        let nobody = store.fetch_records("Initech").await.expect("empty is not an error");
        assert!(nobody.is_empty());
    }

    #[test]
    fn test_csv_non_numeric_rating_is_missing() {
        let records = read_records_csv_from_str(
            "business_id,name,address,postal_code,business_ratings,csat,nps,strengths,areas_for_improvement\n\
             b1,Acme,1 Main St,10001,n/a,88,40,fast,\n",
        );
        assert_eq!(records[0].business_ratings, None);
        assert_eq!(records[0].csat, Some(88.0));
    }

    fn read_records_csv_from_str(contents: &str) -> Vec<BusinessRecord> {
        let mut file = NamedTempFile::new().expect("temp csv");
        file.write_all(contents.as_bytes()).expect("write csv");
        read_records_csv(file.path()).expect("parse csv")
    }
}
