use std::fs;
use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ValueRef;
use rusqlite::{params, OpenFlags, Row};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{InsightsError, Result};
use crate::logging::OperationTimer;
use crate::models::BusinessRecord;
use crate::schema::brand_insights;
use crate::validation::InputValidator;

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database manager for the business records table
pub struct Database {
    pool: DbPool,
    table: String,
}

impl Database {
    /// Open an existing store for reading.
    ///
    /// Fails with `StoreUnavailable` if the file does not exist; the store is
    /// never created implicitly on the read path.
    pub fn open(path: &Path, config: &DatabaseConfig) -> Result<Self> {
        if !path.is_file() {
            return Err(InsightsError::StoreUnavailable(format!(
                "no record store at {}",
                path.display()
            )));
        }

        let manager = SqliteConnectionManager::file(path).with_flags(
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
        );
        let db = Self::with_manager(manager, config)?;
        info!(path = %path.display(), table = %db.table, "Opened record store");
        Ok(db)
    }

    /// Open or create a writable store and make sure the records table exists
    pub fn create(path: &Path, config: &DatabaseConfig) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path);
        let db = Self::with_manager(manager, config)?;
        db.run_migrations()?;
        info!(path = %path.display(), table = %db.table, "Initialized record store");
        Ok(db)
    }

    fn with_manager(manager: SqliteConnectionManager, config: &DatabaseConfig) -> Result<Self> {
        InputValidator::validate_identifier(&config.table)
            .map_err(|e| InsightsError::InvalidConfig(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(0))
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build(manager)?;

        Ok(Self {
            pool,
            table: config.table.clone(),
        })
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        let sql = include_str!("../migrations/2026-10-01-000000_create_brand_insights/up.sql")
            .replace("{table}", &self.table);
        conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Name of the records table this store reads
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// All distinct account names, in store order.
    ///
    /// Names stored as numbers are read as text; NULL names are skipped.
    pub fn list_distinct_names(&self) -> Result<Vec<String>> {
        let timer = OperationTimer::new("list_distinct_names");
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {} FROM {}",
            brand_insights::NAME,
            self.table
        ))?;
        let names = stmt
            .query_map([], |row| text_column(row, 0))?
            .filter_map(std::result::Result::transpose)
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(count = names.len(), "Fetched account names");
        timer.finish();
        Ok(names)
    }

    /// Every record for one account, in store order. An unknown name yields an empty vector.
    pub fn fetch_records(&self, name: &str) -> Result<Vec<BusinessRecord>> {
        let timer = OperationTimer::new("fetch_records");
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE {} = ?",
            brand_insights::COLUMNS.join(", "),
            self.table,
            brand_insights::NAME
        ))?;
        let records = stmt
            .query_map(params![name], map_business_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(account = name, count = records.len(), "Fetched business records");
        timer.finish();
        Ok(records)
    }

    /// Insert one record. A duplicate `business_id` is rejected by the store.
    pub fn insert_record(&self, record: &BusinessRecord) -> Result<()> {
        self.insert_records(std::slice::from_ref(record)).map(|_| ())
    }

    /// Insert many records in one transaction, returning how many were written
    pub fn insert_records(&self, records: &[BusinessRecord]) -> Result<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                brand_insights::COLUMNS.join(", "),
                vec!["?"; brand_insights::COLUMNS.len()].join(", ")
            ))?;
            for record in records {
                stmt.execute(params![
                    record.business_id,
                    record.name,
                    record.address,
                    record.postal_code,
                    record.business_ratings,
                    record.csat,
                    record.nps,
                    record.strengths,
                    record.areas_for_improvement
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }
}

/// Map a row in `COLUMNS` order to a record
fn map_business_record(row: &Row) -> rusqlite::Result<BusinessRecord> {
    Ok(BusinessRecord {
        business_id: text_column(row, 0)?.unwrap_or_default(),
        name: text_column(row, 1)?.unwrap_or_default(),
        address: text_column(row, 2)?.unwrap_or_default(),
        postal_code: text_column(row, 3)?.unwrap_or_default(),
        business_ratings: numeric_column(row, 4)?,
        csat: numeric_column(row, 5)?,
        nps: numeric_column(row, 6)?,
        strengths: text_column(row, 7)?,
        areas_for_improvement: text_column(row, 8)?,
    })
}

/// Read a column as text, accepting numeric storage (e.g. integer ids or postal codes)
fn text_column(row: &Row, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    })
}

/// Read a column as a number; NULL and unparseable text count as missing
fn numeric_column(row: &Row, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get_ref(idx)? {
        #[allow(clippy::cast_precision_loss)]
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}
