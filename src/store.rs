use crate::aggregate::{Granularity, SalesPoint, SeriesFilter};
use crate::record::TransactionRecord;
use chrono::{DateTime, Duration, DurationRound, NaiveDateTime, Utc};
use rusqlite::{Connection, Result as SqliteResult};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Errors that can occur when reading from the sales store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// Store connection could not be acquired
    Connection(String),
    /// Read query failed
    Query(String),
}

impl std::fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSourceError::Connection(msg) => write!(f, "Store connection error: {}", msg),
            DataSourceError::Query(msg) => write!(f, "Store query error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}

/// Errors that can occur when writing a batch to the sales store.
///
/// A failed batch is considered lost; the next scheduled cycle proceeds
/// independently and no retry queue is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The transactional batch insert failed; no rows from the batch were written
    BatchFailed { rows: usize, message: String },
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::BatchFailed { rows, message } => {
                write!(f, "Batch insert of {} rows failed: {}", rows, message)
            }
        }
    }
}

impl std::error::Error for UploadError {}

/// Trait for the external sales store boundary.
///
/// The core issues exactly two operations against the store: one parametrized
/// read query returning bucketed revenue sums, and one transactional
/// multi-row insert. Implementations can be:
/// - SQLite database (production path here)
/// - In-memory maps (for testing)
/// - Any warehouse driver exposing the same two operations
pub trait SalesStore {
    /// Fetches summed revenue per time bucket, ascending by bucket.
    ///
    /// Rows with null revenue are excluded before aggregation; optional
    /// product/region predicates are applied as exact matches before
    /// grouping. A zero-row result is `Ok(vec![])`.
    ///
    /// # Errors
    /// Returns `DataSourceError` on connection or query failure.
    fn fetch_series(
        &self,
        filter: &SeriesFilter,
        granularity: Granularity,
    ) -> Result<Vec<SalesPoint>, DataSourceError>;

    /// Writes all records as a single transaction (all-or-nothing).
    ///
    /// # Returns
    /// Returns the number of rows written, which equals `records.len()` on
    /// success.
    ///
    /// # Errors
    /// Returns `UploadError` if the batch could not be committed; in that
    /// case none of the batch's rows were written.
    fn insert_records(&self, records: &[TransactionRecord]) -> Result<usize, UploadError>;
}

/// SQLite-backed sales store.
///
/// Creates the `sales_data` table on first use. Timestamps are stored as
/// RFC 3339 text so SQLite's date functions can truncate them directly.
#[derive(Debug)]
pub struct SqliteSalesStore {
    conn: Mutex<Connection>,
}

impl SqliteSalesStore {
    /// Opens (or creates) a file-based store.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::ensure_schema(&conn)?;
        Ok(SqliteSalesStore {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory store. Useful for testing.
    pub fn new_in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::ensure_schema(&conn)?;
        Ok(SqliteSalesStore {
            conn: Mutex::new(conn),
        })
    }

    fn ensure_schema(conn: &Connection) -> SqliteResult<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sales_data (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                product TEXT NOT NULL,
                region TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                revenue REAL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sales_data_timestamp ON sales_data(timestamp)",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DataSourceError> {
        self.conn
            .lock()
            .map_err(|_| DataSourceError::Connection("connection lock poisoned".to_string()))
    }

    fn bucket_expr(granularity: Granularity) -> &'static str {
        match granularity {
            Granularity::Hour => "strftime('%Y-%m-%d %H:00:00', timestamp)",
            Granularity::Minute => "strftime('%Y-%m-%d %H:%M:00', timestamp)",
        }
    }
}

impl SalesStore for SqliteSalesStore {
    fn fetch_series(
        &self,
        filter: &SeriesFilter,
        granularity: Granularity,
    ) -> Result<Vec<SalesPoint>, DataSourceError> {
        let conn = self.lock()?;

        let mut sql = format!(
            "SELECT {bucket} AS ds, SUM(revenue) AS y
             FROM sales_data
             WHERE revenue IS NOT NULL",
            bucket = Self::bucket_expr(granularity)
        );
        let mut params: Vec<String> = Vec::new();
        if let Some(product) = filter.product {
            params.push(product.as_str().to_string());
            sql.push_str(&format!(" AND product = ?{}", params.len()));
        }
        if let Some(region) = filter.region {
            params.push(region.as_str().to_string());
            sql.push_str(&format!(" AND region = ?{}", params.len()));
        }
        sql.push_str(" GROUP BY ds ORDER BY ds");

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DataSourceError::Query(format!("prepare fetch_series: {}", e)))?;

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let ds_str: String = row.get(0)?;
                let y: f64 = row.get(1)?;
                let ds = NaiveDateTime::parse_from_str(&ds_str, "%Y-%m-%d %H:%M:%S")
                    .map_err(|e| {
                        rusqlite::Error::InvalidColumnType(
                            0,
                            format!("Invalid bucket timestamp: {}", e),
                            rusqlite::types::Type::Text,
                        )
                    })?
                    .and_utc();
                Ok(SalesPoint::new(ds, y))
            })
            .map_err(|e| DataSourceError::Query(format!("fetch_series: {}", e)))?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row.map_err(|e| DataSourceError::Query(format!("fetch_series row: {}", e)))?);
        }
        Ok(points)
    }

    fn insert_records(&self, records: &[TransactionRecord]) -> Result<usize, UploadError> {
        let mut conn = self.conn.lock().map_err(|_| UploadError::BatchFailed {
            rows: records.len(),
            message: "connection lock poisoned".to_string(),
        })?;

        let tx = conn.transaction().map_err(|e| UploadError::BatchFailed {
            rows: records.len(),
            message: e.to_string(),
        })?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO sales_data (id, timestamp, product, region, quantity, revenue)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| UploadError::BatchFailed {
                    rows: records.len(),
                    message: e.to_string(),
                })?;
            for record in records {
                stmt.execute(rusqlite::params![
                    record.id.to_string(),
                    record.timestamp.to_rfc3339(),
                    record.product.as_str(),
                    record.region.as_str(),
                    record.quantity,
                    record.revenue,
                ])
                .map_err(|e| UploadError::BatchFailed {
                    rows: records.len(),
                    message: e.to_string(),
                })?;
            }
        }
        tx.commit().map_err(|e| UploadError::BatchFailed {
            rows: records.len(),
            message: e.to_string(),
        })?;
        Ok(records.len())
    }
}

/// In-memory sales store for testing the pipeline without a database.
///
/// Stores raw records and aggregates them on read with the same semantics as
/// the SQLite query. A failure toggle lets tests simulate a lost batch.
#[derive(Debug, Default)]
pub struct InMemorySalesStore {
    records: Mutex<Vec<TransactionRecord>>,
    fail_uploads: AtomicBool,
}

impl InMemorySalesStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        InMemorySalesStore::default()
    }

    /// When set, subsequent `insert_records` calls fail with `UploadError`.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn truncate(ts: DateTime<Utc>, granularity: Granularity) -> DateTime<Utc> {
        let width = match granularity {
            Granularity::Minute => Duration::minutes(1),
            Granularity::Hour => Duration::hours(1),
        };
        // duration_trunc only fails for out-of-range durations; a fixed
        // minute/hour width is always in range.
        ts.duration_trunc(width).unwrap_or(ts)
    }
}

impl SalesStore for InMemorySalesStore {
    fn fetch_series(
        &self,
        filter: &SeriesFilter,
        granularity: Granularity,
    ) -> Result<Vec<SalesPoint>, DataSourceError> {
        let records = self
            .records
            .lock()
            .map_err(|_| DataSourceError::Connection("record lock poisoned".to_string()))?;

        let mut buckets: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
        for record in records.iter() {
            if !record.revenue.is_finite() {
                continue;
            }
            if let Some(product) = filter.product {
                if record.product != product {
                    continue;
                }
            }
            if let Some(region) = filter.region {
                if record.region != region {
                    continue;
                }
            }
            let bucket = Self::truncate(record.timestamp, granularity);
            *buckets.entry(bucket).or_insert(0.0) += record.revenue;
        }

        Ok(buckets
            .into_iter()
            .map(|(ds, y)| SalesPoint::new(ds, y))
            .collect())
    }

    fn insert_records(&self, records: &[TransactionRecord]) -> Result<usize, UploadError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(UploadError::BatchFailed {
                rows: records.len(),
                message: "simulated write failure".to_string(),
            });
        }
        let mut stored = self.records.lock().map_err(|_| UploadError::BatchFailed {
            rows: records.len(),
            message: "record lock poisoned".to_string(),
        })?;
        stored.extend_from_slice(records);
        Ok(records.len())
    }
}
