use crate::record::{Product, Region};
use crate::store::{DataSourceError, SalesStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time bucket width used to group raw records before forecasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Minute,
    Hour,
}

impl Granularity {
    /// Returns the lowercase name used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
        }
    }

    /// Parses a configuration name into a Granularity.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "minute" => Some(Granularity::Minute),
            "hour" => Some(Granularity::Hour),
            _ => None,
        }
    }
}

/// Optional exact-match predicates applied before grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesFilter {
    pub product: Option<Product>,
    pub region: Option<Region>,
}

impl SeriesFilter {
    /// A filter matching every record.
    pub fn all() -> Self {
        SeriesFilter::default()
    }

    /// Restricts the filter to a single product.
    pub fn with_product(mut self, product: Product) -> Self {
        self.product = Some(product);
        self
    }

    /// Restricts the filter to a single region.
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }
}

/// One bucketed point of the aggregated revenue series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    /// Bucket boundary timestamp
    pub ds: DateTime<Utc>,
    /// Summed revenue for the bucket
    pub y: f64,
}

impl SalesPoint {
    /// Creates a new SalesPoint.
    pub fn new(ds: DateTime<Utc>, y: f64) -> Self {
        SalesPoint { ds, y }
    }
}

/// Fetches the bucketed revenue series for the given filter and granularity.
///
/// The store performs truncation, summation, grouping, and ordering; this
/// function adds a defensive drop pass removing any row whose value is not
/// finite, so downstream model fitting never sees NaN.
///
/// # Returns
/// Returns the series ascending by `ds`, one point per non-empty bucket. An
/// empty series is a valid result, not an error.
///
/// # Errors
/// Returns `DataSourceError` if the underlying query fails.
pub fn aggregate<S: SalesStore + ?Sized>(
    store: &S,
    filter: &SeriesFilter,
    granularity: Granularity,
) -> Result<Vec<SalesPoint>, DataSourceError> {
    let points = store.fetch_series(filter, granularity)?;
    let cleaned: Vec<SalesPoint> = points.into_iter().filter(|p| p.y.is_finite()).collect();
    tracing::debug!(
        points = cleaned.len(),
        granularity = granularity.as_str(),
        "aggregated revenue series"
    );
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TransactionRecord;
    use crate::store::InMemorySalesStore;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn record(ts: DateTime<Utc>, product: Product, region: Region, revenue: f64) -> TransactionRecord {
        TransactionRecord::new(Uuid::new_v4(), ts, product, region, 1, revenue)
    }

    #[test]
    fn test_aggregate_sums_within_bucket() {
        let store = InMemorySalesStore::new();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 5, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 40, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap();
        store
            .insert_records(&[
                record(t0, Product::Laptop, Region::North, 100.0),
                record(t1, Product::Tablet, Region::South, 50.0),
                record(t2, Product::Phone, Region::East, 25.0),
            ])
            .unwrap();

        let series = aggregate(&store, &SeriesFilter::all(), Granularity::Hour).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].ds, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        assert_eq!(series[0].y, 150.0);
        assert_eq!(series[1].y, 25.0);
    }

    #[test]
    fn test_aggregate_ascending_unique_ds() {
        let store = InMemorySalesStore::new();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let records: Vec<TransactionRecord> = (0..48)
            .map(|i| {
                record(
                    base + chrono::Duration::minutes(i * 37),
                    Product::Laptop,
                    Region::West,
                    10.0,
                )
            })
            .collect();
        store.insert_records(&records).unwrap();

        let series = aggregate(&store, &SeriesFilter::all(), Granularity::Hour).unwrap();
        for pair in series.windows(2) {
            assert!(pair[0].ds < pair[1].ds, "series must be strictly ascending");
        }
    }

    #[test]
    fn test_aggregate_filters_product_and_region() {
        let store = InMemorySalesStore::new();
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        store
            .insert_records(&[
                record(t, Product::Laptop, Region::North, 100.0),
                record(t, Product::Laptop, Region::South, 40.0),
                record(t, Product::Phone, Region::North, 7.0),
            ])
            .unwrap();

        let filter = SeriesFilter::all()
            .with_product(Product::Laptop)
            .with_region(Region::North);
        let series = aggregate(&store, &filter, Granularity::Hour).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].y, 100.0);
    }

    #[test]
    fn test_aggregate_empty_store_is_empty_series() {
        let store = InMemorySalesStore::new();
        let series = aggregate(&store, &SeriesFilter::all(), Granularity::Minute).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!(Granularity::parse("hour"), Some(Granularity::Hour));
        assert_eq!(Granularity::parse("minute"), Some(Granularity::Minute));
        assert_eq!(Granularity::parse("day"), None);
    }
}
