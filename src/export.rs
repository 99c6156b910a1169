use crate::forecast::{ForecastResult, ForecastRow};

/// Timestamp pattern for display tables.
const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Exportable forecast columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Ds,
    Yhat,
    YhatLower,
    YhatUpper,
}

/// Default export column order.
pub const DEFAULT_COLUMNS: [Column; 4] =
    [Column::Ds, Column::Yhat, Column::YhatLower, Column::YhatUpper];

impl Column {
    /// Returns the CSV header name.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Ds => "ds",
            Column::Yhat => "yhat",
            Column::YhatLower => "yhat_lower",
            Column::YhatUpper => "yhat_upper",
        }
    }

    fn field(&self, row: &ForecastRow) -> String {
        match self {
            Column::Ds => row.ds.to_rfc3339(),
            Column::Yhat => row.yhat.to_string(),
            Column::YhatLower => row.yhat_lower.to_string(),
            Column::YhatUpper => row.yhat_upper.to_string(),
        }
    }
}

/// Errors that can occur while serializing a forecast.
#[derive(Debug)]
pub enum ExportError {
    /// CSV writing failed
    Csv(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Csv(msg) => write!(f, "CSV export error: {}", msg),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

/// Serializes a forecast to CSV in the given column order.
///
/// Rows keep their grid order; timestamps are full-precision RFC 3339 so the
/// file round-trips without loss.
///
/// # Errors
/// Returns `ExportError` if CSV serialization fails.
pub fn to_csv(result: &ForecastResult, columns: &[Column]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|c| c.header()))?;
    for row in &result.rows {
        writer.write_record(columns.iter().map(|c| c.field(row)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Csv(e.to_string()))
}

/// Formats the last `n` forecast rows as a markdown-style text table.
///
/// Timestamps use the `YYYY-MM-DD HH:MM` display pattern and values are
/// rounded to two decimals. This is the excerpt handed to the summarization
/// service and printed for the console report.
pub fn display_table(result: &ForecastResult, n: usize) -> String {
    let start = result.rows.len().saturating_sub(n);
    let mut out = String::new();
    out.push_str("| ds               | yhat | yhat_lower | yhat_upper |\n");
    out.push_str("|------------------|------|------------|------------|\n");
    for row in &result.rows[start..] {
        out.push_str(&format!(
            "| {} | {:.2} | {:.2} | {:.2} |\n",
            row.ds.format(DISPLAY_TIME_FORMAT),
            row.yhat,
            row.yhat_lower,
            row.yhat_upper
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::FittedModel;
    use chrono::{Duration, TimeZone, Utc};

    fn sample_result(rows: usize) -> ForecastResult {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let rows = (0..rows)
            .map(|i| ForecastRow {
                ds: base + Duration::hours(i as i64),
                yhat: 100.0 + i as f64,
                yhat_lower: 90.0 + i as f64,
                yhat_upper: 110.0 + i as f64,
            })
            .collect();
        ForecastResult {
            rows,
            model: FittedModel {
                slope: 1.0,
                intercept: 100.0,
                seasonal: Vec::new(),
                sigma: 5.0,
                confidence: 0.95,
            },
        }
    }

    #[test]
    fn test_csv_header_and_row_count() {
        let result = sample_result(3);
        let csv = to_csv(&result, &DEFAULT_COLUMNS).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "ds,yhat,yhat_lower,yhat_upper");
    }

    #[test]
    fn test_csv_column_subset_and_order() {
        let result = sample_result(1);
        let csv = to_csv(&result, &[Column::Yhat, Column::Ds]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "yhat,ds");
        assert!(lines[1].starts_with("100,"));
    }

    #[test]
    fn test_csv_timestamps_full_precision() {
        let result = sample_result(1);
        let csv = to_csv(&result, &DEFAULT_COLUMNS).unwrap();
        assert!(csv.contains("2024-03-01T08:30:00+00:00"));
    }

    #[test]
    fn test_csv_preserves_row_order() {
        let result = sample_result(5);
        let csv = to_csv(&result, &[Column::Yhat]).unwrap();
        let values: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(values, vec!["100", "101", "102", "103", "104"]);
    }

    #[test]
    fn test_display_table_last_n_rows() {
        let result = sample_result(10);
        let table = display_table(&result, 5);
        // Header + separator + 5 data rows.
        assert_eq!(table.lines().count(), 7);
        assert!(table.contains("2024-03-01 13:30"));
        assert!(!table.contains("2024-03-01 08:30"));
    }

    #[test]
    fn test_display_table_shorter_than_n() {
        let result = sample_result(2);
        let table = display_table(&result, 5);
        assert_eq!(table.lines().count(), 4);
    }

    #[test]
    fn test_display_table_two_decimal_values() {
        let result = sample_result(1);
        let table = display_table(&result, 1);
        assert!(table.contains("100.00"));
        assert!(table.contains("90.00"));
        assert!(table.contains("110.00"));
    }
}
