use crate::aggregate::SalesPoint;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Default confidence level for the uncertainty band.
const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Seasonal period in steps for hourly data (one day).
const HOURLY_PERIOD: usize = 24;

/// Seasonal period in steps for daily data (one week).
const DAILY_PERIOD: usize = 7;

/// Step cadence of the forecast grid beyond the last historical point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastFrequency {
    Hour,
    Day,
}

impl ForecastFrequency {
    /// Returns the lowercase name used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastFrequency::Hour => "hour",
            ForecastFrequency::Day => "day",
        }
    }

    /// Parses a configuration name into a ForecastFrequency.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "hour" => Some(ForecastFrequency::Hour),
            "day" => Some(ForecastFrequency::Day),
            _ => None,
        }
    }

    /// One grid step at this cadence.
    pub fn step(&self) -> Duration {
        match self {
            ForecastFrequency::Hour => Duration::hours(1),
            ForecastFrequency::Day => Duration::days(1),
        }
    }

    fn seasonal_period(&self) -> usize {
        match self {
            ForecastFrequency::Hour => HOURLY_PERIOD,
            ForecastFrequency::Day => DAILY_PERIOD,
        }
    }
}

/// One row of the forecast grid.
///
/// Invariant: `yhat_lower <= yhat <= yhat_upper`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// Grid timestamp (historical or future)
    pub ds: DateTime<Utc>,
    /// Central estimate
    pub yhat: f64,
    /// Lower bound of the uncertainty band
    pub yhat_lower: f64,
    /// Upper bound of the uncertainty band
    pub yhat_upper: f64,
}

/// Summary of the fitted model state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    /// Linear trend slope per grid step
    pub slope: f64,
    /// Trend value at the first historical point
    pub intercept: f64,
    /// Additive seasonal component per phase (empty when not enough history)
    pub seasonal: Vec<f64>,
    /// Residual standard deviation
    pub sigma: f64,
    /// Confidence level of the band
    pub confidence: f64,
}

/// Forecast output: one row per historical point plus one per horizon step.
///
/// The result is owned by the invocation that produced it and never mutated;
/// the what-if transform produces a new ForecastResult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub rows: Vec<ForecastRow>,
    pub model: FittedModel,
}

/// Errors that can occur when fitting or predicting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastError {
    /// Fewer than 2 aggregated points; the model was not invoked
    InsufficientData { got: usize },
    /// Numerical failure inside the model
    FitFailed(String),
}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::InsufficientData { got } => {
                write!(f, "Not enough data to forecast: need at least 2 points, got {}", got)
            }
            ForecastError::FitFailed(msg) => write!(f, "Forecast fit failed: {}", msg),
        }
    }
}

impl std::error::Error for ForecastError {}

/// Trait for the model-fitting seam.
///
/// Keeps callers decoupled from the concrete statistical method so tests can
/// substitute a deterministic fake.
pub trait Forecaster {
    /// Fits a model to the series and predicts over the extended grid.
    ///
    /// # Arguments
    /// * `series` - Historical points, ascending by `ds`, no NaN values
    /// * `horizon` - Number of future steps beyond the last historical point
    /// * `freq` - Cadence of the future steps
    ///
    /// # Returns
    /// Returns a ForecastResult with exactly `series.len() + horizon` rows.
    ///
    /// # Errors
    /// Returns `ForecastError::InsufficientData` for fewer than 2 points and
    /// `ForecastError::FitFailed` on numerical failure.
    fn fit_and_predict(
        &self,
        series: &[SalesPoint],
        horizon: usize,
        freq: ForecastFrequency,
    ) -> Result<ForecastResult, ForecastError>;
}

/// Additive trend + periodic seasonality forecaster.
///
/// Fits an ordinary-least-squares linear trend over the point index, then a
/// per-phase mean of the trend residuals as the seasonal component (daily
/// pattern for hourly cadence, weekly pattern for daily cadence). The
/// uncertainty band is `yhat +/- z * sigma` where `sigma` is the standard
/// deviation of the deseasonalized residuals. Fully deterministic: identical
/// input always yields the identical forecast.
#[derive(Debug, Clone)]
pub struct TrendSeasonalForecaster {
    confidence: f64,
}

impl TrendSeasonalForecaster {
    /// Creates a forecaster with the default 95% band.
    pub fn new() -> Self {
        TrendSeasonalForecaster {
            confidence: DEFAULT_CONFIDENCE_LEVEL,
        }
    }

    /// Creates a forecaster with a custom confidence level in (0, 1).
    pub fn with_confidence(confidence: f64) -> Self {
        TrendSeasonalForecaster { confidence }
    }

    /// Returns the configured confidence level.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl Default for TrendSeasonalForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for TrendSeasonalForecaster {
    fn fit_and_predict(
        &self,
        series: &[SalesPoint],
        horizon: usize,
        freq: ForecastFrequency,
    ) -> Result<ForecastResult, ForecastError> {
        let n = series.len();
        if n < 2 {
            return Err(ForecastError::InsufficientData { got: n });
        }

        let (slope, intercept) = ols_trend(series);
        if !slope.is_finite() || !intercept.is_finite() {
            return Err(ForecastError::FitFailed(format!(
                "non-finite trend fit over {} points (slope={}, intercept={})",
                n, slope, intercept
            )));
        }

        let residuals: Vec<f64> = series
            .iter()
            .enumerate()
            .map(|(i, p)| p.y - (intercept + slope * i as f64))
            .collect();

        // Seasonality needs at least two full periods of history to separate
        // a repeating pattern from noise.
        let period = freq.seasonal_period();
        let seasonal = if n >= 2 * period {
            phase_means(&residuals, period)
        } else {
            Vec::new()
        };

        let deseasonalized: Vec<f64> = residuals
            .iter()
            .enumerate()
            .map(|(i, r)| r - seasonal_at(&seasonal, i))
            .collect();
        let sigma = population_std_dev(&deseasonalized);
        if !sigma.is_finite() {
            return Err(ForecastError::FitFailed(format!(
                "non-finite residual deviation over {} points",
                n
            )));
        }

        let z = normal_quantile(self.confidence)
            .map_err(|e| ForecastError::FitFailed(format!("band quantile: {}", e)))?;
        let band = z * sigma;

        let last_ds = series[n - 1].ds;
        let step = freq.step();
        let mut rows = Vec::with_capacity(n + horizon);
        for i in 0..n + horizon {
            let ds = if i < n {
                series[i].ds
            } else {
                last_ds + step * (i - n + 1) as i32
            };
            let yhat = intercept + slope * i as f64 + seasonal_at(&seasonal, i);
            if !yhat.is_finite() {
                return Err(ForecastError::FitFailed(format!(
                    "non-finite estimate at grid index {}",
                    i
                )));
            }
            rows.push(ForecastRow {
                ds,
                yhat,
                yhat_lower: yhat - band,
                yhat_upper: yhat + band,
            });
        }

        tracing::debug!(
            history = n,
            horizon,
            slope,
            sigma,
            seasonal = !seasonal.is_empty(),
            "fitted trend-seasonal model"
        );

        Ok(ForecastResult {
            rows,
            model: FittedModel {
                slope,
                intercept,
                seasonal,
                sigma,
                confidence: self.confidence,
            },
        })
    }
}

/// Ordinary-least-squares fit of `y` against the point index.
fn ols_trend(series: &[SalesPoint]) -> (f64, f64) {
    let n = series.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = series.iter().map(|p| p.y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, p) in series.iter().enumerate() {
        let dx = i as f64 - x_mean;
        cov += dx * (p.y - y_mean);
        var += dx * dx;
    }
    let slope = cov / var;
    (slope, y_mean - slope * x_mean)
}

/// Mean residual per phase of the seasonal period.
fn phase_means(residuals: &[f64], period: usize) -> Vec<f64> {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, r) in residuals.iter().enumerate() {
        sums[i % period] += r;
        counts[i % period] += 1;
    }
    sums.iter()
        .zip(counts.iter())
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect()
}

fn seasonal_at(seasonal: &[f64], index: usize) -> f64 {
    if seasonal.is_empty() {
        0.0
    } else {
        seasonal[index % seasonal.len()]
    }
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Two-sided standard-normal quantile for the given confidence level.
fn normal_quantile(confidence: f64) -> Result<f64, String> {
    if !(0.0..1.0).contains(&confidence) {
        return Err(format!("confidence {} outside (0, 1)", confidence));
    }
    let standard_normal = Normal::new(0.0, 1.0).map_err(|e| e.to_string())?;
    Ok(standard_normal.inverse_cdf(0.5 + confidence / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hourly_series(values: &[f64]) -> Vec<SalesPoint> {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &y)| SalesPoint::new(base + Duration::hours(i as i64), y))
            .collect()
    }

    #[test]
    fn test_two_points_is_enough() {
        let series = hourly_series(&[100.0, 110.0]);
        let result = TrendSeasonalForecaster::new()
            .fit_and_predict(&series, 3, ForecastFrequency::Hour)
            .unwrap();
        assert_eq!(result.rows.len(), 5);
    }

    #[test]
    fn test_one_point_is_insufficient() {
        let series = hourly_series(&[100.0]);
        let err = TrendSeasonalForecaster::new()
            .fit_and_predict(&series, 3, ForecastFrequency::Hour)
            .unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { got: 1 });
    }

    #[test]
    fn test_zero_points_is_insufficient() {
        let err = TrendSeasonalForecaster::new()
            .fit_and_predict(&[], 3, ForecastFrequency::Hour)
            .unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { got: 0 });
    }

    #[test]
    fn test_grid_coverage() {
        let series = hourly_series(&[10.0, 12.0, 11.0, 13.0, 14.0]);
        let result = TrendSeasonalForecaster::new()
            .fit_and_predict(&series, 7, ForecastFrequency::Hour)
            .unwrap();
        assert_eq!(result.rows.len(), series.len() + 7);
        // Historical rows keep their timestamps, future rows extend hourly.
        assert_eq!(result.rows[4].ds, series[4].ds);
        assert_eq!(result.rows[5].ds, series[4].ds + Duration::hours(1));
        assert_eq!(result.rows[11].ds, series[4].ds + Duration::hours(7));
    }

    #[test]
    fn test_band_contains_yhat() {
        let series = hourly_series(&[100.0, 108.0, 103.0, 115.0, 109.0, 122.0]);
        let result = TrendSeasonalForecaster::new()
            .fit_and_predict(&series, 4, ForecastFrequency::Hour)
            .unwrap();
        for row in &result.rows {
            assert!(row.yhat_lower <= row.yhat, "lower > yhat at {}", row.ds);
            assert!(row.yhat <= row.yhat_upper, "yhat > upper at {}", row.ds);
        }
    }

    #[test]
    fn test_linear_series_forecast_follows_trend() {
        // [(t0,100),(t1,110),(t2,120)], horizon 2 -> 5 rows on the trend line.
        let series = hourly_series(&[100.0, 110.0, 120.0]);
        let result = TrendSeasonalForecaster::new()
            .fit_and_predict(&series, 2, ForecastFrequency::Hour)
            .unwrap();
        assert_eq!(result.rows.len(), 5);
        let expected = [100.0, 110.0, 120.0, 130.0, 140.0];
        for (row, want) in result.rows.iter().zip(expected.iter()) {
            assert!((row.yhat - want).abs() < 1e-9, "yhat {} != {}", row.yhat, want);
        }
        // Perfect fit: zero-width band.
        assert!(result.model.sigma.abs() < 1e-9);
    }

    #[test]
    fn test_all_identical_values_does_not_fail() {
        let series = hourly_series(&[42.0; 10]);
        let result = TrendSeasonalForecaster::new()
            .fit_and_predict(&series, 5, ForecastFrequency::Hour)
            .unwrap();
        for row in &result.rows {
            assert!((row.yhat - 42.0).abs() < 1e-9);
            assert!(row.yhat_upper - row.yhat_lower >= 0.0);
        }
    }

    #[test]
    fn test_deterministic() {
        let series = hourly_series(&[10.0, 20.0, 15.0, 30.0, 25.0]);
        let forecaster = TrendSeasonalForecaster::new();
        let a = forecaster
            .fit_and_predict(&series, 6, ForecastFrequency::Hour)
            .unwrap();
        let b = forecaster
            .fit_and_predict(&series, 6, ForecastFrequency::Hour)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seasonality_picked_up_with_enough_history() {
        // Two full days of hourly data with a strong daily pattern.
        let values: Vec<f64> = (0..48)
            .map(|i| if i % 24 < 12 { 50.0 } else { 200.0 })
            .collect();
        let series = hourly_series(&values);
        let result = TrendSeasonalForecaster::new()
            .fit_and_predict(&series, 24, ForecastFrequency::Hour)
            .unwrap();
        assert_eq!(result.model.seasonal.len(), 24);

        // Future morning hours should forecast well below future evening hours.
        let future = &result.rows[48..];
        assert!(future[2].yhat < future[14].yhat);
    }

    #[test]
    fn test_no_seasonality_with_short_history() {
        let series = hourly_series(&[10.0, 12.0, 11.0, 13.0]);
        let result = TrendSeasonalForecaster::new()
            .fit_and_predict(&series, 2, ForecastFrequency::Hour)
            .unwrap();
        assert!(result.model.seasonal.is_empty());
    }

    #[test]
    fn test_day_frequency_steps_by_day() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let series: Vec<SalesPoint> = (0..3)
            .map(|i| SalesPoint::new(base + Duration::days(i), 100.0 + i as f64))
            .collect();
        let result = TrendSeasonalForecaster::new()
            .fit_and_predict(&series, 2, ForecastFrequency::Day)
            .unwrap();
        assert_eq!(result.rows[3].ds, base + Duration::days(3));
        assert_eq!(result.rows[4].ds, base + Duration::days(4));
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!(ForecastFrequency::parse("hour"), Some(ForecastFrequency::Hour));
        assert_eq!(ForecastFrequency::parse("day"), Some(ForecastFrequency::Day));
        assert_eq!(ForecastFrequency::parse("week"), None);
    }
}
