use crate::aggregate::Granularity;
use crate::forecast::ForecastFrequency;
use crate::summarizer::SummarizerConfig;
use crate::whatif::WhatIfPercent;

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable (typically a secret) is not set
    MissingVar(String),
    /// Variable is set but its value is not usable
    InvalidVar { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(name) => write!(f, "Missing configuration variable: {}", name),
            ConfigError::InvalidVar { name, message } => {
                write!(f, "Invalid value for {}: {}", name, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime configuration for the forecasting pipeline.
///
/// Loaded from environment variables in the binaries; every component takes
/// its configuration explicitly at construction time, nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the SQLite sales store
    pub db_path: String,
    /// Aggregation bucket width
    pub granularity: Granularity,
    /// Future periods to forecast
    pub horizon: usize,
    /// Cadence of the forecast grid
    pub freq: ForecastFrequency,
    /// What-if adjustment applied to the forecast
    pub what_if: WhatIfPercent,
    /// Records per simulator cycle
    pub batch_size: usize,
    /// Seconds between simulator cycles
    pub interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: "sales.db".to_string(),
            granularity: Granularity::Hour,
            horizon: 12,
            freq: ForecastFrequency::Hour,
            what_if: WhatIfPercent::zero(),
            batch_size: 5,
            interval_secs: 10,
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the environment, falling back to
    /// defaults for unset variables.
    ///
    /// Recognized variables: `SALES_DB_PATH`, `SALES_GRANULARITY`
    /// (`hour`|`minute`), `FORECAST_HORIZON`, `FORECAST_FREQ` (`hour`|`day`),
    /// `WHAT_IF_PCT` (integer in [-50, 50]), `SIM_BATCH_SIZE`,
    /// `SIM_INTERVAL_SECS`.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidVar` naming the offending variable when
    /// a set value fails to parse or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let db_path = std::env::var("SALES_DB_PATH").unwrap_or(defaults.db_path);

        let granularity = match std::env::var("SALES_GRANULARITY") {
            Ok(raw) => Granularity::parse(&raw).ok_or_else(|| ConfigError::InvalidVar {
                name: "SALES_GRANULARITY".to_string(),
                message: format!("expected 'hour' or 'minute', got '{}'", raw),
            })?,
            Err(_) => defaults.granularity,
        };

        let horizon = parse_var("FORECAST_HORIZON", defaults.horizon)?;
        if horizon == 0 {
            return Err(ConfigError::InvalidVar {
                name: "FORECAST_HORIZON".to_string(),
                message: "horizon must be a positive integer".to_string(),
            });
        }

        let freq = match std::env::var("FORECAST_FREQ") {
            Ok(raw) => ForecastFrequency::parse(&raw).ok_or_else(|| ConfigError::InvalidVar {
                name: "FORECAST_FREQ".to_string(),
                message: format!("expected 'hour' or 'day', got '{}'", raw),
            })?,
            Err(_) => defaults.freq,
        };

        let what_if_raw: i32 = parse_var("WHAT_IF_PCT", defaults.what_if.value())?;
        let what_if = WhatIfPercent::new(what_if_raw).ok_or_else(|| ConfigError::InvalidVar {
            name: "WHAT_IF_PCT".to_string(),
            message: format!(
                "expected an integer in [{}, {}], got {}",
                WhatIfPercent::MIN,
                WhatIfPercent::MAX,
                what_if_raw
            ),
        })?;

        let batch_size = parse_var("SIM_BATCH_SIZE", defaults.batch_size)?;
        let interval_secs = parse_var("SIM_INTERVAL_SECS", defaults.interval_secs)?;

        Ok(AppConfig {
            db_path,
            granularity,
            horizon,
            freq,
            what_if,
            batch_size,
            interval_secs,
        })
    }
}

/// Loads the summarizer configuration from the environment.
///
/// `SUMMARY_API_URL` has a sensible default; the bearer token
/// `SUMMARY_API_TOKEN` is a secret and must be provided by the runtime, never
/// embedded in code.
///
/// # Errors
/// Returns `ConfigError::MissingVar` when the token is not set.
pub fn summarizer_config_from_env() -> Result<SummarizerConfig, ConfigError> {
    let api_url = std::env::var("SUMMARY_API_URL").unwrap_or_else(|_| {
        "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.1".to_string()
    });
    let api_token = std::env::var("SUMMARY_API_TOKEN")
        .map_err(|_| ConfigError::MissingVar("SUMMARY_API_TOKEN".to_string()))?;
    Ok(SummarizerConfig::new(api_url, api_token))
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            name: name.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
