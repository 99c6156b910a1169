pub mod record;
pub mod config;
pub mod store;
pub mod aggregate;
pub mod forecast;
pub mod whatif;
pub mod export;
pub mod generate;
pub mod simulator;
pub mod summarizer;


pub use record::{Product, Region, TransactionRecord, PRODUCTS, REGIONS};
pub use config::{summarizer_config_from_env, AppConfig, ConfigError};
pub use store::{DataSourceError, InMemorySalesStore, SalesStore, SqliteSalesStore, UploadError};
pub use aggregate::{aggregate, Granularity, SalesPoint, SeriesFilter};
pub use forecast::{
    FittedModel, ForecastError, ForecastFrequency, ForecastResult, ForecastRow, Forecaster,
    TrendSeasonalForecaster,
};
pub use whatif::{apply, WhatIfPercent};
pub use export::{display_table, to_csv, Column, ExportError, DEFAULT_COLUMNS};
pub use generate::SalesGenerator;
pub use simulator::{run_cycle, run_simulator, SimulatorConfig};
pub use summarizer::{ForecastSummarizer, SummarizerConfig, SummaryError};
