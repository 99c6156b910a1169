//! Sales forecast report
//!
//! Run with: `cargo run --bin forecast-report`
//!
//! Aggregates the sales store into a revenue series, fits the forecast
//! model, applies the configured what-if adjustment, prints the tail of the
//! forecast, optionally asks the summarization service for an analyst
//! summary, and writes the full forecast as CSV.

use sales_forecast::{
    aggregate, apply, display_table, summarizer_config_from_env, to_csv, AppConfig, ForecastError,
    ForecastSummarizer, Forecaster, Product, Region, SeriesFilter, SqliteSalesStore,
    TrendSeasonalForecaster, DEFAULT_COLUMNS,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let filter = filter_from_env()?;

    println!("🔍 Fetching data from {}...", config.db_path);
    let store = SqliteSalesStore::new(&config.db_path)?;
    let series = aggregate(&store, &filter, config.granularity)?;
    println!("✅ Data loaded: {} buckets", series.len());

    let forecaster = TrendSeasonalForecaster::new();
    let forecast = match forecaster.fit_and_predict(&series, config.horizon, config.freq) {
        Ok(forecast) => forecast,
        Err(ForecastError::InsufficientData { got }) => {
            println!(
                "⚠️ Not enough data to forecast (need at least 2 points, have {}). \
                 Run the simulator a bit longer.",
                got
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let adjusted = apply(&forecast, config.what_if);
    println!();
    println!(
        "📊 Forecast tail (what-if adjustment: {}):",
        config.what_if
    );
    print!("{}", display_table(&adjusted, 5));

    // The summary is best-effort; a missing token just skips it.
    match summarizer_config_from_env() {
        Ok(summarizer_config) => {
            let summarizer = ForecastSummarizer::new(summarizer_config)?;
            println!();
            println!("💬 Requesting analyst summary...");
            match summarizer.summarize(&adjusted, config.what_if, None).await {
                Ok(summary) => println!("{}", summary),
                Err(e) => tracing::warn!(error = %e, "summary unavailable"),
            }
        }
        Err(e) => tracing::info!(reason = %e, "skipping summary"),
    }

    let csv = to_csv(&adjusted, &DEFAULT_COLUMNS)?;
    match std::env::var("FORECAST_CSV_PATH") {
        Ok(path) => {
            std::fs::write(&path, csv)?;
            println!();
            println!("⬇️ Forecast written to {}", path);
        }
        Err(_) => {
            println!();
            print!("{}", csv);
        }
    }

    Ok(())
}

/// Reads optional PRODUCT/REGION filters, rejecting unknown catalog values.
fn filter_from_env() -> Result<SeriesFilter, Box<dyn std::error::Error>> {
    let mut filter = SeriesFilter::all();
    if let Ok(raw) = std::env::var("PRODUCT") {
        let product = Product::parse(&raw)
            .ok_or_else(|| format!("unknown product '{}' (see the product catalog)", raw))?;
        filter = filter.with_product(product);
    }
    if let Ok(raw) = std::env::var("REGION") {
        let region = Region::parse(&raw)
            .ok_or_else(|| format!("unknown region '{}' (see the region catalog)", raw))?;
        filter = filter.with_region(region);
    }
    Ok(filter)
}
