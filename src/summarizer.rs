use crate::export::display_table;
use crate::forecast::ForecastResult;
use crate::whatif::WhatIfPercent;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Number of trailing forecast rows embedded in the prompt.
const PROMPT_ROWS: usize = 5;

/// Configuration for the forecast summarizer.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Text-completion endpoint URL
    pub api_url: String,
    /// Bearer token for the endpoint
    pub api_token: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

impl SummarizerConfig {
    /// Creates a new summarizer configuration with the default timeout.
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        SummarizerConfig {
            api_url: api_url.into(),
            api_token: api_token.into(),
            timeout_seconds: 30,
        }
    }
}

/// Errors that can occur when requesting a forecast summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    /// HTTP client creation failed
    ClientCreation(String),
    /// Network error occurred
    Network(String),
    /// Endpoint returned an error indicator
    Api(String),
    /// No forecast rows to summarize
    EmptyForecast,
}

impl std::fmt::Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryError::ClientCreation(msg) => write!(f, "Client creation error: {}", msg),
            SummaryError::Network(msg) => write!(f, "Network error: {}", msg),
            SummaryError::Api(msg) => write!(f, "Summarizer API error: {}", msg),
            SummaryError::EmptyForecast => write!(f, "No forecast data available to summarize"),
        }
    }
}

impl std::error::Error for SummaryError {}

/// Client for the opaque text-completion boundary.
///
/// Hands a small tabular excerpt of the forecast plus a question to the
/// endpoint and returns its free-text reply. The reply content is not parsed
/// or validated beyond checking for an error indicator.
#[derive(Debug)]
pub struct ForecastSummarizer {
    client: Client,
    config: SummarizerConfig,
}

impl ForecastSummarizer {
    /// Creates a new summarizer client.
    ///
    /// # Errors
    /// Returns `SummaryError::ClientCreation` if the HTTP client cannot be
    /// built.
    pub fn new(config: SummarizerConfig) -> Result<Self, SummaryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SummaryError::ClientCreation(e.to_string()))?;
        Ok(ForecastSummarizer { client, config })
    }

    /// Builds the analyst prompt for the given forecast excerpt.
    ///
    /// Embeds the last rows of the forecast as a display table together with
    /// the active what-if percentage; `question` switches from the default
    /// trend summary to an interactive reply.
    pub fn build_prompt(
        result: &ForecastResult,
        what_if: WhatIfPercent,
        question: Option<&str>,
    ) -> String {
        let table = display_table(result, PROMPT_ROWS);
        match question {
            Some(question) => format!(
                "You are a helpful business analyst.\n\n\
                 Here is the forecast (with a {} simulation):\n\n\
                 ```\n{}```\n\n\
                 User question: {}\n\n\
                 Please reply with bullet points outlining trends, risks, and suggestions.\n",
                what_if, table, question
            ),
            None => format!(
                "You are a helpful business analyst.\n\n\
                 Here is the forecasted sales data (with a {} simulation):\n\n\
                 ```\n{}```\n\n\
                 Please summarize the trends and risks.\n",
                what_if, table
            ),
        }
    }

    /// Requests a free-text summary of the forecast.
    ///
    /// # Errors
    /// Returns `SummaryError::EmptyForecast` for a forecast with no rows,
    /// `SummaryError::Network` on transport failure, and `SummaryError::Api`
    /// when the endpoint reports an error or returns no text.
    pub async fn summarize(
        &self,
        result: &ForecastResult,
        what_if: WhatIfPercent,
        question: Option<&str>,
    ) -> Result<String, SummaryError> {
        if result.rows.is_empty() {
            return Err(SummaryError::EmptyForecast);
        }

        let prompt = Self::build_prompt(result, what_if, question);
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_token)
            .json(&json!({ "inputs": prompt }))
            .send()
            .await
            .map_err(|e| SummaryError::Network(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| SummaryError::Network(e.to_string()))?;
        Self::extract_text(&body)
    }

    /// Pulls the generated text out of the endpoint's JSON reply.
    fn extract_text(body: &Value) -> Result<String, SummaryError> {
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(SummaryError::Api(error.to_string()));
        }
        match body.as_array().and_then(|items| items.first()) {
            Some(first) => match first.get("generated_text").and_then(Value::as_str) {
                Some(text) => Ok(text.to_string()),
                None => Err(SummaryError::Api("endpoint returned no text".to_string())),
            },
            None => Err(SummaryError::Api(format!("unexpected reply: {}", body))),
        }
    }
}
