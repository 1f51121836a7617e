//! Analysis types: wire request, parsed result, errors and the client trait.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while talking to the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (connect, timeout, body read).
    #[error("analysis request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("analysis service returned status {status}: {message}")]
    Response { status: u16, message: String },

    /// The response body was not a usable result.
    #[error("analysis response parse failed: {0}")]
    Parse(String),

    /// A calculation is already in flight.
    #[error("a calculation is already running")]
    Busy,
}

impl AnalysisError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_ANALYSIS_REQUEST",
            Self::Response { .. } => "E_ANALYSIS_RESPONSE",
            Self::Parse(_) => "E_ANALYSIS_PARSE",
            Self::Busy => "E_BUSY",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Busy | Self::Response { status: 429 | 500..=599, .. })
    }

    /// Short message suitable for the result panel.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigParse(_) | Self::HttpClientBuild(_) => "Analysis is not configured.".into(),
            Self::Request(_) => "Could not reach the analysis service. Please try again.".into(),
            Self::Response { message, .. } if !message.is_empty() => format!("Analysis failed: {message}"),
            Self::Response { status, .. } => format!("Analysis failed (status {status})."),
            Self::Parse(_) => "Could not understand the analysis result.".into(),
            Self::Busy => "A calculation is already running.".into(),
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Body POSTed to the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// PNG data URL of the board.
    pub image: String,
    /// Variables assigned by earlier calculations, by name.
    pub variable: BTreeMap<String, String>,
}

/// The first entry of an analysis response, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub expression: String,
    pub answer: String,
    #[serde(default)]
    pub assign: bool,
    #[serde(default)]
    pub steps: Vec<String>,
}

// =============================================================================
// ANALYZER TRAIT
// =============================================================================

/// Sends a request to the analysis service. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    /// Returns the raw response body of a successful call.
    ///
    /// # Errors
    ///
    /// Returns an [`AnalysisError`] if the request fails or the service
    /// answers with a non-success status.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
