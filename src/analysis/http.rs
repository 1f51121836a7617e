//! HTTP client for the analysis service.
//!
//! Thin wrapper around a single JSON POST. Response decoding lives in
//! [`super::parse`] so it can be tested without a server.

use std::time::Duration;

use super::config::AnalysisConfig;
use super::parse::error_message;
use super::types::{AnalysisError, AnalysisRequest, Analyzer};

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAnalyzer {
    http: reqwest::Client,
    url: String,
}

impl HttpAnalyzer {
    /// # Errors
    ///
    /// Returns [`AnalysisError::HttpClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| AnalysisError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url: config.url.clone() })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Analyzer for HttpAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(failure(status.as_u16(), &text));
        }
        tracing::debug!(bytes = text.len(), "analysis response received");
        Ok(text)
    }
}

/// Map a non-success answer to an error, preferring the service's own message.
fn failure(status: u16, body: &str) -> AnalysisError {
    let message = error_message(body).unwrap_or_default();
    AnalysisError::Response { status, message }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
