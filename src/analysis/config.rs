//! Analysis client configuration parsed from environment variables.

use super::types::AnalysisError;

pub const DEFAULT_ANALYSIS_URL: &str = "http://localhost:8900/calculate";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for AnalysisTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub url: String,
    pub timeouts: AnalysisTimeouts,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { url: DEFAULT_ANALYSIS_URL.to_owned(), timeouts: AnalysisTimeouts::default() }
    }
}

impl AnalysisConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `ANALYSIS_URL`: endpoint receiving the POST, default [`DEFAULT_ANALYSIS_URL`]
    /// - `ANALYSIS_REQUEST_TIMEOUT_SECS`: default 60
    /// - `ANALYSIS_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ConfigParse`] if the URL is not http(s).
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ConfigParse`] if the URL is not http(s).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AnalysisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = match lookup("ANALYSIS_URL") {
            Some(raw) => parse_url(&raw)?,
            None => DEFAULT_ANALYSIS_URL.to_owned(),
        };
        let timeouts = AnalysisTimeouts {
            request_secs: parse_secs(lookup("ANALYSIS_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_secs(lookup("ANALYSIS_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Ok(Self { url, timeouts })
    }

    /// Replace the endpoint, validating it the same way as the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ConfigParse`] if the URL is not http(s).
    pub fn with_url(mut self, raw: &str) -> Result<Self, AnalysisError> {
        self.url = parse_url(raw)?;
        Ok(self)
    }
}

fn parse_url(raw: &str) -> Result<String, AnalysisError> {
    let url = raw.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_owned())
    } else {
        Err(AnalysisError::ConfigParse(format!("ANALYSIS_URL must be an http(s) URL, got '{url}'")))
    }
}

/// Unparsable or zero values fall back to the default.
fn parse_secs(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
