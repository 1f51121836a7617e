//! Result pipeline: board image -> analysis service -> displayed result.
//!
//! DESIGN
//! ======
//! The pipeline never touches the canvas. It receives an already-encoded PNG
//! data URL, sends it with the current variable dictionary, and keeps the
//! displayed [`ResultState`]. A loading flag refuses a second calculation while
//! one is in flight; the board itself stays fully interactive.
//!
//! A failed or malformed analysis keeps the previously displayed result and
//! sets a user-visible error string.
//!
//! `reset` bumps a generation counter. A call that started before the reset
//! still returns its outcome to the caller but leaves the cleared state alone.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::analysis::{AnalysisError, AnalysisRequest, Analyzer, CalculationResult, parse_response};

/// Renders a displayed expression (e.g. math typesetting in the host).
pub trait Typesetter: Send + Sync {
    fn typeset(&self, text: &str);
}

/// What the result panel shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultState {
    pub result: Option<CalculationResult>,
    pub error: Option<String>,
    pub loading: bool,
}

impl ResultState {
    /// The line shown for the current result, `expression = answer`.
    #[must_use]
    pub fn display_text(&self) -> Option<String> {
        self.result.as_ref().map(display_text)
    }
}

fn display_text(result: &CalculationResult) -> String {
    format!("{} = {}", result.expression, result.answer)
}

#[derive(Default)]
struct Inner {
    state: ResultState,
    variables: BTreeMap<String, String>,
    generation: u64,
}

pub struct ResultPipeline {
    analyzer: Arc<dyn Analyzer>,
    typesetter: Option<Arc<dyn Typesetter>>,
    inner: Mutex<Inner>,
}

impl ResultPipeline {
    #[must_use]
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self { analyzer, typesetter: None, inner: Mutex::new(Inner::default()) }
    }

    #[must_use]
    pub fn with_typesetter(mut self, typesetter: Arc<dyn Typesetter>) -> Self {
        self.typesetter = Some(typesetter);
        self
    }

    #[must_use]
    pub fn state(&self) -> ResultState {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().state.loading
    }

    #[must_use]
    pub fn variables(&self) -> BTreeMap<String, String> {
        self.lock().variables.clone()
    }

    /// Set a variable sent with the next request.
    pub fn set_variable(&self, name: impl Into<String>, value: impl Into<String>) {
        self.lock().variables.insert(name.into(), value.into());
    }

    /// Clear result, error and variables. A calculation in flight is
    /// orphaned: its result will not be displayed.
    pub fn reset(&self) {
        let mut inner = self.lock();
        let loading = inner.state.loading;
        let generation = inner.generation.wrapping_add(1);
        *inner = Inner { generation, ..Inner::default() };
        // An in-flight call still owns the loading flag.
        inner.state.loading = loading;
    }

    /// Send the board image for analysis and update the displayed result.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Busy`] if a calculation is already running (state is
    /// left alone), otherwise the request or parse failure, which is also
    /// recorded in [`ResultState::error`].
    pub async fn calculate(&self, image: String) -> Result<CalculationResult, AnalysisError> {
        let (request, generation) = {
            let mut inner = self.lock();
            if inner.state.loading {
                return Err(AnalysisError::Busy);
            }
            inner.state.loading = true;
            (AnalysisRequest { image, variable: inner.variables.clone() }, inner.generation)
        };
        info!(image_bytes = request.image.len(), variables = request.variable.len(), "analysis started");

        let outcome = match self.analyzer.analyze(&request).await {
            Ok(body) => parse_response(&body),
            Err(e) => Err(e),
        };

        let mut typeset = None;
        {
            let mut inner = self.lock();
            inner.state.loading = false;
            if inner.generation != generation {
                info!(ok = outcome.is_ok(), "analysis finished after reset, result dropped");
                return outcome;
            }
            match &outcome {
                Ok(result) => {
                    let text = display_text(result);
                    if inner.state.display_text().as_deref() != Some(text.as_str()) {
                        typeset = Some(text);
                    }
                    if result.assign {
                        inner.variables.insert(result.expression.clone(), result.answer.clone());
                    }
                    inner.state.result = Some(result.clone());
                    inner.state.error = None;
                    info!(expression = %result.expression, answer = %result.answer, "analysis finished");
                }
                Err(e) => {
                    inner.state.error = Some(e.user_message());
                    warn!(error = %e, code = e.error_code(), "analysis failed");
                }
            }
        }

        if let (Some(text), Some(typesetter)) = (typeset, self.typesetter.as_ref()) {
            typesetter.typeset(&text);
        }
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
