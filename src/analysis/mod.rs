//! Analysis: client for the service that reads math off the board.
//!
//! DESIGN
//! ======
//! The board image goes out as a PNG data URL together with the variables
//! assigned so far; the service answers with a JSON array whose first entry is
//! the recognized expression and its result. [`Analyzer`] is the seam: the
//! pipeline only sees the trait, [`http::HttpAnalyzer`] is the production
//! implementation, tests substitute a mock.

pub mod config;
pub mod http;
pub mod parse;
pub mod types;

pub use config::AnalysisConfig;
pub use http::HttpAnalyzer;
pub use parse::parse_response;
pub use types::{AnalysisError, AnalysisRequest, Analyzer, CalculationResult};
