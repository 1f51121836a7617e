//! Native side of the math whiteboard.
//!
//! The drawing core lives in the `canvas` crate. This crate adds what runs
//! around it: the client for the analysis service that reads the board, the
//! result pipeline that owns the displayed answer and variable dictionary,
//! stroke-script replay through the engine, and the `mathboard` CLI.

pub mod analysis;
pub mod pipeline;
pub mod replay;
