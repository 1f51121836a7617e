//! Errors surfaced by the canvas crate's fallible exports.

/// Failure while encoding or restoring canvas pixels.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// The bitmap could not be encoded as PNG.
    #[error("PNG encoding failed: {0}")]
    Encode(String),

    /// A history snapshot could not be decoded back into pixels.
    #[error("PNG decoding failed: {0}")]
    Decode(String),

    /// An operation needed the bitmap before `initialize` created it.
    #[error("canvas bitmap is not initialized")]
    Uninitialized,
}
