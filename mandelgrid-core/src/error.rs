use thiserror::Error;

/// Errors originating from viewport derivation, iteration setup, and the
/// history log.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid iteration limit: {0} (must be >= 1)")]
    InvalidLimit(u32),

    #[error("invalid dither factor: {0} (must be 1..=5)")]
    InvalidDither(u32),

    #[error("invalid divergence bound: {0} (must be positive and finite)")]
    InvalidDivergenceBound(f64),

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },

    #[error("history index {index} out of range (log holds {len} entries)")]
    HistoryIndex { index: usize, len: usize },
}
