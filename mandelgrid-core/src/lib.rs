pub mod complex;
pub mod error;
pub mod escape;
pub mod history;
pub mod mandelbrot;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use escape::{escape_count, EscapeEngine, EscapeParams};
pub use history::{HistoryEntry, HistoryLog, HistorySummary, HistoryWindow};
pub use mandelbrot::Mandelbrot;
pub use viewport::{DerivedViewport, ViewportRequest};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
