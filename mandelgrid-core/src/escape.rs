use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;
use crate::mandelbrot::Mandelbrot;

/// Parameters controlling the escape-time iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscapeParams {
    /// An orbit has escaped once `|z|²` exceeds this value.
    pub divergence_bound: f64,
}

impl EscapeParams {
    /// `|z|² > 4`, i.e. escape radius 2.
    pub const DEFAULT_DIVERGENCE_BOUND: f64 = 4.0;
    /// Bound used by early versions of the renderer. Shifts the contrast
    /// bands outward by roughly one iteration.
    pub const LEGACY_DIVERGENCE_BOUND: f64 = 12.0;

    pub fn new(divergence_bound: f64) -> crate::Result<Self> {
        if divergence_bound <= 0.0 || !divergence_bound.is_finite() {
            return Err(CoreError::InvalidDivergenceBound(divergence_bound));
        }
        Ok(Self { divergence_bound })
    }

    pub fn legacy() -> Self {
        Self {
            divergence_bound: Self::LEGACY_DIVERGENCE_BOUND,
        }
    }
}

impl Default for EscapeParams {
    fn default() -> Self {
        Self {
            divergence_bound: Self::DEFAULT_DIVERGENCE_BOUND,
        }
    }
}

/// Per-sample escape-time function.
///
/// The grid builder is generic over this trait (static dispatch), so the
/// hot loop inlines. Implementations must be pure: the same point and
/// limit always yield the same count, and calls share no mutable state.
pub trait EscapeEngine {
    /// Number of completed iterations before the orbit of `c` diverged,
    /// or `limit` if it never did. Expected to lie in `[0, limit]`.
    fn escape_count(&self, c: Complex, limit: u32) -> u32;
}

/// Canonical escape count for `x + yi` with the standard bound.
pub fn escape_count(x: f64, y: f64, limit: u32) -> u32 {
    Mandelbrot::default().escape_count(Complex::new(x, y), limit)
}
