use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use mandelgrid_core::{DerivedViewport, EscapeEngine};

use crate::error::RenderError;
use crate::grid::{sample_row, RowSamples, SampleGrid};

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Tracks the current render generation for cancellation and progress.
///
/// Incrementing the generation signals an in-flight build to stop at the
/// next row boundary. The progress counters let the UI display a
/// progress bar.
#[derive(Debug)]
pub struct RenderCancel {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            progress_done: AtomicUsize::new(0),
            progress_total: AtomicUsize::new(0),
        }
    }

    /// Cancel the current render by advancing the generation.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Read the current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reset progress for a new phase with `total` work units.
    pub fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    /// Increment completed work units by one.
    pub fn inc_progress(&self) {
        self.progress_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the current progress as `(done, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// The result of sampling a full frame.
///
/// Contains raw escape counts (no coloring); apply a palette through
/// [`colorize`](crate::colorize::colorize) to get displayable pixels.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub grid: SampleGrid,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Full-frame sampling
// ---------------------------------------------------------------------------

/// Sample every pixel of `viewport` on its dither lattice.
///
/// Rows are independent and processed in parallel via Rayon; the result is
/// identical to a sequential pass because rows are reassembled in order and
/// the histogram is tallied afterwards. Generic over the engine for static
/// dispatch.
///
/// Returns [`RenderError::Cancelled`] if `cancel` advanced its generation
/// while the build was running; no partial grid is returned.
pub fn build_grid<E: EscapeEngine + Sync>(
    engine: &E,
    viewport: &DerivedViewport,
    cancel: &RenderCancel,
) -> crate::Result<RenderResult> {
    let start = Instant::now();
    let gen = cancel.generation();
    let height = viewport.height();

    debug!(
        width = viewport.width(),
        height,
        dither = viewport.dither(),
        limit = viewport.limit(),
        "Starting grid build"
    );
    cancel.reset_progress(height as usize);

    let rows: Vec<Option<RowSamples>> = (0..height)
        .into_par_iter()
        .map(|j| {
            if cancel.generation() != gen {
                return None;
            }
            let row = sample_row(engine, viewport, j);
            cancel.inc_progress();
            Some(row)
        })
        .collect();

    if cancel.generation() != gen {
        debug!("Grid build cancelled");
        return Err(RenderError::Cancelled);
    }
    let rows: Option<Vec<RowSamples>> = rows.into_iter().collect();
    let rows = rows.ok_or(RenderError::Cancelled)?;

    let grid = SampleGrid::from_rows(viewport, rows);
    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        samples = grid.total_samples(),
        discarded = grid.discarded(),
        "Grid build complete"
    );

    Ok(RenderResult { grid, elapsed })
}
