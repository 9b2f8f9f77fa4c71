use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use mandelgrid_core::{
    DerivedViewport, EscapeEngine, HistoryLog, Mandelbrot, ViewportRequest,
};

use crate::buffer::RenderBuffer;
use crate::colorize::colorize;
use crate::error::RenderError;
use crate::grid::SampleGrid;
use crate::palette::{Palette, PaletteSettings, PaletteVariant};
use crate::renderer::{build_grid, RenderCancel};

// ---------------------------------------------------------------------------
// Busy guard
// ---------------------------------------------------------------------------

/// Holds the session's busy flag for the duration of a render.
///
/// Acquiring fails with [`RenderError::Busy`] while another guard is alive;
/// dropping the guard clears the flag.
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    pub fn acquire(flag: &Arc<AtomicBool>) -> crate::Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RenderError::Busy)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The view currently on screen: its geometry and its sampled counts.
#[derive(Debug, Clone)]
pub struct RenderedView {
    pub viewport: DerivedViewport,
    pub grid: SampleGrid,
    pub elapsed: Duration,
}

/// Engine context for one interactive session.
///
/// Owns the active palette, the last sampled grid and the history log.
/// Two operations touch the grid: [`render`](Self::render) replaces it,
/// [`recolor`](Self::recolor) only reads it. A failed or cancelled render
/// leaves every piece of state as it was.
#[derive(Debug)]
pub struct Session<E = Mandelbrot> {
    engine: E,
    palette: Palette,
    variant: PaletteVariant,
    current: Option<RenderedView>,
    history: HistoryLog,
    cancel: Arc<RenderCancel>,
    busy: Arc<AtomicBool>,
}

impl Default for Session<Mandelbrot> {
    fn default() -> Self {
        Self::new(Mandelbrot::default())
    }
}

impl<E: EscapeEngine + Sync> Session<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            palette: Palette::default(),
            variant: PaletteVariant::default(),
            current: None,
            history: HistoryLog::new(),
            cancel: Arc::new(RenderCancel::new()),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Swap the escape engine. The current grid stays until the next render.
    pub fn set_engine(&mut self, engine: E) {
        self.engine = engine;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn variant(&self) -> PaletteVariant {
        self.variant
    }

    pub fn current(&self) -> Option<&RenderedView> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Handle for abandoning an in-flight render from another thread.
    pub fn cancel_handle(&self) -> Arc<RenderCancel> {
        Arc::clone(&self.cancel)
    }

    /// Flag that is `true` while a render is running.
    pub fn busy_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.busy)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    // -- Recompute ----------------------------------------------------------

    /// Sample, colorize and record `request`.
    pub fn render(&mut self, request: &ViewportRequest) -> crate::Result<RenderBuffer> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let viewport = DerivedViewport::derive(request)?;
        debug!(
            x_min = request.x_min,
            y_min = request.y_min,
            real_width = request.real_width,
            limit = request.limit,
            width = viewport.width(),
            height = viewport.height(),
            dither = viewport.dither(),
            "Render requested"
        );

        let result = build_grid(&self.engine, &viewport, &self.cancel)?;
        let buffer = colorize(&result.grid, self.palette.colors(self.variant));

        let index = self.history.append(*request, viewport);
        info!(
            index,
            elapsed_ms = result.elapsed.as_millis(),
            "Render recorded"
        );
        self.current = Some(RenderedView {
            viewport,
            grid: result.grid,
            elapsed: result.elapsed,
        });
        Ok(buffer)
    }

    /// The request a click at pixel `(i, j)` of the current view produces.
    pub fn zoom_request(&self, i: u32, j: u32, zoom_factor: f64) -> crate::Result<ViewportRequest> {
        let current = self.current.as_ref().ok_or(RenderError::NoView)?;
        Ok(current.viewport.zoom_at(i, j, zoom_factor))
    }

    /// Recentre on pixel `(i, j)`, zoom in by `zoom_factor`, and render.
    pub fn zoom_at(&mut self, i: u32, j: u32, zoom_factor: f64) -> crate::Result<RenderBuffer> {
        let request = self.zoom_request(i, j, zoom_factor)?;
        self.render(&request)
    }

    /// Render history entry `index` again. The replay is appended as a new
    /// entry; the stored one is left untouched.
    pub fn reissue(&mut self, index: usize) -> crate::Result<RenderBuffer> {
        let request = self.history.reissue(index)?;
        debug!(index, "Re-issuing history entry");
        self.render(&request)
    }

    // -- Recolor ------------------------------------------------------------

    /// Regenerate the palette and repaint the current grid with it.
    ///
    /// Never calls the escape engine. Returns `None` if nothing has been
    /// rendered yet.
    pub fn recolor(&mut self, settings: PaletteSettings) -> Option<RenderBuffer> {
        self.palette = Palette::from_settings(settings);
        debug!(
            size = self.palette.len(),
            offset = self.palette.settings().offset_degrees,
            "Palette regenerated"
        );
        self.colorize_current()
    }

    /// Switch between the standard and muted sequences and repaint.
    pub fn set_variant(&mut self, variant: PaletteVariant) -> Option<RenderBuffer> {
        self.variant = variant;
        self.colorize_current()
    }

    /// Paint the current grid with the active palette.
    pub fn colorize_current(&self) -> Option<RenderBuffer> {
        self.current
            .as_ref()
            .map(|view| colorize(&view.grid, self.palette.colors(self.variant)))
    }

    // -- Reset --------------------------------------------------------------

    /// Abandon any in-flight render and forget the current view and the
    /// history. The palette is kept.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.current = None;
        self.history.clear();
        info!("Session reset");
    }
}
