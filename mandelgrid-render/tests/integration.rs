use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use mandelgrid_core::{
    Complex, CoreError, EscapeEngine, EscapeParams, HistoryWindow, Mandelbrot, ViewportRequest,
};
use mandelgrid_render::{PaletteSettings, PaletteVariant, RenderCancel, RenderError, Session};

/// Wraps the real engine and counts how often it is called.
#[derive(Default)]
struct CountingEngine {
    inner: Mandelbrot,
    calls: AtomicUsize,
}

impl CountingEngine {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl EscapeEngine for CountingEngine {
    fn escape_count(&self, c: Complex, limit: u32) -> u32 {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.escape_count(c, limit)
    }
}

/// Reports an out-of-range count for every sample in the upper half-plane.
struct UpperHalfFaulty;

impl EscapeEngine for UpperHalfFaulty {
    fn escape_count(&self, c: Complex, limit: u32) -> u32 {
        if c.im > 0.0 {
            limit + 7
        } else {
            Mandelbrot::default().escape_count(c, limit)
        }
    }
}

/// Cancels the session's in-flight render on its first call once armed.
#[derive(Default)]
struct CancelsWhenArmed {
    cancel: OnceLock<Arc<RenderCancel>>,
    armed: AtomicBool,
}

impl EscapeEngine for CancelsWhenArmed {
    fn escape_count(&self, c: Complex, limit: u32) -> u32 {
        if self.armed.swap(false, Ordering::SeqCst) {
            if let Some(cancel) = self.cancel.get() {
                cancel.cancel();
            }
        }
        Mandelbrot::default().escape_count(c, limit)
    }
}

fn session() -> Session {
    Session::default()
}

fn initial_request() -> ViewportRequest {
    ViewportRequest::new(-2.3, -1.2, 3.2, 70, 200, 2)
}

#[test]
fn end_to_end_render_is_not_all_black() {
    let mut session = session();
    let buffer = session.render(&initial_request()).unwrap();

    assert_eq!(buffer.width, 200);
    assert_eq!(buffer.height, 150);
    let has_non_black = buffer
        .pixels
        .chunks_exact(4)
        .any(|px| px[0] > 0 || px[1] > 0 || px[2] > 0);
    assert!(has_non_black, "rendered image should contain non-black pixels");

    // The pixel nearest c = -0.1 + 0i lies inside the main cardioid.
    let view = session.current().unwrap();
    let i = ((-0.1 - view.viewport.request.x_min) / view.viewport.incr_per_pixel).round() as u32;
    let j = ((view.viewport.y_max - 0.0) / view.viewport.incr_per_pixel).round() as u32;
    assert_eq!(buffer.pixel(i, j), [0, 0, 0, 255]);
}

#[test]
fn recolor_never_calls_the_engine() {
    let mut session = Session::new(CountingEngine::default());
    session.render(&initial_request()).unwrap();
    let after_render = session.engine().calls();
    assert_eq!(after_render, 200 * 150 * 4);

    session.recolor(PaletteSettings::new(100, 45.0)).unwrap();
    session.set_variant(PaletteVariant::Alt).unwrap();
    session.recolor(PaletteSettings::new(3000, -120.0)).unwrap();
    assert_eq!(session.engine().calls(), after_render);
    assert_eq!(session.history().len(), 1, "recolor must not add history");
}

#[test]
fn reissue_reproduces_pixels() {
    let mut session = session();
    let first = session.render(&initial_request()).unwrap();
    session.zoom_at(60, 70, 4.0).unwrap();
    session.zoom_at(100, 75, 2.0).unwrap();

    let replay = session.reissue(0).unwrap();
    assert_eq!(replay, first);
    assert_eq!(session.history().len(), 4);
    assert_eq!(
        session.history().get(3).unwrap().request,
        session.history().get(0).unwrap().request
    );
}

#[test]
fn reissue_out_of_range_is_rejected() {
    let mut session = session();
    session.render(&initial_request()).unwrap();
    assert_eq!(
        session.reissue(5),
        Err(RenderError::Core(CoreError::HistoryIndex { index: 5, len: 1 }))
    );
    assert_eq!(session.history().len(), 1);
}

#[test]
fn cancelled_render_leaves_session_unchanged() {
    let mut session = Session::new(CancelsWhenArmed::default());
    session
        .engine()
        .cancel
        .set(session.cancel_handle())
        .unwrap();
    let first = session.render(&initial_request()).unwrap();
    let view = session.current().unwrap().viewport;

    session.engine().armed.store(true, Ordering::SeqCst);
    let result = session.render(&ViewportRequest::new(-1.0, -0.5, 1.0, 200, 120, 3));

    assert_eq!(result, Err(RenderError::Cancelled));
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.current().unwrap().viewport, view);
    assert_eq!(session.colorize_current().unwrap(), first);
    assert!(!session.is_busy());

    // The next request renders normally.
    session.render(&initial_request()).unwrap();
    assert_eq!(session.history().len(), 2);
}

#[test]
fn faulty_samples_are_discarded_and_darken() {
    let mut session = Session::new(UpperHalfFaulty);
    let buffer = session.render(&initial_request()).unwrap();
    let grid = &session.current().unwrap().grid;

    assert!(grid.discarded() > 0);
    assert_eq!(grid.total_samples() + grid.discarded(), 200 * 150 * 4);
    // Top-left pixel: all four samples are in the upper half-plane.
    assert!(grid.counts(0, 0).is_empty());
    assert_eq!(buffer.pixel(0, 0), [0, 0, 0, 255]);
    // Bottom rows are sampled normally.
    assert_eq!(grid.counts(0, 149).len(), 4);
}

#[test]
fn legacy_bound_changes_counts() {
    let request = initial_request();
    let mut standard = session();
    let mut legacy = Session::new(Mandelbrot::new(EscapeParams::legacy()));

    let a = standard.render(&request).unwrap();
    let b = legacy.render(&request).unwrap();
    assert_ne!(a, b);
}

#[test]
fn history_window_tracks_renders() {
    let mut session = session();
    session.render(&initial_request()).unwrap();
    for _ in 0..11 {
        session.zoom_at(100, 75, 1.5).unwrap();
    }
    let history = session.history();
    assert_eq!(history.len(), 12);
    assert_eq!(history.window(HistoryWindow::Last10).len(), 10);
    assert_eq!(history.window(HistoryWindow::Last10)[0].index, 2);
    assert_eq!(history.window(HistoryWindow::Last)[0].index, 11);
    assert!(history.window(HistoryWindow::None).is_empty());
}
