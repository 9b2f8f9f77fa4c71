use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui;
use tracing::info;

use mandelgrid_core::{DerivedViewport, EscapeParams, HistoryLog};
use mandelgrid_render::{Palette, PaletteVariant, RenderCancel, Session};

use crate::controls::{
    width_from_available, AppDefaults, ControlText, ControlValues, PixelWidthField,
    MIN_INITIAL_WIDTH,
};
use crate::direct_entry;
use crate::render_bridge::{render_worker, Job, RenderPhase, Response};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub(crate) const CONTROLS_WIDTH: f32 = 260.0;
pub(crate) const PROGRESS_BAR_HEIGHT: f32 = 3.0;
const WINDOW_SIZE: [f32; 2] = [1200.0, 900.0];

// ---------------------------------------------------------------------------
// Application struct
// ---------------------------------------------------------------------------

pub(crate) struct MandelGridApp {
    // Controls
    pub(crate) defaults: AppDefaults,
    pub(crate) controls: ControlValues,
    pub(crate) text: ControlText,
    pub(crate) pixel_width: PixelWidthField,
    pub(crate) escape_bound: f64,
    pub(crate) variant: PaletteVariant,
    pub(crate) preview_palette: Palette,
    pub(crate) direct_entry_text: String,
    pub(crate) alert: Option<String>,

    // Render state
    pub(crate) tx_job: mpsc::Sender<Job>,
    pub(crate) rx_response: mpsc::Receiver<Response>,
    pub(crate) cancel: Arc<RenderCancel>,
    pub(crate) busy: Arc<AtomicBool>,
    pub(crate) render_id: u64,
    pub(crate) render_phase: RenderPhase,
    pub(crate) render_time: Duration,
    pub(crate) discarded: usize,
    pub(crate) last_error: Option<String>,
    pub(crate) texture: Option<egui::TextureHandle>,

    // View state mirrored from the session
    pub(crate) current_view: Option<DerivedViewport>,
    pub(crate) history: HistoryLog,

    /// Canvas width seen on the previous frame, for reset.
    pub(crate) available_width: f32,
    started: bool,
}

impl MandelGridApp {
    pub(crate) fn new(egui_ctx: &egui::Context) -> Self {
        let (tx_job, rx_job) = mpsc::channel();
        let (tx_resp, rx_resp) = mpsc::channel();

        let session = Session::default();
        let cancel = session.cancel_handle();
        let busy = session.busy_flag();

        let ctx = egui_ctx.clone();
        thread::spawn(move || {
            render_worker(ctx, rx_job, tx_resp, session);
        });

        let defaults = AppDefaults::default();
        let controls = ControlValues::from_defaults(&defaults);
        Self {
            defaults,
            controls,
            text: ControlText::from_values(&controls),
            pixel_width: PixelWidthField::new(MIN_INITIAL_WIDTH),
            escape_bound: EscapeParams::DEFAULT_DIVERGENCE_BOUND,
            variant: PaletteVariant::Standard,
            preview_palette: Palette::from_settings(controls.palette),
            direct_entry_text: String::new(),
            alert: None,

            tx_job,
            rx_response: rx_resp,
            cancel,
            busy,
            render_id: 0,
            render_phase: RenderPhase::Idle,
            render_time: Duration::ZERO,
            discarded: 0,
            last_error: None,
            texture: None,

            current_view: None,
            history: HistoryLog::new(),

            available_width: 0.0,
            started: false,
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    // -- Actions ------------------------------------------------------------

    /// Redraw the current window with the limit and dither from the
    /// controls.
    pub(crate) fn redraw(&mut self) {
        let base = match self.current_view {
            Some(view) => view.request,
            None => self.defaults.initial_request(self.pixel_width.value()),
        };
        let request = self
            .controls
            .apply(base)
            .with_pixel_width(self.pixel_width.value());
        self.request_render(request);
    }

    /// Zoom in on pixel `(i, j)` of the displayed image.
    pub(crate) fn zoom_at(&mut self, i: u32, j: u32) {
        let Some(view) = self.current_view else {
            return;
        };
        let request = self
            .controls
            .zoom_request(&view, i, j, self.pixel_width.value());
        self.request_render(request);
    }

    /// Re-render the current window at a new pixel width.
    pub(crate) fn resize(&mut self, pixel_width: u32) {
        let base = match self.current_view {
            Some(view) => view.request,
            None => self.defaults.initial_request(pixel_width),
        };
        self.request_render(base.with_pixel_width(pixel_width));
    }

    pub(crate) fn submit_direct_entry(&mut self) {
        match direct_entry::parse(&self.direct_entry_text) {
            Ok(entry) => {
                self.controls.limit = entry.limit;
                self.text.limit = entry.limit.to_string();
                let request = entry.to_request(self.pixel_width.value(), self.controls.dither);
                self.request_render(request);
            }
            Err(e) => {
                info!(error = %e, "Direct entry rejected");
                self.alert = Some(e.to_string());
            }
        }
    }

    pub(crate) fn set_escape_bound(&mut self, bound: f64) {
        let params = match EscapeParams::new(bound) {
            Ok(params) => params,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return;
            }
        };
        self.escape_bound = bound;
        self.request_engine(params);
        if let Some(view) = self.current_view {
            self.request_render(view.request);
        }
    }

    /// Restore every control to its default, forget history and draw the
    /// initial view.
    pub(crate) fn reset(&mut self) {
        info!("Resetting to initial view");
        self.request_reset();

        self.controls = ControlValues::from_defaults(&self.defaults);
        self.text = ControlText::from_values(&self.controls);
        let width = width_from_available(self.available_width);
        self.pixel_width = PixelWidthField::new(width);
        self.request_recolor();

        self.request_render(self.defaults.initial_request(width));
    }

    // -- Frame --------------------------------------------------------------

    fn start(&mut self, available_width: f32) {
        self.started = true;
        self.available_width = available_width;
        let width = width_from_available(available_width);
        self.pixel_width.set(width);
        info!(width, "Drawing initial view");
        self.request_render(self.defaults.initial_request(width));
    }
}

// ---------------------------------------------------------------------------
// eframe::App
// ---------------------------------------------------------------------------

impl eframe::App for MandelGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_responses(ctx);
        self.pixel_width.tick(Instant::now());

        self.show_controls_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let available_width = ui.available_width();
            if !self.started {
                self.start(available_width);
            }
            self.available_width = available_width;

            egui::ScrollArea::both().show(ui, |ui| {
                self.draw_canvas(ui);
                ui.add_space(8.0);
                self.draw_history(ui);
            });
        });

        self.show_alert(ctx);

        if self.render_phase == RenderPhase::Rendering || self.pixel_width.is_pending() {
            ctx.request_repaint();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub(crate) fn run() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting MandelGrid");

    let viewport = egui::ViewportBuilder::default()
        .with_title("MandelGrid")
        .with_inner_size(WINDOW_SIZE);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "MandelGrid",
        options,
        Box::new(|cc| Ok(Box::new(MandelGridApp::new(&cc.egui_ctx)))),
    )
}
