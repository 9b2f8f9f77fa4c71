use std::sync::mpsc;
use std::time::Duration;

use eframe::egui;
use tracing::{debug, info, warn};

use mandelgrid_core::{DerivedViewport, EscapeParams, HistoryLog, Mandelbrot, ViewportRequest};
use mandelgrid_render::{
    PaletteSettings, PaletteVariant, RenderBuffer, RenderError, Session,
};

use crate::app::MandelGridApp;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderPhase {
    Idle,
    Rendering,
    Done,
}

impl RenderPhase {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Rendering => "Rendering\u{2026}",
            Self::Done => "Done",
        }
    }
}

/// Work sent to the session thread.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Job {
    Render { id: u64, request: ViewportRequest },
    Reissue { id: u64, index: usize },
    Recolor(PaletteSettings),
    SetVariant(PaletteVariant),
    SetEngine(EscapeParams),
    Reset,
}

impl Job {
    fn is_render(&self) -> bool {
        matches!(self, Self::Render { .. } | Self::Reissue { .. })
    }
}

pub(crate) enum Response {
    Rendered {
        id: u64,
        buffer: RenderBuffer,
        viewport: DerivedViewport,
        history: HistoryLog,
        elapsed: Duration,
        discarded: usize,
    },
    Recolored(RenderBuffer),
    Failed { id: u64, error: RenderError },
    Cleared,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Background thread owning the session.
///
/// Jobs that pile up while a render runs are collapsed: every render but
/// the last one queued is skipped, and a queued reset supersedes any
/// render queued before it. Other jobs run in order.
pub(crate) fn render_worker(
    ctx: egui::Context,
    rx: mpsc::Receiver<Job>,
    tx: mpsc::Sender<Response>,
    mut session: Session,
) {
    while let Ok(initial) = rx.recv() {
        for job in drain_pending(initial, &rx) {
            if let Some(resp) = run_job(&mut session, job) {
                if tx.send(resp).is_err() {
                    return;
                }
                ctx.request_repaint();
            }
        }
    }
    debug!("Render worker exiting");
}

fn drain_pending(initial: Job, rx: &mpsc::Receiver<Job>) -> Vec<Job> {
    let mut jobs = vec![initial];
    while let Ok(next) = rx.try_recv() {
        jobs.push(next);
    }
    let last_render = jobs
        .iter()
        .rposition(|j| j.is_render() || *j == Job::Reset);
    jobs.into_iter()
        .enumerate()
        .filter(|(i, job)| !job.is_render() || Some(*i) == last_render)
        .map(|(_, job)| job)
        .collect()
}

fn run_job(session: &mut Session, job: Job) -> Option<Response> {
    match job {
        Job::Render { id, request } => Some(rendered(session, id, |s| s.render(&request))),
        Job::Reissue { id, index } => Some(rendered(session, id, |s| s.reissue(index))),
        Job::Recolor(settings) => session.recolor(settings).map(Response::Recolored),
        Job::SetVariant(variant) => session.set_variant(variant).map(Response::Recolored),
        Job::SetEngine(params) => {
            info!(bound = params.divergence_bound, "Escape engine changed");
            session.set_engine(Mandelbrot::new(params));
            None
        }
        Job::Reset => {
            session.reset();
            Some(Response::Cleared)
        }
    }
}

fn rendered(
    session: &mut Session,
    id: u64,
    f: impl FnOnce(&mut Session) -> mandelgrid_render::Result<RenderBuffer>,
) -> Response {
    match f(session) {
        Ok(buffer) => match session.current() {
            Some(view) => Response::Rendered {
                id,
                buffer,
                viewport: view.viewport,
                history: session.history().clone(),
                elapsed: view.elapsed,
                discarded: view.grid.discarded(),
            },
            None => Response::Failed {
                id,
                error: RenderError::NoView,
            },
        },
        Err(error) => Response::Failed { id, error },
    }
}

// ---------------------------------------------------------------------------
// impl MandelGridApp — render dispatch & polling
// ---------------------------------------------------------------------------

impl MandelGridApp {
    fn next_render_id(&mut self) -> u64 {
        self.cancel.cancel();
        self.render_id += 1;
        self.render_phase = RenderPhase::Rendering;
        self.render_id
    }

    pub(crate) fn request_render(&mut self, request: ViewportRequest) {
        let id = self.next_render_id();
        debug!(
            id,
            x_min = request.x_min,
            y_min = request.y_min,
            real_width = request.real_width,
            limit = request.limit,
            "Requesting render"
        );
        self.send(Job::Render { id, request });
    }

    pub(crate) fn request_reissue(&mut self, index: usize) {
        let id = self.next_render_id();
        debug!(id, index, "Requesting re-issue");
        self.send(Job::Reissue { id, index });
    }

    pub(crate) fn request_recolor(&mut self) {
        self.preview_palette = mandelgrid_render::Palette::from_settings(self.controls.palette);
        self.send(Job::Recolor(self.controls.palette));
    }

    pub(crate) fn request_variant(&mut self) {
        self.send(Job::SetVariant(self.variant));
    }

    pub(crate) fn request_engine(&mut self, params: EscapeParams) {
        self.send(Job::SetEngine(params));
    }

    pub(crate) fn request_reset(&mut self) {
        self.cancel.cancel();
        self.send(Job::Reset);
    }

    fn send(&self, job: Job) {
        if self.tx_job.send(job).is_err() {
            warn!("Render worker is gone; dropping job");
        }
    }

    pub(crate) fn poll_responses(&mut self, ctx: &egui::Context) {
        while let Ok(resp) = self.rx_response.try_recv() {
            match resp {
                Response::Rendered {
                    id,
                    buffer,
                    viewport,
                    history,
                    elapsed,
                    discarded,
                } => {
                    // History is authoritative even for superseded renders.
                    self.history = history;
                    if id == self.render_id {
                        self.apply_buffer(ctx, &buffer);
                        self.current_view = Some(viewport);
                        self.render_time = elapsed;
                        self.discarded = discarded;
                        self.render_phase = RenderPhase::Done;
                        self.last_error = None;
                    }
                }
                Response::Recolored(buffer) => self.apply_buffer(ctx, &buffer),
                Response::Failed { id, error } => {
                    if id == self.render_id {
                        self.render_phase = RenderPhase::Done;
                        if error != RenderError::Cancelled {
                            warn!(%error, "Render failed");
                            self.last_error = Some(error.to_string());
                        }
                    }
                }
                Response::Cleared => {
                    self.history = HistoryLog::new();
                    self.current_view = None;
                    self.texture = None;
                }
            }
        }
    }

    fn apply_buffer(&mut self, ctx: &egui::Context, buffer: &RenderBuffer) {
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [buffer.width as usize, buffer.height as usize],
            &buffer.pixels,
        );
        self.texture = Some(ctx.load_texture("mandelgrid", image, egui::TextureOptions::NEAREST));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(id: u64) -> Job {
        Job::Render {
            id,
            request: ViewportRequest::new(-2.3, -1.2, 3.2, 70, 40, 1),
        }
    }

    fn drained(jobs: Vec<Job>) -> Vec<Job> {
        let (tx, rx) = mpsc::channel();
        let mut jobs = jobs.into_iter();
        let first = jobs.next().unwrap();
        for job in jobs {
            tx.send(job).unwrap();
        }
        drain_pending(first, &rx)
    }

    #[test]
    fn only_latest_render_survives() {
        let jobs = drained(vec![
            render(1),
            Job::Recolor(PaletteSettings::default()),
            render(2),
            Job::Reissue { id: 3, index: 0 },
        ]);
        assert_eq!(
            jobs,
            vec![
                Job::Recolor(PaletteSettings::default()),
                Job::Reissue { id: 3, index: 0 },
            ]
        );
    }

    #[test]
    fn reset_supersedes_earlier_renders() {
        let jobs = drained(vec![render(1), Job::Reset]);
        assert_eq!(jobs, vec![Job::Reset]);

        let jobs = drained(vec![Job::Reset, render(2)]);
        assert_eq!(jobs, vec![Job::Reset, render(2)]);
    }

    #[test]
    fn worker_jobs_drive_session() {
        let mut session = Session::default();
        assert!(run_job(&mut session, Job::Recolor(PaletteSettings::default())).is_none());

        match run_job(&mut session, render(1)) {
            Some(Response::Rendered { id, history, .. }) => {
                assert_eq!(id, 1);
                assert_eq!(history.len(), 1);
            }
            _ => panic!("expected a rendered response"),
        }

        assert!(run_job(&mut session, Job::SetEngine(EscapeParams::legacy())).is_none());
        assert_eq!(session.engine().params().divergence_bound, 12.0);

        assert!(matches!(
            run_job(&mut session, Job::SetVariant(PaletteVariant::Alt)),
            Some(Response::Recolored(_))
        ));
        assert!(matches!(
            run_job(&mut session, Job::Reissue { id: 2, index: 9 }),
            Some(Response::Failed { id: 2, .. })
        ));
        assert!(matches!(run_job(&mut session, Job::Reset), Some(Response::Cleared)));
        assert!(session.history().is_empty());
    }
}
