use eframe::egui;

use crate::app::{MandelGridApp, PROGRESS_BAR_HEIGHT};
use crate::render_bridge::RenderPhase;

impl MandelGridApp {
    /// The rendered image, one texel per point. A click zooms on the
    /// clicked pixel.
    pub(crate) fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let Some(tex) = self.texture.as_ref() else {
            ui.label(self.render_phase.label());
            return;
        };

        let [w, h] = tex.size();
        let size = egui::vec2(w as f32, h as f32);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
        let painter = ui.painter_at(rect);

        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(tex.id(), rect, uv, egui::Color32::WHITE);

        if self.render_phase == RenderPhase::Rendering {
            let (done, total) = self.cancel.progress();
            if total > 0 {
                let frac = (done as f32 / total as f32).clamp(0.0, 1.0);
                let bar_y = rect.max.y - PROGRESS_BAR_HEIGHT;

                let bg_rect = egui::Rect::from_min_size(
                    egui::pos2(rect.min.x, bar_y),
                    egui::vec2(rect.width(), PROGRESS_BAR_HEIGHT),
                );
                painter.rect_filled(
                    bg_rect,
                    0.0,
                    egui::Color32::from_rgba_premultiplied(0, 0, 0, 120),
                );
                if frac > 0.0 {
                    let fill_rect = egui::Rect::from_min_size(
                        egui::pos2(rect.min.x, bar_y),
                        egui::vec2(rect.width() * frac, PROGRESS_BAR_HEIGHT),
                    );
                    painter.rect_filled(fill_rect, 0.0, egui::Color32::from_rgb(80, 200, 255));
                }
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = pos - rect.min;
                let i = (local.x.max(0.0) as u32).min(w.saturating_sub(1) as u32);
                let j = (local.y.max(0.0) as u32).min(h.saturating_sub(1) as u32);
                self.zoom_at(i, j);
            }
        }
    }
}
