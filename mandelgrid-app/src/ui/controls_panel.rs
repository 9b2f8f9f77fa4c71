use std::time::Instant;

use eframe::egui;

use mandelgrid_core::{EscapeParams, HistoryWindow};
use mandelgrid_render::PaletteVariant;

use crate::app::{MandelGridApp, CONTROLS_WIDTH};

const FIELD_WIDTH: f32 = 90.0;
const PREVIEW_SAMPLES: usize = 128;
const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 90, 70);

/// A labelled single-line input. Returns `true` once editing finishes.
fn text_field(ui: &mut egui::Ui, label: &str, text: &mut String) -> bool {
    ui.label(label);
    let resp = ui.add(egui::TextEdit::singleline(text).desired_width(FIELD_WIDTH));
    ui.end_row();
    resp.lost_focus()
}

impl MandelGridApp {
    pub(crate) fn show_controls_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("controls")
            .resizable(false)
            .exact_width(CONTROLS_WIDTH)
            .show(ctx, |ui| {
                ui.heading("MandelGrid");
                ui.add_space(6.0);

                self.draw_render_controls(ui);
                ui.separator();
                self.draw_palette_controls(ui);
                ui.separator();
                self.draw_direct_entry(ui);
                ui.separator();
                self.draw_status(ui);
            });
    }

    fn draw_render_controls(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("render_controls")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                if text_field(ui, "Limit", &mut self.text.limit) {
                    self.controls.set_limit(&self.text.limit);
                    self.text.limit = self.controls.limit.to_string();
                }
                if text_field(ui, "Zoom factor", &mut self.text.zoom_factor) {
                    self.controls.set_zoom_factor(&self.text.zoom_factor);
                    self.text.zoom_factor = self.controls.zoom_factor.to_string();
                }
                if text_field(ui, "Quality (1-5)", &mut self.text.dither) {
                    self.controls.set_dither(&self.text.dither);
                    self.text.dither = self.controls.dither.to_string();
                }

                ui.label("Pixel width");
                let warning = self.pixel_width.warning();
                let mut edit =
                    egui::TextEdit::singleline(&mut self.pixel_width.text).desired_width(FIELD_WIDTH);
                if warning {
                    edit = edit.text_color(WARNING_COLOR);
                }
                let resp = ui.add(edit);
                ui.end_row();
                if warning {
                    ui.label("");
                    ui.colored_label(WARNING_COLOR, "must be an integer > 3");
                    ui.end_row();
                }
                if resp.lost_focus() {
                    if let Some(width) = self.pixel_width.commit(Instant::now()) {
                        self.resize(width);
                    }
                }

                ui.label("Escape bound");
                let mut bound = self.escape_bound;
                egui::ComboBox::from_id_salt(egui::Id::new("escape_bound"))
                    .selected_text(format!("|z|\u{00b2} > {bound}"))
                    .show_ui(ui, |ui| {
                        for choice in [
                            EscapeParams::DEFAULT_DIVERGENCE_BOUND,
                            EscapeParams::LEGACY_DIVERGENCE_BOUND,
                        ] {
                            ui.selectable_value(&mut bound, choice, format!("|z|\u{00b2} > {choice}"));
                        }
                    });
                ui.end_row();
                if bound != self.escape_bound {
                    self.set_escape_bound(bound);
                }

                ui.label("History");
                egui::ComboBox::from_id_salt(egui::Id::new("history_window"))
                    .selected_text(self.controls.history.label())
                    .show_ui(ui, |ui| {
                        for window in HistoryWindow::ALL {
                            ui.selectable_value(&mut self.controls.history, window, window.label());
                        }
                    });
                ui.end_row();
            });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let busy = self.is_busy();
            if ui
                .add_enabled(!busy, egui::Button::new("Redraw"))
                .on_disabled_hover_text("A render is in progress")
                .clicked()
            {
                self.redraw();
            }
            if ui.button("Reset").clicked() {
                self.reset();
            }
        });
    }

    fn draw_palette_controls(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;
        egui::Grid::new("palette_controls")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                changed |= text_field(ui, "Palette size", &mut self.text.palette_size);
                changed |= text_field(ui, "Phase offset (\u{00b0})", &mut self.text.palette_offset);
            });
        if changed {
            self.controls
                .set_palette(&self.text.palette_size, &self.text.palette_offset);
            self.text.palette_size = self.controls.palette.size.to_string();
            self.text.palette_offset = self.controls.palette.offset_degrees.to_string();
            self.request_recolor();
        }

        let mut muted = self.variant == PaletteVariant::Alt;
        if ui.checkbox(&mut muted, "Muted palette").changed() {
            self.variant = if muted {
                PaletteVariant::Alt
            } else {
                PaletteVariant::Standard
            };
            self.request_variant();
        }

        let colors = self.preview_palette.preview_colors(self.variant, PREVIEW_SAMPLES);
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), 12.0),
            egui::Sense::hover(),
        );
        let painter = ui.painter_at(rect);
        let step = rect.width() / colors.len().max(1) as f32;
        for (k, [r, g, b, _]) in colors.into_iter().enumerate() {
            let x = rect.min.x + k as f32 * step;
            let cell = egui::Rect::from_min_max(
                egui::pos2(x, rect.min.y),
                egui::pos2(x + step + 0.5, rect.max.y),
            );
            painter.rect_filled(cell, 0.0, egui::Color32::from_rgb(r, g, b));
        }
    }

    fn draw_direct_entry(&mut self, ui: &mut egui::Ui) {
        ui.label("Go to");
        let resp = ui.add(
            egui::TextEdit::multiline(&mut self.direct_entry_text)
                .desired_rows(2)
                .desired_width(ui.available_width())
                .hint_text("center: [-0.75, 0.1], width: 0.5, limit: 200"),
        );
        let enter = resp.has_focus()
            && ui.input(|i| i.key_pressed(egui::Key::Enter) && i.modifiers.command);
        if ui.button("Go").clicked() || enter {
            self.submit_direct_entry();
        }
    }

    fn draw_status(&mut self, ui: &mut egui::Ui) {
        ui.label(format!("Status: {}", self.render_phase.label()));
        if let Some(view) = self.current_view {
            ui.label(format!(
                "Image: {} x {} at {} samples/pixel",
                view.width(),
                view.height(),
                view.dither() * view.dither()
            ));
            ui.label(format!("Render time: {:.0} ms", self.render_time.as_secs_f64() * 1000.0));
        }
        if self.discarded > 0 {
            ui.colored_label(
                WARNING_COLOR,
                format!("{} out-of-range samples discarded", self.discarded),
            );
        }
        if let Some(err) = &self.last_error {
            ui.colored_label(WARNING_COLOR, err);
        }
    }
}
