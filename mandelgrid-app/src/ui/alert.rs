use eframe::egui;

use crate::app::MandelGridApp;

impl MandelGridApp {
    /// Modal-style notice for a rejected direct entry.
    pub(crate) fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Direct entry")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.colored_label(egui::Color32::from_rgb(255, 180, 50), message);
                ui.add_space(4.0);
                ui.label("Expected: center: [re, im], width: w, limit: n");
                ui.add_space(6.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        if dismissed || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.alert = None;
        }
    }
}
