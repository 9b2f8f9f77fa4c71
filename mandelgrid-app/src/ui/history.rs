use eframe::egui;

use crate::app::MandelGridApp;

const HEADERS: [&str; 6] = [
    "#",
    "Center Point",
    "Width",
    "Limit",
    "Pixel Dimensions",
    "Quality",
];

impl MandelGridApp {
    /// Past renders selected by the history option. Clicking a row
    /// renders that entry again.
    pub(crate) fn draw_history(&mut self, ui: &mut egui::Ui) {
        let entries = self.history.window(self.controls.history);
        if entries.is_empty() {
            return;
        }

        let mut reissue = None;
        ui.heading("History");
        egui::Grid::new("history_table")
            .striped(true)
            .num_columns(HEADERS.len())
            .spacing([16.0, 4.0])
            .show(ui, |ui| {
                for header in HEADERS {
                    ui.strong(header);
                }
                ui.end_row();

                for entry in entries {
                    let s = entry.summary();
                    let cells = [
                        s.number.to_string(),
                        s.center,
                        s.width,
                        s.limit.to_string(),
                        s.pixel_dimensions,
                        s.dither.to_string(),
                    ];
                    let mut clicked = false;
                    for cell in cells {
                        let resp = ui
                            .add(egui::Label::new(cell).sense(egui::Sense::click()))
                            .on_hover_cursor(egui::CursorIcon::PointingHand);
                        clicked |= resp.clicked();
                    }
                    if clicked {
                        reissue = Some(entry.index);
                    }
                    ui.end_row();
                }
            });

        if let Some(index) = reissue {
            self.request_reissue(index);
        }
    }
}
