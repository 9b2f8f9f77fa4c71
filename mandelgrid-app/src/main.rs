mod app;
mod controls;
mod direct_entry;
mod render_bridge;
mod ui;

fn main() -> eframe::Result {
    app::run()
}
