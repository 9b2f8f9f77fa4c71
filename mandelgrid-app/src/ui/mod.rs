mod alert;
mod canvas;
mod controls_panel;
mod history;
