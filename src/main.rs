mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::Path;

use app::HouseScopeApp;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let mut state = AppState::default();

    // Optional dataset path on the command line; otherwise File → Open.
    if let Some(path) = std::env::args().nth(1) {
        match data::loader::load_file(Path::new(&path)) {
            Ok(dataset) => {
                log::info!("Loaded {} sales from {path}", dataset.len());
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {path}: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "HouseScope – Housing Sales Explorer",
        options,
        Box::new(move |_cc| Ok(Box::new(HouseScopeApp::new(state)))),
    )
}
