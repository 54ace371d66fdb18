mod app;
/// Fixed policy constants: rank window, truncation limits, file names and
/// report text. They are applied verbatim.
mod config;
mod data;
/// Result exports: the paginated PDF report plus CSV and JSON dumps.
mod export;
mod state;
mod ui;

use app::CutoffPredictorApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "TG EAPCET 2024 – College Predictor",
        options,
        Box::new(|_cc| Ok(Box::new(CutoffPredictorApp::new()))),
    )
}
