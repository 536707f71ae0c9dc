use card_canvas::canvas::CanvasState;
use card_canvas::cards::{self, CardRegistry};
use card_canvas::gui::CanvasApp;
use card_canvas::logging;
use card_canvas::settings::Settings;

use eframe::egui;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load("settings.json")?;
    logging::init(settings.debug_logging, settings.log_file.clone());

    let registry = cards::install_global(CardRegistry::with_builtin())?;
    let state = CanvasState::load(settings.storage(), settings.start_config.clone());
    tracing::info!(types = registry.names().len(), "starting card canvas");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(settings.title.clone())
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };
    let title = settings.title.clone();
    eframe::run_native(
        &title,
        native_options,
        Box::new(move |_cc| Box::new(CanvasApp::new(state, registry, settings))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the canvas window: {e}"))
}
