mod gallery;
mod grid;
mod logo;
mod settings_panel;

pub use gallery::gallery_ui;
pub use grid::{nudged, CardGrid, CardMenuAction, GridMetrics};
pub use logo::{decode_logo, TitleLogo};
pub use settings_panel::{PanelOutcome, SettingsPanel};

use crate::canvas::{render_pass, CanvasState, DroppedItem, RefreshScheduler};
use crate::canvas::layout::{DEFAULT_BREAKPOINT, DEFAULT_CARD_HEIGHT, DEFAULT_CARD_WIDTH};
use crate::cards::{CardContext, CardRegistry, LiveCard};
use crate::settings::Settings;
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::path::PathBuf;
use std::time::Instant;

pub struct CanvasApp {
    state: CanvasState,
    registry: &'static CardRegistry,
    settings: Settings,
    context: CardContext,
    cards: Vec<LiveCard>,
    rendered_revision: Option<u64>,
    scheduler: RefreshScheduler,
    toasts: Toasts,
    editable: bool,
    show_gallery: bool,
    import_path: String,
    breakpoint: String,
    settings_panel: Option<SettingsPanel>,
    logo: Option<TitleLogo>,
}

impl CanvasApp {
    pub fn new(state: CanvasState, registry: &'static CardRegistry, settings: Settings) -> Self {
        let context = settings.context();
        let import_path = settings
            .export_dir()
            .join(crate::canvas::snapshot::EXPORT_FILENAME)
            .to_string_lossy()
            .to_string();
        Self {
            state,
            registry,
            context,
            cards: Vec::new(),
            rendered_revision: None,
            scheduler: RefreshScheduler::new(),
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]),
            editable: false,
            show_gallery: false,
            import_path,
            breakpoint: DEFAULT_BREAKPOINT.to_string(),
            settings_panel: None,
            logo: settings.logo.as_deref().map(TitleLogo::new),
            settings,
        }
    }

    fn toast(&mut self, kind: ToastKind, text: impl Into<String>) {
        if !self.settings.enable_toasts {
            return;
        }
        let text: String = text.into();
        self.toasts.add(Toast {
            text: text.into(),
            kind,
            options: ToastOptions::default().duration_in_seconds(self.settings.toast_duration as f64),
        });
    }

    /// Re-derive live cards when the stores changed since the last pass.
    fn sync_cards(&mut self, now: Instant) {
        if self.rendered_revision == Some(self.state.revision()) {
            return;
        }
        self.cards = render_pass(self.state.card_config(), self.registry, &self.context);
        self.scheduler
            .sync(self.cards.iter().map(|c| (c.id(), c.interval())), now);
        self.rendered_revision = Some(self.state.revision());
    }

    fn refresh_due(&mut self, now: Instant) {
        for card_id in self.scheduler.due(now) {
            if let Some(card) = self.cards.iter_mut().find(|c| c.id() == card_id) {
                card.refresh();
            }
        }
    }

    fn add_card(&mut self, type_name: &str) {
        let row = self.state.card_layouts().next_free_row(&self.breakpoint);
        let dropped = DroppedItem::new(type_name, 0, row, DEFAULT_CARD_WIDTH, DEFAULT_CARD_HEIGHT);
        if self.state.add_card(Some(dropped), self.registry).is_none() {
            self.toast(ToastKind::Warning, format!("Unknown card type {type_name}"));
        }
    }

    fn handle_menu(&mut self, card_id: &str, action: CardMenuAction) {
        match action {
            CardMenuAction::Settings => {
                if let Some(card) = self.cards.iter().find(|c| c.id() == card_id) {
                    self.settings_panel = Some(SettingsPanel::open(card, &self.state));
                }
            }
            CardMenuAction::Duplicate => {
                self.state.duplicate_card(card_id);
            }
            CardMenuAction::Delete => {
                self.state.delete_card(card_id);
                if self.settings_panel.as_ref().map(|p| p.card_id()) == Some(card_id) {
                    self.settings_panel = None;
                }
            }
            CardMenuAction::Nudge { dx, dy } => {
                let cols = self.settings.breakpoints.cols(&self.breakpoint);
                if let Some(next) =
                    nudged(self.state.card_layouts(), &self.breakpoint, cols, card_id, dx, dy)
                {
                    self.state.apply_grid_layouts(next);
                }
            }
        }
    }

    fn save(&mut self) {
        match self.state.save() {
            Ok(()) => self.toast(ToastKind::Success, "Layout saved"),
            Err(e) => {
                tracing::error!(error = %e, "failed to save layout");
                self.toast(ToastKind::Error, format!("Failed to save layout: {e}"));
            }
        }
    }

    fn restore(&mut self) {
        if self.state.restore() {
            self.toast(ToastKind::Info, "Layout restored");
        } else {
            self.toast(ToastKind::Info, "Nothing saved yet");
        }
    }

    fn export(&mut self) {
        let doc = match self.state.export() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                self.toast(ToastKind::Info, "Save the layout before exporting");
                return;
            }
            Err(e) => {
                self.toast(ToastKind::Error, format!("Export failed: {e}"));
                return;
            }
        };
        let dir = self.settings.export_dir();
        let path = dir.join(&doc.filename);
        let written = std::fs::create_dir_all(&dir).and_then(|_| std::fs::write(&path, &doc.content));
        match written {
            Ok(()) => {
                tracing::info!(path = %path.display(), "layout exported");
                self.toast(ToastKind::Success, format!("Exported to {}", path.display()));
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to write export");
                self.toast(ToastKind::Error, format!("Export failed: {e}"));
            }
        }
    }

    fn import(&mut self) {
        let path = PathBuf::from(self.import_path.trim());
        let result = std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|text| {
                if text.trim_start().starts_with("data:") {
                    self.state.import_upload(&text)
                } else {
                    self.state.import_json(&text)
                }
            });
        match result {
            Ok(()) => self.toast(ToastKind::Success, "Layout imported"),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "import failed");
                self.toast(ToastKind::Error, format!("Import failed: {e}"));
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.toggle_value(&mut self.show_gallery, "Add Cards");
            ui.separator();
            if ui.button("Save").clicked() {
                self.save();
            }
            if ui.button("Restore").clicked() {
                self.restore();
            }
            if ui.button("Reset").clicked() {
                self.state.reset_to_default();
                self.toast(ToastKind::Info, "Layout reset to default");
            }
            if ui.button("Clear").clicked() {
                self.state.clear();
                self.settings_panel = None;
                self.toast(ToastKind::Info, "Layout cleared");
            }
            ui.separator();
            if ui.button("Export").clicked() {
                self.export();
            }
            ui.add(egui::TextEdit::singleline(&mut self.import_path).desired_width(200.0));
            if ui.button("Import").clicked() {
                self.import();
            }
            ui.separator();
            ui.checkbox(&mut self.editable, "Editable Layout");
        });
    }
}

impl eframe::App for CanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.sync_cards(now);
        self.refresh_due(now);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(logo) = &mut self.logo {
                    logo.ui(ui);
                }
                ui.heading(&self.settings.title);
                if let Some(subtitle) = &self.settings.subtitle {
                    ui.label(subtitle);
                }
            });
            self.toolbar(ui);
        });

        if self.show_gallery {
            let mut picked = None;
            egui::SidePanel::left("gallery").show(ctx, |ui| {
                picked = gallery_ui(ui, self.registry);
            });
            if let Some(type_name) = picked {
                self.add_card(&type_name);
            }
        }

        if let Some(mut panel) = self.settings_panel.take() {
            let card = self.cards.iter().find(|c| c.id() == panel.card_id());
            let mut outcome = PanelOutcome::Open;
            egui::SidePanel::right("card_settings").show(ctx, |ui| {
                outcome = panel.ui(ui, card, &self.state);
            });
            match outcome {
                PanelOutcome::Open => self.settings_panel = Some(panel),
                PanelOutcome::Cancelled => {}
                PanelOutcome::Submitted(updates) => {
                    self.state.edit_settings(&updates);
                }
            }
        }

        // Operations above may have changed the stores.
        self.sync_cards(now);

        let mut picked = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let grid = CardGrid {
                    breakpoints: &self.settings.breakpoints,
                    row_height: self.settings.grid_row_height,
                    editable: self.editable,
                };
                let (breakpoint, action) = grid.ui(ui, self.state.card_layouts(), &mut self.cards);
                self.breakpoint = breakpoint;
                picked = action;
            });
        });
        if let Some((card_id, action)) = picked {
            self.handle_menu(&card_id, action);
        }

        self.toasts.show(ctx);

        if let Some(wait) = self.scheduler.next_deadline(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.scheduler.cancel_all();
    }
}
