use crate::canvas::{CanvasState, SettingsUpdate};
use crate::cards::LiveCard;
use eframe::egui;
use serde_json::Value;

/// What the settings panel asks the app to do after a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOutcome {
    Open,
    Cancelled,
    Submitted(Vec<SettingsUpdate>),
}

/// Side panel editing a draft copy of one card's settings.
pub struct SettingsPanel {
    card_id: String,
    draft: Value,
    error: Option<String>,
}

impl SettingsPanel {
    pub fn open(card: &LiveCard, state: &CanvasState) -> Self {
        let draft = state
            .card_settings(card.id())
            .map(|stored| card.settings_draft(stored))
            .unwrap_or(Value::Null);
        Self {
            card_id: card.id().to_string(),
            draft,
            error: None,
        }
    }

    pub fn card_id(&self) -> &str {
        &self.card_id
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        card: Option<&LiveCard>,
        state: &CanvasState,
    ) -> PanelOutcome {
        ui.heading("Settings");
        ui.separator();
        let (Some(card), Some(stored)) = (card, state.card_settings(&self.card_id)) else {
            ui.label("Card not found");
            return if ui.button("Close").clicked() {
                PanelOutcome::Cancelled
            } else {
                PanelOutcome::Open
            };
        };

        ui.small(card.card_class());
        match card.render_settings(ui, &mut self.draft) {
            Some(result) => {
                if result.error.is_some() {
                    self.error = result.error;
                }
            }
            None => {
                ui.label("This card has no settings.");
            }
        }
        if let Some(err) = &self.error {
            ui.colored_label(egui::Color32::RED, err);
        }

        let mut outcome = PanelOutcome::Open;
        ui.horizontal(|ui| {
            if ui.button("OK").clicked() {
                outcome =
                    PanelOutcome::Submitted(SettingsUpdate::diff(&self.card_id, stored, &self.draft));
            }
            if ui.button("Cancel").clicked() {
                outcome = PanelOutcome::Cancelled;
            }
        });
        outcome
    }
}
