use crate::cards::{edit_typed_settings, Card, CardContext, CardSettingsUiResult, CardTypeInfo};
use eframe::egui;
use serde::{Deserialize, Serialize};

pub const CHOICES: &[(&str, &str)] = &[
    ("Option 1", "option1"),
    ("Option 2", "option2"),
    ("Option 3", "option3"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptionsConfig {
    #[serde(rename = "option", default)]
    pub selected: Vec<String>,
}

pub struct OptionsCard {
    cfg: OptionsConfig,
}

impl OptionsCard {
    pub fn new(cfg: OptionsConfig) -> Self {
        Self { cfg }
    }

    pub fn info() -> CardTypeInfo {
        CardTypeInfo::new("Options", "List of options")
            .description("Select from a list of options")
            .icon("mdi:format-list-checks")
    }

    pub fn settings_ui(ui: &mut egui::Ui, value: &mut serde_json::Value) -> CardSettingsUiResult {
        edit_typed_settings(ui, value, |ui, cfg: &mut OptionsConfig| {
            ui.label("Select an option");
            let mut changed = false;
            for (label, key) in CHOICES {
                let mut on = cfg.selected.iter().any(|s| s == key);
                if ui.checkbox(&mut on, *label).changed() {
                    if on {
                        cfg.selected.push((*key).to_string());
                    } else {
                        cfg.selected.retain(|s| s != key);
                    }
                    changed = true;
                }
            }
            changed
        })
    }

    pub fn summary(&self) -> String {
        if self.cfg.selected.is_empty() {
            "Nothing selected".into()
        } else {
            format!("You have selected {}", self.cfg.selected.join(","))
        }
    }
}

impl Card for OptionsCard {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &CardContext) {
        ui.label(self.summary());
    }
}
