use super::{color_setting, parse_hex_color};
use crate::cards::{edit_typed_settings, Card, CardContext, CardSettingsUiResult, CardTypeInfo};
use eframe::egui;
use serde::{Deserialize, Serialize};

fn default_color() -> String {
    "#cccccc".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorConfig {
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
        }
    }
}

/// Fills its cell with a single colour.
#[derive(Default)]
pub struct ColorCard {
    cfg: ColorConfig,
}

impl ColorCard {
    pub fn new(cfg: ColorConfig) -> Self {
        Self { cfg }
    }

    pub fn info() -> CardTypeInfo {
        CardTypeInfo::new("Color", "Color Card")
            .description("This card just shows a coloured background")
            .icon("mdi:palette")
            .color("#be4bdb")
    }

    pub fn settings_ui(ui: &mut egui::Ui, value: &mut serde_json::Value) -> CardSettingsUiResult {
        edit_typed_settings(ui, value, |ui, cfg: &mut ColorConfig| {
            color_setting(ui, "Colour", &mut cfg.color)
        })
    }
}

impl Card for ColorCard {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &CardContext) {
        let fill = parse_hex_color(&self.cfg.color).unwrap_or(egui::Color32::LIGHT_GRAY);
        let rect = ui.max_rect();
        ui.painter().rect_filled(rect, 4.0, fill);
    }
}
