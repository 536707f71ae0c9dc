use super::{color_setting, parse_hex_color};
use crate::cards::{
    edit_typed_settings, Card, CardContext, CardSettingsUiResult, CardTypeInfo, GridSettings,
};
use chrono::Local;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn default_text_color() -> String {
    "#f1f3f5".into()
}

fn default_background_color() -> String {
    "#868e96".into()
}

fn default_format() -> String {
    DEFAULT_FORMAT.into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockConfig {
    #[serde(rename = "text-color", default = "default_text_color")]
    pub text_color: String,
    #[serde(rename = "background-color", default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            text_color: default_text_color(),
            background_color: default_background_color(),
            format: default_format(),
        }
    }
}

pub struct ClockCard {
    cfg: ClockConfig,
    now: String,
}

impl ClockCard {
    pub fn new(cfg: ClockConfig) -> Self {
        let now = timestamp(&cfg.format);
        Self { cfg, now }
    }

    pub fn info() -> CardTypeInfo {
        CardTypeInfo::new("Clock", "Clock")
            .description("Shows the current time, refreshed every minute.")
            .icon("mdi:clock-outline")
            .interval(Duration::from_secs(60))
            .grid(GridSettings::width(6).with_hint("minW", 6))
    }

    pub fn settings_ui(ui: &mut egui::Ui, value: &mut serde_json::Value) -> CardSettingsUiResult {
        edit_typed_settings(ui, value, |ui, cfg: &mut ClockConfig| {
            let mut changed = color_setting(ui, "Text colour", &mut cfg.text_color);
            changed |= color_setting(ui, "Background", &mut cfg.background_color);
            ui.horizontal(|ui| {
                ui.label("Format");
                changed |= ui.text_edit_singleline(&mut cfg.format).changed();
            });
            changed
        })
    }

    pub fn now(&self) -> &str {
        &self.now
    }
}

impl Default for ClockCard {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

impl Card for ClockCard {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &CardContext) {
        let rect = ui.max_rect();
        if let Some(bg) = parse_hex_color(&self.cfg.background_color) {
            ui.painter().rect_filled(rect, 4.0, bg);
        }
        let color = parse_hex_color(&self.cfg.text_color).unwrap_or(egui::Color32::GRAY);
        ui.vertical_centered(|ui| {
            ui.heading(egui::RichText::new(format!("Now time is: {}", self.now)).color(color));
            if let Some(user) = &ctx.username {
                ui.label(egui::RichText::new(format!("Hello, {user}")).color(color));
            }
        });
    }

    fn refresh(&mut self) {
        self.now = timestamp(&self.cfg.format);
    }
}

/// Format the local time, falling back to the default format when the
/// configured one is not a valid strftime string.
fn timestamp(format: &str) -> String {
    let now = Local::now();
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_err() {
        out.clear();
        let _ = write!(out, "{}", now.format(DEFAULT_FORMAT));
    }
    out
}
