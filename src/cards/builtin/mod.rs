//! Demo card types shipped with the binary.

use super::{CardDescriptor, CardRegistry};
use eframe::egui;

mod clock;
mod color;
mod options;

pub use clock::{ClockCard, ClockConfig};
pub use color::{ColorCard, ColorConfig};
pub use options::{OptionsCard, OptionsConfig};

impl CardRegistry {
    pub fn with_builtin() -> Self {
        let mut reg = Self::default();
        register_builtin(&mut reg);
        reg
    }
}

pub fn register_builtin(reg: &mut CardRegistry) {
    reg.register(
        CardDescriptor::new(ClockCard::info(), ClockCard::new)
            .with_settings_ui(ClockCard::settings_ui),
    );
    reg.register(
        CardDescriptor::new(ColorCard::info(), ColorCard::new)
            .with_settings_ui(ColorCard::settings_ui),
    );
    reg.register(
        CardDescriptor::new(OptionsCard::info(), OptionsCard::new)
            .with_settings_ui(OptionsCard::settings_ui),
    );
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Option<egui::Color32> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(egui::Color32::from_rgb(r, g, b))
}

pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

pub(crate) fn color_setting(ui: &mut egui::Ui, label: &str, hex: &mut String) -> bool {
    let mut rgb = parse_hex_color(hex)
        .map(|c| [c.r(), c.g(), c.b()])
        .unwrap_or([128, 128, 128]);
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            *hex = format_hex_color(rgb);
            changed = true;
        }
        ui.monospace(hex.as_str());
    });
    changed
}
