use crate::cards::builtin::parse_hex_color;
use crate::cards::CardRegistry;
use eframe::egui;

/// List of registered card types. Returns the type name the user clicked.
pub fn gallery_ui(ui: &mut egui::Ui, registry: &CardRegistry) -> Option<String> {
    let mut picked = None;
    ui.heading("Add Cards");
    ui.label("Click a card to place it below the existing ones.");
    ui.separator();
    egui::ScrollArea::vertical().show(ui, |ui| {
        for info in registry.infos() {
            let accent = parse_hex_color(&info.color).unwrap_or(egui::Color32::GRAY);
            let clicked = egui::Frame::group(ui.style())
                .stroke(egui::Stroke::new(1.0, accent))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    let title = ui.add(
                        egui::Label::new(egui::RichText::new(&info.title).strong().color(accent))
                            .sense(egui::Sense::click()),
                    );
                    if !info.description.is_empty() {
                        ui.small(&info.description);
                    }
                    title.clicked()
                })
                .inner;
            if clicked {
                picked = Some(info.name.clone());
            }
        }
    });
    picked
}
