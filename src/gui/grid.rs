use crate::canvas::layout::MAX_GRID_COORD;
use crate::canvas::{Breakpoints, CardLayouts, LayoutItem};
use crate::cards::LiveCard;
use eframe::egui;
use std::collections::HashMap;

/// Action picked from a card's edit-mode menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardMenuAction {
    Settings,
    Duplicate,
    Delete,
    Nudge { dx: i32, dy: i32 },
}

/// Geometry of the grid for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub origin: egui::Pos2,
    pub col_width: f32,
    pub row_height: f32,
}

impl GridMetrics {
    pub fn new(origin: egui::Pos2, width: f32, cols: u32, row_height: f32) -> Self {
        Self {
            origin,
            col_width: width / cols.max(1) as f32,
            row_height,
        }
    }

    /// Screen rectangle of a layout record.
    pub fn item_rect(&self, item: &LayoutItem) -> egui::Rect {
        egui::Rect::from_min_size(
            self.origin
                + egui::vec2(
                    self.col_width * item.x.max(0) as f32,
                    self.row_height * item.y.max(0) as f32,
                ),
            egui::vec2(
                self.col_width * item.w.max(1) as f32,
                self.row_height * item.h.max(1) as f32,
            ),
        )
    }
}

pub struct CardGrid<'a> {
    pub breakpoints: &'a Breakpoints,
    pub row_height: f32,
    pub editable: bool,
}

impl CardGrid<'_> {
    /// Draw `cards` at their placements for the breakpoint matching the
    /// available width. Returns the breakpoint used and the menu action the
    /// user picked, if any.
    pub fn ui(
        &self,
        ui: &mut egui::Ui,
        layouts: &CardLayouts,
        cards: &mut [LiveCard],
    ) -> (String, Option<(String, CardMenuAction)>) {
        let width = ui.available_width();
        let breakpoint = self
            .breakpoints
            .for_width(width)
            .map(|bp| bp.name.clone())
            .unwrap_or_else(|| crate::canvas::layout::DEFAULT_BREAKPOINT.to_string());
        let Some((resolved, items)) = layouts.resolve(&breakpoint, self.breakpoints) else {
            ui.label("No cards yet. Use \"Add Cards\" to place one.");
            return (breakpoint, None);
        };
        let cols = self.breakpoints.cols(resolved);
        let rows = items.iter().map(LayoutItem::bottom).max().unwrap_or(0).max(1);
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(width, self.row_height * rows as f32),
            egui::Sense::hover(),
        );
        let metrics = GridMetrics::new(rect.min, rect.width(), cols, self.row_height);

        let indices: Vec<(usize, egui::Rect)> = {
            let by_id: HashMap<&str, usize> = cards
                .iter()
                .enumerate()
                .map(|(idx, card)| (card.id(), idx))
                .collect();
            items
                .iter()
                .filter_map(|item| {
                    by_id
                        .get(item.i.as_str())
                        .map(|idx| (*idx, metrics.item_rect(item)))
                })
                .collect()
        };

        let mut picked = None;
        for (idx, card_rect) in indices {
            let card = &mut cards[idx];
            let clip = card_rect.intersect(ui.clip_rect());
            let action = ui
                .allocate_ui_at_rect(card_rect, |card_ui| {
                    card_ui.set_clip_rect(clip);
                    card_ui.set_min_size(card_rect.size());
                    render_card(card_ui, card, self.editable)
                })
                .inner;
            if let Some(action) = action {
                picked = Some((card.id().to_string(), action));
            }
        }
        (resolved.to_string(), picked)
    }
}

fn render_card(ui: &mut egui::Ui, card: &mut LiveCard, editable: bool) -> Option<CardMenuAction> {
    let mut action = None;
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_min_size(ui.available_size());
        if editable {
            ui.horizontal(|ui| {
                ui.small(card.card_class());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    action = card_menu(ui, card.has_settings());
                });
            });
        }
        card.render(ui);
    });
    action
}

fn card_menu(ui: &mut egui::Ui, has_settings: bool) -> Option<CardMenuAction> {
    let mut action = None;
    ui.menu_button("⋮", |ui| {
        if has_settings && ui.button("Settings").clicked() {
            action = Some(CardMenuAction::Settings);
        }
        if ui.button("Duplicate").clicked() {
            action = Some(CardMenuAction::Duplicate);
        }
        if ui.button("Delete").clicked() {
            action = Some(CardMenuAction::Delete);
        }
        ui.separator();
        ui.horizontal(|ui| {
            for (label, dx, dy) in [("←", -1, 0), ("→", 1, 0), ("↑", 0, -1), ("↓", 0, 1)] {
                if ui.small_button(label).clicked() {
                    action = Some(CardMenuAction::Nudge { dx, dy });
                }
            }
        });
        if action.is_some() {
            ui.close_menu();
        }
    });
    action
}

/// Copy of `layouts` with card `card_id` moved by one step in `breakpoint`,
/// kept inside the grid's columns. `None` when nothing would move.
pub fn nudged(
    layouts: &CardLayouts,
    breakpoint: &str,
    cols: u32,
    card_id: &str,
    dx: i32,
    dy: i32,
) -> Option<CardLayouts> {
    let mut items = layouts.get(breakpoint)?.to_vec();
    let item = items.iter_mut().find(|it| it.i == card_id)?;
    let max_x = (cols as i32 - item.w).max(0);
    let x = item.x.saturating_add(dx).clamp(0, max_x);
    let y = item.y.saturating_add(dy).clamp(0, MAX_GRID_COORD);
    if (x, y) == (item.x, item.y) {
        return None;
    }
    item.x = x;
    item.y = y;
    let mut next = layouts.clone();
    next.insert(breakpoint, items);
    Some(next)
}
