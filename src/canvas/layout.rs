use crate::cards::GridSettings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_BREAKPOINT: &str = "lg";
pub const DEFAULT_CARD_WIDTH: i32 = 4;
pub const DEFAULT_CARD_HEIGHT: i32 = 2;
/// Largest coordinate or span accepted from an imported document.
pub const MAX_GRID_COORD: i32 = 10_000;

fn default_span() -> i32 {
    1
}

/// Grid placement of one card in one breakpoint.
///
/// Keys the grid understands beyond the coordinates (`minW`, `static`, ...)
/// are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutItem {
    pub i: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_span")]
    pub w: i32,
    #[serde(default = "default_span")]
    pub h: i32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LayoutItem {
    pub fn new(id: &str, x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            i: id.to_string(),
            x,
            y,
            w,
            h,
            extra: Map::new(),
        }
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h.max(1))
    }

    fn check_bounds(&self) -> anyhow::Result<()> {
        let coords = [("x", self.x, 0), ("y", self.y, 0), ("w", self.w, 1), ("h", self.h, 1)];
        for (name, value, min) in coords {
            if !(min..=MAX_GRID_COORD).contains(&value) {
                anyhow::bail!(
                    "card {} has {name} = {value}, expected {min}..={MAX_GRID_COORD}",
                    self.i
                );
            }
        }
        Ok(())
    }

    /// Overlay a card type's sizing hints.
    pub fn apply_grid_settings(&mut self, grid: &GridSettings) {
        if let Some(w) = grid.w {
            self.w = w;
        }
        if let Some(h) = grid.h {
            self.h = h;
        }
        for (k, v) in &grid.extra {
            let n = v.as_i64().and_then(|n| i32::try_from(n).ok());
            match (k.as_str(), n) {
                ("x", Some(n)) => self.x = n,
                ("y", Some(n)) => self.y = n,
                ("w", Some(n)) => self.w = n,
                ("h", Some(n)) => self.h = n,
                ("i" | "x" | "y" | "w" | "h", _) => {}
                _ => {
                    self.extra.insert(k.clone(), v.clone());
                }
            }
        }
    }
}

/// Payload the grid reports when a card type is dropped on it. `i` holds the
/// card type name, not an instance id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DroppedItem {
    pub i: String,
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_span")]
    pub w: i32,
    #[serde(default = "default_span")]
    pub h: i32,
}

impl DroppedItem {
    pub fn new(type_name: &str, x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            i: type_name.to_string(),
            x,
            y,
            w,
            h,
        }
    }
}

/// Layout Store: breakpoint name to the placements of every card.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CardLayouts(BTreeMap<String, Vec<LayoutItem>>);

impl CardLayouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, breakpoint: &str) -> Option<&[LayoutItem]> {
        self.0.get(breakpoint).map(Vec::as_slice)
    }

    pub fn insert(&mut self, breakpoint: &str, items: Vec<LayoutItem>) {
        self.0.insert(breakpoint.to_string(), items);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LayoutItem])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Seed the default breakpoint when no breakpoint exists yet.
    pub fn ensure_breakpoint(&mut self) {
        if self.0.is_empty() {
            self.0.insert(DEFAULT_BREAKPOINT.to_string(), Vec::new());
        }
    }

    pub fn push_all(&mut self, item: &LayoutItem) {
        for items in self.0.values_mut() {
            items.push(item.clone());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.values().any(|items| items.iter().any(|it| it.i == id))
    }

    pub fn find(&self, breakpoint: &str, id: &str) -> Option<&LayoutItem> {
        self.0.get(breakpoint)?.iter().find(|it| it.i == id)
    }

    /// First placement of `id` in any breakpoint.
    pub fn find_any(&self, id: &str) -> Option<&LayoutItem> {
        self.0.values().flatten().find(|it| it.i == id)
    }

    /// Copy every placement of `from` under the id `to`. Breakpoints that lack
    /// `from` receive a copy of `template`.
    pub fn duplicate(&mut self, from: &str, to: &str, template: &LayoutItem) {
        for items in self.0.values_mut() {
            let mut copy = items
                .iter()
                .find(|it| it.i == from)
                .cloned()
                .unwrap_or_else(|| template.clone());
            copy.i = to.to_string();
            items.push(copy);
        }
    }

    /// Drop every placement of `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let mut removed = false;
        for items in self.0.values_mut() {
            let before = items.len();
            items.retain(|it| it.i != id);
            removed |= items.len() != before;
        }
        removed
    }

    /// Keep only placements whose id is in `keep`.
    pub fn retain_ids(&mut self, keep: &BTreeSet<String>) -> usize {
        let mut removed = 0;
        for items in self.0.values_mut() {
            let before = items.len();
            items.retain(|it| keep.contains(&it.i));
            removed += before - items.len();
        }
        removed
    }

    pub fn ids(&self) -> BTreeSet<String> {
        self.0
            .values()
            .flatten()
            .map(|it| it.i.clone())
            .collect()
    }

    /// Whether every breakpoint places exactly the cards in `ids`.
    pub fn in_step_with(&self, ids: &BTreeSet<String>) -> bool {
        if self.0.is_empty() {
            return ids.is_empty();
        }
        self.0.values().all(|items| {
            let placed: BTreeSet<&String> = items.iter().map(|it| &it.i).collect();
            items.len() == ids.len()
                && placed.len() == ids.len()
                && placed.iter().all(|id| ids.contains(*id))
        })
    }

    /// Reject placements with negative or oversized coordinates.
    pub fn check_bounds(&self) -> anyhow::Result<()> {
        for (bp, items) in &self.0 {
            for item in items {
                item.check_bounds()
                    .map_err(|e| anyhow::anyhow!("breakpoint {bp}: {e}"))?;
            }
        }
        Ok(())
    }

    /// First row below every card of the breakpoint.
    pub fn next_free_row(&self, breakpoint: &str) -> i32 {
        self.0
            .get(breakpoint)
            .map(|items| items.iter().map(LayoutItem::bottom).max().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Placements to draw for `breakpoint`: its own list when present,
    /// otherwise the list of the closest wider breakpoint, otherwise any.
    pub fn resolve<'a>(
        &'a self,
        breakpoint: &str,
        breakpoints: &Breakpoints,
    ) -> Option<(&'a str, &'a [LayoutItem])> {
        if let Some((k, v)) = self.0.get_key_value(breakpoint) {
            return Some((k.as_str(), v.as_slice()));
        }
        let order = breakpoints.sorted_desc();
        let pos = order.iter().position(|bp| bp.name == breakpoint);
        let wider = pos.map(|p| &order[..p]).unwrap_or(&order[..]);
        wider
            .iter()
            .rev()
            .chain(order.iter())
            .find_map(|bp| self.0.get_key_value(&bp.name))
            .or_else(|| self.0.iter().next())
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A named responsive size class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Breakpoint {
    pub name: String,
    pub min_width: f32,
    pub cols: u32,
}

impl Breakpoint {
    pub fn new(name: &str, min_width: f32, cols: u32) -> Self {
        Self {
            name: name.to_string(),
            min_width,
            cols,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Breakpoints(Vec<Breakpoint>);

impl Default for Breakpoints {
    fn default() -> Self {
        Self(vec![
            Breakpoint::new("lg", 1200.0, 18),
            Breakpoint::new("md", 996.0, 12),
            Breakpoint::new("sm", 768.0, 6),
            Breakpoint::new("xs", 480.0, 4),
            Breakpoint::new("xxs", 0.0, 2),
        ])
    }
}

impl Breakpoints {
    pub fn new(list: Vec<Breakpoint>) -> Self {
        Self(list)
    }

    fn sorted_desc(&self) -> Vec<&Breakpoint> {
        let mut list: Vec<&Breakpoint> = self.0.iter().collect();
        list.sort_by(|a, b| b.min_width.total_cmp(&a.min_width));
        list
    }

    /// Widest breakpoint whose minimum width fits `width`, or the narrowest
    /// breakpoint when none fits.
    pub fn for_width(&self, width: f32) -> Option<&Breakpoint> {
        let order = self.sorted_desc();
        order
            .iter()
            .find(|bp| width >= bp.min_width)
            .or_else(|| order.last())
            .copied()
    }

    pub fn get(&self, name: &str) -> Option<&Breakpoint> {
        self.0.iter().find(|bp| bp.name == name)
    }

    pub fn cols(&self, name: &str) -> u32 {
        self.get(name).map(|bp| bp.cols).unwrap_or(12).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn breakpoint_for_width() {
        let bps = Breakpoints::default();
        assert_eq!(bps.for_width(1500.0).unwrap().name, "lg");
        assert_eq!(bps.for_width(1000.0).unwrap().name, "md");
        assert_eq!(bps.for_width(500.0).unwrap().name, "xs");
        assert_eq!(bps.for_width(10.0).unwrap().name, "xxs");
        assert_eq!(bps.cols("sm"), 6);
        assert_eq!(bps.cols("unknown"), 12);
    }

    #[test]
    fn grid_settings_override_drop_size() {
        let mut item = LayoutItem::new("a", 1, 2, 3, 4);
        item.apply_grid_settings(&GridSettings::width(6).with_hint("minW", 6));
        assert_eq!((item.x, item.y, item.w, item.h), (1, 2, 6, 4));
        assert_eq!(item.extra.get("minW"), Some(&json!(6)));
    }

    #[test]
    fn extra_keys_survive_serde() {
        let raw = json!({"i": "a", "x": 0, "y": 1, "w": 2, "h": 3, "minW": 2, "static": true});
        let item: LayoutItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(item.extra.len(), 2);
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }

    #[test]
    fn duplicate_copies_each_breakpoint() {
        let mut layouts = CardLayouts::new();
        layouts.insert("lg", vec![LayoutItem::new("a", 0, 0, 4, 2)]);
        layouts.insert("sm", vec![LayoutItem::new("a", 1, 1, 2, 2)]);
        layouts.insert("xs", Vec::new());
        let template = layouts.find_any("a").unwrap().clone();
        layouts.duplicate("a", "b", &template);
        assert_eq!(layouts.find("lg", "b").unwrap().w, 4);
        assert_eq!(layouts.find("sm", "b").unwrap().x, 1);
        assert_eq!(layouts.find("xs", "b").unwrap().w, 4);
    }

    #[test]
    fn remove_and_retain() {
        let mut layouts = CardLayouts::new();
        layouts.insert(
            "lg",
            vec![LayoutItem::new("a", 0, 0, 1, 1), LayoutItem::new("b", 1, 0, 1, 1)],
        );
        assert!(layouts.remove("a"));
        assert!(!layouts.remove("a"));
        let keep: BTreeSet<String> = BTreeSet::new();
        assert_eq!(layouts.retain_ids(&keep), 1);
        assert!(layouts.ids().is_empty());
    }

    #[test]
    fn next_free_row_is_below_tallest() {
        let mut layouts = CardLayouts::new();
        assert_eq!(layouts.next_free_row("lg"), 0);
        layouts.insert(
            "lg",
            vec![LayoutItem::new("a", 0, 0, 1, 3), LayoutItem::new("b", 1, 2, 1, 2)],
        );
        assert_eq!(layouts.next_free_row("lg"), 4);

        layouts.insert("xs", vec![LayoutItem::new("a", 0, i32::MAX, 1, 2)]);
        assert_eq!(layouts.next_free_row("xs"), i32::MAX);
    }

    #[test]
    fn in_step_requires_every_card_in_every_breakpoint() {
        let ids: BTreeSet<String> = ["a".to_string(), "b".to_string()].into();
        let mut layouts = CardLayouts::new();
        assert!(!layouts.in_step_with(&ids));
        assert!(layouts.in_step_with(&BTreeSet::new()));
        layouts.insert(
            "lg",
            vec![LayoutItem::new("a", 0, 0, 1, 1), LayoutItem::new("b", 1, 0, 1, 1)],
        );
        assert!(layouts.in_step_with(&ids));
        layouts.insert("sm", vec![LayoutItem::new("a", 0, 0, 1, 1)]);
        assert!(!layouts.in_step_with(&ids));
    }

    #[test]
    fn bounds_check_rejects_extreme_coordinates() {
        let mut layouts = CardLayouts::new();
        layouts.insert("lg", vec![LayoutItem::new("a", 0, 3, 4, 2)]);
        assert!(layouts.check_bounds().is_ok());
        layouts.insert("lg", vec![LayoutItem::new("a", 0, i32::MAX, 4, 2)]);
        assert!(layouts.check_bounds().is_err());
        layouts.insert("lg", vec![LayoutItem::new("a", -1, 0, 4, 2)]);
        assert!(layouts.check_bounds().is_err());
        layouts.insert("lg", vec![LayoutItem::new("a", 0, 0, 0, 2)]);
        assert!(layouts.check_bounds().is_err());
    }

    #[test]
    fn resolve_falls_back_to_wider_breakpoint() {
        let bps = Breakpoints::default();
        let mut layouts = CardLayouts::new();
        layouts.insert("lg", vec![LayoutItem::new("a", 0, 0, 1, 1)]);
        layouts.insert("xxs", vec![LayoutItem::new("a", 0, 5, 1, 1)]);
        assert_eq!(layouts.resolve("sm", &bps).unwrap().0, "lg");
        assert_eq!(layouts.resolve("xxs", &bps).unwrap().0, "xxs");
        assert!(CardLayouts::new().resolve("lg", &bps).is_none());
    }
}
