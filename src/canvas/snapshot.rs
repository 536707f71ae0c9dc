use super::config::CardConfig;
use super::layout::{CardLayouts, LayoutItem, DEFAULT_CARD_HEIGHT, DEFAULT_CARD_WIDTH};
use anyhow::{bail, Context};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

pub const EXPORT_FILENAME: &str = "layout.json";
pub const EXPORT_MIME: &str = "application/json";

/// Unit of persistence, export and import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub card_config: CardConfig,
    #[serde(default)]
    pub card_layouts: CardLayouts,
}

#[derive(Deserialize)]
struct PartialSnapshot {
    card_config: Option<CardConfig>,
    card_layouts: Option<CardLayouts>,
}

impl Snapshot {
    pub fn new(card_config: CardConfig, card_layouts: CardLayouts) -> Self {
        Self {
            card_config,
            card_layouts,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot document. A store missing from the document is taken
    /// from `fallback`.
    pub fn from_json(text: &str, fallback: &Snapshot) -> anyhow::Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).context("layout document is not valid JSON")?;
        if !value.is_object() {
            bail!("layout document must be a JSON object");
        }
        let partial: PartialSnapshot =
            serde_json::from_value(value).context("layout document has an invalid shape")?;
        let snapshot = Self {
            card_config: partial
                .card_config
                .unwrap_or_else(|| fallback.card_config.clone()),
            card_layouts: partial
                .card_layouts
                .unwrap_or_else(|| fallback.card_layouts.clone()),
        };
        snapshot
            .card_layouts
            .check_bounds()
            .context("layout document has out-of-range placements")?;
        Ok(snapshot)
    }

    /// Bring config and layouts back in step: placements without a config
    /// entry are dropped and configured cards missing from a breakpoint are
    /// appended below the existing cards of that breakpoint.
    pub fn reconciled(&self) -> Self {
        let mut out = self.clone();
        let ids = out.card_config.ids();
        let dropped = out.card_layouts.retain_ids(&ids);
        if dropped > 0 {
            tracing::warn!(dropped, "layout records without card config dropped");
        }
        if ids.is_empty() {
            return out;
        }
        out.card_layouts.ensure_breakpoint();
        let breakpoints: Vec<String> = out.card_layouts.breakpoints().map(str::to_string).collect();
        for bp in breakpoints {
            let mut items: Vec<LayoutItem> = out.card_layouts.get(&bp).unwrap_or_default().to_vec();
            let mut row = out.card_layouts.next_free_row(&bp);
            for id in &ids {
                if items.iter().any(|it| &it.i == id) {
                    continue;
                }
                tracing::warn!(card = %id, breakpoint = %bp, "card without layout record placed");
                items.push(LayoutItem::new(id, 0, row, DEFAULT_CARD_WIDTH, DEFAULT_CARD_HEIGHT));
                row = row.saturating_add(DEFAULT_CARD_HEIGHT);
            }
            out.card_layouts.insert(&bp, items);
        }
        out
    }
}

/// JSON document offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub filename: String,
    pub mime: String,
    pub content: String,
}

impl ExportDocument {
    pub fn from_snapshot(snapshot: &Snapshot) -> anyhow::Result<Self> {
        Ok(Self {
            filename: EXPORT_FILENAME.into(),
            mime: EXPORT_MIME.into(),
            content: snapshot.to_json()?,
        })
    }
}

/// Decode an upload of the form `data:<mime>;base64,<payload>` into text.
/// A bare base64 payload without the prefix is accepted too.
pub fn decode_upload(contents: &str) -> anyhow::Result<String> {
    let payload = match contents.split_once(',') {
        Some((_, payload)) => payload,
        None => contents,
    };
    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .context("upload is not valid base64")?;
    String::from_utf8(bytes).context("upload is not valid UTF-8")
}

/// Inverse of [`decode_upload`], producing a data URL.
pub fn encode_upload(text: &str) -> String {
    format!(
        "data:{EXPORT_MIME};base64,{}",
        general_purpose::STANDARD.encode(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::config::CardEntry;
    use serde_json::json;

    fn sample() -> Snapshot {
        let mut cfg = CardConfig::new();
        cfg.insert("a", CardEntry::new("Clock"));
        let mut layouts = CardLayouts::new();
        layouts.insert("lg", vec![LayoutItem::new("a", 0, 0, 4, 2)]);
        Snapshot::new(cfg, layouts)
    }

    #[test]
    fn wire_shape_matches_store_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "card_config": {"a": {"card_class": "Clock", "settings": {}}},
                "card_layouts": {"lg": [{"i": "a", "x": 0, "y": 0, "w": 4, "h": 2}]}
            })
        );
    }

    #[test]
    fn missing_stores_come_from_fallback() {
        let fallback = sample();
        let parsed = Snapshot::from_json(r#"{"card_layouts": {}}"#, &fallback).unwrap();
        assert_eq!(parsed.card_config, fallback.card_config);
        assert!(parsed.card_layouts.is_empty());
    }

    #[test]
    fn non_object_documents_are_rejected() {
        assert!(Snapshot::from_json("[1, 2]", &Snapshot::default()).is_err());
        assert!(Snapshot::from_json("{\"card_config\": ", &Snapshot::default()).is_err());
        assert!(Snapshot::from_json(r#"{"card_config": 3}"#, &Snapshot::default()).is_err());
    }

    #[test]
    fn out_of_range_placements_are_rejected() {
        let doc = json!({
            "card_config": {"a": {"card_class": "Clock", "settings": {}}},
            "card_layouts": {"lg": [{"i": "a", "x": 0, "y": i32::MAX, "w": 4, "h": 2}]}
        });
        assert!(Snapshot::from_json(&doc.to_string(), &Snapshot::default()).is_err());
    }

    #[test]
    fn reconcile_does_not_overflow_below_extreme_rows() {
        let mut snap = sample();
        snap.card_layouts
            .insert("lg", vec![LayoutItem::new("a", 0, i32::MAX, 4, 2)]);
        snap.card_config.insert("b", CardEntry::new("Color"));
        snap.card_config.insert("c", CardEntry::new("Color"));
        let fixed = snap.reconciled();
        assert_eq!(fixed.card_layouts.find("lg", "b").unwrap().y, i32::MAX);
        assert_eq!(fixed.card_layouts.find("lg", "c").unwrap().y, i32::MAX);
    }

    #[test]
    fn upload_decoding() {
        let url = encode_upload("{\"a\":1}");
        assert!(url.starts_with("data:application/json;base64,"));
        assert_eq!(decode_upload(&url).unwrap(), "{\"a\":1}");
        assert_eq!(decode_upload("eyJhIjoxfQ==").unwrap(), "{\"a\":1}");
        assert!(decode_upload("data:application/json;base64,@@@").is_err());
    }

    #[test]
    fn reconcile_drops_orphans_and_places_missing_cards() {
        let mut snap = sample();
        snap.card_config.insert("b", CardEntry::new("Color"));
        let mut lg = snap.card_layouts.get("lg").unwrap().to_vec();
        lg.push(LayoutItem::new("orphan", 4, 0, 2, 2));
        snap.card_layouts.insert("lg", lg);

        let fixed = snap.reconciled();
        assert_eq!(fixed.card_layouts.ids(), fixed.card_config.ids());
        let placed = fixed.card_layouts.find("lg", "b").unwrap();
        assert_eq!(placed.y, 2);
    }

    #[test]
    fn reconcile_seeds_breakpoint_for_configured_cards() {
        let mut snap = sample();
        snap.card_layouts = CardLayouts::new();
        let fixed = snap.reconciled();
        assert!(fixed.card_layouts.find("lg", "a").is_some());
    }
}
