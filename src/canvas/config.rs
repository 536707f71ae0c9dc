use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Configuration of one card instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardEntry {
    pub card_class: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardEntry {
    pub fn new(card_class: &str) -> Self {
        Self {
            card_class: card_class.to_string(),
            settings: Map::new(),
            extra: Map::new(),
        }
    }
}

/// One submitted settings field.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsUpdate {
    pub card_id: String,
    pub key: String,
    pub value: Value,
}

impl SettingsUpdate {
    pub fn new(card_id: &str, key: &str, value: Value) -> Self {
        Self {
            card_id: card_id.to_string(),
            key: key.to_string(),
            value,
        }
    }

    /// Updates for every key of `draft` whose value differs from `stored`.
    pub fn diff(card_id: &str, stored: &Map<String, Value>, draft: &Value) -> Vec<Self> {
        let Value::Object(draft) = draft else {
            return Vec::new();
        };
        draft
            .iter()
            .filter(|(k, v)| stored.get(k.as_str()) != Some(*v))
            .map(|(k, v)| Self::new(card_id, k, v.clone()))
            .collect()
    }
}

/// Configuration Store: card instance id to its class and settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CardConfig(BTreeMap<String, CardEntry>);

impl CardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CardEntry> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn insert(&mut self, id: &str, entry: CardEntry) -> Option<CardEntry> {
        self.0.insert(id.to_string(), entry)
    }

    pub fn remove(&mut self, id: &str) -> Option<CardEntry> {
        self.0.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CardEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn ids(&self) -> BTreeSet<String> {
        self.0.keys().cloned().collect()
    }

    /// Merge `updates` into the matching entries. Updates for ids that are not
    /// configured are skipped. Returns the number of applied updates.
    pub fn apply_updates(&mut self, updates: &[SettingsUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            let Some(entry) = self.0.get_mut(&update.card_id) else {
                tracing::debug!(card = %update.card_id, key = %update.key, "settings update for unknown card skipped");
                continue;
            };
            entry
                .settings
                .insert(update.key.clone(), update.value.clone());
            applied += 1;
        }
        applied
    }
}
