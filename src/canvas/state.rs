use super::config::{CardConfig, CardEntry, SettingsUpdate};
use super::layout::{CardLayouts, DroppedItem, LayoutItem};
use super::snapshot::{decode_upload, ExportDocument, Snapshot};
use super::storage::SnapshotStorage;
use crate::cards::CardRegistry;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Live card stores of one session plus the last saved snapshot.
///
/// Every mutation runs through [`CanvasState::transact`], which works on
/// copies of both stores and swaps them in together, so the configuration and
/// layout stores always hold the same card ids between operations.
#[derive(Debug, Clone, Default)]
pub struct CanvasState {
    card_config: CardConfig,
    card_layouts: CardLayouts,
    saved: Option<Snapshot>,
    start_config: Snapshot,
    storage: SnapshotStorage,
    revision: u64,
}

impl CanvasState {
    /// Empty session with nothing saved.
    pub fn new(start_config: Snapshot, storage: SnapshotStorage) -> Self {
        Self {
            start_config,
            storage,
            ..Default::default()
        }
    }

    /// Open a session: the saved snapshot comes from `storage`, or from
    /// `start_config` when storage holds nothing usable, and seeds the live
    /// stores.
    pub fn load(storage: SnapshotStorage, start_config: Snapshot) -> Self {
        let saved = match storage.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => start_config.clone(),
            Err(e) => {
                tracing::warn!(error = %e, "stored layout unreadable; using start config");
                start_config.clone()
            }
        };
        let live = saved.reconciled();
        tracing::info!(cards = live.card_config.len(), "canvas loaded");
        Self {
            card_config: live.card_config,
            card_layouts: live.card_layouts,
            saved: Some(saved),
            start_config,
            storage,
            revision: 1,
        }
    }

    pub fn card_config(&self) -> &CardConfig {
        &self.card_config
    }

    pub fn card_layouts(&self) -> &CardLayouts {
        &self.card_layouts
    }

    pub fn saved(&self) -> Option<&Snapshot> {
        self.saved.as_ref()
    }

    /// Bumped on every committed change; the render layer re-derives its cards
    /// when it moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Current live stores as a snapshot.
    pub fn current(&self) -> Snapshot {
        Snapshot::new(self.card_config.clone(), self.card_layouts.clone())
    }

    pub fn card_settings(&self, card_id: &str) -> Option<&Map<String, Value>> {
        self.card_config.get(card_id).map(|e| &e.settings)
    }

    /// Apply `op` to copies of both stores and commit them together when it
    /// reports a change.
    fn transact(
        &mut self,
        name: &str,
        op: impl FnOnce(&mut CardConfig, &mut CardLayouts) -> bool,
    ) -> bool {
        let mut config = self.card_config.clone();
        let mut layouts = self.card_layouts.clone();
        if !op(&mut config, &mut layouts) {
            tracing::debug!(op = name, "no change");
            return false;
        }
        self.card_config = config;
        self.card_layouts = layouts;
        self.revision += 1;
        tracing::debug!(op = name, cards = self.card_config.len(), "stores updated");
        true
    }

    fn replace(&mut self, name: &str, snapshot: Snapshot) {
        let live = snapshot.reconciled();
        self.transact(name, |config, layouts| {
            *config = live.card_config;
            *layouts = live.card_layouts;
            true
        });
    }

    /// Add a card of the dropped type. Returns the new card id.
    pub fn add_card(
        &mut self,
        dropped: Option<DroppedItem>,
        registry: &CardRegistry,
    ) -> Option<String> {
        let dropped = dropped?;
        let Some(descriptor) = registry.lookup(&dropped.i) else {
            tracing::warn!(card_class = %dropped.i, "dropped card type is not registered");
            return None;
        };
        let card_id = Uuid::new_v4().to_string();
        let mut item = LayoutItem::new(&card_id, dropped.x, dropped.y, dropped.w, dropped.h);
        if let Some(grid) = &descriptor.info().grid {
            item.apply_grid_settings(grid);
        }
        self.transact("add", |config, layouts| {
            config.insert(&card_id, CardEntry::new(&dropped.i));
            layouts.ensure_breakpoint();
            layouts.push_all(&item);
            true
        });
        tracing::info!(card = %card_id, card_class = %dropped.i, "card added");
        Some(card_id)
    }

    /// Copy a card's configuration and placements under a fresh id. Returns
    /// the new id, or `None` when the card is not on the grid.
    pub fn duplicate_card(&mut self, card_id: &str) -> Option<String> {
        let template = self.card_layouts.find_any(card_id)?.clone();
        let entry = self.card_config.get(card_id)?.clone();
        let new_id = Uuid::new_v4().to_string();
        self.transact("duplicate", |config, layouts| {
            config.insert(&new_id, entry);
            layouts.duplicate(card_id, &new_id, &template);
            true
        });
        tracing::info!(card = %card_id, copy = %new_id, "card duplicated");
        Some(new_id)
    }

    /// Remove a card and its placements. Deleting an absent card is a no-op.
    pub fn delete_card(&mut self, card_id: &str) -> bool {
        let deleted = self.transact("delete", |config, layouts| {
            let removed = config.remove(card_id).is_some();
            let pruned = layouts.remove(card_id);
            removed || pruned
        });
        if deleted {
            tracing::info!(card = %card_id, "card deleted");
        }
        deleted
    }

    /// Merge submitted settings fields. Returns the number of applied fields.
    pub fn edit_settings(&mut self, updates: &[SettingsUpdate]) -> usize {
        let mut applied = 0;
        self.transact("edit_settings", |config, _| {
            applied = config.apply_updates(updates);
            applied > 0
        });
        applied
    }

    /// Take over placements reported by the grid after the user moved cards.
    /// Placements of unknown cards are dropped; a report that leaves a
    /// configured card out of any breakpoint is rejected.
    pub fn apply_grid_layouts(&mut self, grid_layouts: CardLayouts) -> bool {
        self.transact("grid_layouts", |config, layouts| {
            let ids = config.ids();
            let mut next = grid_layouts;
            next.retain_ids(&ids);
            if !next.in_step_with(&ids) {
                tracing::warn!(cards = ids.len(), "grid layout without every card ignored");
                return false;
            }
            if next == *layouts {
                return false;
            }
            *layouts = next;
            true
        })
    }

    /// Commit the live stores as the saved snapshot and persist it.
    pub fn save(&mut self) -> anyhow::Result<()> {
        let snapshot = self.current();
        self.storage.store(&snapshot)?;
        tracing::info!(cards = snapshot.card_config.len(), "layout saved");
        self.saved = Some(snapshot);
        Ok(())
    }

    /// Overwrite the live stores with the last saved snapshot.
    pub fn restore(&mut self) -> bool {
        let Some(saved) = self.saved.clone() else {
            tracing::debug!("nothing saved to restore");
            return false;
        };
        self.replace("restore", saved);
        tracing::info!("layout restored");
        true
    }

    /// Overwrite the live stores with the start configuration.
    pub fn reset_to_default(&mut self) {
        let start = self.start_config.clone();
        self.replace("reset", start);
        tracing::info!("layout reset to default");
    }

    /// Empty both live stores. The saved snapshot is untouched.
    pub fn clear(&mut self) {
        self.transact("clear", |config, layouts| {
            *config = CardConfig::new();
            *layouts = CardLayouts::new();
            true
        });
        tracing::info!("layout cleared");
    }

    /// The saved snapshot as a downloadable JSON document.
    pub fn export(&self) -> anyhow::Result<Option<ExportDocument>> {
        self.saved.as_ref().map(ExportDocument::from_snapshot).transpose()
    }

    /// Import a base64 data-URL upload. On any error the stores are left as
    /// they were.
    pub fn import_upload(&mut self, contents: &str) -> anyhow::Result<()> {
        let text = decode_upload(contents).map_err(|e| {
            tracing::error!(error = %e, "layout upload rejected");
            e
        })?;
        self.import_json(&text)
    }

    /// Import a layout JSON document. On success it becomes the saved
    /// snapshot and the live stores; on any error nothing changes.
    pub fn import_json(&mut self, text: &str) -> anyhow::Result<()> {
        let snapshot = Snapshot::from_json(text, &self.start_config).map_err(|e| {
            tracing::error!(error = %e, "layout import rejected");
            e
        })?;
        self.storage.store(&snapshot).map_err(|e| {
            tracing::error!(error = %e, "imported layout could not be stored");
            e
        })?;
        self.replace("import", snapshot.clone());
        tracing::info!(cards = snapshot.card_config.len(), "layout imported");
        self.saved = Some(snapshot);
        Ok(())
    }
}
