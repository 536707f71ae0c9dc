use super::config::CardConfig;
use crate::cards::{CardContext, CardRegistry, LiveCard};

/// Build one live card per configured entry whose type is registered.
///
/// Cards are re-created from the Configuration Store on every pass, so a
/// deleted card never renders and an edited one always shows its latest
/// settings.
pub fn render_pass(config: &CardConfig, registry: &CardRegistry, ctx: &CardContext) -> Vec<LiveCard> {
    let mut cards = Vec::with_capacity(config.len());
    for (card_id, entry) in config.iter() {
        match registry.instantiate(card_id, &entry.card_class, &entry.settings, ctx) {
            Some(card) => cards.push(card),
            None => {
                tracing::warn!(card = %card_id, card_class = %entry.card_class, "card type not registered; skipped")
            }
        }
    }
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::config::CardEntry;
    use crate::cards::{Card, CardDescriptor, CardTypeInfo};
    use eframe::egui;
    use serde::{Deserialize, Serialize};

    #[derive(Default, Serialize, Deserialize)]
    struct EmptyConfig {}

    struct BlankCard;

    impl Card for BlankCard {
        fn render(&mut self, _ui: &mut egui::Ui, _ctx: &CardContext) {}
    }

    fn registry() -> CardRegistry {
        let mut reg = CardRegistry::default();
        reg.register(CardDescriptor::new(
            CardTypeInfo::new("Blank", "Blank"),
            |_: EmptyConfig| BlankCard,
        ));
        reg
    }

    #[test]
    fn one_instance_per_registered_entry() {
        let mut cfg = CardConfig::new();
        cfg.insert("a", CardEntry::new("Blank"));
        cfg.insert("b", CardEntry::new("Blank"));
        cfg.insert("c", CardEntry::new("Unknown"));
        let cards = render_pass(&cfg, &registry(), &CardContext::default());
        let ids: Vec<&str> = cards.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn deleted_cards_are_not_rendered() {
        let mut cfg = CardConfig::new();
        cfg.insert("a", CardEntry::new("Blank"));
        cfg.insert("b", CardEntry::new("Blank"));
        cfg.remove("a");
        let cards = render_pass(&cfg, &registry(), &CardContext::default());
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id(), "b");
    }
}
