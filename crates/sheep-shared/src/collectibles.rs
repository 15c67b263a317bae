//! Built-in collectible catalog.
//!
//! The store seeds its `collectibles` table from this list, and offline
//! sessions use it directly since they cannot reach the catalog table.

use crate::models::Collectible;
use crate::types::{CollectibleKind, Rarity};

struct CatalogEntry {
    id: &'static str,
    name: &'static str,
    emoji: &'static str,
    kind: CollectibleKind,
    rarity: Rarity,
    gem_cost: u64,
}

const fn sheep(id: &'static str, name: &'static str, emoji: &'static str, rarity: Rarity, gem_cost: u64) -> CatalogEntry {
    CatalogEntry { id, name, emoji, kind: CollectibleKind::SheepEmoji, rarity, gem_cost }
}

const fn particle(id: &'static str, name: &'static str, emoji: &'static str, rarity: Rarity, gem_cost: u64) -> CatalogEntry {
    CatalogEntry { id, name, emoji, kind: CollectibleKind::Particle, rarity, gem_cost }
}

// Legendary prices are informational; legendary items are box-only.
const CATALOG: &[CatalogEntry] = &[
    sheep("sheep_sheep", "Sheep", "🐑", Rarity::Free, 0),
    sheep("sheep_ram", "Ram", "🐏", Rarity::Free, 0),
    sheep("sheep_goat", "Goat", "🐐", Rarity::Normal, 5),
    sheep("sheep_chick", "Chick", "🐥", Rarity::Normal, 5),
    sheep("sheep_duck", "Duck", "🦆", Rarity::Normal, 5),
    sheep("sheep_cat", "Cat", "🐈", Rarity::Normal, 8),
    sheep("sheep_dog", "Dog", "🐕", Rarity::Normal, 8),
    sheep("sheep_snail", "Snail", "🐌", Rarity::Normal, 8),
    sheep("sheep_hedgehog", "Hedgehog", "🦔", Rarity::Normal, 10),
    sheep("sheep_owl", "Owl", "🦉", Rarity::Epic, 20),
    sheep("sheep_penguin", "Penguin", "🐧", Rarity::Epic, 20),
    sheep("sheep_otter", "Otter", "🦦", Rarity::Epic, 25),
    sheep("sheep_flamingo", "Flamingo", "🦩", Rarity::Epic, 25),
    sheep("sheep_peacock", "Peacock", "🦚", Rarity::Epic, 30),
    sheep("sheep_unicorn", "Unicorn", "🦄", Rarity::Legendary, 100),
    sheep("sheep_dragon", "Dragon", "🐉", Rarity::Legendary, 100),
    sheep("sheep_phoenix", "Phoenix", "🐦‍🔥", Rarity::Legendary, 100),
    particle("particle_sparkle", "Sparkle", "✨", Rarity::Free, 0),
    particle("particle_star", "Star", "⭐", Rarity::Normal, 5),
    particle("particle_heart", "Heart", "💖", Rarity::Normal, 5),
    particle("particle_blossom", "Blossom", "🌸", Rarity::Normal, 8),
    particle("particle_clover", "Clover", "🍀", Rarity::Normal, 8),
    particle("particle_flame", "Flame", "🔥", Rarity::Epic, 20),
    particle("particle_bolt", "Bolt", "⚡", Rarity::Epic, 20),
    particle("particle_rainbow", "Rainbow", "🌈", Rarity::Epic, 30),
    particle("particle_diamond", "Diamond", "💎", Rarity::Legendary, 100),
    particle("particle_crown", "Crown", "👑", Rarity::Legendary, 100),
];

/// The full built-in catalog, ordered by kind then rarity as listed.
pub fn default_catalog() -> Vec<Collectible> {
    CATALOG
        .iter()
        .map(|e| Collectible {
            id: e.id.to_string(),
            name: e.name.to_string(),
            emoji: e.emoji.to_string(),
            kind: e.kind,
            rarity: e.rarity,
            gem_cost: e.gem_cost,
        })
        .collect()
}

pub fn find<'a>(catalog: &'a [Collectible], id: &str) -> Option<&'a Collectible> {
    catalog.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_are_unique() {
        let catalog = default_catalog();
        let ids: HashSet<_> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn every_box_rarity_is_stocked() {
        let catalog = default_catalog();
        for rarity in [Rarity::Normal, Rarity::Epic, Rarity::Legendary] {
            assert!(catalog.iter().any(|c| c.rarity == rarity), "{rarity:?} missing");
        }
    }

    #[test]
    fn free_items_cost_nothing() {
        for item in default_catalog().iter().filter(|c| c.rarity == Rarity::Free) {
            assert_eq!(item.gem_cost, 0, "{}", item.id);
        }
    }
}
