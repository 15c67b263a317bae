use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Anonymous player identity, assigned on first visit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a collectible customises.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    /// Replaces the sheep on the click button.
    SheepEmoji,
    /// Emitted as a particle on every click.
    Particle,
}

impl CollectibleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SheepEmoji => "sheep_emoji",
            Self::Particle => "particle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sheep_emoji" => Some(Self::SheepEmoji),
            "particle" => Some(Self::Particle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Free,
    Normal,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Normal => "normal",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "normal" => Some(Self::Normal),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }

    /// Legendary items can only be won from boxes.
    pub fn is_box_only(&self) -> bool {
        matches!(self, Self::Legendary)
    }
}

/// How a collectible ended up in a player's collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObtainedFrom {
    Purchase,
    Box,
    Free,
}

impl ObtainedFrom {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Box => "box",
            Self::Free => "free",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(Self::Purchase),
            "box" => Some(Self::Box),
            "free" => Some(Self::Free),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BoxKind {
    /// Free once per calendar day, two rolls.
    Daily,
    /// Paid with sheep gems, one roll.
    Premium,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_text_round_trip() {
        for kind in [CollectibleKind::SheepEmoji, CollectibleKind::Particle] {
            assert_eq!(CollectibleKind::parse(kind.as_str()), Some(kind));
        }
        for rarity in [Rarity::Free, Rarity::Normal, Rarity::Epic, Rarity::Legendary] {
            assert_eq!(Rarity::parse(rarity.as_str()), Some(rarity));
        }
        assert_eq!(ObtainedFrom::parse("box"), Some(ObtainedFrom::Box));
        assert_eq!(Rarity::parse("mythic"), None);
    }

    #[test]
    fn short_id_is_prefix() {
        let id = UserId::new();
        assert!(id.to_string().starts_with(&id.short()));
        assert_eq!(id.short().len(), 8);
    }
}
