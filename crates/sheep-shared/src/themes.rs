//! Colour themes that can be bought with wool coins.

use serde::Serialize;

/// Theme every player starts with.
pub const DEFAULT_THEME_ID: &str = "cosmic";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Theme {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Price in wool coins. Zero for the starter theme.
    pub cost: u64,
    pub colors: Palette,
}

pub const THEMES: [Theme; 9] = [
    Theme {
        id: "cosmic",
        display_name: "Cosmic Purple",
        description: "The classic purple and pink cosmic theme",
        cost: 0,
        colors: Palette { primary: "#8B5CF6", secondary: "#EC4899", accent: "#F59E0B" },
    },
    Theme {
        id: "forest",
        display_name: "Emerald Forest",
        description: "A fresh green theme inspired by nature",
        cost: 25,
        colors: Palette { primary: "#10B981", secondary: "#059669", accent: "#F59E0B" },
    },
    Theme {
        id: "arctic",
        display_name: "Arctic White",
        description: "A clean, minimalist white and blue theme",
        cost: 50,
        colors: Palette { primary: "#3B82F6", secondary: "#1D4ED8", accent: "#F59E0B" },
    },
    Theme {
        id: "sunset",
        display_name: "Golden Sunset",
        description: "Warm orange and red sunset colors",
        cost: 75,
        colors: Palette { primary: "#F59E0B", secondary: "#EF4444", accent: "#8B5CF6" },
    },
    Theme {
        id: "midnight",
        display_name: "Midnight Blue",
        description: "Deep blue theme for night owls",
        cost: 100,
        colors: Palette { primary: "#1E40AF", secondary: "#3730A3", accent: "#F59E0B" },
    },
    Theme {
        id: "neon",
        display_name: "Neon Cyber",
        description: "Futuristic dark theme with vibrant neon highlights",
        cost: 250,
        colors: Palette { primary: "#00FFFF", secondary: "#FF00FF", accent: "#00FF00" },
    },
    Theme {
        id: "coral",
        display_name: "Coral Reef",
        description: "Tropical coral theme with warm ocean vibes",
        cost: 500,
        colors: Palette { primary: "#FF7F7F", secondary: "#40E0D0", accent: "#FFD700" },
    },
    Theme {
        id: "rainbow",
        display_name: "Rainbow Spectrum",
        description: "Vibrant rainbow theme with shifting colors",
        cost: 750,
        colors: Palette { primary: "#FF6B6B", secondary: "#4ECDC4", accent: "#45B7D1" },
    },
    Theme {
        id: "galaxy",
        display_name: "Cosmic Galaxy",
        description: "Premium galaxy theme with stellar highlights",
        cost: 1000,
        colors: Palette { primary: "#9D4EDD", secondary: "#7209B7", accent: "#FFD60A" },
    },
];

pub fn find_theme(id: &str) -> Option<&'static Theme> {
    THEMES.iter().find(|t| t.id == id)
}
