// Theme domain model
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemePreset {
    #[default]
    AcsDefault,
    BitaxeRed,
    BlockstreamJade,
    BlockstreamBlue,
    SoloSatoshi,
    SoloMiningCo,
}

impl ThemePreset {
    pub const ALL: [ThemePreset; 6] = [
        ThemePreset::AcsDefault,
        ThemePreset::BitaxeRed,
        ThemePreset::BlockstreamJade,
        ThemePreset::BlockstreamBlue,
        ThemePreset::SoloSatoshi,
        ThemePreset::SoloMiningCo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreset::AcsDefault => "THEME_ACS_DEFAULT",
            ThemePreset::BitaxeRed => "THEME_BITAXE_RED",
            ThemePreset::BlockstreamJade => "THEME_BLOCKSTREAM_JADE",
            ThemePreset::BlockstreamBlue => "THEME_BLOCKSTREAM_BLUE",
            ThemePreset::SoloSatoshi => "THEME_SOLO_SATOSHI",
            ThemePreset::SoloMiningCo => "THEME_SOLO_MINING_CO",
        }
    }
}

impl fmt::Display for ThemePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid theme name: {0}")]
pub struct ThemeParseError(pub String);

impl FromStr for ThemePreset {
    type Err = ThemeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemePreset::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ThemeParseError(s.to_string()))
    }
}

/// Colors the device reports for the active theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDescriptor {
    pub theme_name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub border_color: String,
}

impl ThemeDescriptor {
    pub fn preset(&self) -> Result<ThemePreset, ThemeParseError> {
        self.theme_name.parse()
    }

    /// Styling variables, in the order a renderer should apply them.
    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        vec![
            ("--primary-color", self.primary_color.clone()),
            ("--secondary-color", self.secondary_color.clone()),
            ("--background-color", self.background_color.clone()),
            ("--text-color", self.text_color.clone()),
            ("--border-color", self.border_color.clone()),
            ("--primary-color-text", "#ffffff".to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeList {
    #[serde(default)]
    pub themes: Vec<String>,
}
