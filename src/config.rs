//! # Settings Module
//!
//! Persists the single user setting, the wallpaper target directory, and
//! resolves the Bing regional market from the locale environment.
//!
//! ## Settings Storage
//! Settings are stored as one JSON object in
//! `~/.config/bingwall/settings.json`. An absent or corrupt file falls back
//! to defaults, so a caller always starts with a usable target directory.
//!
//! ## Bing Markets
//! Bing serves different "Image of the Day" content per regional market.
//! The market is not persisted; it is derived from the locale environment on
//! each run, with "en-US" as the fallback.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Market used when the locale environment names no known market.
pub const DEFAULT_MARKET: &str = "en-US";

/// Market codes known to serve a regional image of the day.
pub const MARKETS: &[&str] = &[
    "da-DK", "de-DE", "en-AU", "en-CA", "en-GB", "en-IN", "en-NZ", "en-US", "es-ES", "fi-FI",
    "fr-FR", "it-IT", "ja-JP", "ko-KR", "nb-NO", "nl-NL", "pl-PL", "pt-BR", "ru-RU", "sv-SE",
    "zh-CN",
];

/// Resolves the Bing market from the locale environment.
///
/// Checks `LC_ALL` first, then `LANG`, normalizing values like
/// `de_DE.UTF-8` to `de-DE`. Falls back to [`DEFAULT_MARKET`] when neither
/// variable names a known market.
pub fn detect_market() -> String {
    ["LC_ALL", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|value| market_from_locale(&value))
        .unwrap_or_else(|| DEFAULT_MARKET.to_string())
}

/// Normalizes a POSIX locale string to a market code, if it is a known one.
fn market_from_locale(locale: &str) -> Option<String> {
    let tag = locale
        .split('.')
        .next()
        .unwrap_or_default()
        .replace('_', "-");
    if MARKETS.contains(&tag.as_str()) {
        Some(tag)
    } else {
        None
    }
}

/// User settings for the application.
///
/// Persisted to `~/.config/bingwall/settings.json` as a single JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory where downloaded wallpapers are stored.
    /// Defaults to `~/Pictures/BingImages`.
    pub wallpaper_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let wallpaper_dir = dirs::picture_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join("BingImages");

        Self { wallpaper_dir }
    }
}

impl Config {
    /// Returns the path to the settings file.
    fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("bingwall/settings.json"))
    }

    /// Loads the settings from disk.
    ///
    /// If the settings file does not exist or cannot be parsed, returns
    /// default values.
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Persists the current settings to disk.
    ///
    /// Creates the settings directory if it does not exist. The settings are
    /// stored as pretty-printed JSON for easy manual editing if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()
            .ok_or_else(|| Error::Config("could not determine settings path".to_string()))?;
        self.save_to(&path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize settings: {e}")))?;
        std::fs::write(path, content)?;

        Ok(())
    }
}
