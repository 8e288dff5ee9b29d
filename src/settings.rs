//! # Settings Module
//!
//! Display options of the restaurant, persisted as a small JSON document.
//! Absent files and absent keys fall back to defaults; unknown keys are
//! ignored.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::menu_errors::MenuError;

pub const DEFAULT_RESTAURANT_NAME: &str = "Ristorante";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "€";

/// Restaurant display options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Whether prices are shown to non-admin users
    #[serde(alias = "mostra_prezzi")]
    pub show_prices: bool,
    #[serde(alias = "nome_ristorante")]
    pub restaurant_name: String,
    #[serde(alias = "valuta")]
    pub currency_symbol: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_prices: true,
            restaurant_name: DEFAULT_RESTAURANT_NAME.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

/// Subset of settings visible to non-admin users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub show_prices: bool,
    pub currency_symbol: String,
}

impl Settings {
    pub fn public_view(&self) -> PublicSettings {
        PublicSettings {
            show_prices: self.show_prices,
            currency_symbol: self.currency_symbol.clone(),
        }
    }
}

/// Partial update; only provided fields change
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub show_prices: Option<bool>,
    pub restaurant_name: Option<String>,
    pub currency_symbol: Option<String>,
}

/// Settings document on disk
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current settings; defaults when the document is absent or unreadable
    pub fn load(&self) -> Settings {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Settings::default(),
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring unreadable settings {}: {}", self.path.display(), e);
            Settings::default()
        })
    }

    /// Merge an update into the stored settings and persist the result
    pub fn update(&self, update: SettingsUpdate) -> Result<Settings, MenuError> {
        let mut settings = self.load();
        if let Some(show_prices) = update.show_prices {
            settings.show_prices = show_prices;
        }
        if let Some(name) = update.restaurant_name {
            settings.restaurant_name = name;
        }
        if let Some(symbol) = update.currency_symbol {
            settings.currency_symbol = symbol;
        }

        fs::write(&self.path, serde_json::to_string_pretty(&settings)?)?;
        info!("Settings saved to {}", self.path.display());
        Ok(settings)
    }
}
