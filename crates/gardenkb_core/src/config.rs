//! Static import configuration.
//!
//! # Responsibility
//! - Carry the curated alias table, skip set and taxonomy tables that
//!   drive name resolution and feeder-type derivation.
//! - Load overrides from a JSON file, or fall back to built-in defaults.
//!
//! # Invariants
//! - Configuration is immutable for the lifetime of an import run.
//! - Resolver and classifier receive it at construction, never read
//!   process-wide state.

use crate::model::plant::FeederType;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Complete static configuration surface consumed by the import core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Source spelling -> canonical name or slug. Keys are case-sensitive:
    /// the table enumerates a finite set of known spellings, and an
    /// unlisted case variant is reported unresolved rather than guessed.
    pub aliases: BTreeMap<String, String>,
    /// Names intentionally excluded from the domain (ornamentals,
    /// placeholder tokens). Counted separately from resolution misses.
    pub skip_names: BTreeSet<String>,
    /// The single family whose members are nitrogen fixers.
    pub nitrogen_fixing_family: String,
    /// Botanical family -> feeder type, for families with a known class.
    pub feeder_families: BTreeMap<String, FeederType>,
    /// Nutrient signal at or above this value classifies as heavy feeder.
    pub heavy_nutrient_min: i64,
    /// Nutrient signal at or below this value classifies as light feeder.
    pub light_nutrient_max: i64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
            skip_names: default_skip_names(),
            nitrogen_fixing_family: "Fabaceae".to_string(),
            feeder_families: default_feeder_families(),
            heavy_nutrient_min: 7,
            light_nutrient_max: 4,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config file: {err}"),
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl ImportConfig {
    /// Loads configuration from a JSON file.
    ///
    /// Missing keys fall back to the built-in defaults, so a partial
    /// override file only needs the tables it changes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&raw).map_err(ConfigError::Parse)
    }
}

fn default_aliases() -> BTreeMap<String, String> {
    [
        // Plural to singular.
        ("Beans", "Bean"),
        ("Peas", "Pea"),
        ("Leeks", "Leek"),
        ("Shallots", "Shallot"),
        ("Strawberries", "Strawberry"),
        ("Chives", "Chive"),
        ("Tomatoes", "Tomato"),
        ("Peppers", "Pepper"),
        ("Potatoes", "Potato"),
        ("Carrots", "Carrot"),
        ("Onions", "Onion"),
        ("Cucumbers", "Cucumber"),
        ("Radishes", "Radish"),
        ("Beets", "Beet"),
        ("Turnips", "Turnip"),
        ("Parsnips", "Parsnip"),
        ("Pumpkins", "Pumpkin"),
        // Regional or merged spellings.
        ("Beetroot", "Beet"),
        ("Cilantro", "Coriander"),
        ("Squash", "Zucchini"),
        ("Aubergine", "Eggplant"),
        ("Scallion", "Green Onion"),
        ("Scallions", "Green Onion"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

fn default_skip_names() -> BTreeSet<String> {
    [
        // Ornamentals outside the vegetable/herb domain.
        "Chamomile",
        "Marigold",
        "Nasturtium",
        "Rue",
        "Borage",
        "Calendula",
        "Petunia",
        "Zinnia",
        "Lavender",
        "Sunflower",
        // Placeholder token appearing in companion matrices.
        "Most plants",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_feeder_families() -> BTreeMap<String, FeederType> {
    [
        ("Solanaceae", FeederType::Heavy),
        ("Brassicaceae", FeederType::Heavy),
        ("Cucurbitaceae", FeederType::Heavy),
        ("Poaceae", FeederType::Heavy),
        ("Apiaceae", FeederType::Moderate),
        ("Amaranthaceae", FeederType::Moderate),
        ("Amaryllidaceae", FeederType::Light),
        ("Asteraceae", FeederType::Light),
        ("Lamiaceae", FeederType::Light),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::ImportConfig;
    use crate::model::plant::FeederType;

    #[test]
    fn defaults_cover_the_curated_tables() {
        let config = ImportConfig::default();
        assert_eq!(config.aliases.get("Beans").map(String::as_str), Some("Bean"));
        assert!(config.skip_names.contains("Marigold"));
        assert_eq!(config.nitrogen_fixing_family, "Fabaceae");
        assert_eq!(
            config.feeder_families.get("Solanaceae").copied(),
            Some(FeederType::Heavy)
        );
        assert_eq!(config.heavy_nutrient_min, 7);
        assert_eq!(config.light_nutrient_max, 4);
    }

    #[test]
    fn partial_override_keeps_default_tables() {
        let config: ImportConfig =
            serde_json::from_str(r#"{"nitrogen_fixing_family": "Other"}"#).unwrap();
        assert_eq!(config.nitrogen_fixing_family, "Other");
        assert!(config.skip_names.contains("Marigold"));
    }
}
