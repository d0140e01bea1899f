//! Typed loaders for the four read-only source inputs.
//!
//! # Responsibility
//! - Deserialize the companion matrix, botanical lookup results,
//!   pest/disease database and per-plant attribute fragments.
//! - Treat a malformed or unreadable file as a counted skip, not a
//!   fatal fault (taxonomy: per-file parse faults keep the run alive).
//!
//! # Invariants
//! - Loaders never mutate the knowledge base; they only produce values.
//! - Fragment slugs derive from file names, matching the upstream
//!   extraction layout (`<slug>.json`).

use crate::model::plant::AttributeFragment;
use log::warn;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

#[derive(Debug)]
pub enum IngestError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read source file: {err}"),
            Self::Parse(err) => write!(f, "invalid source JSON: {err}"),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Companion matrix value: either a bare kind string or an annotated
/// object carrying a free-text reason.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CompanionValue {
    Kind(String),
    Detailed {
        relationship: String,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl CompanionValue {
    pub fn kind_str(&self) -> &str {
        match self {
            Self::Kind(kind) => kind,
            Self::Detailed { relationship, .. } => relationship,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Kind(_) => None,
            Self::Detailed { reason, .. } => reason.as_deref(),
        }
    }
}

/// Source plant name -> companion name -> relationship statement.
///
/// BTreeMap keeps iteration order deterministic, so disputed pairs
/// resolve the same way on every run of the same input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompanionMatrix(pub BTreeMap<String, BTreeMap<String, CompanionValue>>);

/// One botanical lookup result row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BotanicalRecord {
    pub slug: String,
    #[serde(rename = "commonName")]
    pub common_name: Option<String>,
    #[serde(alias = "trefle_found")]
    pub found: bool,
    pub scientific_name: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub growth: Option<GrowthData>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GrowthData {
    pub soil_nutriments: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BotanicalLookup {
    pub plants: Vec<BotanicalRecord>,
}

impl BotanicalLookup {
    pub fn by_slug(&self) -> BTreeMap<&str, &BotanicalRecord> {
        self.plants
            .iter()
            .map(|record| (record.slug.as_str(), record))
            .collect()
    }
}

/// Per-plant pest/disease extraction result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlantPestRecord {
    pub slug: String,
    #[serde(rename = "commonName")]
    pub common_name: Option<String>,
    pub pests: Vec<String>,
    pub diseases: Vec<String>,
}

/// The pest/disease extraction database. The `*_index` maps are kept
/// for operator inspection; linkage works off the per-plant lists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PestDiseaseDatabase {
    pub plants: Vec<PlantPestRecord>,
    pub pests_index: BTreeMap<String, serde_json::Value>,
    pub diseases_index: BTreeMap<String, serde_json::Value>,
}

/// One attribute fragment file, slug taken from the file name.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentFile {
    pub slug: String,
    pub fragment: AttributeFragment,
}

pub fn load_companion_matrix(path: impl AsRef<Path>) -> Result<CompanionMatrix, IngestError> {
    load_json(path)
}

pub fn load_botanical_lookup(path: impl AsRef<Path>) -> Result<BotanicalLookup, IngestError> {
    load_json(path)
}

pub fn load_pest_database(path: impl AsRef<Path>) -> Result<PestDiseaseDatabase, IngestError> {
    load_json(path)
}

/// Loads every `*.json` attribute fragment in a directory.
///
/// Returns the parsed fragments sorted by slug plus the count of files
/// that were skipped because they could not be read or parsed.
pub fn load_attribute_fragments(
    dir: impl AsRef<Path>,
) -> Result<(Vec<FragmentFile>, usize), IngestError> {
    let mut fragments = Vec::new();
    let mut skipped = 0usize;

    let entries = std::fs::read_dir(dir.as_ref()).map_err(IngestError::Io)?;
    for entry in entries {
        let entry = entry.map_err(IngestError::Io)?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let Some(slug) = path.file_stem().and_then(|stem| stem.to_str()) else {
            skipped += 1;
            continue;
        };

        match load_json::<AttributeFragment>(&path) {
            Ok(fragment) => fragments.push(FragmentFile {
                slug: slug.to_string(),
                fragment,
            }),
            Err(err) => {
                warn!(
                    "event=fragment_skipped module=ingest status=warn file={} error={}",
                    path.display(),
                    err
                );
                skipped += 1;
            }
        }
    }

    fragments.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok((fragments, skipped))
}

fn load_json<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T, IngestError> {
    let raw = std::fs::read_to_string(path).map_err(IngestError::Io)?;
    serde_json::from_str(&raw).map_err(IngestError::Parse)
}

#[cfg(test)]
mod tests {
    use super::{CompanionMatrix, CompanionValue};

    #[test]
    fn companion_values_accept_both_shapes() {
        let raw = r#"{
            "Tomato": {
                "Basil": "beneficial",
                "Cabbage": {"relationship": "unfavorable", "reason": "stunts growth"}
            }
        }"#;
        let matrix: CompanionMatrix = serde_json::from_str(raw).unwrap();
        let companions = matrix.0.get("Tomato").unwrap();

        assert_eq!(companions.get("Basil").unwrap().kind_str(), "beneficial");
        let cabbage = companions.get("Cabbage").unwrap();
        assert_eq!(cabbage.kind_str(), "unfavorable");
        assert_eq!(cabbage.reason(), Some("stunts growth"));
        assert!(matches!(cabbage, CompanionValue::Detailed { .. }));
    }
}
