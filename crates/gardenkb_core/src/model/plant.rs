//! Plant domain model.
//!
//! # Responsibility
//! - Define the canonical plant identity record and its attribute set.
//! - Define closed category enums with stable database tokens.
//! - Provide slug/name normalization helpers shared by import paths.
//!
//! # Invariants
//! - `id` is stable for the lifetime of a registry; `slug` is unique.
//! - Attribute fragments never carry derived fields; `feeder_type` and
//!   `is_nitrogen_fixer` are recomputed on every merge.

use serde::{Deserialize, Serialize};

/// Stable identifier for a canonical plant.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type PlantId = i64;

/// Growing cycle category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cycle {
    Annual,
    Perennial,
    Biennial,
}

/// Sunlight requirement category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SunNeeds {
    FullSun,
    PartShade,
    Shade,
}

/// Watering requirement category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaterNeeds {
    Low,
    Moderate,
    High,
    Frequent,
}

/// Root depth class used by rotation planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RootDepth {
    Shallow,
    Medium,
    Deep,
}

/// Growth habit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrowthHabit {
    Bush,
    Vine,
    Climber,
    Root,
    Leaf,
    Fruiting,
}

/// Soil nutrient demand class derived from botanical family and/or a
/// numeric nutrient signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeederType {
    Heavy,
    Moderate,
    Light,
    NitrogenFixer,
}

/// Closed set of companion relationship kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    Beneficial,
    Unfavorable,
    Neutral,
}

impl RelationshipKind {
    /// Parses a source-side kind value, case-insensitively.
    ///
    /// Returns `None` for any value outside the closed set; callers must
    /// report such values, never coerce them.
    pub fn parse_source_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beneficial" => Some(Self::Beneficial),
            "unfavorable" => Some(Self::Unfavorable),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Beneficial => "BENEFICIAL",
            Self::Unfavorable => "UNFAVORABLE",
            Self::Neutral => "NEUTRAL",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "BENEFICIAL" => Some(Self::Beneficial),
            "UNFAVORABLE" => Some(Self::Unfavorable),
            "NEUTRAL" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl FeederType {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Heavy => "HEAVY",
            Self::Moderate => "MODERATE",
            Self::Light => "LIGHT",
            Self::NitrogenFixer => "NITROGEN_FIXER",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "HEAVY" => Some(Self::Heavy),
            "MODERATE" => Some(Self::Moderate),
            "LIGHT" => Some(Self::Light),
            "NITROGEN_FIXER" => Some(Self::NitrogenFixer),
            _ => None,
        }
    }
}

macro_rules! category_db_tokens {
    ($type:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $type {
            pub fn as_db_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }

            pub fn parse_db(value: &str) -> Option<Self> {
                match value {
                    $($token => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

category_db_tokens!(Cycle {
    Annual => "ANNUAL",
    Perennial => "PERENNIAL",
    Biennial => "BIENNIAL",
});

category_db_tokens!(SunNeeds {
    FullSun => "FULL_SUN",
    PartShade => "PART_SHADE",
    Shade => "SHADE",
});

category_db_tokens!(WaterNeeds {
    Low => "LOW",
    Moderate => "MODERATE",
    High => "HIGH",
    Frequent => "FREQUENT",
});

category_db_tokens!(RootDepth {
    Shallow => "SHALLOW",
    Medium => "MEDIUM",
    Deep => "DEEP",
});

category_db_tokens!(GrowthHabit {
    Bush => "BUSH",
    Vine => "VINE",
    Climber => "CLIMBER",
    Root => "ROOT",
    Leaf => "LEAF",
    Fruiting => "FRUITING",
});

/// Which source produced a merged fragment or linked statement. Used
/// for logging, not for precedence: merges are last-applied-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTag {
    /// LLM-structured extraction from free-text gardening guides.
    GuideExtraction,
    /// Third-party botanical taxonomy lookup results.
    BotanicalLookup,
    /// Regex-based pest/disease extraction database.
    PestExtraction,
    /// Companion-planting compatibility matrix.
    CompanionMatrix,
}

impl SourceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GuideExtraction => "guide_extraction",
            Self::BotanicalLookup => "botanical_lookup",
            Self::PestExtraction => "pest_extraction",
            Self::CompanionMatrix => "companion_matrix",
        }
    }
}

/// The reconciled plant identity.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPlant {
    pub id: PlantId,
    /// Singular, title-case display name.
    pub name: String,
    /// Lowercase hyphenated unique identifier.
    pub slug: String,
    pub scientific_name: Option<String>,
    pub genus: Option<String>,
    pub family_id: Option<i64>,
    /// Family display name resolved from the fixed vocabulary.
    pub family_name: Option<String>,
}

/// Consolidated per-plant attributes after merging all source fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeRecord {
    pub cycle: Option<Cycle>,
    pub sun_needs: Option<SunNeeds>,
    pub water_needs: Option<WaterNeeds>,
    pub root_depth: Option<RootDepth>,
    pub growth_habit: Option<GrowthHabit>,
    pub soil_temp_min_f: Option<f64>,
    pub soil_temp_optimal_f: Option<f64>,
    pub frost_tolerant: Option<bool>,
    pub spacing_min_inches: Option<f64>,
    pub spacing_max_inches: Option<f64>,
    pub planting_depth_inches: Option<f64>,
    pub container_suitable: Option<bool>,
    pub requires_staking: Option<bool>,
    pub requires_pruning: Option<bool>,
    pub days_to_maturity_min: Option<i64>,
    pub days_to_maturity_max: Option<i64>,
    pub watering_inches_per_week: Option<f64>,
    pub fertilizing_frequency_weeks: Option<i64>,
    pub mulch_recommended: Option<bool>,
    /// Numeric nutrient-demand signal from the botanical lookup (0-10).
    pub soil_nutrient_signal: Option<i64>,
    pub notes: Option<String>,
    /// Set-valued: replaced wholesale by the last fragment carrying it.
    pub edible_parts: Vec<String>,
    /// Derived on every merge, never carried by a fragment.
    pub is_nitrogen_fixer: bool,
    /// Derived on every merge, never carried by a fragment.
    pub feeder_type: Option<FeederType>,
}

/// One source's partial view of a plant's attributes.
///
/// Field names mirror the JSON emitted by the guide extraction step, so
/// fragment files deserialize directly into this shape. Fields absent
/// from a fragment leave the stored record untouched on merge.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributeFragment {
    pub common_name: Option<String>,
    pub cycle: Option<Cycle>,
    pub sun_needs: Option<SunNeeds>,
    pub water_needs: Option<WaterNeeds>,
    pub root_depth: Option<RootDepth>,
    pub growth_habit: Option<GrowthHabit>,
    #[serde(rename = "soilTempMinF")]
    pub soil_temp_min_f: Option<f64>,
    #[serde(rename = "soilTempOptimalF")]
    pub soil_temp_optimal_f: Option<f64>,
    pub frost_tolerant: Option<bool>,
    #[serde(rename = "spacingMin")]
    pub spacing_min_inches: Option<f64>,
    #[serde(rename = "spacingMax")]
    pub spacing_max_inches: Option<f64>,
    pub planting_depth_inches: Option<f64>,
    pub container_suitable: Option<bool>,
    pub requires_staking: Option<bool>,
    pub requires_pruning: Option<bool>,
    pub days_to_maturity_min: Option<i64>,
    pub days_to_maturity_max: Option<i64>,
    pub watering_inches_per_week: Option<f64>,
    pub fertilizing_frequency_weeks: Option<i64>,
    pub mulch_recommended: Option<bool>,
    pub soil_nutrient_signal: Option<i64>,
    pub notes: Option<String>,
    pub edible_parts: Option<Vec<String>>,
}

/// Converts a display name to the canonical lowercase hyphenated slug.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace([' ', '_'], "-")
}

/// Derives a title-case display name from a slug, for plants whose
/// fragment carries no `commonName`.
pub fn name_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
