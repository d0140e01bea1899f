//! Feeder-type and nitrogen-fixer derivation from botanical taxonomy.
//!
//! # Responsibility
//! - Classify a plant's soil nutrient demand from its family and, when
//!   the family is unknown, from a numeric nutrient signal.
//!
//! # Invariants
//! - `is_nitrogen_fixer` depends only on the family identifier.
//! - A plant with no classifiable family and no nutrient signal gets no
//!   feeder type; the classifier never guesses a default.

use crate::config::ImportConfig;
use crate::model::plant::FeederType;
use std::collections::BTreeMap;

/// Derived taxonomy facts for one plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub feeder_type: Option<FeederType>,
    pub is_nitrogen_fixer: bool,
}

/// Classifies nutrient demand from family membership and nutrient signal.
pub struct TaxonomyClassifier {
    nitrogen_fixing_family: String,
    feeder_families: BTreeMap<String, FeederType>,
    heavy_nutrient_min: i64,
    light_nutrient_max: i64,
}

impl TaxonomyClassifier {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            nitrogen_fixing_family: config.nitrogen_fixing_family.clone(),
            feeder_families: config.feeder_families.clone(),
            heavy_nutrient_min: config.heavy_nutrient_min,
            light_nutrient_max: config.light_nutrient_max,
        }
    }

    /// Derives feeder type and nitrogen-fixer flag.
    ///
    /// Resolution order for the feeder type:
    /// 1. nitrogen-fixing family -> `NitrogenFixer`
    /// 2. static family table
    /// 3. nutrient signal partitioned by the two configured thresholds
    /// 4. nothing available -> `None`
    pub fn classify(
        &self,
        family: Option<&str>,
        nutrient_signal: Option<i64>,
    ) -> Classification {
        let is_nitrogen_fixer =
            family.is_some_and(|name| name == self.nitrogen_fixing_family);

        if is_nitrogen_fixer {
            return Classification {
                feeder_type: Some(FeederType::NitrogenFixer),
                is_nitrogen_fixer: true,
            };
        }

        if let Some(feeder) = family.and_then(|name| self.feeder_families.get(name)) {
            return Classification {
                feeder_type: Some(*feeder),
                is_nitrogen_fixer: false,
            };
        }

        let feeder_type = nutrient_signal.map(|signal| {
            if signal >= self.heavy_nutrient_min {
                FeederType::Heavy
            } else if signal <= self.light_nutrient_max {
                FeederType::Light
            } else {
                FeederType::Moderate
            }
        });

        Classification {
            feeder_type,
            is_nitrogen_fixer: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TaxonomyClassifier;
    use crate::config::ImportConfig;
    use crate::model::plant::FeederType;

    fn classifier() -> TaxonomyClassifier {
        TaxonomyClassifier::from_config(&ImportConfig::default())
    }

    #[test]
    fn nitrogen_fixing_family_ignores_nutrient_signal() {
        let result = classifier().classify(Some("Fabaceae"), Some(9));
        assert!(result.is_nitrogen_fixer);
        assert_eq!(result.feeder_type, Some(FeederType::NitrogenFixer));
    }

    #[test]
    fn family_table_wins_over_nutrient_signal() {
        let result = classifier().classify(Some("Solanaceae"), Some(9));
        assert!(!result.is_nitrogen_fixer);
        assert_eq!(result.feeder_type, Some(FeederType::Heavy));
    }

    #[test]
    fn unknown_family_partitions_on_nutrient_signal() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify(Some("Rosaceae"), Some(8)).feeder_type,
            Some(FeederType::Heavy)
        );
        assert_eq!(
            classifier.classify(Some("Rosaceae"), Some(5)).feeder_type,
            Some(FeederType::Moderate)
        );
        assert_eq!(
            classifier.classify(None, Some(3)).feeder_type,
            Some(FeederType::Light)
        );
    }

    #[test]
    fn nothing_available_leaves_feeder_type_unset() {
        let result = classifier().classify(None, None);
        assert_eq!(result.feeder_type, None);
        assert!(!result.is_nitrogen_fixer);

        let unknown_family = classifier().classify(Some("Rosaceae"), None);
        assert_eq!(unknown_family.feeder_type, None);
    }
}
