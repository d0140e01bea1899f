//! Attribute fragment merging.
//!
//! # Responsibility
//! - Overlay one source fragment onto the stored attribute record with
//!   field-level last-write-wins semantics.
//! - Recompute derived taxonomy facts on every merge.
//!
//! # Invariants
//! - Absent fragment fields leave stored values untouched.
//! - Re-applying an already-applied fragment changes nothing.
//! - `edible_parts` is replaced wholesale when the fragment carries it.
//! - `feeder_type` and `is_nitrogen_fixer` are always derived from the
//!   record's current family and nutrient signal, never taken from a
//!   fragment.

use crate::model::plant::{AttributeFragment, AttributeRecord, PlantId, SourceTag};
use crate::repo::plant_repo::PlantRepository;
use crate::repo::RepoError;
use crate::taxonomy::TaxonomyClassifier;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum MergeError {
    PlantNotFound(PlantId),
    Repo(RepoError),
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlantNotFound(id) => write!(f, "plant not found for merge: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MergeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MergeError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::PlantNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Overlays a fragment onto a record, field by field.
///
/// Pure; persistence and reclassification happen in the service.
pub fn overlay_fragment(record: &AttributeRecord, fragment: &AttributeFragment) -> AttributeRecord {
    let mut merged = record.clone();

    if let Some(value) = fragment.cycle {
        merged.cycle = Some(value);
    }
    if let Some(value) = fragment.sun_needs {
        merged.sun_needs = Some(value);
    }
    if let Some(value) = fragment.water_needs {
        merged.water_needs = Some(value);
    }
    if let Some(value) = fragment.root_depth {
        merged.root_depth = Some(value);
    }
    if let Some(value) = fragment.growth_habit {
        merged.growth_habit = Some(value);
    }
    if let Some(value) = fragment.soil_temp_min_f {
        merged.soil_temp_min_f = Some(value);
    }
    if let Some(value) = fragment.soil_temp_optimal_f {
        merged.soil_temp_optimal_f = Some(value);
    }
    if let Some(value) = fragment.frost_tolerant {
        merged.frost_tolerant = Some(value);
    }
    if let Some(value) = fragment.spacing_min_inches {
        merged.spacing_min_inches = Some(value);
    }
    if let Some(value) = fragment.spacing_max_inches {
        merged.spacing_max_inches = Some(value);
    }
    if let Some(value) = fragment.planting_depth_inches {
        merged.planting_depth_inches = Some(value);
    }
    if let Some(value) = fragment.container_suitable {
        merged.container_suitable = Some(value);
    }
    if let Some(value) = fragment.requires_staking {
        merged.requires_staking = Some(value);
    }
    if let Some(value) = fragment.requires_pruning {
        merged.requires_pruning = Some(value);
    }
    if let Some(value) = fragment.days_to_maturity_min {
        merged.days_to_maturity_min = Some(value);
    }
    if let Some(value) = fragment.days_to_maturity_max {
        merged.days_to_maturity_max = Some(value);
    }
    if let Some(value) = fragment.watering_inches_per_week {
        merged.watering_inches_per_week = Some(value);
    }
    if let Some(value) = fragment.fertilizing_frequency_weeks {
        merged.fertilizing_frequency_weeks = Some(value);
    }
    if let Some(value) = fragment.mulch_recommended {
        merged.mulch_recommended = Some(value);
    }
    if let Some(value) = fragment.soil_nutrient_signal {
        merged.soil_nutrient_signal = Some(value);
    }
    if let Some(value) = fragment.notes.as_ref() {
        merged.notes = Some(value.clone());
    }
    if let Some(parts) = fragment.edible_parts.as_ref() {
        merged.edible_parts = parts.clone();
    }

    merged
}

/// Merge service facade over the plant repository.
pub struct MergeService<'a, R: PlantRepository> {
    repo: &'a R,
    classifier: &'a TaxonomyClassifier,
}

impl<'a, R: PlantRepository> MergeService<'a, R> {
    pub fn new(repo: &'a R, classifier: &'a TaxonomyClassifier) -> Self {
        Self { repo, classifier }
    }

    /// Merges one fragment into the stored record for `plant_id` and
    /// persists the result with rederived taxonomy facts.
    pub fn merge(
        &self,
        plant_id: PlantId,
        fragment: &AttributeFragment,
        source: SourceTag,
    ) -> Result<AttributeRecord, MergeError> {
        let plant = self
            .repo
            .get_plant(plant_id)?
            .ok_or(MergeError::PlantNotFound(plant_id))?;
        let stored = self
            .repo
            .get_attributes(plant_id)?
            .ok_or(MergeError::PlantNotFound(plant_id))?;

        let mut merged = overlay_fragment(&stored, fragment);

        let classification = self.classifier.classify(
            plant.family_name.as_deref(),
            merged.soil_nutrient_signal,
        );
        merged.feeder_type = classification.feeder_type;
        merged.is_nitrogen_fixer = classification.is_nitrogen_fixer;

        if merged != stored {
            self.repo.store_attributes(plant_id, &merged)?;
        }

        info!(
            "event=fragment_merged module=merge_service status=ok slug={} source={} changed={}",
            plant.slug,
            source.as_str(),
            merged != stored
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::overlay_fragment;
    use crate::model::plant::{AttributeFragment, AttributeRecord, Cycle, SunNeeds};

    #[test]
    fn absent_fields_leave_stored_values_untouched() {
        let stored = AttributeRecord {
            cycle: Some(Cycle::Perennial),
            sun_needs: Some(SunNeeds::FullSun),
            notes: Some("established".to_string()),
            ..AttributeRecord::default()
        };
        let fragment = AttributeFragment {
            cycle: Some(Cycle::Annual),
            ..AttributeFragment::default()
        };

        let merged = overlay_fragment(&stored, &fragment);
        assert_eq!(merged.cycle, Some(Cycle::Annual));
        assert_eq!(merged.sun_needs, Some(SunNeeds::FullSun));
        assert_eq!(merged.notes.as_deref(), Some("established"));
    }

    #[test]
    fn reapplying_the_same_fragment_is_a_no_op() {
        let fragment = AttributeFragment {
            cycle: Some(Cycle::Annual),
            frost_tolerant: Some(false),
            spacing_min_inches: Some(18.0),
            edible_parts: Some(vec!["fruit".to_string()]),
            ..AttributeFragment::default()
        };

        let once = overlay_fragment(&AttributeRecord::default(), &fragment);
        let twice = overlay_fragment(&once, &fragment);
        assert_eq!(once, twice);
    }

    #[test]
    fn edible_parts_are_replaced_wholesale() {
        let stored = AttributeRecord {
            edible_parts: vec!["leaves".to_string(), "stems".to_string()],
            ..AttributeRecord::default()
        };
        let fragment = AttributeFragment {
            edible_parts: Some(vec!["fruit".to_string()]),
            ..AttributeFragment::default()
        };

        let merged = overlay_fragment(&stored, &fragment);
        assert_eq!(merged.edible_parts, vec!["fruit".to_string()]);

        let untouched = overlay_fragment(&stored, &AttributeFragment::default());
        assert_eq!(untouched.edible_parts, stored.edible_parts);
    }
}
