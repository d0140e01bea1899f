//! Name resolution against the canonical plant registry.
//!
//! # Responsibility
//! - Map arbitrary source-side plant name spellings to one canonical
//!   identity, or classify them as skipped/unresolved.
//! - Hold the in-memory registry view used for lookups during a run.
//!
//! # Invariants
//! - Resolution order is fixed: skip set, alias table, identity.
//! - Alias and skip lookups are case-sensitive exact matches.
//! - An unmapped spelling is `Unresolved`, never silently skipped.
//! - `resolve` is a pure function of (config, registry, input).

use crate::config::ImportConfig;
use crate::model::plant::{slugify, PlantId};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of resolving one source-side plant name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The name maps to a live canonical plant.
    Resolved(PlantId),
    /// The name is intentionally outside the domain.
    Skipped,
    /// No canonical plant matches the candidate name.
    Unresolved {
        /// The candidate canonical name after alias substitution,
        /// reported so operators can extend the alias table.
        candidate: String,
    },
}

/// In-memory view of the live canonical plant registry.
///
/// Built once per run after the registry phase and treated read-only by
/// every later phase.
#[derive(Debug, Clone, Default)]
pub struct PlantRegistry {
    by_name: BTreeMap<String, PlantId>,
    by_slug: BTreeMap<String, PlantId>,
}

impl PlantRegistry {
    pub fn insert(&mut self, id: PlantId, name: &str, slug: &str) {
        self.by_name.insert(name.to_string(), id);
        self.by_slug.insert(slug.to_string(), id);
    }

    /// Looks a candidate canonical name up by exact name, then by its
    /// slugified form.
    pub fn lookup(&self, candidate: &str) -> Option<PlantId> {
        if let Some(id) = self.by_name.get(candidate) {
            return Some(*id);
        }
        self.by_slug.get(slugify(candidate).as_str()).copied()
    }

    pub fn lookup_slug(&self, slug: &str) -> Option<PlantId> {
        self.by_slug.get(slug).copied()
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

/// Resolves source-side plant names to canonical identities.
pub struct NameResolver {
    aliases: BTreeMap<String, String>,
    skip_names: BTreeSet<String>,
}

impl NameResolver {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            aliases: config.aliases.clone(),
            skip_names: config.skip_names.clone(),
        }
    }

    /// Resolves one source name. First match wins:
    /// 1. skip set membership -> `Skipped`
    /// 2. alias table -> mapped canonical name
    /// 3. otherwise the input itself is the candidate
    ///
    /// The candidate is then matched against the live registry; a miss
    /// yields `Unresolved` with the candidate attached.
    pub fn resolve(&self, registry: &PlantRegistry, source_name: &str) -> Resolution {
        if self.skip_names.contains(source_name) {
            return Resolution::Skipped;
        }

        let candidate = self
            .aliases
            .get(source_name)
            .map(String::as_str)
            .unwrap_or(source_name);

        match registry.lookup(candidate) {
            Some(id) => Resolution::Resolved(id),
            None => Resolution::Unresolved {
                candidate: candidate.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NameResolver, PlantRegistry, Resolution};
    use crate::config::ImportConfig;

    fn fixture() -> (NameResolver, PlantRegistry) {
        let mut config = ImportConfig::default();
        config.aliases.insert("Beans".to_string(), "Bean".to_string());
        let resolver = NameResolver::from_config(&config);

        let mut registry = PlantRegistry::default();
        registry.insert(1, "Bean", "bean");
        registry.insert(2, "Tomato", "tomato");
        registry.insert(3, "Brussels Sprouts", "brussels-sprouts");
        (resolver, registry)
    }

    #[test]
    fn skip_set_wins_over_everything() {
        let (resolver, registry) = fixture();
        assert_eq!(resolver.resolve(&registry, "Marigold"), Resolution::Skipped);
    }

    #[test]
    fn alias_maps_to_registry_entry() {
        let (resolver, registry) = fixture();
        assert_eq!(
            resolver.resolve(&registry, "Beans"),
            Resolution::Resolved(1)
        );
    }

    #[test]
    fn identity_match_falls_back_to_slug_lookup() {
        let (resolver, registry) = fixture();
        assert_eq!(
            resolver.resolve(&registry, "Tomato"),
            Resolution::Resolved(2)
        );
        // Name differs in spacing/case; slugified form still matches.
        assert_eq!(
            resolver.resolve(&registry, "Brussels sprouts"),
            Resolution::Resolved(3)
        );
    }

    #[test]
    fn unknown_case_variant_of_alias_key_is_unresolved_by_design() {
        let (resolver, registry) = fixture();
        assert_eq!(
            resolver.resolve(&registry, "BEANS"),
            Resolution::Unresolved {
                candidate: "BEANS".to_string()
            }
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let (resolver, registry) = fixture();
        for _ in 0..3 {
            assert_eq!(
                resolver.resolve(&registry, "Beans"),
                Resolution::Resolved(1)
            );
            assert_eq!(resolver.resolve(&registry, "Rue"), Resolution::Skipped);
            assert!(matches!(
                resolver.resolve(&registry, "Dragonfruit"),
                Resolution::Unresolved { .. }
            ));
        }
    }
}
