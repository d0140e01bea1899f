//! Companion matrix application.
//!
//! # Responsibility
//! - Turn raw companion matrix statements into deduplicated
//!   relationship edges: resolve both endpoints, validate the kind,
//!   discard self-pairs and persist by unordered pair.
//!
//! # Invariants
//! - A statement with an unresolved or skipped endpoint is dropped and
//!   counted; it never aborts the run.
//! - A kind outside the closed set is one warning and a drop; the
//!   prior stored edge for that pair is left intact.
//! - Self-pairs are discarded silently.
//! - Disputed pairs resolve last-write-wins in matrix iteration order.

use crate::ingest::CompanionMatrix;
use crate::model::plant::{PlantId, RelationshipKind};
use crate::repo::companion_repo::CompanionRepository;
use crate::repo::RepoError;
use crate::resolve::{NameResolver, PlantRegistry, Resolution};
use log::warn;
use std::collections::BTreeSet;

/// Counters and listings from one matrix application pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanionOutcome {
    pub statements_seen: usize,
    pub edges_applied: usize,
    pub dropped_skipped: usize,
    pub dropped_unresolved: usize,
    pub dropped_unknown_kind: usize,
    pub dropped_self_pairs: usize,
    /// Candidate names that matched no canonical plant, for operators.
    pub unresolved_names: BTreeSet<String>,
}

/// Applies companion matrices against the live registry.
pub struct CompanionService<'a, R: CompanionRepository> {
    repo: &'a R,
    resolver: &'a NameResolver,
    registry: &'a PlantRegistry,
}

impl<'a, R: CompanionRepository> CompanionService<'a, R> {
    pub fn new(repo: &'a R, resolver: &'a NameResolver, registry: &'a PlantRegistry) -> Self {
        Self {
            repo,
            resolver,
            registry,
        }
    }

    /// Applies every statement in the matrix, accumulating an outcome
    /// summary. Only repository faults propagate as errors.
    pub fn apply_matrix(&self, matrix: &CompanionMatrix) -> Result<CompanionOutcome, RepoError> {
        let mut outcome = CompanionOutcome::default();

        for (subject_name, companions) in &matrix.0 {
            let subject_resolution = self.resolver.resolve(self.registry, subject_name);
            if let Resolution::Unresolved { candidate } = &subject_resolution {
                warn!(
                    "event=unresolved_companion_name module=companion_service status=warn \
                     source_name={subject_name} candidate={candidate}"
                );
                outcome.unresolved_names.insert(candidate.clone());
            }

            for (companion_name, value) in companions {
                outcome.statements_seen += 1;

                // A dropped subject drops every statement on its row.
                let subject = match &subject_resolution {
                    Resolution::Resolved(id) => *id,
                    Resolution::Skipped => {
                        outcome.dropped_skipped += 1;
                        continue;
                    }
                    Resolution::Unresolved { .. } => {
                        outcome.dropped_unresolved += 1;
                        continue;
                    }
                };

                let companion = match self.resolve_endpoint(companion_name, &mut outcome) {
                    Some(id) => id,
                    None => continue,
                };

                if subject == companion {
                    outcome.dropped_self_pairs += 1;
                    continue;
                }

                let Some(kind) = RelationshipKind::parse_source_value(value.kind_str()) else {
                    warn!(
                        "event=unknown_relationship_kind module=companion_service status=warn \
                         subject={subject_name} companion={companion_name} kind={}",
                        value.kind_str()
                    );
                    outcome.dropped_unknown_kind += 1;
                    continue;
                };

                self.repo
                    .upsert_edge(subject, companion, kind, value.reason())?;
                outcome.edges_applied += 1;
            }
        }

        Ok(outcome)
    }

    fn resolve_endpoint(&self, name: &str, outcome: &mut CompanionOutcome) -> Option<PlantId> {
        match self.resolver.resolve(self.registry, name) {
            Resolution::Resolved(id) => Some(id),
            Resolution::Skipped => {
                outcome.dropped_skipped += 1;
                None
            }
            Resolution::Unresolved { candidate } => {
                warn!(
                    "event=unresolved_companion_name module=companion_service status=warn \
                     source_name={name} candidate={candidate}"
                );
                outcome.dropped_unresolved += 1;
                outcome.unresolved_names.insert(candidate);
                None
            }
        }
    }
}
