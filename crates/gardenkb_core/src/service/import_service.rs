//! Import run orchestration.
//!
//! # Responsibility
//! - Drive one full import as a phase state machine: rebuild the
//!   canonical registry, merge attribute fragments, link relationship
//!   and pest/disease data, verify coverage.
//! - Emit a run report on every run, success or failure.
//!
//! # Invariants
//! - Phase order is fixed: `Idle -> RegistryLoaded -> AttributesMerged
//!   -> RelationshipsLinked -> Verified -> Done`; `Failed` is reachable
//!   from any non-terminal state.
//! - Each writing phase runs in one SQLite transaction; a mid-phase
//!   fault rolls that phase back and ends the run `Failed`.
//! - The registry view is built once after the registry phase and
//!   treated read-only by every later phase.

use crate::config::ImportConfig;
use crate::extract::normalize_entity_name;
use crate::ingest::{
    load_attribute_fragments, load_botanical_lookup, load_companion_matrix, load_pest_database,
    BotanicalLookup, CompanionMatrix, FragmentFile, IngestError, PestDiseaseDatabase,
};
use crate::model::plant::{
    name_from_slug, AttributeFragment, RelationshipKind, SourceTag,
};
use crate::repo::companion_repo::{CompanionRepository, SqliteCompanionRepository};
use crate::repo::pest_repo::{PestRepository, SqlitePestRepository};
use crate::repo::plant_repo::{NewPlant, PlantRepository, SqlitePlantRepository};
use crate::repo::RepoError;
use crate::resolve::{NameResolver, PlantRegistry};
use crate::service::companion_service::{CompanionOutcome, CompanionService};
use crate::service::merge_service::{MergeError, MergeService};
use crate::taxonomy::TaxonomyClassifier;
use log::{error, info, warn};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

#[derive(Debug)]
pub enum ImportError {
    Db(rusqlite::Error),
    Repo(RepoError),
    Merge(MergeError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "database failure during import: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Merge(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Merge(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MergeError> for ImportError {
    fn from(value: MergeError) -> Self {
        Self::Merge(value)
    }
}

/// Import run phases, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPhase {
    #[default]
    Idle,
    RegistryLoaded,
    AttributesMerged,
    RelationshipsLinked,
    Verified,
    Done,
    Failed,
}

impl ImportPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RegistryLoaded => "registry_loaded",
            Self::AttributesMerged => "attributes_merged",
            Self::RelationshipsLinked => "relationships_linked",
            Self::Verified => "verified",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// The four read-only source inputs for one run.
#[derive(Debug, Clone, Default)]
pub struct ImportSources {
    pub companion_matrix: CompanionMatrix,
    pub botanical: BotanicalLookup,
    pub pest_db: PestDiseaseDatabase,
    pub fragments: Vec<FragmentFile>,
    pub fragment_files_skipped: usize,
    /// Single-file sources that could not be read or parsed and were
    /// replaced by their empty value.
    pub source_files_skipped: usize,
}

impl ImportSources {
    /// Loads all sources from a data directory with the conventional
    /// layout produced by the upstream collection steps:
    /// `companion_matrix.json`, `botanical_lookup.json`,
    /// `pest_disease_db.json` and a `fragments/` directory.
    ///
    /// A malformed or missing source is counted and replaced by its
    /// empty value; the run proceeds with that source contributing
    /// nothing.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut source_files_skipped = 0usize;

        let fragments_dir = dir.join("fragments");
        let (fragments, fragment_files_skipped) = or_skipped(
            load_attribute_fragments(&fragments_dir),
            &fragments_dir,
            &mut source_files_skipped,
        );

        let matrix_path = dir.join("companion_matrix.json");
        let botanical_path = dir.join("botanical_lookup.json");
        let pest_path = dir.join("pest_disease_db.json");
        Self {
            companion_matrix: or_skipped(
                load_companion_matrix(&matrix_path),
                &matrix_path,
                &mut source_files_skipped,
            ),
            botanical: or_skipped(
                load_botanical_lookup(&botanical_path),
                &botanical_path,
                &mut source_files_skipped,
            ),
            pest_db: or_skipped(
                load_pest_database(&pest_path),
                &pest_path,
                &mut source_files_skipped,
            ),
            fragments,
            fragment_files_skipped,
            source_files_skipped,
        }
    }
}

fn or_skipped<T: Default>(
    result: Result<T, IngestError>,
    path: &Path,
    source_files_skipped: &mut usize,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "event=source_skipped module=import_service status=warn file={} error={}",
                path.display(),
                err
            );
            *source_files_skipped += 1;
            T::default()
        }
    }
}

/// Human-facing summary of one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub phase: ImportPhase,
    pub plants_imported: usize,
    pub plants_skipped: usize,
    pub fragment_files_skipped: usize,
    pub source_files_skipped: usize,
    pub fragments_merged: usize,
    pub botanical_merged: usize,
    pub companions: CompanionOutcome,
    pub pest_entities: i64,
    pub disease_entities: i64,
    pub pest_links: i64,
    pub disease_links: i64,
    pub pest_rows_unmatched: usize,
    pub kind_histogram: Vec<(RelationshipKind, i64)>,
    /// Skip-set names encountered while building the registry.
    pub skipped_names: BTreeSet<String>,
    pub failure: Option<String>,
}

impl ImportReport {
    pub fn succeeded(&self) -> bool {
        self.phase == ImportPhase::Done
    }
}

impl Display for ImportReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "import run: {}", self.phase.as_str())?;
        writeln!(
            f,
            "  plants: {} imported, {} skipped",
            self.plants_imported, self.plants_skipped
        )?;
        writeln!(
            f,
            "  fragments: {} merged, {} files skipped; {} botanical records merged; \
             {} source files skipped",
            self.fragments_merged,
            self.fragment_files_skipped,
            self.botanical_merged,
            self.source_files_skipped
        )?;
        writeln!(
            f,
            "  companions: {} statements, {} edges applied, {} skipped, {} unresolved, \
             {} unknown kind, {} self-pairs",
            self.companions.statements_seen,
            self.companions.edges_applied,
            self.companions.dropped_skipped,
            self.companions.dropped_unresolved,
            self.companions.dropped_unknown_kind,
            self.companions.dropped_self_pairs
        )?;
        write!(f, "  relationship kinds:")?;
        if self.kind_histogram.is_empty() {
            write!(f, " none")?;
        }
        for (kind, count) in &self.kind_histogram {
            write!(f, " {}={count}", kind.as_db_str())?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "  pests/diseases: {} pests ({} links), {} diseases ({} links), \
             {} source rows unmatched",
            self.pest_entities,
            self.pest_links,
            self.disease_entities,
            self.disease_links,
            self.pest_rows_unmatched
        )?;
        if !self.skipped_names.is_empty() {
            let names: Vec<&str> = self.skipped_names.iter().map(String::as_str).collect();
            writeln!(f, "  skipped names: {}", names.join(", "))?;
        }
        if !self.companions.unresolved_names.is_empty() {
            let names: Vec<&str> = self
                .companions
                .unresolved_names
                .iter()
                .map(String::as_str)
                .collect();
            writeln!(f, "  unmapped names: {}", names.join(", "))?;
        }
        if let Some(failure) = &self.failure {
            writeln!(f, "  failure: {failure}")?;
        }
        Ok(())
    }
}

/// Drives one full import run against a migrated connection.
pub struct ImportService<'conn> {
    conn: &'conn mut Connection,
    config: ImportConfig,
    resolver: NameResolver,
    classifier: TaxonomyClassifier,
}

impl<'conn> ImportService<'conn> {
    pub fn new(conn: &'conn mut Connection, config: ImportConfig) -> Self {
        let resolver = NameResolver::from_config(&config);
        let classifier = TaxonomyClassifier::from_config(&config);
        Self {
            conn,
            config,
            resolver,
            classifier,
        }
    }

    /// Runs the full import. Always returns a report; a fault is
    /// recorded in it and leaves the run in the `Failed` phase with the
    /// failing phase rolled back.
    pub fn run(&mut self, sources: &ImportSources) -> ImportReport {
        let mut report = ImportReport {
            fragment_files_skipped: sources.fragment_files_skipped,
            source_files_skipped: sources.source_files_skipped,
            ..ImportReport::default()
        };

        if let Err(err) = self.run_phases(sources, &mut report) {
            error!(
                "event=import_failed module=import_service status=error phase={} error={err}",
                report.phase.as_str()
            );
            report.failure = Some(err.to_string());
            report.phase = ImportPhase::Failed;
        }
        report
    }

    fn run_phases(
        &mut self,
        sources: &ImportSources,
        report: &mut ImportReport,
    ) -> Result<(), ImportError> {
        let registry = self.build_registry(sources, report)?;
        report.phase = ImportPhase::RegistryLoaded;
        info!(
            "event=phase_complete module=import_service status=ok phase=registry plants={}",
            report.plants_imported
        );

        self.merge_attributes(sources, &registry, report)?;
        report.phase = ImportPhase::AttributesMerged;
        info!(
            "event=phase_complete module=import_service status=ok phase=attributes merged={}",
            report.fragments_merged
        );

        self.link_relationships(sources, &registry, report)?;
        report.phase = ImportPhase::RelationshipsLinked;
        info!(
            "event=phase_complete module=import_service status=ok phase=relationships edges={}",
            report.companions.edges_applied
        );

        self.verify(report)?;
        report.phase = ImportPhase::Verified;
        info!("event=phase_complete module=import_service status=ok phase=verify");

        report.phase = ImportPhase::Done;
        Ok(())
    }

    /// Phase 1: reset derived data and rebuild the canonical registry
    /// from attribute fragments, enriched with botanical lookup rows.
    fn build_registry(
        &mut self,
        sources: &ImportSources,
        report: &mut ImportReport,
    ) -> Result<PlantRegistry, ImportError> {
        let tx = self.conn.transaction()?;
        let registry;
        {
            let repo = SqlitePlantRepository::try_new(&tx)?;
            repo.reset_registry()?;

            let botanical = sources.botanical.by_slug();
            for file in &sources.fragments {
                let name = file
                    .fragment
                    .common_name
                    .clone()
                    .unwrap_or_else(|| name_from_slug(&file.slug));

                if self.config.skip_names.contains(&name) {
                    report.plants_skipped += 1;
                    report.skipped_names.insert(name);
                    continue;
                }

                let mut plant = NewPlant {
                    name,
                    slug: file.slug.clone(),
                    ..NewPlant::default()
                };
                if let Some(record) = botanical.get(file.slug.as_str()).filter(|r| r.found) {
                    plant.scientific_name = record.scientific_name.clone();
                    plant.genus = record.genus.clone();
                    if let Some(family) = record.family.as_deref() {
                        plant.family_id = repo.family_id_by_name(family)?;
                    }
                }

                repo.insert_plant(&plant)?;
                report.plants_imported += 1;
            }

            registry = repo.load_registry()?;
        }
        tx.commit()?;
        Ok(registry)
    }

    /// Phase 2: merge guide fragments, then botanical nutrient signals,
    /// through the same overlay path. Fixed source order keeps disputed
    /// fields deterministic under last-write-wins.
    fn merge_attributes(
        &mut self,
        sources: &ImportSources,
        registry: &PlantRegistry,
        report: &mut ImportReport,
    ) -> Result<(), ImportError> {
        let tx = self.conn.transaction()?;
        {
            let repo = SqlitePlantRepository::try_new(&tx)?;
            let merger = MergeService::new(&repo, &self.classifier);

            for file in &sources.fragments {
                let Some(id) = registry.lookup_slug(&file.slug) else {
                    continue;
                };
                merger.merge(id, &file.fragment, SourceTag::GuideExtraction)?;
                report.fragments_merged += 1;
            }

            for record in &sources.botanical.plants {
                if !record.found {
                    continue;
                }
                let Some(signal) = record.growth.as_ref().and_then(|g| g.soil_nutriments) else {
                    continue;
                };
                let Some(id) = registry.lookup_slug(&record.slug) else {
                    continue;
                };
                let fragment = AttributeFragment {
                    soil_nutrient_signal: Some(signal),
                    ..AttributeFragment::default()
                };
                merger.merge(id, &fragment, SourceTag::BotanicalLookup)?;
                report.botanical_merged += 1;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Phase 3: companion edges and pest/disease associations.
    fn link_relationships(
        &mut self,
        sources: &ImportSources,
        registry: &PlantRegistry,
        report: &mut ImportReport,
    ) -> Result<(), ImportError> {
        let tx = self.conn.transaction()?;
        {
            let companion_repo = SqliteCompanionRepository::try_new(&tx)?;
            let companions =
                CompanionService::new(&companion_repo, &self.resolver, registry);
            report.companions = companions.apply_matrix(&sources.companion_matrix)?;
            info!(
                "event=source_applied module=import_service status=ok source={} edges={}",
                SourceTag::CompanionMatrix.as_str(),
                report.companions.edges_applied
            );

            let pest_repo = SqlitePestRepository::try_new(&tx)?;
            for record in &sources.pest_db.plants {
                let Some(id) = registry.lookup_slug(&record.slug) else {
                    report.pest_rows_unmatched += 1;
                    continue;
                };

                for pest in &record.pests {
                    let name = normalize_entity_name(pest);
                    if name.is_empty() {
                        continue;
                    }
                    let pest_id = pest_repo.upsert_pest(&name, Some(pest))?;
                    pest_repo.link_pest(id, pest_id)?;
                }
                for disease in &record.diseases {
                    let name = normalize_entity_name(disease);
                    if name.is_empty() {
                        continue;
                    }
                    let disease_id = pest_repo.upsert_disease(&name, Some(disease))?;
                    pest_repo.link_disease(id, disease_id)?;
                }
            }
            info!(
                "event=source_applied module=import_service status=ok source={} rows={}",
                SourceTag::PestExtraction.as_str(),
                sources.pest_db.plants.len()
            );
        }
        tx.commit()?;
        Ok(())
    }

    /// Phase 4: read-only coverage checks for the report.
    fn verify(&mut self, report: &mut ImportReport) -> Result<(), ImportError> {
        let companion_repo = SqliteCompanionRepository::try_new(self.conn)?;
        report.kind_histogram = companion_repo.kind_histogram()?;

        let pest_repo = SqlitePestRepository::try_new(self.conn)?;
        report.pest_entities = pest_repo.pest_count()?;
        report.disease_entities = pest_repo.disease_count()?;
        report.pest_links = pest_repo.pest_link_count()?;
        report.disease_links = pest_repo.disease_link_count()?;
        Ok(())
    }
}
