//! Core domain logic for the garden knowledge base importer.
//! This crate is the single source of truth for reconciliation invariants.

pub mod config;
pub mod db;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod repo;
pub mod resolve;
pub mod service;
pub mod taxonomy;

pub use config::{ConfigError, ImportConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::plant::{
    AttributeFragment, AttributeRecord, CanonicalPlant, FeederType, PlantId, RelationshipKind,
    SourceTag,
};
pub use repo::{RepoError, RepoResult};
pub use resolve::{NameResolver, PlantRegistry, Resolution};
pub use service::import_service::{
    ImportError, ImportPhase, ImportReport, ImportService, ImportSources,
};
pub use taxonomy::{Classification, TaxonomyClassifier};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
