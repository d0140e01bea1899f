//! Pest and disease catalog persistence.
//!
//! # Responsibility
//! - Own the `pests` and `diseases` catalogs and their plant link
//!   tables (`plant_pests`, `plant_diseases`).
//!
//! # Invariants
//! - Catalog entries are unique by canonical name; re-upserting the
//!   same name returns the existing id and refreshes `source_name`.
//! - Linking is idempotent: a duplicate (plant, entity) pair is a
//!   no-op, never an error.

use crate::model::plant::PlantId;
use crate::repo::{ensure_tables, RepoResult};
use rusqlite::{params, Connection};

pub type PestId = i64;
pub type DiseaseId = i64;

/// Repository interface for pest/disease catalogs and plant links.
pub trait PestRepository {
    /// Inserts or refreshes a pest by canonical name, returning its id.
    fn upsert_pest(&self, name: &str, source_name: Option<&str>) -> RepoResult<PestId>;
    /// Inserts or refreshes a disease by canonical name, returning its id.
    fn upsert_disease(&self, name: &str, source_name: Option<&str>) -> RepoResult<DiseaseId>;
    fn link_pest(&self, plant_id: PlantId, pest_id: PestId) -> RepoResult<()>;
    fn link_disease(&self, plant_id: PlantId, disease_id: DiseaseId) -> RepoResult<()>;
    fn pests_for_plant(&self, plant_id: PlantId) -> RepoResult<Vec<String>>;
    fn diseases_for_plant(&self, plant_id: PlantId) -> RepoResult<Vec<String>>;
    fn pest_count(&self) -> RepoResult<i64>;
    fn disease_count(&self) -> RepoResult<i64>;
    fn pest_link_count(&self) -> RepoResult<i64>;
    fn disease_link_count(&self) -> RepoResult<i64>;
}

/// SQLite-backed pest/disease repository.
pub struct SqlitePestRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePestRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &["pests", "diseases", "plant_pests", "plant_diseases"],
        )?;
        Ok(Self { conn })
    }

    fn upsert_named(
        &self,
        table: &str,
        name: &str,
        source_name: Option<&str>,
    ) -> RepoResult<i64> {
        // RETURNING is avoided for older SQLite compatibility; the
        // follow-up SELECT runs inside the caller's transaction.
        self.conn.execute(
            &format!(
                "INSERT INTO {table} (name, source_name)
                 VALUES (?1, ?2)
                 ON CONFLICT (name) DO UPDATE
                 SET source_name = COALESCE(excluded.source_name, {table}.source_name);"
            ),
            params![name, source_name],
        )?;
        let id = self.conn.query_row(
            &format!("SELECT id FROM {table} WHERE name = ?1;"),
            [name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn names_for_plant(
        &self,
        link_table: &str,
        catalog_table: &str,
        link_column: &str,
        plant_id: PlantId,
    ) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT c.name
             FROM {link_table} AS l
             JOIN {catalog_table} AS c ON c.id = l.{link_column}
             WHERE l.plant_id = ?1
             ORDER BY c.name ASC;"
        ))?;
        let mut rows = stmt.query([plant_id])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }
        Ok(names)
    }

    fn count_rows(&self, table: &str) -> RepoResult<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }
}

impl PestRepository for SqlitePestRepository<'_> {
    fn upsert_pest(&self, name: &str, source_name: Option<&str>) -> RepoResult<PestId> {
        self.upsert_named("pests", name, source_name)
    }

    fn upsert_disease(&self, name: &str, source_name: Option<&str>) -> RepoResult<DiseaseId> {
        self.upsert_named("diseases", name, source_name)
    }

    fn link_pest(&self, plant_id: PlantId, pest_id: PestId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO plant_pests (plant_id, pest_id) VALUES (?1, ?2);",
            params![plant_id, pest_id],
        )?;
        Ok(())
    }

    fn link_disease(&self, plant_id: PlantId, disease_id: DiseaseId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO plant_diseases (plant_id, disease_id) VALUES (?1, ?2);",
            params![plant_id, disease_id],
        )?;
        Ok(())
    }

    fn pests_for_plant(&self, plant_id: PlantId) -> RepoResult<Vec<String>> {
        self.names_for_plant("plant_pests", "pests", "pest_id", plant_id)
    }

    fn diseases_for_plant(&self, plant_id: PlantId) -> RepoResult<Vec<String>> {
        self.names_for_plant("plant_diseases", "diseases", "disease_id", plant_id)
    }

    fn pest_count(&self) -> RepoResult<i64> {
        self.count_rows("pests")
    }

    fn disease_count(&self) -> RepoResult<i64> {
        self.count_rows("diseases")
    }

    fn pest_link_count(&self) -> RepoResult<i64> {
        self.count_rows("plant_pests")
    }

    fn disease_link_count(&self) -> RepoResult<i64> {
        self.count_rows("plant_diseases")
    }
}
