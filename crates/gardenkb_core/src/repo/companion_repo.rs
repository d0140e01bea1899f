//! Companion relationship edge persistence.
//!
//! # Responsibility
//! - Own the `plant_companions` table: upsert by unordered pair, edge
//!   lookup and the relationship-kind histogram used for verification.
//!
//! # Invariants
//! - The pair is stored sorted (`plant_low < plant_high`), so one row
//!   exists per unordered pair regardless of submission order.
//! - Upsert overwrites kind and reason: last write wins by policy.
//! - Self-pairs are rejected here as a second line of defense; the
//!   service discards them before persistence.

use crate::model::plant::{PlantId, RelationshipKind};
use crate::repo::{ensure_tables, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// One stored undirected relationship edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub plant_low: PlantId,
    pub plant_high: PlantId,
    pub kind: RelationshipKind,
    pub reason: Option<String>,
}

/// Repository interface for companion edges.
pub trait CompanionRepository {
    /// Inserts or overwrites the edge for the unordered pair `{a, b}`.
    fn upsert_edge(
        &self,
        a: PlantId,
        b: PlantId,
        kind: RelationshipKind,
        reason: Option<&str>,
    ) -> RepoResult<()>;
    /// Loads the edge for the unordered pair, if any.
    fn get_edge(&self, a: PlantId, b: PlantId) -> RepoResult<Option<EdgeRecord>>;
    fn edge_count(&self) -> RepoResult<i64>;
    /// Relationship-kind histogram, ordered by kind.
    fn kind_histogram(&self) -> RepoResult<Vec<(RelationshipKind, i64)>>;
}

/// SQLite-backed companion edge repository.
pub struct SqliteCompanionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompanionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["plant_companions"])?;
        Ok(Self { conn })
    }
}

impl CompanionRepository for SqliteCompanionRepository<'_> {
    fn upsert_edge(
        &self,
        a: PlantId,
        b: PlantId,
        kind: RelationshipKind,
        reason: Option<&str>,
    ) -> RepoResult<()> {
        if a == b {
            return Err(RepoError::InvalidData(format!(
                "self-edge rejected for plant id {a}"
            )));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };

        self.conn.execute(
            "INSERT INTO plant_companions (plant_low, plant_high, relationship, reason)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (plant_low, plant_high) DO UPDATE
             SET relationship = excluded.relationship,
                 reason = excluded.reason;",
            params![low, high, kind.as_db_str(), reason],
        )?;
        Ok(())
    }

    fn get_edge(&self, a: PlantId, b: PlantId) -> RepoResult<Option<EdgeRecord>> {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let mut stmt = self.conn.prepare(
            "SELECT plant_low, plant_high, relationship, reason
             FROM plant_companions
             WHERE plant_low = ?1 AND plant_high = ?2;",
        )?;

        let mut rows = stmt.query(params![low, high])?;
        if let Some(row) = rows.next()? {
            let token: String = row.get("relationship")?;
            let kind = RelationshipKind::parse_db(&token).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid token `{token}` in plant_companions.relationship"
                ))
            })?;
            return Ok(Some(EdgeRecord {
                plant_low: row.get("plant_low")?,
                plant_high: row.get("plant_high")?,
                kind,
                reason: row.get("reason")?,
            }));
        }
        Ok(None)
    }

    fn edge_count(&self) -> RepoResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM plant_companions;", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    fn kind_histogram(&self) -> RepoResult<Vec<(RelationshipKind, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT relationship, COUNT(*) AS edge_count
             FROM plant_companions
             GROUP BY relationship
             ORDER BY relationship ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut histogram = Vec::new();
        while let Some(row) = rows.next()? {
            let token: String = row.get("relationship")?;
            let kind = RelationshipKind::parse_db(&token).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid token `{token}` in plant_companions.relationship"
                ))
            })?;
            histogram.push((kind, row.get("edge_count")?));
        }
        Ok(histogram)
    }
}
