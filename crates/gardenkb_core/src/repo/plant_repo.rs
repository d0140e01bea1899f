//! Canonical plant registry and attribute persistence.
//!
//! # Responsibility
//! - Own the `plants` table: registry reset, identity inserts, registry
//!   loading and attribute record read/write.
//! - Keep the edible-part association in sync with the stored record.
//!
//! # Invariants
//! - `slug` is unique; an insert with a duplicate slug is a DB error.
//! - Family links only reference the seeded vocabulary; an unknown
//!   family name resolves to `None`, never a new row.
//! - `store_attributes` replaces the edible-part set wholesale.

use crate::model::plant::{
    AttributeRecord, CanonicalPlant, Cycle, FeederType, GrowthHabit, PlantId, RootDepth,
    SunNeeds, WaterNeeds,
};
use crate::repo::{
    bool_to_int, ensure_tables, int_to_opt_bool, opt_bool_to_int, RepoError, RepoResult,
};
use crate::resolve::PlantRegistry;
use rusqlite::{params, Connection, Row};

/// Identity fields for a registry insert; attributes arrive later via
/// the merge path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPlant {
    pub name: String,
    pub slug: String,
    pub scientific_name: Option<String>,
    pub genus: Option<String>,
    pub family_id: Option<i64>,
}

/// Repository interface for the canonical plant registry.
pub trait PlantRepository {
    /// Deletes all derived data and the registry itself, in FK order.
    fn reset_registry(&self) -> RepoResult<()>;
    /// Inserts one canonical identity and returns its new stable id.
    fn insert_plant(&self, plant: &NewPlant) -> RepoResult<PlantId>;
    /// Loads the in-memory registry view (name/slug -> id).
    fn load_registry(&self) -> RepoResult<PlantRegistry>;
    /// Looks a family up in the fixed vocabulary.
    fn family_id_by_name(&self, name: &str) -> RepoResult<Option<i64>>;
    /// Loads one canonical plant with its resolved family name.
    fn get_plant(&self, id: PlantId) -> RepoResult<Option<CanonicalPlant>>;
    /// Loads the stored attribute record for one plant.
    fn get_attributes(&self, id: PlantId) -> RepoResult<Option<AttributeRecord>>;
    /// Writes the full attribute record and syncs edible-part links.
    fn store_attributes(&self, id: PlantId, record: &AttributeRecord) -> RepoResult<()>;
    fn plant_count(&self) -> RepoResult<i64>;
}

/// SQLite-backed plant repository.
pub struct SqlitePlantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlantRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &["plants", "plant_families", "edible_parts", "plant_edible_parts"],
        )?;
        Ok(Self { conn })
    }
}

impl PlantRepository for SqlitePlantRepository<'_> {
    fn reset_registry(&self) -> RepoResult<()> {
        self.conn.execute_batch(
            "DELETE FROM plant_companions;
             DELETE FROM plant_pests;
             DELETE FROM plant_diseases;
             DELETE FROM plant_edible_parts;
             DELETE FROM plants;",
        )?;
        Ok(())
    }

    fn insert_plant(&self, plant: &NewPlant) -> RepoResult<PlantId> {
        self.conn.execute(
            "INSERT INTO plants (name, slug, scientific_name, genus, family_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                plant.name.as_str(),
                plant.slug.as_str(),
                plant.scientific_name.as_deref(),
                plant.genus.as_deref(),
                plant.family_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn load_registry(&self) -> RepoResult<PlantRegistry> {
        let mut stmt = self.conn.prepare("SELECT id, name, slug FROM plants;")?;
        let mut rows = stmt.query([])?;
        let mut registry = PlantRegistry::default();
        while let Some(row) = rows.next()? {
            let id: PlantId = row.get("id")?;
            let name: String = row.get("name")?;
            let slug: String = row.get("slug")?;
            registry.insert(id, &name, &slug);
        }
        Ok(registry)
    }

    fn family_id_by_name(&self, name: &str) -> RepoResult<Option<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM plant_families WHERE name = ?1;")?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }
        Ok(None)
    }

    fn get_plant(&self, id: PlantId) -> RepoResult<Option<CanonicalPlant>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                p.id,
                p.name,
                p.slug,
                p.scientific_name,
                p.genus,
                p.family_id,
                f.name AS family_name
             FROM plants p
             LEFT JOIN plant_families f ON f.id = p.family_id
             WHERE p.id = ?1;",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(CanonicalPlant {
                id: row.get("id")?,
                name: row.get("name")?,
                slug: row.get("slug")?,
                scientific_name: row.get("scientific_name")?,
                genus: row.get("genus")?,
                family_id: row.get("family_id")?,
                family_name: row.get("family_name")?,
            }));
        }
        Ok(None)
    }

    fn get_attributes(&self, id: PlantId) -> RepoResult<Option<AttributeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                cycle, sun_needs, water_needs, root_depth, growth_habit,
                soil_temp_min_f, soil_temp_optimal_f, frost_tolerant,
                spacing_min_inches, spacing_max_inches, planting_depth_inches,
                container_suitable, requires_staking, requires_pruning,
                days_to_maturity_min, days_to_maturity_max,
                watering_inches_per_week, fertilizing_frequency_weeks,
                mulch_recommended, soil_nutrient_signal, notes,
                is_nitrogen_fixer, feeder_type
             FROM plants
             WHERE id = ?1;",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let mut record = parse_attribute_row(row)?;
            record.edible_parts = self.load_edible_parts(id)?;
            return Ok(Some(record));
        }
        Ok(None)
    }

    fn store_attributes(&self, id: PlantId, record: &AttributeRecord) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE plants
             SET
                cycle = ?2,
                sun_needs = ?3,
                water_needs = ?4,
                root_depth = ?5,
                growth_habit = ?6,
                soil_temp_min_f = ?7,
                soil_temp_optimal_f = ?8,
                frost_tolerant = ?9,
                spacing_min_inches = ?10,
                spacing_max_inches = ?11,
                planting_depth_inches = ?12,
                container_suitable = ?13,
                requires_staking = ?14,
                requires_pruning = ?15,
                days_to_maturity_min = ?16,
                days_to_maturity_max = ?17,
                watering_inches_per_week = ?18,
                fertilizing_frequency_weeks = ?19,
                mulch_recommended = ?20,
                soil_nutrient_signal = ?21,
                notes = ?22,
                is_nitrogen_fixer = ?23,
                feeder_type = ?24
             WHERE id = ?1;",
            params![
                id,
                record.cycle.map(Cycle::as_db_str),
                record.sun_needs.map(SunNeeds::as_db_str),
                record.water_needs.map(WaterNeeds::as_db_str),
                record.root_depth.map(RootDepth::as_db_str),
                record.growth_habit.map(GrowthHabit::as_db_str),
                record.soil_temp_min_f,
                record.soil_temp_optimal_f,
                opt_bool_to_int(record.frost_tolerant),
                record.spacing_min_inches,
                record.spacing_max_inches,
                record.planting_depth_inches,
                opt_bool_to_int(record.container_suitable),
                opt_bool_to_int(record.requires_staking),
                opt_bool_to_int(record.requires_pruning),
                record.days_to_maturity_min,
                record.days_to_maturity_max,
                record.watering_inches_per_week,
                record.fertilizing_frequency_weeks,
                opt_bool_to_int(record.mulch_recommended),
                record.soil_nutrient_signal,
                record.notes.as_deref(),
                bool_to_int(record.is_nitrogen_fixer),
                record.feeder_type.map(FeederType::as_db_str),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.replace_edible_parts(id, &record.edible_parts)?;
        Ok(())
    }

    fn plant_count(&self) -> RepoResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM plants;", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl SqlitePlantRepository<'_> {
    fn load_edible_parts(&self, id: PlantId) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.name
             FROM plant_edible_parts pe
             INNER JOIN edible_parts e ON e.id = pe.edible_part_id
             WHERE pe.plant_id = ?1
             ORDER BY e.name ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut parts = Vec::new();
        while let Some(row) = rows.next()? {
            parts.push(row.get(0)?);
        }
        Ok(parts)
    }

    /// Replaces the edible-part association for one plant. Part names
    /// outside the seeded vocabulary are dropped silently, matching the
    /// rule that the core never extends vocabularies.
    fn replace_edible_parts(&self, id: PlantId, parts: &[String]) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM plant_edible_parts WHERE plant_id = ?1;",
            [id],
        )?;

        for part in parts {
            self.conn.execute(
                "INSERT OR IGNORE INTO plant_edible_parts (plant_id, edible_part_id)
                 SELECT ?1, id
                 FROM edible_parts
                 WHERE name = ?2;",
                params![id, part.as_str()],
            )?;
        }
        Ok(())
    }
}

fn parse_attribute_row(row: &Row<'_>) -> RepoResult<AttributeRecord> {
    let record = AttributeRecord {
        cycle: parse_category(row, "cycle", Cycle::parse_db)?,
        sun_needs: parse_category(row, "sun_needs", SunNeeds::parse_db)?,
        water_needs: parse_category(row, "water_needs", WaterNeeds::parse_db)?,
        root_depth: parse_category(row, "root_depth", RootDepth::parse_db)?,
        growth_habit: parse_category(row, "growth_habit", GrowthHabit::parse_db)?,
        soil_temp_min_f: row.get("soil_temp_min_f")?,
        soil_temp_optimal_f: row.get("soil_temp_optimal_f")?,
        frost_tolerant: int_to_opt_bool(row.get("frost_tolerant")?, "plants.frost_tolerant")?,
        spacing_min_inches: row.get("spacing_min_inches")?,
        spacing_max_inches: row.get("spacing_max_inches")?,
        planting_depth_inches: row.get("planting_depth_inches")?,
        container_suitable: int_to_opt_bool(
            row.get("container_suitable")?,
            "plants.container_suitable",
        )?,
        requires_staking: int_to_opt_bool(
            row.get("requires_staking")?,
            "plants.requires_staking",
        )?,
        requires_pruning: int_to_opt_bool(
            row.get("requires_pruning")?,
            "plants.requires_pruning",
        )?,
        days_to_maturity_min: row.get("days_to_maturity_min")?,
        days_to_maturity_max: row.get("days_to_maturity_max")?,
        watering_inches_per_week: row.get("watering_inches_per_week")?,
        fertilizing_frequency_weeks: row.get("fertilizing_frequency_weeks")?,
        mulch_recommended: int_to_opt_bool(
            row.get("mulch_recommended")?,
            "plants.mulch_recommended",
        )?,
        soil_nutrient_signal: row.get("soil_nutrient_signal")?,
        notes: row.get("notes")?,
        edible_parts: Vec::new(),
        is_nitrogen_fixer: row.get::<_, i64>("is_nitrogen_fixer")? == 1,
        feeder_type: parse_category(row, "feeder_type", FeederType::parse_db)?,
    };
    Ok(record)
}

fn parse_category<T>(
    row: &Row<'_>,
    column: &'static str,
    parse: fn(&str) -> Option<T>,
) -> RepoResult<Option<T>> {
    match row.get::<_, Option<String>>(column)? {
        None => Ok(None),
        Some(token) => parse(&token).map(Some).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid token `{token}` in plants.{column}"))
        }),
    }
}
