use gardenkb_core::db::migrations::latest_version;
use gardenkb_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "plants");
    assert_table_exists(&conn, "plant_families");
    assert_table_exists(&conn, "edible_parts");
    assert_table_exists(&conn, "plant_edible_parts");
    assert_table_exists(&conn, "pests");
    assert_table_exists(&conn, "diseases");
    assert_table_exists(&conn, "plant_pests");
    assert_table_exists(&conn, "plant_diseases");
    assert_table_exists(&conn, "plant_companions");
}

#[test]
fn family_vocabulary_is_seeded() {
    let conn = open_db_in_memory().unwrap();

    let families: i64 = conn
        .query_row("SELECT COUNT(*) FROM plant_families;", [], |row| row.get(0))
        .unwrap();
    assert!(families >= 10, "expected seeded families, got {families}");

    let fabaceae: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM plant_families WHERE name = 'Fabaceae';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(fabaceae, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gardenkb.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "plants");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
