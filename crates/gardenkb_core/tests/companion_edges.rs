use gardenkb_core::config::ImportConfig;
use gardenkb_core::db::open_db_in_memory;
use gardenkb_core::ingest::CompanionMatrix;
use gardenkb_core::model::plant::RelationshipKind;
use gardenkb_core::repo::companion_repo::{CompanionRepository, SqliteCompanionRepository};
use gardenkb_core::repo::plant_repo::{NewPlant, PlantRepository, SqlitePlantRepository};
use gardenkb_core::resolve::{NameResolver, PlantRegistry};
use gardenkb_core::service::companion_service::CompanionService;
use rusqlite::Connection;

fn seed_registry(conn: &Connection, names: &[(&str, &str)]) -> PlantRegistry {
    let repo = SqlitePlantRepository::try_new(conn).unwrap();
    for (name, slug) in names {
        repo.insert_plant(&NewPlant {
            name: name.to_string(),
            slug: slug.to_string(),
            ..NewPlant::default()
        })
        .unwrap();
    }
    repo.load_registry().unwrap()
}

fn matrix(raw: &str) -> CompanionMatrix {
    serde_json::from_str(raw).unwrap()
}

#[test]
fn pair_is_unique_irrespective_of_submission_order() {
    let conn = open_db_in_memory().unwrap();
    let registry = seed_registry(&conn, &[("Tomato", "tomato"), ("Basil", "basil")]);
    let repo = SqliteCompanionRepository::try_new(&conn).unwrap();

    let (tomato, basil) = (
        registry.lookup("Tomato").unwrap(),
        registry.lookup("Basil").unwrap(),
    );

    repo.upsert_edge(tomato, basil, RelationshipKind::Beneficial, None)
        .unwrap();
    repo.upsert_edge(basil, tomato, RelationshipKind::Beneficial, Some("aroma"))
        .unwrap();

    assert_eq!(repo.edge_count().unwrap(), 1);
    let edge = repo.get_edge(basil, tomato).unwrap().unwrap();
    assert_eq!(edge.kind, RelationshipKind::Beneficial);
    assert_eq!(edge.reason.as_deref(), Some("aroma"));
    assert!(edge.plant_low < edge.plant_high);
}

#[test]
fn self_pairs_are_discarded_silently() {
    let conn = open_db_in_memory().unwrap();
    let registry = seed_registry(&conn, &[("Tomato", "tomato"), ("Basil", "basil")]);
    let repo = SqliteCompanionRepository::try_new(&conn).unwrap();
    let resolver = NameResolver::from_config(&ImportConfig::default());
    let service = CompanionService::new(&repo, &resolver, &registry);

    let outcome = service
        .apply_matrix(&matrix(
            r#"{"Tomato": {"Tomato": "beneficial", "Basil": "beneficial"}}"#,
        ))
        .unwrap();

    assert_eq!(outcome.dropped_self_pairs, 1);
    assert_eq!(outcome.edges_applied, 1);
    assert_eq!(repo.edge_count().unwrap(), 1);
}

#[test]
fn unknown_kind_is_dropped_and_leaves_the_prior_edge_intact() {
    let conn = open_db_in_memory().unwrap();
    let registry = seed_registry(&conn, &[("Tomato", "tomato"), ("Basil", "basil")]);
    let repo = SqliteCompanionRepository::try_new(&conn).unwrap();
    let resolver = NameResolver::from_config(&ImportConfig::default());
    let service = CompanionService::new(&repo, &resolver, &registry);

    service
        .apply_matrix(&matrix(r#"{"Tomato": {"Basil": "beneficial"}}"#))
        .unwrap();
    let outcome = service
        .apply_matrix(&matrix(r#"{"Tomato": {"Basil": "complicated"}}"#))
        .unwrap();

    assert_eq!(outcome.dropped_unknown_kind, 1);
    assert_eq!(outcome.edges_applied, 0);

    let edge = repo
        .get_edge(
            registry.lookup("Tomato").unwrap(),
            registry.lookup("Basil").unwrap(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(edge.kind, RelationshipKind::Beneficial);
}

#[test]
fn disputed_pair_resolves_last_write_wins() {
    let conn = open_db_in_memory().unwrap();
    let registry = seed_registry(&conn, &[("Tomato", "tomato"), ("Cabbage", "cabbage")]);
    let repo = SqliteCompanionRepository::try_new(&conn).unwrap();
    let resolver = NameResolver::from_config(&ImportConfig::default());
    let service = CompanionService::new(&repo, &resolver, &registry);

    // Matrix rows apply in key order: Cabbage sorts before Tomato, so
    // Tomato's statement lands last and wins.
    let outcome = service
        .apply_matrix(&matrix(
            r#"{
                "Cabbage": {"Tomato": "neutral"},
                "Tomato": {"Cabbage": "unfavorable"}
            }"#,
        ))
        .unwrap();

    assert_eq!(outcome.edges_applied, 2);
    assert_eq!(repo.edge_count().unwrap(), 1);
    let edge = repo
        .get_edge(
            registry.lookup("Tomato").unwrap(),
            registry.lookup("Cabbage").unwrap(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(edge.kind, RelationshipKind::Unfavorable);
}

#[test]
fn skipped_and_unresolved_endpoints_drop_statements_without_error() {
    let conn = open_db_in_memory().unwrap();
    let registry = seed_registry(&conn, &[("Tomato", "tomato")]);
    let repo = SqliteCompanionRepository::try_new(&conn).unwrap();
    let resolver = NameResolver::from_config(&ImportConfig::default());
    let service = CompanionService::new(&repo, &resolver, &registry);

    let outcome = service
        .apply_matrix(&matrix(
            r#"{
                "Tomato": {"Marigold": "beneficial", "Dragonfruit": "beneficial"},
                "Marigold": {"Tomato": "beneficial"}
            }"#,
        ))
        .unwrap();

    assert_eq!(outcome.statements_seen, 3);
    assert_eq!(outcome.edges_applied, 0);
    assert_eq!(outcome.dropped_skipped, 2);
    assert_eq!(outcome.dropped_unresolved, 1);
    assert!(outcome.unresolved_names.contains("Dragonfruit"));
    assert_eq!(repo.edge_count().unwrap(), 0);
}

#[test]
fn tomato_basil_cabbage_scenario_yields_expected_edges() {
    let conn = open_db_in_memory().unwrap();
    let registry = seed_registry(
        &conn,
        &[("Tomato", "tomato"), ("Basil", "basil"), ("Cabbage", "cabbage")],
    );
    let repo = SqliteCompanionRepository::try_new(&conn).unwrap();
    let resolver = NameResolver::from_config(&ImportConfig::default());
    let service = CompanionService::new(&repo, &resolver, &registry);

    let outcome = service
        .apply_matrix(&matrix(
            r#"{
                "Tomato": {
                    "Basil": {"relationship": "beneficial", "reason": "repels hornworms"},
                    "Cabbage": "unfavorable"
                },
                "Basil": {"Tomato": "beneficial"}
            }"#,
        ))
        .unwrap();

    assert_eq!(outcome.edges_applied, 3);
    assert_eq!(repo.edge_count().unwrap(), 2);

    let tomato = registry.lookup("Tomato").unwrap();
    let basil = registry.lookup("Basil").unwrap();
    let cabbage = registry.lookup("Cabbage").unwrap();

    let basil_edge = repo.get_edge(tomato, basil).unwrap().unwrap();
    assert_eq!(basil_edge.kind, RelationshipKind::Beneficial);

    let cabbage_edge = repo.get_edge(tomato, cabbage).unwrap().unwrap();
    assert_eq!(cabbage_edge.kind, RelationshipKind::Unfavorable);

    let histogram = repo.kind_histogram().unwrap();
    assert_eq!(
        histogram,
        vec![
            (RelationshipKind::Beneficial, 1),
            (RelationshipKind::Unfavorable, 1)
        ]
    );
}
