use gardenkb_core::config::ImportConfig;
use gardenkb_core::db::open_db_in_memory;
use gardenkb_core::repo::plant_repo::{NewPlant, PlantRepository, SqlitePlantRepository};
use gardenkb_core::resolve::{NameResolver, Resolution};

#[test]
fn resolution_works_against_a_persisted_registry() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::try_new(&conn).unwrap();

    for (name, slug) in [
        ("Bean", "bean"),
        ("Tomato", "tomato"),
        ("Green Onion", "green-onion"),
    ] {
        repo.insert_plant(&NewPlant {
            name: name.to_string(),
            slug: slug.to_string(),
            ..NewPlant::default()
        })
        .unwrap();
    }

    let registry = repo.load_registry().unwrap();
    let resolver = NameResolver::from_config(&ImportConfig::default());

    // Alias table: plural and regional spellings collapse to one id.
    let bean = registry.lookup("Bean").unwrap();
    assert_eq!(resolver.resolve(&registry, "Beans"), Resolution::Resolved(bean));

    let green_onion = registry.lookup("Green Onion").unwrap();
    assert_eq!(
        resolver.resolve(&registry, "Scallions"),
        Resolution::Resolved(green_onion)
    );

    // Skip set beats both alias and identity matching.
    assert_eq!(resolver.resolve(&registry, "Marigold"), Resolution::Skipped);
    assert_eq!(
        resolver.resolve(&registry, "Most plants"),
        Resolution::Skipped
    );

    // Unknown names surface the candidate for operators.
    assert_eq!(
        resolver.resolve(&registry, "Dragonfruit"),
        Resolution::Unresolved {
            candidate: "Dragonfruit".to_string()
        }
    );
}

#[test]
fn reset_registry_clears_plants_and_derived_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::try_new(&conn).unwrap();

    repo.insert_plant(&NewPlant {
        name: "Tomato".to_string(),
        slug: "tomato".to_string(),
        ..NewPlant::default()
    })
    .unwrap();
    assert_eq!(repo.plant_count().unwrap(), 1);

    repo.reset_registry().unwrap();
    assert_eq!(repo.plant_count().unwrap(), 0);
    assert!(repo.load_registry().unwrap().is_empty());
}
