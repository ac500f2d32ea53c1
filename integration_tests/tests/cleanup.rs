//! Failure semantics: a failed generation leaves no partial galaxy.

mod common;

use common::{small_config, FailingStore};
use galaxy_core::persist::GalaxyStore;
use galaxy_core::{generate_galaxy, STEP_PLANETARY_SYSTEMS, STEP_SECTOR_GRID, STEP_STAR_FIELD};
use galaxy_schema::{EntityKind, GalaxyStatus};

#[test]
fn mid_pipeline_failure_removes_rows_from_completed_steps() {
    // Sector insertion (step 3) fails: stars and planetary bodies were
    // already committed by steps 1 and 2 and must be gone afterwards.
    let mut store = FailingStore::new("insert_sectors", 0);
    let report = generate_galaxy(&mut store, &small_config(42));

    assert!(!report.success);
    assert!(report.error.as_deref().unwrap().contains("injected failure"));

    let names: Vec<(&str, bool)> = report
        .steps
        .iter()
        .map(|s| (s.name.as_str(), s.success))
        .collect();
    assert_eq!(
        names,
        vec![
            (STEP_STAR_FIELD, true),
            (STEP_PLANETARY_SYSTEMS, true),
            (STEP_SECTOR_GRID, false),
        ]
    );

    let galaxy = report.galaxy.as_ref().unwrap();
    assert_eq!(galaxy.status, GalaxyStatus::Failed);
    for kind in EntityKind::ORDERED {
        assert_eq!(
            store.inner.entity_count(galaxy.id, kind),
            0,
            "{kind:?} rows survived cleanup"
        );
    }
    assert!(store.inner.active_galaxies().is_empty());
}

#[test]
fn gate_step_failure_cleans_up_too() {
    let mut store = FailingStore::new("insert_gates_ignoring_conflicts", 0);
    let report = generate_galaxy(&mut store, &small_config(7));

    assert!(!report.success);
    let galaxy = report.galaxy.as_ref().unwrap();
    for kind in EntityKind::ORDERED {
        assert_eq!(store.inner.entity_count(galaxy.id, kind), 0);
    }
    assert_eq!(
        store.inner.galaxy_status(galaxy.id).unwrap(),
        GalaxyStatus::Failed
    );
}

#[test]
fn mirror_failure_removes_prime_and_satellite() {
    // The prime's sector insert succeeds (first call); the mirror's
    // (second call) fails mid-way through the mirror step. Generation is
    // all-or-nothing: both galaxies must come out empty and failed.
    let mut config = small_config(11);
    config.include_mirror = true;

    let mut store = FailingStore::new("insert_sectors", 1);
    let report = generate_galaxy(&mut store, &config);

    assert!(!report.success);
    assert!(report.mirror_galaxy.is_none());

    let prime = report.galaxy.as_ref().unwrap().id;
    // The satellite was created after the prime.
    let mirror = prime + 1;
    assert!(store.inner.load_galaxy(mirror).is_ok(), "mirror record missing");

    for id in [prime, mirror] {
        for kind in EntityKind::ORDERED {
            assert_eq!(
                store.inner.entity_count(id, kind),
                0,
                "galaxy {id} kept {kind:?} rows"
            );
        }
        assert_eq!(store.inner.galaxy_status(id).unwrap(), GalaxyStatus::Failed);
    }
    assert!(store.inner.active_galaxies().is_empty());
}

#[test]
fn first_step_failure_leaves_only_the_failed_record() {
    let mut store = FailingStore::new("insert_pois", 0);
    let report = generate_galaxy(&mut store, &small_config(3));

    assert!(!report.success);
    assert_eq!(report.steps.len(), 1);
    assert!(!report.steps[0].success);

    let galaxy = report.galaxy.as_ref().unwrap();
    assert_eq!(galaxy.status, GalaxyStatus::Failed);
    assert_eq!(store.inner.entity_count(galaxy.id, EntityKind::Pois), 0);
}
