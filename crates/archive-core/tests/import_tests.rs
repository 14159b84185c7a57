//! Integration tests for the import pipeline.

mod common;

use common::{registry, Fixture};
use pdb_archive::{Importer, RescanReport, StoreCounts};
use serde_json::json;

fn importer(fixture: &Fixture) -> Importer {
    Importer::new(fixture.store(), registry(), fixture.root()).with_owner(Some("archivist".into()))
}

#[test]
fn test_empty_root_imports_nothing() {
    let fixture = Fixture::new();
    let report = importer(&fixture).rescan().unwrap();
    assert_eq!(report, RescanReport::default());
    assert_eq!(fixture.store().counts().unwrap(), StoreCounts::default());
}

#[test]
fn test_rescan_is_idempotent() {
    let fixture = Fixture::new();
    fixture
        .snapshot("1abc", "aa11")
        .software("refmac", Some("5.8"))
        .property("RFREE", json!(0.21))
        .property("HAS_LIGAND", json!(true))
        .write();
    fixture
        .snapshot("2xyz", "bb22")
        .software("refmac", Some("5.8"))
        .software("phenix", None)
        .property("SPACEGROUP", json!("P 21 21 21"))
        .write();

    let importer = importer(&fixture);
    let first = importer.rescan().unwrap();
    assert_eq!(first.candidates, 2);
    assert_eq!(first.imported, 2);
    let counts = fixture.store().counts().unwrap();

    let second = importer.rescan().unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(fixture.store().counts().unwrap(), counts);
}

#[test]
fn test_shared_software_is_deduplicated_across_shards() {
    let fixture = Fixture::new();
    fixture.snapshot("1abc", "h1").software("tortoize", Some("2.0")).write();
    fixture.snapshot("3pqr", "h2").software("tortoize", Some("2.0")).write();
    fixture.snapshot("4stu", "h3").software("tortoize", None).write();
    fixture.snapshot("5stu", "h4").software("tortoize", None).write();

    importer(&fixture).rescan().unwrap();
    assert_eq!(fixture.store().counts().unwrap().software, 2);
}

#[test]
fn test_unused_software_is_not_linked() {
    let fixture = Fixture::new();
    fixture
        .snapshot("1abc", "h1")
        .software("refmac", Some("5.8"))
        .unused_software("coot", "0.9")
        .write();

    importer(&fixture).rescan().unwrap();
    assert_eq!(fixture.store().counts().unwrap().software, 1);
}

#[test]
fn test_non_string_revision_is_stored_absent() {
    let fixture = Fixture::new();
    fixture
        .snapshot("1abc", "h1")
        .versions_data(json!({
            "coordinates_revision": 4,
            "reflections_revision": null,
            "coordinates_edited": true,
            "reflections_edited": false
        }))
        .write();

    let report = importer(&fixture).rescan().unwrap();
    assert_eq!(report.imported, 1);

    let conn = fixture.store().connect().unwrap();
    let (coords, refl, edited): (Option<String>, Option<String>, bool) = conn
        .query_row(
            "SELECT coordinates_revision, reflections_revision, coordinates_edited FROM entry",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(coords, None);
    assert_eq!(refl, None);
    assert!(edited);
}

#[test]
fn test_failures_are_isolated() {
    let fixture = Fixture::new();
    fixture.snapshot("1abc", "good").property("RFREE", json!(0.2)).write();
    fixture
        .snapshot("1abc", "mismatch")
        .property("RFREE", json!("not a number"))
        .write();
    fixture
        .snapshot("2xyz", "unknown")
        .property("FAVOURITE_COLOUR", json!("blue"))
        .write();
    let broken = fixture.snapshot("3pqr", "broken").write();
    std::fs::write(broken.join("data.json"), "{ truncated").unwrap();

    let report = importer(&fixture).rescan().unwrap();
    assert_eq!(report.candidates, 4);
    assert_eq!(report.imported, 1);
    assert_eq!(report.failed, 3);
    assert_eq!(fixture.store().counts().unwrap().entries, 1);
}

#[test]
fn test_parallel_workers_import_everything() {
    let fixture = Fixture::new();
    for i in 0..12 {
        fixture
            .snapshot(&format!("{}abc", i % 10), &format!("hash{:02}", i))
            .software("refmac", Some("5.8"))
            .property("RESOLUTION", json!(1.5 + i as f64 / 10.0))
            .write();
    }

    let report = importer(&fixture).with_workers(4).rescan().unwrap();
    assert_eq!(report.candidates, 12);
    assert_eq!(report.imported, 12);

    let counts = fixture.store().counts().unwrap();
    assert_eq!(counts.entries, 12);
    assert_eq!(counts.software, 1);
    assert_eq!(counts.properties, 2);
}

#[test]
fn test_reset_before_rescan_rebuilds() {
    let fixture = Fixture::new();
    fixture.snapshot("1abc", "h1").write();

    let importer = importer(&fixture).with_reset_before_rescan(true);
    importer.rescan().unwrap();
    let report = importer.rescan().unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(fixture.store().owner().unwrap().as_deref(), Some("archivist"));
}

#[test]
fn test_missing_root_is_an_error() {
    let fixture = Fixture::new();
    std::fs::remove_dir_all(fixture.root()).unwrap();
    assert!(importer(&fixture).rescan().is_err());
}

#[test]
fn test_parallel_report_covers_every_candidate() {
    let fixture = Fixture::new();
    for i in 0..6 {
        fixture
            .snapshot("1abc", &format!("ok{:02}", i))
            .property("RFREE", json!(0.2))
            .write();
    }
    fixture
        .snapshot("2xyz", "bad")
        .property("RFREE", json!("not a number"))
        .write();
    importer(&fixture).rescan().unwrap();
    fixture.snapshot("3pqr", "fresh").write();

    let report = importer(&fixture).with_workers(16).rescan().unwrap();
    assert_eq!(
        report,
        RescanReport {
            candidates: 8,
            imported: 1,
            skipped: 6,
            failed: 1,
        }
    );
}

#[test]
fn test_stored_property_type_conflict_fails_candidate() {
    let fixture = Fixture::new();
    fixture
        .store()
        .connect()
        .unwrap()
        .execute("INSERT INTO property (name, type) VALUES ('RFREE', 'string')", [])
        .unwrap();
    fixture.snapshot("1abc", "h1").property("RFREE", json!(0.2)).write();

    let report = importer(&fixture).rescan().unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(fixture.store().counts().unwrap().entries, 0);
}
