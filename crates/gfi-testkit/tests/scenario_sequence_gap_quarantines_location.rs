//! Scenario: a sequence gap quarantines exactly one location.
//!
//! The bad location is never written to `fleet_locations`; its first source
//! row is marked as a bad record with the violation text. Other locations in
//! the same run are unaffected.

use gfi_reconcile::{run_import, AreaType};
use gfi_testkit::MemoryStore;
use rust_decimal_macros::dec;

const FLEET: i64 = 7;

#[tokio::test]
async fn gap_marks_first_row_and_skips_insert() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let first = store.add_point(AreaType::NoGo, "Quarry", 1, dec!(1), dec!(1));
    store.add_point(AreaType::NoGo, "Quarry", 2, dec!(2), dec!(2));
    store.add_point(AreaType::NoGo, "Quarry", 4, dec!(4), dec!(4));
    store.add_point(AreaType::NoGo, "Quarry", 5, dec!(5), dec!(5));

    let report = run_import(&store, FLEET, AreaType::NoGo).await?;

    assert_eq!(report.rows_read, 4);
    assert_eq!(report.rows_rejected, 2, "4 and 5 both follow last accepted 2");
    assert_eq!(report.bad_records, 1);
    assert_eq!(report.locations_inserted, 0);
    assert_eq!(report.quarantined, vec!["Quarry".to_string()]);

    assert!(store.fleet_rows(FLEET).is_empty());

    let bad = store.source_row(first).expect("first row exists");
    assert!(bad.bad_record);
    assert_eq!(
        bad.bad_record_reason.as_deref(),
        Some("incorrect sequence number 5: expected 3 (1 more than 2)")
    );
    assert_eq!(store.bad_source_rows().len(), 1, "only the opening row is marked");
    Ok(())
}

#[tokio::test]
async fn neighbours_of_a_bad_location_are_still_inserted() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.add_point(AreaType::Location, "Alpha", 1, dec!(1), dec!(1));
    store.add_point(AreaType::Location, "Bravo", 1, dec!(2), dec!(2));
    store.add_point(AreaType::Location, "Bravo", 3, dec!(3), dec!(3));
    store.add_point(AreaType::Location, "Charlie", 1, dec!(4), dec!(4));
    store.add_point(AreaType::Location, "Charlie", 2, dec!(5), dec!(5));

    let report = run_import(&store, FLEET, AreaType::Location).await?;

    assert_eq!(report.locations_inserted, 2);
    assert_eq!(report.bad_records, 1);
    assert!(store.fleet_row(FLEET, "Alpha").is_some());
    assert!(store.fleet_row(FLEET, "Bravo").is_none());
    assert!(store.fleet_row(FLEET, "Charlie").is_some());
    Ok(())
}

#[tokio::test]
async fn repeated_sequence_number_is_a_violation() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let first = store.add_point(AreaType::SpeedArea, "Ramp", 1, dec!(1), dec!(1));
    store.add_point(AreaType::SpeedArea, "Ramp", 1, dec!(1), dec!(2));

    let report = run_import(&store, FLEET, AreaType::SpeedArea).await?;

    assert_eq!(report.bad_records, 1);
    assert_eq!(
        store.source_row(first).and_then(|r| r.bad_record_reason).as_deref(),
        Some("incorrect sequence number 1: expected 2 (1 more than 1)")
    );
    Ok(())
}

#[tokio::test]
async fn first_row_may_start_at_any_sequence_number() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.add_point(AreaType::KeepIn, "Lane", 10, dec!(1), dec!(1));
    store.add_point(AreaType::KeepIn, "Lane", 11, dec!(2), dec!(2));

    let report = run_import(&store, FLEET, AreaType::KeepIn).await?;

    assert_eq!(report.bad_records, 0);
    assert_eq!(report.locations_inserted, 1);
    Ok(())
}
