//! Scenario: re-running an import over unchanged source data leaves the
//! destination in the same state (ignoring surrogate ids).

use gfi_reconcile::{run_import, AreaType, AreaTypeFlags};
use gfi_testkit::MemoryStore;
use rust_decimal_macros::dec;

const FLEET: i64 = 3;

fn seed(store: &MemoryStore) {
    store.add_point(AreaType::Location, "North", 1, dec!(10), dec!(10));
    store.add_point(AreaType::Location, "North", 2, dec!(11), dec!(12));
    store.add_point(AreaType::Location, "South", 1, dec!(-10), dec!(10));
    store.add_point(AreaType::Location, "Broken", 1, dec!(0), dec!(0));
    store.add_point(AreaType::Location, "Broken", 9, dec!(0), dec!(1));
}

#[tokio::test]
async fn second_run_reproduces_first_run_state() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    seed(&store);

    let first = run_import(&store, FLEET, AreaType::Location).await?;
    let after_first = store.fleet_records(FLEET);

    let second = run_import(&store, FLEET, AreaType::Location).await?;
    let after_second = store.fleet_records(FLEET);

    assert_eq!(after_first, after_second);
    assert_eq!(first.locations_inserted, 2);
    assert_eq!(second.locations_inserted, 2);
    assert_eq!(second.cleanup_deleted, 2, "rows classified only as Location are rebuilt");
    assert_eq!(second.bad_records, 1);
    Ok(())
}

#[tokio::test]
async fn multi_classified_row_survives_reimport_with_flag_restored() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.add_point(AreaType::KeepIn, "Harbour", 1, dec!(1), dec!(1));
    store.add_point(AreaType::KeepIn, "Harbour", 2, dec!(2), dec!(2));
    store.add_point(AreaType::NoGo, "Harbour", 1, dec!(1), dec!(1));

    run_import(&store, FLEET, AreaType::KeepIn).await?;
    let report = run_import(&store, FLEET, AreaType::NoGo).await?;
    assert_eq!(report.locations_classified, 1);

    let loc_id = store.fleet_row(FLEET, "Harbour").expect("Harbour").loc_id;
    let expected = AreaTypeFlags::only(AreaType::KeepIn).with(AreaType::NoGo, true);
    assert_eq!(store.fleet_row(FLEET, "Harbour").expect("Harbour").record.flags, expected);

    // Re-running NoGo clears the flag, keeps the row, then sets it again.
    let again = run_import(&store, FLEET, AreaType::NoGo).await?;
    assert_eq!(again.cleanup_deleted, 0);
    assert_eq!(again.locations_classified, 1);

    let row = store.fleet_row(FLEET, "Harbour").expect("Harbour");
    assert_eq!(row.loc_id, loc_id, "row kept, not re-inserted");
    assert_eq!(row.record.flags, expected);
    Ok(())
}

#[tokio::test]
async fn location_dropped_from_source_is_removed_on_reimport() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    seed(&store);
    run_import(&store, FLEET, AreaType::Location).await?;
    assert!(store.fleet_row(FLEET, "North").is_some());

    store.clear_source(AreaType::Location);
    store.add_point(AreaType::Location, "South", 1, dec!(-10), dec!(10));

    let report = run_import(&store, FLEET, AreaType::Location).await?;
    assert_eq!(report.cleanup_deleted, 2);
    assert_eq!(report.locations_inserted, 1);
    assert!(store.fleet_row(FLEET, "North").is_none(), "stale import cleaned up");
    assert!(store.fleet_row(FLEET, "South").is_some());
    Ok(())
}
