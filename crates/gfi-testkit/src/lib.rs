//! In-memory [`LocationStore`] for scenario tests.
//!
//! Mirrors the Postgres store's statement semantics (ordering of source rows,
//! `imported`-only lookups, insert-ignore on `(fleet, location_name)`) and
//! adds fault injection so tests can prove fail-fast behaviour.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use gfi_reconcile::{
    AreaType, AreaTypeFlags, ImportRow, ImportRowStream, LocationStore, NewFleetLocation,
    StoreError, StoreResult,
};
use rust_decimal::Decimal;

/// One `locations_import` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub area_type: AreaType,
    pub row: ImportRow,
    pub bad_record: bool,
    pub bad_record_reason: Option<String>,
}

/// One `fleet_locations` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetLocationRow {
    pub loc_id: i64,
    pub imported: bool,
    pub record: NewFleetLocation,
}

/// Statement to fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Delete,
    ClearFlag,
    /// Fail when the n-th (0-based) source row is fetched.
    ImportRowAt(usize),
    Lookup,
    SetFlag,
    Insert,
    MarkBadRecord,
}

#[derive(Debug, Default)]
struct State {
    source: Vec<SourceRow>,
    fleet: BTreeMap<i64, FleetLocationRow>,
    next_source_id: i64,
    next_loc_id: i64,
    fail_on: Option<FailPoint>,
    statements: Vec<&'static str>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn injected(intent: &str) -> StoreError {
    StoreError::query(intent, "injected failure")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Add a source point with no speed limit and `is_safe = false`. Returns its id.
    pub fn add_point(
        &self,
        area_type: AreaType,
        location_name: &str,
        sequence_no: i32,
        latitude: Decimal,
        longitude: Decimal,
    ) -> i64 {
        self.add_row(
            area_type,
            location_name,
            sequence_no,
            latitude,
            longitude,
            None,
            false,
        )
    }

    /// Add a fully specified source point. Returns its id.
    #[allow(clippy::too_many_arguments)]
    pub fn add_row(
        &self,
        area_type: AreaType,
        location_name: &str,
        sequence_no: i32,
        latitude: Decimal,
        longitude: Decimal,
        speed_limit: Option<Decimal>,
        is_safe: bool,
    ) -> i64 {
        let mut st = self.state();
        st.next_source_id += 1;
        let id = st.next_source_id;
        st.source.push(SourceRow {
            area_type,
            row: ImportRow {
                id,
                location_name: location_name.to_string(),
                speed_limit,
                is_safe,
                sequence_no,
                latitude,
                longitude,
            },
            bad_record: false,
            bad_record_reason: None,
        });
        id
    }

    /// Remove every source row for `area_type`.
    pub fn clear_source(&self, area_type: AreaType) {
        self.state().source.retain(|r| r.area_type != area_type);
    }

    /// Seed a destination row directly. Returns its `loc_id`.
    pub fn seed_fleet_location(
        &self,
        fleet_id: i64,
        location_name: &str,
        flags: AreaTypeFlags,
        imported: bool,
    ) -> i64 {
        let record = NewFleetLocation {
            fleet_id,
            location_name: location_name.to_string(),
            latitude: Decimal::ZERO,
            longitude: Decimal::ZERO,
            top_left_lat: Decimal::ZERO,
            top_left_lon: Decimal::ZERO,
            bottom_right_lat: Decimal::ZERO,
            bottom_right_lon: Decimal::ZERO,
            complex_points: String::new(),
            service_loc_flag: false,
            corridor_flag: false,
            speed_zone_override: None,
            speed_zone_flag: false,
            location_color: String::new(),
            flags,
        };
        self.state().insert_row(record, imported)
    }

    pub fn fail_on(&self, point: FailPoint) {
        self.state().fail_on = Some(point);
    }

    pub fn clear_failure(&self) {
        self.state().fail_on = None;
    }

    /// Destination rows for `fleet_id`, ordered by location name.
    pub fn fleet_rows(&self, fleet_id: i64) -> Vec<FleetLocationRow> {
        let mut rows: Vec<FleetLocationRow> = self
            .state()
            .fleet
            .values()
            .filter(|r| r.record.fleet_id == fleet_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.record.location_name.cmp(&b.record.location_name));
        rows
    }

    /// Destination records for `fleet_id` without surrogate ids, for state comparison.
    pub fn fleet_records(&self, fleet_id: i64) -> Vec<(bool, NewFleetLocation)> {
        self.fleet_rows(fleet_id)
            .into_iter()
            .map(|r| (r.imported, r.record))
            .collect()
    }

    pub fn fleet_row(&self, fleet_id: i64, location_name: &str) -> Option<FleetLocationRow> {
        self.fleet_rows(fleet_id)
            .into_iter()
            .find(|r| r.record.location_name == location_name)
    }

    pub fn source_row(&self, id: i64) -> Option<SourceRow> {
        self.state().source.iter().find(|r| r.row.id == id).cloned()
    }

    pub fn bad_source_rows(&self) -> Vec<SourceRow> {
        self.state()
            .source
            .iter()
            .filter(|r| r.bad_record)
            .cloned()
            .collect()
    }

    /// Names of the store methods called, in call order.
    pub fn statements(&self) -> Vec<&'static str> {
        self.state().statements.clone()
    }
}

impl State {
    fn check(&mut self, statement: &'static str, point: FailPoint, intent: &str) -> StoreResult<()> {
        self.statements.push(statement);
        if self.fail_on == Some(point) {
            return Err(injected(intent));
        }
        Ok(())
    }

    fn insert_row(&mut self, record: NewFleetLocation, imported: bool) -> i64 {
        self.next_loc_id += 1;
        let loc_id = self.next_loc_id;
        self.fleet.insert(
            loc_id,
            FleetLocationRow {
                loc_id,
                imported,
                record,
            },
        );
        loc_id
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    fn import_rows(&self, area_type: AreaType) -> ImportRowStream<'_> {
        let mut st = self.state();
        st.statements.push("import_rows");
        let fail_at = match st.fail_on {
            Some(FailPoint::ImportRowAt(n)) => Some(n),
            _ => None,
        };

        let mut rows: Vec<ImportRow> = st
            .source
            .iter()
            .filter(|r| r.area_type == area_type)
            .map(|r| r.row.clone())
            .collect();
        rows.sort_by(|a, b| {
            a.location_name
                .cmp(&b.location_name)
                .then(a.sequence_no.cmp(&b.sequence_no))
        });

        let items: Vec<StoreResult<ImportRow>> = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                if Some(i) == fail_at {
                    Err(injected("fetch locations_import row"))
                } else {
                    Ok(row)
                }
            })
            .collect();
        stream::iter(items).boxed()
    }

    async fn delete_imported_with_flags(
        &self,
        fleet_id: i64,
        flags: AreaTypeFlags,
    ) -> StoreResult<u64> {
        let mut st = self.state();
        st.check("delete_imported_with_flags", FailPoint::Delete, "delete fleet_locations")?;
        let before = st.fleet.len();
        st.fleet.retain(|_, r| {
            !(r.record.fleet_id == fleet_id && r.imported && r.record.flags == flags)
        });
        Ok((before - st.fleet.len()) as u64)
    }

    async fn clear_imported_flag(&self, fleet_id: i64, area_type: AreaType) -> StoreResult<u64> {
        let mut st = self.state();
        st.check("clear_imported_flag", FailPoint::ClearFlag, "clear fleet_locations flag")?;
        let mut n = 0;
        for r in st.fleet.values_mut() {
            if r.record.fleet_id == fleet_id && r.imported {
                r.record.flags.set(area_type, false);
                n += 1;
            }
        }
        Ok(n)
    }

    async fn find_imported(
        &self,
        fleet_id: i64,
        location_name: &str,
    ) -> StoreResult<Option<i64>> {
        let mut st = self.state();
        st.check("find_imported", FailPoint::Lookup, "look up fleet_location")?;
        Ok(st
            .fleet
            .values()
            .find(|r| {
                r.record.fleet_id == fleet_id
                    && r.imported
                    && r.record.location_name == location_name
            })
            .map(|r| r.loc_id))
    }

    async fn set_flag(&self, loc_id: i64, area_type: AreaType) -> StoreResult<()> {
        let mut st = self.state();
        st.check("set_flag", FailPoint::SetFlag, "set fleet_location flag")?;
        if let Some(r) = st.fleet.get_mut(&loc_id) {
            r.record.flags.set(area_type, true);
        }
        Ok(())
    }

    async fn insert_imported(&self, location: &NewFleetLocation) -> StoreResult<bool> {
        let mut st = self.state();
        st.check("insert_imported", FailPoint::Insert, "insert fleet_location")?;
        let exists = st.fleet.values().any(|r| {
            r.record.fleet_id == location.fleet_id
                && r.record.location_name == location.location_name
        });
        if exists {
            return Ok(false);
        }
        st.insert_row(location.clone(), true);
        Ok(true)
    }

    async fn mark_bad_record(&self, source_id: i64, reason: &str) -> StoreResult<()> {
        let mut st = self.state();
        st.check("mark_bad_record", FailPoint::MarkBadRecord, "mark locations_import bad record")?;
        if let Some(r) = st.source.iter_mut().find(|r| r.row.id == source_id) {
            r.bad_record = true;
            r.bad_record_reason = Some(reason.to_string());
        }
        Ok(())
    }
}
