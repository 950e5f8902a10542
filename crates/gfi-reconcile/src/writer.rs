//! Reconciliation of finalized locations into the destination store.

use tracing::{debug, info};

use crate::area::{AreaType, AreaTypeFlags};
use crate::location::Location;
use crate::store::{LocationStore, NewFleetLocation, StoreResult};

/// Rows touched by the pre-pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cleanup {
    /// Imported rows whose only classification was this area type.
    pub deleted: u64,
    /// Imported rows that had this area type's flag cleared.
    pub cleared: u64,
}

/// Result of writing one good location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// An imported row with this name already existed; only its flag was set.
    Classified { loc_id: i64 },
    /// A new row was inserted with computed geometry.
    Inserted,
    /// The insert hit an existing natural key and was ignored.
    DuplicateIgnored,
}

/// Merges locations for one `(fleet_id, area_type)` import run.
pub struct ReconciliationWriter<'s, S: ?Sized> {
    store: &'s S,
    fleet_id: i64,
    area_type: AreaType,
}

impl<'s, S: LocationStore + ?Sized> ReconciliationWriter<'s, S> {
    pub fn new(store: &'s S, fleet_id: i64, area_type: AreaType) -> Self {
        Self {
            store,
            fleet_id,
            area_type,
        }
    }

    /// Pre-pass, run once before any location is written:
    /// 1. delete imported rows classified solely as this area type;
    /// 2. clear this area type's flag on the remaining imported rows.
    pub async fn cleanup(&self) -> StoreResult<Cleanup> {
        info!(
            fleet_id = self.fleet_id,
            area_type = %self.area_type,
            "deleting locations classified only as {}",
            self.area_type
        );
        let deleted = self
            .store
            .delete_imported_with_flags(self.fleet_id, AreaTypeFlags::only(self.area_type))
            .await?;

        let cleared = self
            .store
            .clear_imported_flag(self.fleet_id, self.area_type)
            .await?;

        info!(deleted, cleared, "cleanup pass complete");
        Ok(Cleanup { deleted, cleared })
    }

    /// Write one good location: flag an existing imported row, or insert a new one.
    pub async fn write(&self, location: &Location) -> StoreResult<WriteOutcome> {
        let name = location.location_name();

        if let Some(loc_id) = self.store.find_imported(self.fleet_id, name).await? {
            info!(location = name, loc_id, "updating existing location");
            self.store.set_flag(loc_id, self.area_type).await?;
            return Ok(WriteOutcome::Classified { loc_id });
        }

        let record = NewFleetLocation::from_location(self.fleet_id, location);
        info!(
            location = name,
            points = location.number_of_points(),
            "inserting location"
        );
        debug!(?record, "insert record");

        if self.store.insert_imported(&record).await? {
            Ok(WriteOutcome::Inserted)
        } else {
            info!(location = name, "insert ignored: location already present");
            Ok(WriteOutcome::DuplicateIgnored)
        }
    }
}
