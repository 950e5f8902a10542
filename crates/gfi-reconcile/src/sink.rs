//! Quarantine of locations that failed sequence validation.

use tracing::warn;

use crate::location::Location;
use crate::store::{LocationStore, StoreResult};

/// Writes bad-record markers back to the import source.
pub struct BadRecordSink<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: LocationStore + ?Sized> BadRecordSink<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Mark the row that opened `location` as bad. Returns `false` (and
    /// writes nothing) when the location has no violations.
    pub async fn quarantine(&self, location: &Location) -> StoreResult<bool> {
        let Some(reason) = location.bad_record_reason() else {
            return Ok(false);
        };

        warn!(
            location = location.location_name(),
            source_id = location.source_id(),
            violations = location.violations().len(),
            %reason,
            "marking location as a bad record"
        );
        self.store
            .mark_bad_record(location.source_id(), &reason)
            .await?;
        Ok(true)
    }
}
