//! Store boundary for the import engine.
//!
//! This module defines **only** the record shapes crossing the boundary, the
//! error type, and the [`LocationStore`] trait. Concrete stores live in
//! `gfi-db` (Postgres) and `gfi-testkit` (in-memory).

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::area::{AreaType, AreaTypeFlags};
use crate::location::{ImportRow, Location};

/// Colour assigned to every imported location.
pub const DEFAULT_LOCATION_COLOR: &str = "#008CFF";

/// Boxed cause carried by [`StoreError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure talking to the source or destination store.
///
/// All variants are fatal for the run; there is no retry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("cannot connect to location store: {source}")]
    Connection {
        #[source]
        source: BoxError,
    },

    /// A read or write statement failed. `intent` names what the statement was for.
    #[error("{intent} failed: {source}")]
    Query {
        intent: String,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub fn query(intent: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StoreError::Query {
            intent: intent.into(),
            source: source.into(),
        }
    }

    pub fn connection(source: impl Into<BoxError>) -> Self {
        StoreError::Connection {
            source: source.into(),
        }
    }

    pub fn intent(&self) -> Option<&str> {
        match self {
            StoreError::Query { intent, .. } => Some(intent.as_str()),
            StoreError::Connection { .. } => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered source rows for one area type.
pub type ImportRowStream<'a> = BoxStream<'a, StoreResult<ImportRow>>;

/// A destination row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFleetLocation {
    pub fleet_id: i64,
    pub location_name: String,
    /// Centroid.
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub top_left_lat: Decimal,
    pub top_left_lon: Decimal,
    pub bottom_right_lat: Decimal,
    pub bottom_right_lon: Decimal,
    pub complex_points: String,
    pub service_loc_flag: bool,
    pub corridor_flag: bool,
    pub speed_zone_override: Option<Decimal>,
    pub speed_zone_flag: bool,
    pub location_color: String,
    pub flags: AreaTypeFlags,
}

impl NewFleetLocation {
    /// Build the insert record for a good location, computing its geometry.
    pub fn from_location(fleet_id: i64, location: &Location) -> Self {
        let bb = location.bounding_box();
        Self {
            fleet_id,
            location_name: location.location_name().to_string(),
            latitude: bb.centroid.latitude,
            longitude: bb.centroid.longitude,
            top_left_lat: bb.top_left.latitude,
            top_left_lon: bb.top_left.longitude,
            bottom_right_lat: bb.bottom_right.latitude,
            bottom_right_lon: bb.bottom_right.longitude,
            complex_points: location.complex_points(),
            service_loc_flag: location.is_safe(),
            corridor_flag: location.is_corridor(),
            speed_zone_override: location.speed_limit(),
            speed_zone_flag: false,
            location_color: DEFAULT_LOCATION_COLOR.to_string(),
            flags: AreaTypeFlags::only(location.area_type()),
        }
    }
}

/// Source and destination operations used by one import run.
///
/// Every method is a single independent statement; implementations must not
/// wrap calls in a transaction spanning more than one method.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Source rows for `area_type`, ordered by `(location_name, sequence_no)`.
    fn import_rows(&self, area_type: AreaType) -> ImportRowStream<'_>;

    /// Delete the fleet's imported rows whose flags equal `flags` exactly.
    async fn delete_imported_with_flags(
        &self,
        fleet_id: i64,
        flags: AreaTypeFlags,
    ) -> StoreResult<u64>;

    /// Clear `area_type`'s flag on every imported row of the fleet.
    async fn clear_imported_flag(&self, fleet_id: i64, area_type: AreaType) -> StoreResult<u64>;

    /// Surrogate id of the imported row named `location_name`, if any.
    async fn find_imported(&self, fleet_id: i64, location_name: &str)
        -> StoreResult<Option<i64>>;

    /// Set `area_type`'s flag on the row with surrogate id `loc_id`.
    async fn set_flag(&self, loc_id: i64, area_type: AreaType) -> StoreResult<()>;

    /// Insert an imported row. Returns `false` when the natural key
    /// `(fleet_id, location_name)` already existed and the insert was ignored.
    async fn insert_imported(&self, location: &NewFleetLocation) -> StoreResult<bool>;

    /// Mark the source row `source_id` as a bad record.
    async fn mark_bad_record(&self, source_id: i64, reason: &str) -> StoreResult<()>;
}
