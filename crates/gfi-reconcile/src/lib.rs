//! gfi-reconcile
//!
//! Geofence import core: turns ordered `(location_name, sequence_no, lat, lon)`
//! rows into location geometries and reconciles them into a fleet's
//! destination rows for one area type.
//!
//! - Grouping, validation and geometry are pure.
//! - All IO goes through the [`LocationStore`] trait.
//! - A sequence gap quarantines one location; any store failure aborts the run.

mod area;
mod engine;
mod geometry;
mod grouper;
mod location;
mod sink;
mod store;
mod validator;
mod writer;

pub use area::{AreaType, AreaTypeFlags, UnknownAreaType};
pub use engine::{run_import, ImportReport};
pub use geometry::{
    bounding_box, complex_points, BoundingBox, CoordinateOutOfRange, Extent, Point,
    CENTROID_MIN_SCALE,
};
pub use grouper::{finish, group_rows, step, GroupState, Grouper, LocationGroups, RowOutcome, Transition};
pub use location::{ImportRow, Location};
pub use sink::BadRecordSink;
pub use store::{
    BoxError, ImportRowStream, LocationStore, NewFleetLocation, StoreError, StoreResult,
    DEFAULT_LOCATION_COLOR,
};
pub use validator::{validate, SequenceCheck, SequenceViolation};
pub use writer::{Cleanup, ReconciliationWriter, WriteOutcome};
