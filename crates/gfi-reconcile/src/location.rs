//! Source rows and the per-location aggregate assembled from them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::area::AreaType;
use crate::geometry::{complex_points, BoundingBox, Extent, Point};
use crate::validator::SequenceViolation;

/// One row of the import source, already filtered to a single area type.
///
/// Rows must arrive ordered by `(location_name, sequence_no)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub id: i64,
    pub location_name: String,
    pub speed_limit: Option<Decimal>,
    pub is_safe: bool,
    pub sequence_no: i32,
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl ImportRow {
    pub fn point(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}

/// Consecutive rows sharing one location name, folded into one record.
///
/// Speed limit, safety flag and `source_id` come from the row that opened
/// the group. `points` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    source_id: i64,
    area_type: AreaType,
    location_name: String,
    speed_limit: Option<Decimal>,
    is_safe: bool,
    last_sequence_no: i32,
    points: Vec<Point>,
    extent: Extent,
    violations: Vec<SequenceViolation>,
}

impl Location {
    /// Open a group from its first row. The first point is always accepted.
    pub fn open(area_type: AreaType, row: ImportRow) -> Self {
        let first = row.point();
        Self {
            source_id: row.id,
            area_type,
            location_name: row.location_name,
            speed_limit: row.speed_limit,
            is_safe: row.is_safe,
            last_sequence_no: row.sequence_no,
            points: vec![first],
            extent: Extent::from_point(&first),
            violations: Vec::new(),
        }
    }

    pub(crate) fn append(&mut self, sequence_no: i32, point: Point) {
        self.last_sequence_no = sequence_no;
        self.extent.include(&point);
        self.points.push(point);
    }

    pub(crate) fn mark_bad(&mut self, violation: SequenceViolation) {
        self.violations.push(violation);
    }

    pub fn is_same_as(&self, location_name: &str) -> bool {
        self.location_name == location_name
    }

    pub fn source_id(&self) -> i64 {
        self.source_id
    }

    pub fn area_type(&self) -> AreaType {
        self.area_type
    }

    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    pub fn speed_limit(&self) -> Option<Decimal> {
        self.speed_limit
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    pub fn is_corridor(&self) -> bool {
        self.area_type.is_corridor()
    }

    pub fn last_sequence_no(&self) -> i32 {
        self.last_sequence_no
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_bad_record(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Reason persisted for a bad record: the most recent violation.
    pub fn bad_record_reason(&self) -> Option<String> {
        self.violations.last().map(|v| v.to_string())
    }

    /// Every violation seen while the group was open, in stream order.
    pub fn violations(&self) -> &[SequenceViolation] {
        &self.violations
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.extent.bounding_box()
    }

    pub fn complex_points(&self) -> String {
        complex_points(&self.points)
    }
}
