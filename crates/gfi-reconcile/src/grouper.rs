//! Streaming group-by-name over ordered import rows.
//!
//! Two states: [`GroupState::NoGroup`] before the first row and
//! [`GroupState::Open`] while a location is being assembled. A location is
//! handed out (finalized) when the name changes or the stream ends; nothing
//! beyond the single open group is buffered.

use crate::area::AreaType;
use crate::location::{ImportRow, Location};
use crate::validator::{validate, SequenceCheck, SequenceViolation};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroupState {
    #[default]
    NoGroup,
    Open(Location),
}

/// What happened to the row just consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Row started a new group.
    Opened,
    /// Row's point was appended to the open group.
    Appended,
    /// Row failed the continuity check; its point was dropped.
    Rejected(SequenceViolation),
}

#[derive(Debug)]
pub struct Transition {
    pub state: GroupState,
    pub outcome: RowOutcome,
    /// Group closed by this row's name change, if any.
    pub finalized: Option<Location>,
}

/// Consume one row.
pub fn step(state: GroupState, area_type: AreaType, row: ImportRow) -> Transition {
    match state {
        GroupState::Open(mut current) if current.is_same_as(&row.location_name) => {
            let outcome = match validate(&current, row.sequence_no) {
                SequenceCheck::Accept => {
                    current.append(row.sequence_no, row.point());
                    RowOutcome::Appended
                }
                SequenceCheck::Reject(violation) => {
                    current.mark_bad(violation);
                    RowOutcome::Rejected(violation)
                }
            };
            Transition {
                state: GroupState::Open(current),
                outcome,
                finalized: None,
            }
        }
        GroupState::Open(previous) => Transition {
            state: GroupState::Open(Location::open(area_type, row)),
            outcome: RowOutcome::Opened,
            finalized: Some(previous),
        },
        GroupState::NoGroup => Transition {
            state: GroupState::Open(Location::open(area_type, row)),
            outcome: RowOutcome::Opened,
            finalized: None,
        },
    }
}

/// End of stream: hand out the open group, if there is one.
pub fn finish(state: GroupState) -> Option<Location> {
    match state {
        GroupState::Open(current) => Some(current),
        GroupState::NoGroup => None,
    }
}

/// Push-style driver around [`step`] / [`finish`].
#[derive(Debug)]
pub struct Grouper {
    area_type: AreaType,
    state: GroupState,
}

impl Grouper {
    pub fn new(area_type: AreaType) -> Self {
        Self {
            area_type,
            state: GroupState::NoGroup,
        }
    }

    pub fn push(&mut self, row: ImportRow) -> (RowOutcome, Option<Location>) {
        let state = std::mem::take(&mut self.state);
        let t = step(state, self.area_type, row);
        self.state = t.state;
        (t.outcome, t.finalized)
    }

    pub fn finish(&mut self) -> Option<Location> {
        finish(std::mem::take(&mut self.state))
    }

    pub fn current(&self) -> Option<&Location> {
        match &self.state {
            GroupState::Open(l) => Some(l),
            GroupState::NoGroup => None,
        }
    }
}

/// Iterator adaptor: ordered rows in, finalized locations out.
pub struct LocationGroups<I> {
    rows: I,
    grouper: Grouper,
}

pub fn group_rows<I>(area_type: AreaType, rows: I) -> LocationGroups<I::IntoIter>
where
    I: IntoIterator<Item = ImportRow>,
{
    LocationGroups {
        rows: rows.into_iter(),
        grouper: Grouper::new(area_type),
    }
}

impl<I: Iterator<Item = ImportRow>> Iterator for LocationGroups<I> {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        for row in self.rows.by_ref() {
            if let (_, Some(done)) = self.grouper.push(row) {
                return Some(done);
            }
        }
        self.grouper.finish()
    }
}
