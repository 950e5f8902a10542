//! Point-sequence continuity check for an open location group.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// A row whose sequence number does not follow the group's last accepted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceViolation {
    pub received: i32,
    pub last_accepted: i32,
}

impl SequenceViolation {
    pub fn new(received: i32, last_accepted: i32) -> Self {
        Self {
            received,
            last_accepted,
        }
    }

    /// The sequence number that would have been accepted.
    pub fn expected(&self) -> i64 {
        i64::from(self.last_accepted) + 1
    }
}

impl fmt::Display for SequenceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "incorrect sequence number {}: expected {} (1 more than {})",
            self.received,
            self.expected(),
            self.last_accepted
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    Accept,
    Reject(SequenceViolation),
}

/// Accept iff `incoming == last + 1`. Never mutates the group.
pub fn validate(group: &Location, incoming_sequence_no: i32) -> SequenceCheck {
    let last = group.last_sequence_no();
    if i64::from(incoming_sequence_no) == i64::from(last) + 1 {
        SequenceCheck::Accept
    } else {
        SequenceCheck::Reject(SequenceViolation::new(incoming_sequence_no, last))
    }
}
