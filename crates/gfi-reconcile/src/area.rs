//! Area-type classifications and the per-record flag vector.
//!
//! Every destination row carries one boolean per [`AreaType`]. The vector is
//! modelled as [`AreaTypeFlags`], indexed by the enum, so callers never branch
//! five ways on the area type to pick a column or a bind value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the five fixed geofence classifications.
///
/// Declaration order is the slot order of [`AreaTypeFlags`] and matches the
/// column order of the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AreaType {
    Location,
    SpeedArea,
    KeepIn,
    NoGo,
    AreaCollection,
}

impl AreaType {
    /// All area types in slot order.
    pub const ALL: [AreaType; 5] = [
        AreaType::Location,
        AreaType::SpeedArea,
        AreaType::KeepIn,
        AreaType::NoGo,
        AreaType::AreaCollection,
    ];

    /// Name used in the source table's `area_type` column and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaType::Location => "Location",
            AreaType::SpeedArea => "speedArea",
            AreaType::KeepIn => "Keep-In",
            AreaType::NoGo => "NoGo",
            AreaType::AreaCollection => "AreaCollection",
        }
    }

    /// Destination column holding this classification's flag.
    pub fn flag_column(&self) -> &'static str {
        match self {
            AreaType::Location => "area_location",
            AreaType::SpeedArea => "area_speed_area",
            AreaType::KeepIn => "area_keep_in",
            AreaType::NoGo => "area_no_go",
            AreaType::AreaCollection => "area_collection",
        }
    }

    /// Keep-In areas are stored as corridors.
    pub fn is_corridor(&self) -> bool {
        matches!(self, AreaType::KeepIn)
    }

    fn slot(self) -> usize {
        self as usize
    }

    /// Parse a command-line / source-table name.
    ///
    /// Accepts the source-table spelling (`Keep-In`, `speedArea`) and the
    /// variant spelling (`KeepIn`, `SpeedArea`). Matching is exact.
    pub fn parse(s: &str) -> Result<Self, UnknownAreaType> {
        let s = s.trim();
        AreaType::ALL
            .into_iter()
            .find(|a| a.as_str() == s || a.variant_name() == s)
            .ok_or_else(|| UnknownAreaType(s.to_string()))
    }

    fn variant_name(&self) -> &'static str {
        match self {
            AreaType::Location => "Location",
            AreaType::SpeedArea => "SpeedArea",
            AreaType::KeepIn => "KeepIn",
            AreaType::NoGo => "NoGo",
            AreaType::AreaCollection => "AreaCollection",
        }
    }

    /// Comma-separated list of accepted names, alphabetical, for usage messages.
    pub fn usage_list() -> String {
        let mut names: Vec<&str> = AreaType::ALL.iter().map(|a| a.as_str()).collect();
        names.sort_by_key(|n| n.to_ascii_lowercase());
        names.join(", ")
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AreaType {
    type Err = UnknownAreaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AreaType::parse(s)
    }
}

/// Returned by [`AreaType::parse`] for a name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown area type '{0}'; expected one of: {list}", list = AreaType::usage_list())]
pub struct UnknownAreaType(pub String);

/// Five-slot classification vector, one boolean per [`AreaType`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaTypeFlags([bool; 5]);

impl AreaTypeFlags {
    /// No classification set.
    pub const fn none() -> Self {
        AreaTypeFlags([false; 5])
    }

    /// Exactly `area` set, every other slot clear.
    pub fn only(area: AreaType) -> Self {
        let mut flags = Self::none();
        flags.set(area, true);
        flags
    }

    pub fn get(&self, area: AreaType) -> bool {
        self.0[area.slot()]
    }

    pub fn set(&mut self, area: AreaType, value: bool) {
        self.0[area.slot()] = value;
    }

    /// Copy with `area` set to `value`.
    pub fn with(mut self, area: AreaType, value: bool) -> Self {
        self.set(area, value);
        self
    }

    /// True when `area` is the sole classification.
    pub fn is_only(&self, area: AreaType) -> bool {
        *self == Self::only(area)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|f| !f)
    }

    /// Slot values in [`AreaType::ALL`] order.
    pub fn as_array(&self) -> [bool; 5] {
        self.0
    }

    /// Set classifications in slot order.
    pub fn iter_set(&self) -> impl Iterator<Item = AreaType> + '_ {
        AreaType::ALL.into_iter().filter(|a| self.get(*a))
    }
}

impl fmt::Display for AreaTypeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter_set().map(|a| a.as_str()).collect();
        write!(f, "{{{}}}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_table_and_variant_spellings() {
        assert_eq!(AreaType::parse("Keep-In").unwrap(), AreaType::KeepIn);
        assert_eq!(AreaType::parse("KeepIn").unwrap(), AreaType::KeepIn);
        assert_eq!(AreaType::parse("speedArea").unwrap(), AreaType::SpeedArea);
        assert_eq!(AreaType::parse("SpeedArea").unwrap(), AreaType::SpeedArea);
        assert_eq!(AreaType::parse(" NoGo ").unwrap(), AreaType::NoGo);
        for a in AreaType::ALL {
            assert_eq!(a.as_str().parse::<AreaType>().unwrap(), a);
        }
    }

    #[test]
    fn parse_rejects_unknown_and_lists_valid_names() {
        let err = AreaType::parse("keep-in").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'keep-in'"), "{msg}");
        assert!(
            msg.contains("AreaCollection, Keep-In, Location, NoGo, speedArea"),
            "{msg}"
        );
    }

    #[test]
    fn only_sets_exactly_one_slot() {
        for a in AreaType::ALL {
            let f = AreaTypeFlags::only(a);
            assert!(f.get(a));
            assert_eq!(f.iter_set().collect::<Vec<_>>(), vec![a]);
            assert!(f.is_only(a));
        }
    }

    #[test]
    fn is_only_false_when_other_slots_set() {
        let f = AreaTypeFlags::only(AreaType::NoGo).with(AreaType::KeepIn, true);
        assert!(!f.is_only(AreaType::NoGo));
        assert!(!f.is_only(AreaType::KeepIn));
        assert_eq!(f.to_string(), "{Keep-In,NoGo}");
    }

    #[test]
    fn slot_order_matches_columns() {
        let cols: Vec<&str> = AreaType::ALL.iter().map(|a| a.flag_column()).collect();
        assert_eq!(
            cols,
            vec![
                "area_location",
                "area_speed_area",
                "area_keep_in",
                "area_no_go",
                "area_collection"
            ]
        );
        assert_eq!(
            AreaTypeFlags::only(AreaType::KeepIn).as_array(),
            [false, false, true, false, false]
        );
    }

    #[test]
    fn only_keep_in_is_corridor() {
        let corridors: Vec<AreaType> = AreaType::ALL.into_iter().filter(|a| a.is_corridor()).collect();
        assert_eq!(corridors, vec![AreaType::KeepIn]);
    }
}
