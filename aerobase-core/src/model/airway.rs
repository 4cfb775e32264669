use std::fmt;

use super::{RecordError, require};

/// Airway structure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum AirwayKind {
    /// High-level (jet) route.
    High,
    /// Low-level (victor) route.
    Low,
    /// Area navigation route.
    Rnav,
    /// Anything else.
    Other,
}

impl AirwayKind {
    /// Store representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Low => "LOW",
            Self::Rnav => "RNAV",
            Self::Other => "OTHER",
        }
    }
}

impl From<&str> for AirwayKind {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Self::High,
            "LOW" => Self::Low,
            "RNAV" => Self::Rnav,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for AirwayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published airway with optional altitude limits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Airway {
    /// Store identifier.
    pub id: String,
    /// Designator, e.g. `A1`.
    pub name: String,
    /// Structure class.
    pub kind: AirwayKind,
    /// Lowest usable altitude in feet.
    pub min_altitude_ft: Option<i32>,
    /// Highest usable altitude in feet.
    pub max_altitude_ft: Option<i32>,
}

impl Airway {
    /// Validates and constructs an unrestricted [`Airway`].
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: AirwayKind,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            id: require("id", id.into())?,
            name: require("name", name.into())?,
            kind,
            min_altitude_ft: None,
            max_altitude_ft: None,
        })
    }

    /// Set the altitude limits; either side may be open.
    #[must_use]
    pub const fn with_altitudes(mut self, min_ft: Option<i32>, max_ft: Option<i32>) -> Self {
        self.min_altitude_ft = min_ft;
        self.max_altitude_ft = max_ft;
        self
    }

    /// Whether `altitude_ft` satisfies both bounds (inclusive).
    pub fn permits_altitude(&self, altitude_ft: i32) -> bool {
        self.min_altitude_ft.is_none_or(|min| altitude_ft >= min)
            && self.max_altitude_ft.is_none_or(|max| altitude_ft <= max)
    }

    /// Whether either altitude bound is set.
    pub const fn is_restricted(&self) -> bool {
        self.min_altitude_ft.is_some() || self.max_altitude_ft.is_some()
    }
}

/// A directed edge between two waypoints on an airway.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AirwaySegment {
    /// Store identifier.
    pub id: String,
    /// Owning airway.
    pub airway_id: String,
    /// Start waypoint id.
    pub from_waypoint_id: String,
    /// End waypoint id.
    pub to_waypoint_id: String,
    /// Position along the airway.
    pub sequence: u32,
    /// Published length in nautical miles.
    pub distance_nm: Option<f64>,
}

impl AirwaySegment {
    /// Validates and constructs an [`AirwaySegment`].
    pub fn new(
        id: impl Into<String>,
        airway_id: impl Into<String>,
        from_waypoint_id: impl Into<String>,
        to_waypoint_id: impl Into<String>,
        sequence: u32,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            id: require("id", id.into())?,
            airway_id: require("airway_id", airway_id.into())?,
            from_waypoint_id: require("from_waypoint_id", from_waypoint_id.into())?,
            to_waypoint_id: require("to_waypoint_id", to_waypoint_id.into())?,
            sequence,
            distance_nm: None,
        })
    }

    /// Whether the segment runs from `from` to `to`.
    pub fn connects(&self, from: &str, to: &str) -> bool {
        self.from_waypoint_id == from && self.to_waypoint_id == to
    }
}
