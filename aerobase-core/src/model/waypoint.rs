use std::fmt;

use crate::index::Positioned;

use super::{Coordinate, RecordError, require};

/// Classification of a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum WaypointKind {
    /// Named intersection.
    Fix,
    /// Co-located VOR.
    Vor,
    /// Co-located NDB.
    Ndb,
    /// RNAV/GPS-only point.
    Gps,
    /// Airport reference point.
    Airport,
    /// Anything else.
    Other,
}

impl WaypointKind {
    /// Store representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fix => "FIX",
            Self::Vor => "VOR",
            Self::Ndb => "NDB",
            Self::Gps => "GPS",
            Self::Airport => "AIRPORT",
            Self::Other => "OTHER",
        }
    }
}

impl From<&str> for WaypointKind {
    /// Unknown labels map to [`WaypointKind::Other`].
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "FIX" => Self::Fix,
            "VOR" => Self::Vor,
            "NDB" => Self::Ndb,
            "GPS" => Self::Gps,
            "AIRPORT" => Self::Airport,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for WaypointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named point used to build routes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    /// Store identifier, referenced by flight plans.
    pub id: String,
    /// Published name.
    pub name: String,
    /// Position.
    pub coordinate: Coordinate,
    /// Classification.
    pub kind: WaypointKind,
    /// Navigation region.
    pub region: Option<String>,
}

impl Waypoint {
    /// Validates and constructs a [`Waypoint`].
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        coordinate: Coordinate,
        kind: WaypointKind,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            id: require("id", id.into())?,
            name: require("name", name.into())?,
            coordinate,
            kind,
            region: None,
        })
    }

    /// Attach a region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

impl Positioned for Waypoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}
