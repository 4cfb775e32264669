use std::fmt;

use crate::index::Positioned;

use super::{Coordinate, RecordError, require};

/// Radio navigation aid type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum NavaidKind {
    /// VHF omnidirectional range.
    Vor,
    /// VOR with co-located DME.
    VorDme,
    /// Distance measuring equipment.
    Dme,
    /// Non-directional beacon.
    Ndb,
    /// Tactical air navigation.
    Tacan,
    /// Anything else.
    Other,
}

impl NavaidKind {
    /// Store representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vor => "VOR",
            Self::VorDme => "VORDME",
            Self::Dme => "DME",
            Self::Ndb => "NDB",
            Self::Tacan => "TACAN",
            Self::Other => "OTHER",
        }
    }
}

impl From<&str> for NavaidKind {
    /// Unknown labels map to [`NavaidKind::Other`].
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "VOR" => Self::Vor,
            "VORDME" | "VOR-DME" | "VOR/DME" => Self::VorDme,
            "DME" => Self::Dme,
            "NDB" => Self::Ndb,
            "TACAN" => Self::Tacan,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for NavaidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ground-based radio navigation aid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Navaid {
    /// Store identifier.
    pub id: String,
    /// Identifier or name.
    pub name: String,
    /// Navaid type.
    pub kind: NavaidKind,
    /// Antenna position.
    pub coordinate: Coordinate,
    /// Frequency in MHz (VOR/DME) or kHz (NDB).
    pub frequency: Option<f64>,
    /// Usable range in nautical miles.
    pub range_nm: Option<u32>,
    /// Elevation in feet.
    pub elevation_ft: Option<i32>,
    /// Navigation region.
    pub region: Option<String>,
}

impl Navaid {
    /// Validates and constructs a [`Navaid`].
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: NavaidKind,
        coordinate: Coordinate,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            id: require("id", id.into())?,
            name: require("name", name.into())?,
            kind,
            coordinate,
            frequency: None,
            range_nm: None,
            elevation_ft: None,
            region: None,
        })
    }

    /// Attach a frequency.
    #[must_use]
    pub const fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Attach a usable range.
    #[must_use]
    pub const fn with_range(mut self, range_nm: u32) -> Self {
        self.range_nm = Some(range_nm);
        self
    }

    /// Whether `coordinate` lies within the published usable range.
    ///
    /// A navaid without a published range is never considered in range.
    pub fn is_in_range(&self, coordinate: Coordinate) -> bool {
        self.range_nm
            .is_some_and(|range| self.coordinate.distance_to(coordinate) <= f64::from(range))
    }
}

impl Positioned for Navaid {
    fn id(&self) -> &str {
        &self.id
    }

    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}
