use std::fmt;

use super::{Coordinate, RecordError, require};

/// ICAO airspace class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum AirspaceClass {
    /// Class A.
    A,
    /// Class B.
    B,
    /// Class C.
    C,
    /// Class D.
    D,
    /// Class E.
    E,
    /// Class G.
    G,
    /// Anything else.
    Other,
}

impl AirspaceClass {
    /// Store representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::G => "G",
            Self::Other => "OTHER",
        }
    }
}

impl From<&str> for AirspaceClass {
    fn from(value: &str) -> Self {
        let upper = value.trim().to_ascii_uppercase();
        match upper.strip_prefix("CLASS ").unwrap_or(upper.as_str()) {
            "A" => Self::A,
            "B" => Self::B,
            "C" => Self::C,
            "D" => Self::D,
            "E" => Self::E,
            "G" => Self::G,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for AirspaceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purpose of an airspace volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AirspaceKind {
    /// Control zone around an aerodrome.
    #[cfg_attr(feature = "serde", serde(rename = "CTR"))]
    ControlZone,
    /// Terminal control area.
    #[cfg_attr(feature = "serde", serde(rename = "TMA"))]
    TerminalArea,
    /// Flight information region.
    #[cfg_attr(feature = "serde", serde(rename = "FIR"))]
    FlightInformationRegion,
    /// Restricted area.
    #[cfg_attr(feature = "serde", serde(rename = "RESTRICTED"))]
    Restricted,
    /// Danger area.
    #[cfg_attr(feature = "serde", serde(rename = "DANGER"))]
    Danger,
    /// Prohibited area.
    #[cfg_attr(feature = "serde", serde(rename = "PROHIBITED"))]
    Prohibited,
    /// Anything else.
    #[cfg_attr(feature = "serde", serde(rename = "OTHER"))]
    Other,
}

impl AirspaceKind {
    /// Store representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ControlZone => "CTR",
            Self::TerminalArea => "TMA",
            Self::FlightInformationRegion => "FIR",
            Self::Restricted => "RESTRICTED",
            Self::Danger => "DANGER",
            Self::Prohibited => "PROHIBITED",
            Self::Other => "OTHER",
        }
    }
}

impl From<&str> for AirspaceKind {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "CTR" | "CONTROL ZONE" => Self::ControlZone,
            "TMA" | "TERMINAL AREA" => Self::TerminalArea,
            "FIR" | "FLIGHT INFO REGION" | "FLIGHT INFORMATION REGION" => {
                Self::FlightInformationRegion
            }
            "RESTRICTED" | "R" => Self::Restricted,
            "DANGER" | "D" => Self::Danger,
            "PROHIBITED" | "P" => Self::Prohibited,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for AirspaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named airspace volume. Its lateral extent is the ring of
/// [`AirspaceBoundary`] vertices stored under its id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Airspace {
    /// Store identifier.
    pub id: String,
    /// Published name, e.g. `Beijing CTR`.
    pub name: String,
    /// Purpose of the volume.
    pub kind: AirspaceKind,
    /// Airspace class, when published.
    pub class: Option<AirspaceClass>,
    /// Floor in feet.
    pub lower_limit_ft: Option<i32>,
    /// Ceiling in feet.
    pub upper_limit_ft: Option<i32>,
}

impl Airspace {
    /// Validates and constructs an unbounded, unclassified [`Airspace`].
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: AirspaceKind,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            id: require("id", id.into())?,
            name: require("name", name.into())?,
            kind,
            class: None,
            lower_limit_ft: None,
            upper_limit_ft: None,
        })
    }

    /// Set the airspace class.
    #[must_use]
    pub const fn with_class(mut self, class: AirspaceClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Set the vertical limits; either side may be open.
    #[must_use]
    pub const fn with_limits(mut self, lower_ft: Option<i32>, upper_ft: Option<i32>) -> Self {
        self.lower_limit_ft = lower_ft;
        self.upper_limit_ft = upper_ft;
        self
    }

    /// Whether `altitude_ft` lies between the floor and the ceiling
    /// (inclusive).
    pub fn contains_altitude(&self, altitude_ft: i32) -> bool {
        self.lower_limit_ft.is_none_or(|lower| altitude_ft >= lower)
            && self.upper_limit_ft.is_none_or(|upper| altitude_ft <= upper)
    }
}

/// One vertex of an airspace's lateral boundary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AirspaceBoundary {
    /// Store identifier.
    pub id: String,
    /// Owning airspace.
    pub airspace_id: String,
    /// Vertex position.
    pub coordinate: Coordinate,
    /// Position of the vertex along the ring.
    pub sequence: u32,
}

impl AirspaceBoundary {
    /// Validates and constructs an [`AirspaceBoundary`] vertex.
    pub fn new(
        id: impl Into<String>,
        airspace_id: impl Into<String>,
        coordinate: Coordinate,
        sequence: u32,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            id: require("id", id.into())?,
            airspace_id: require("airspace_id", airspace_id.into())?,
            coordinate,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tma() -> Airspace {
        Airspace::new("AS001", "Beijing TMA", AirspaceKind::TerminalArea).unwrap()
    }

    #[rstest]
    #[case(10_000, true)]
    #[case(5_000, true)]
    #[case(15_000, true)]
    #[case(3_000, false)]
    #[case(20_000, false)]
    fn limits_are_inclusive(#[case] altitude: i32, #[case] inside: bool) {
        let airspace = tma().with_limits(Some(5_000), Some(15_000));
        assert_eq!(airspace.contains_altitude(altitude), inside);
    }

    #[test]
    fn unbounded_airspace_contains_every_altitude() {
        assert!(tma().contains_altitude(-500));
        assert!(tma().contains_altitude(90_000));
    }

    #[rstest]
    #[case("B", AirspaceClass::B)]
    #[case("class c", AirspaceClass::C)]
    #[case(" g ", AirspaceClass::G)]
    #[case("F", AirspaceClass::Other)]
    fn class_parses_short_and_long_forms(#[case] input: &str, #[case] expected: AirspaceClass) {
        assert_eq!(AirspaceClass::from(input), expected);
    }

    #[rstest]
    #[case("ctr", AirspaceKind::ControlZone)]
    #[case("Terminal Area", AirspaceKind::TerminalArea)]
    #[case("FIR", AirspaceKind::FlightInformationRegion)]
    #[case("P", AirspaceKind::Prohibited)]
    #[case("MOA", AirspaceKind::Other)]
    fn kind_parses_codes_and_names(#[case] input: &str, #[case] expected: AirspaceKind) {
        assert_eq!(AirspaceKind::from(input), expected);
        assert_eq!(AirspaceKind::from(expected.as_str()), expected);
    }

    #[test]
    fn boundary_requires_owner() {
        let at = Coordinate::new(40.0, 116.0).unwrap();
        assert_eq!(
            AirspaceBoundary::new("B1", " ", at, 0),
            Err(RecordError::EmptyField {
                field: "airspace_id"
            })
        );
    }
}
