use crate::index::Positioned;

use super::{Coordinate, RecordError, normalise_icao, require};

/// An aerodrome referenced by flight plans through its ICAO code.
///
/// # Examples
/// ```
/// use aerobase_core::{Airport, Coordinate};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let airport = Airport::new(
///     "AP001",
///     "zbaa",
///     "Beijing Capital International",
///     Coordinate::new(40.0801, 116.5846)?,
/// )?
/// .with_iata("PEK");
///
/// assert_eq!(airport.icao, "ZBAA");
/// assert!(airport.has_iata());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Airport {
    /// Store identifier.
    pub id: String,
    /// Four-letter ICAO code, upper-case.
    pub icao: String,
    /// Three-letter IATA code.
    pub iata: Option<String>,
    /// Display name.
    pub name: String,
    /// Aerodrome reference point.
    pub coordinate: Coordinate,
    /// Field elevation in feet.
    pub elevation_ft: Option<i32>,
    /// Country name or code.
    pub country: Option<String>,
    /// Administrative or navigation region.
    pub region: Option<String>,
}

impl Airport {
    /// Validates and constructs an [`Airport`] with no optional fields.
    pub fn new(
        id: impl Into<String>,
        icao: &str,
        name: impl Into<String>,
        coordinate: Coordinate,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            id: require("id", id.into())?,
            icao: normalise_icao(icao)?,
            iata: None,
            name: require("name", name.into())?,
            coordinate,
            elevation_ft: None,
            country: None,
            region: None,
        })
    }

    /// Attach an IATA code.
    #[must_use]
    pub fn with_iata(mut self, iata: impl Into<String>) -> Self {
        self.iata = Some(iata.into());
        self
    }

    /// Attach a field elevation.
    #[must_use]
    pub const fn with_elevation(mut self, elevation_ft: i32) -> Self {
        self.elevation_ft = Some(elevation_ft);
        self
    }

    /// Attach a country.
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Whether an IATA code is known.
    pub const fn has_iata(&self) -> bool {
        self.iata.is_some()
    }
}

impl Positioned for Airport {
    fn id(&self) -> &str {
        &self.id
    }

    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}
