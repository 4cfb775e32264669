//! Reference-data records held by the store and the geo-index.
//!
//! Records are plain data with public fields, mirroring the rows of the
//! backing store. Constructors validate the required identifiers; positions
//! are always valid because [`Coordinate`] cannot hold out-of-range values.

use thiserror::Error;

mod airport;
mod airspace;
mod airway;
mod coordinate;
mod navaid;
mod waypoint;

pub use airport::Airport;
pub use airspace::{Airspace, AirspaceBoundary, AirspaceClass, AirspaceKind};
pub use airway::{Airway, AirwayKind, AirwaySegment};
pub use coordinate::{Coordinate, CoordinateError};
pub use navaid::{Navaid, NavaidKind};
pub use waypoint::{Waypoint, WaypointKind};

/// Errors returned by record constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A required textual field was empty or whitespace.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },
    /// An ICAO airport code was not four alphanumeric characters.
    #[error("ICAO code {code:?} must be four alphanumeric characters")]
    InvalidIcao {
        /// Rejected code.
        code: String,
    },
}

pub(crate) fn require(field: &'static str, value: String) -> Result<String, RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::EmptyField { field });
    }
    Ok(value)
}

/// Upper-case an ICAO code after checking its shape.
pub(crate) fn normalise_icao(code: &str) -> Result<String, RecordError> {
    let trimmed = code.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(RecordError::InvalidIcao {
            code: code.to_owned(),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}
