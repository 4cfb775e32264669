//! Top-level error type returned by the planner and the service facade.

use thiserror::Error;

use crate::{
    flight::PlanBuildError,
    index::IndexError,
    model::{CoordinateError, RecordError},
    store::StoreError,
};

/// Coarse failure category, stable across releases.
///
/// The foreign-call boundary reports these as negative integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// The request was structurally invalid.
    InvalidInput,
    /// A flight-planning rule was violated.
    FlightPlanning,
    /// Building or querying a spatial index failed.
    SpatialQuery,
    /// The backing store failed.
    Database,
    /// A filesystem operation failed.
    Io,
    /// The device identity could not be derived.
    DeviceIdentity,
    /// Anything else, including caught panics.
    Unknown,
}

impl ErrorKind {
    /// Boundary return code; always negative.
    pub const fn code(self) -> i32 {
        match self {
            Self::NotFound => -1,
            Self::InvalidInput => -2,
            Self::FlightPlanning => -3,
            Self::SpatialQuery => -4,
            Self::Database => -5,
            Self::Io => -6,
            Self::DeviceIdentity => -7,
            Self::Unknown => -99,
        }
    }
}

/// Errors surfaced by AeroBase operations.
#[derive(Debug, Error)]
pub enum AeroBaseError {
    /// A referenced entity does not resolve.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `airport`.
        entity: &'static str,
        /// Identifier or code that failed to resolve.
        id: String,
    },
    /// The request was structurally invalid.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human-readable explanation.
        reason: String,
    },
    /// A coordinate was out of range.
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    /// A record failed constructor validation.
    #[error(transparent)]
    Record(#[from] RecordError),
    /// A flight plan was missing required fields.
    #[error(transparent)]
    PlanBuild(#[from] PlanBuildError),
    /// The cruise altitude violates an airway restriction.
    #[error(
        "cruise altitude {altitude_ft} ft violates airway {airway} restrictions on segment {segment_id}"
    )]
    FlightPlanning {
        /// Offending airway segment.
        segment_id: String,
        /// Name of the airway the segment belongs to.
        airway: String,
        /// Requested cruise altitude.
        altitude_ft: i32,
    },
    /// A spatial index could not be built.
    #[error("spatial index failure: {source}")]
    SpatialQuery {
        /// Underlying index error.
        #[source]
        source: IndexError,
    },
    /// Shared index state was poisoned by a panicking writer.
    #[error("{what} lock poisoned")]
    Poisoned {
        /// Lock that was found poisoned.
        what: &'static str,
    },
    /// The backing store failed.
    #[error("store error: {0}")]
    Database(#[from] StoreError),
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The device identity could not be derived.
    #[error("device identity error: {reason}")]
    DeviceIdentity {
        /// Human-readable explanation.
        reason: String,
    },
    /// Anything else.
    #[error("unknown error: {reason}")]
    Unknown {
        /// Human-readable explanation.
        reason: String,
    },
}

impl AeroBaseError {
    /// Shorthand for [`AeroBaseError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for [`AeroBaseError::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput { .. }
            | Self::Coordinate(_)
            | Self::Record(_)
            | Self::PlanBuild(_) => ErrorKind::InvalidInput,
            Self::FlightPlanning { .. } => ErrorKind::FlightPlanning,
            Self::SpatialQuery { .. } | Self::Poisoned { .. } => ErrorKind::SpatialQuery,
            Self::Database(StoreError::Io { .. }) | Self::Io(_) => ErrorKind::Io,
            Self::Database(_) => ErrorKind::Database,
            Self::DeviceIdentity { .. } => ErrorKind::DeviceIdentity,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }
}

impl From<IndexError> for AeroBaseError {
    fn from(source: IndexError) -> Self {
        Self::SpatialQuery { source }
    }
}
