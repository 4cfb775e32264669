//! Core of the AeroBase offline aviation reference store.
//!
//! The crate holds airports, waypoints, navaids, airways and airspaces, answers
//! great-circle radius and nearest-neighbour queries over them through
//! [`GeoIndex`], and validates and computes flight routes in [`flight`].
//! [`AeroBase`] ties these together over a [`ReferenceStore`] with
//! snapshot-swapping indexes that are safe to share across threads.
//!
//! Coordinates are WGS-84 degrees and every distance is in nautical miles on
//! a sphere of radius [`distance::EARTH_RADIUS_NM`].

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod device;
pub mod distance;
mod error;
pub mod flight;
pub mod index;
pub mod model;
pub mod service;
pub mod store;
pub mod sync;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use device::{
    Device, HostFacts, HostIdentityProvider, IdentityProvider, StaticIdentityProvider,
};
pub use error::{AeroBaseError, ErrorKind};
pub use flight::{
    FlightPlan, FlightPlanBuilder, FlightRoute, FuelEstimate, PlanBuildError, PlanLimits,
    RouteLeg, ValidatedPlan, Wind, calculate_route, ground_speed, validate,
    wind_adjusted_minutes, wind_correction_angle,
};
pub use index::{GeoIndex, IndexError, Positioned, Proximity};
pub use model::{
    Airport, Airspace, AirspaceBoundary, AirspaceClass, AirspaceKind, Airway, AirwayKind,
    AirwaySegment, Coordinate, CoordinateError, Navaid, NavaidKind, RecordError, Waypoint,
    WaypointKind,
};
pub use service::{AeroBase, Config, IndexSnapshot};
pub use store::{BatchSummary, MemoryStore, ReferenceBatch, ReferenceStore, StoreError};
#[cfg(feature = "store-sqlite")]
pub use store::{SCHEMA_VERSION, SqliteStore, StoreOptions};
pub use sync::{NoopSync, SyncCollaborator, SyncStatus, SyncStrategy};
