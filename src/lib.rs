//! Facade crate for the AeroBase aviation reference engine.
//!
//! This crate re-exports the core domain types, the spatial index and the
//! flight planner, and exposes the SQLite-backed store behind a feature flag.

#![forbid(unsafe_code)]

pub use aerobase_core::{
    AeroBase, AeroBaseError, Airport, Airspace, AirspaceBoundary, AirspaceClass, AirspaceKind,
    Airway, AirwayKind, AirwaySegment, BatchSummary, Config, Coordinate, CoordinateError, Device,
    ErrorKind, FlightPlan, FlightPlanBuilder, FlightRoute, FuelEstimate, GeoIndex, HostFacts,
    HostIdentityProvider, IdentityProvider, IndexError, IndexSnapshot, MemoryStore, Navaid,
    NavaidKind, NoopSync, PlanBuildError, PlanLimits, Positioned, Proximity, RecordError,
    ReferenceBatch, ReferenceStore, RouteLeg, StaticIdentityProvider, StoreError,
    SyncCollaborator, SyncStatus, SyncStrategy, ValidatedPlan, Waypoint, WaypointKind, Wind,
    calculate_route, validate,
};

pub use aerobase_core::{distance, flight};

#[cfg(feature = "store-sqlite")]
pub use aerobase_core::{SCHEMA_VERSION, SqliteStore, StoreOptions};

#[cfg(feature = "test-support")]
pub use aerobase_core::test_support;
