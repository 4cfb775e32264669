//! Persistence seam for reference data and device records.
//!
//! The [`ReferenceStore`] trait is the only way the planner and the service
//! facade reach persisted data. Two implementations ship with the crate:
//! [`MemoryStore`], a map-backed store for tests and ephemeral use, and
//! `SqliteStore` (feature `store-sqlite`), which persists to a single SQLite
//! file through a fixed-size connection pool.

use std::path::PathBuf;

use thiserror::Error;

use crate::{
    device::Device,
    model::{Airport, Airspace, AirspaceBoundary, Airway, AirwaySegment, Navaid, Waypoint},
};

mod memory;
#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "store-sqlite")]
pub use schema::SCHEMA_VERSION;
#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteStore, StoreOptions};

/// Errors raised by [`ReferenceStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open SQLite database at {path}: {source}")]
    Open {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `r2d2`.
        #[source]
        source: r2d2::Error,
    },
    /// No pooled connection became available in time.
    #[cfg(feature = "store-sqlite")]
    #[error("connection pool exhausted: {source}")]
    Pool {
        /// Source error returned by `r2d2`.
        #[source]
        source: r2d2::Error,
    },
    /// Applying a schema migration failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to migrate schema to version {version}: {source}")]
    Migration {
        /// Target schema version.
        version: u32,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Generic SQLite failure.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// A write violated a uniqueness or reference constraint.
    #[error("constraint violated on {table}: {reason}")]
    Constraint {
        /// Table the write targeted.
        table: &'static str,
        /// Explanation from the store.
        reason: String,
    },
    /// A persisted row could not be turned back into a record.
    #[error("corrupt {table} row {id}: {reason}")]
    Decode {
        /// Table holding the row.
        table: &'static str,
        /// Row identifier.
        id: String,
        /// Explanation of the failure.
        reason: String,
    },
    /// Preparing the database location failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The store can no longer serve requests.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Explanation of the failure.
        reason: String,
    },
}

/// Records written together by [`ReferenceStore::apply_batch`].
///
/// Every list may be empty. Records are applied in field order, so airways
/// follow the waypoints they join, segments follow their airways and
/// boundary vertices follow their airspaces.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReferenceBatch {
    /// Airports to insert or replace.
    pub airports: Vec<Airport>,
    /// Waypoints to insert or replace.
    pub waypoints: Vec<Waypoint>,
    /// Navaids to insert or replace.
    pub navaids: Vec<Navaid>,
    /// Airways to insert or replace.
    pub airways: Vec<Airway>,
    /// Airway segments to insert or replace.
    pub airway_segments: Vec<AirwaySegment>,
    /// Airspaces to insert or replace.
    pub airspaces: Vec<Airspace>,
    /// Airspace boundary vertices to insert or replace.
    pub airspace_boundaries: Vec<AirspaceBoundary>,
}

/// Number of records per table in a [`ReferenceBatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchSummary {
    /// Airports written.
    pub airports: usize,
    /// Waypoints written.
    pub waypoints: usize,
    /// Navaids written.
    pub navaids: usize,
    /// Airways written.
    pub airways: usize,
    /// Airway segments written.
    pub airway_segments: usize,
    /// Airspaces written.
    pub airspaces: usize,
    /// Airspace boundary vertices written.
    pub airspace_boundaries: usize,
}

impl ReferenceBatch {
    /// Record counts per table.
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            airports: self.airports.len(),
            waypoints: self.waypoints.len(),
            navaids: self.navaids.len(),
            airways: self.airways.len(),
            airway_segments: self.airway_segments.len(),
            airspaces: self.airspaces.len(),
            airspace_boundaries: self.airspace_boundaries.len(),
        }
    }

    /// Write every record through `store` one at a time, stopping at the
    /// first failure without undoing earlier writes.
    pub(crate) fn write_each(&self, store: &impl ReferenceStore) -> Result<(), StoreError> {
        for airport in &self.airports {
            store.upsert_airport(airport)?;
        }
        for waypoint in &self.waypoints {
            store.upsert_waypoint(waypoint)?;
        }
        for navaid in &self.navaids {
            store.upsert_navaid(navaid)?;
        }
        for airway in &self.airways {
            store.upsert_airway(airway)?;
        }
        for segment in &self.airway_segments {
            store.upsert_airway_segment(segment)?;
        }
        for airspace in &self.airspaces {
            store.upsert_airspace(airspace)?;
        }
        for vertex in &self.airspace_boundaries {
            store.upsert_airspace_boundary(vertex)?;
        }
        Ok(())
    }
}

/// CRUD access to reference data and device records.
///
/// Implementations must be shareable across threads; the service facade
/// calls them from any reader or writer thread. Identifiers are compared
/// exactly, except ICAO codes, which are matched case-insensitively.
///
/// # Examples
///
/// ```rust
/// use aerobase_core::{Airport, Coordinate, MemoryStore, ReferenceStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::default();
/// let zbaa = Airport::new("AP001", "ZBAA", "Beijing Capital", Coordinate::new(40.08, 116.58)?)?;
/// store.upsert_airport(&zbaa)?;
///
/// assert_eq!(store.airport_by_icao("zbaa")?, Some(zbaa));
/// assert!(store.delete_airport("AP001")?);
/// assert!(store.airports()?.is_empty());
/// # Ok(())
/// # }
/// ```
pub trait ReferenceStore: Send + Sync {
    /// Every airport, in identifier order.
    fn airports(&self) -> Result<Vec<Airport>, StoreError>;

    /// Every waypoint, in identifier order.
    fn waypoints(&self) -> Result<Vec<Waypoint>, StoreError>;

    /// Every navaid, in identifier order.
    fn navaids(&self) -> Result<Vec<Navaid>, StoreError>;

    /// Airport with the given store identifier.
    fn airport(&self, id: &str) -> Result<Option<Airport>, StoreError>;

    /// Airport with the given ICAO code, matched case-insensitively.
    fn airport_by_icao(&self, icao: &str) -> Result<Option<Airport>, StoreError>;

    /// Waypoint with the given identifier.
    fn waypoint(&self, id: &str) -> Result<Option<Waypoint>, StoreError>;

    /// Navaid with the given identifier.
    fn navaid(&self, id: &str) -> Result<Option<Navaid>, StoreError>;

    /// Airway with the given identifier.
    fn airway(&self, id: &str) -> Result<Option<Airway>, StoreError>;

    /// Segments running from `from_waypoint_id` to `to_waypoint_id`, ordered
    /// by airway then sequence.
    fn segments_between(
        &self,
        from_waypoint_id: &str,
        to_waypoint_id: &str,
    ) -> Result<Vec<AirwaySegment>, StoreError>;

    /// Insert or replace an airport.
    ///
    /// Fails with [`StoreError::Constraint`] when another airport already
    /// holds the same ICAO code.
    fn upsert_airport(&self, airport: &Airport) -> Result<(), StoreError>;

    /// Insert or replace a waypoint.
    fn upsert_waypoint(&self, waypoint: &Waypoint) -> Result<(), StoreError>;

    /// Insert or replace a navaid.
    fn upsert_navaid(&self, navaid: &Navaid) -> Result<(), StoreError>;

    /// Insert or replace an airway.
    fn upsert_airway(&self, airway: &Airway) -> Result<(), StoreError>;

    /// Insert or replace an airway segment.
    ///
    /// The airway and both waypoints must already exist.
    fn upsert_airway_segment(&self, segment: &AirwaySegment) -> Result<(), StoreError>;

    /// Remove an airport; returns whether it existed.
    fn delete_airport(&self, id: &str) -> Result<bool, StoreError>;

    /// Remove a waypoint and every segment touching it; returns whether it
    /// existed.
    fn delete_waypoint(&self, id: &str) -> Result<bool, StoreError>;

    /// Remove a navaid; returns whether it existed.
    fn delete_navaid(&self, id: &str) -> Result<bool, StoreError>;

    /// Every airspace, in identifier order.
    fn airspaces(&self) -> Result<Vec<Airspace>, StoreError>;

    /// Airspace with the given identifier.
    fn airspace(&self, id: &str) -> Result<Option<Airspace>, StoreError>;

    /// Boundary vertices of `airspace_id` in sequence order.
    fn airspace_boundary(&self, airspace_id: &str) -> Result<Vec<AirspaceBoundary>, StoreError>;

    /// Insert or replace an airspace.
    fn upsert_airspace(&self, airspace: &Airspace) -> Result<(), StoreError>;

    /// Insert or replace a boundary vertex. The airspace must already exist.
    fn upsert_airspace_boundary(&self, vertex: &AirspaceBoundary) -> Result<(), StoreError>;

    /// Remove an airspace and its boundary; returns whether it existed.
    fn delete_airspace(&self, id: &str) -> Result<bool, StoreError>;

    /// Write every record in `batch`, or none of them.
    ///
    /// On error the store is left exactly as it was before the call.
    fn apply_batch(&self, batch: &ReferenceBatch) -> Result<(), StoreError>;

    /// Device registered under `fingerprint`.
    fn device_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Device>, StoreError>;

    /// Register a new device.
    fn insert_device(&self, device: &Device) -> Result<(), StoreError>;

    /// Record that the device was seen at `last_seen` (unix seconds).
    fn touch_device(&self, id: &str, last_seen: i64) -> Result<(), StoreError>;
}
