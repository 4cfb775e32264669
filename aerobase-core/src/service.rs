//! Thread-safe facade tying the store, the geo-indexes and the planner
//! together.
//!
//! Readers take a brief read lock to clone the current [`IndexSnapshot`] and
//! then query it without holding any lock. Writers serialise on a mutex,
//! write through to the store, rebuild only the index the write touched and
//! swap the new snapshot in under a brief write lock. A reader therefore sees
//! either the old snapshot or the new one, never a mixture.
//!
//! The store write commits before the index is rebuilt. Should the rebuild
//! fail, the write stays in the store, the published snapshot keeps the old
//! contents and [`AeroBase::rebuild_indexes`] brings them back in line.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, RwLock},
    time::Duration,
};

#[cfg(feature = "store-sqlite")]
use crate::store::{SqliteStore, StoreOptions};
use crate::{
    device::{Device, HostIdentityProvider, IdentityProvider, resolve_device, unix_now},
    distance::point_in_polygon,
    error::AeroBaseError,
    flight::{self, FlightPlan, FlightRoute, FuelEstimate, PlanLimits, ValidatedPlan},
    index::{GeoIndex, Proximity},
    model::{
        Airport, Airspace, AirspaceBoundary, Airway, AirwaySegment, Coordinate, Navaid, Waypoint,
    },
    store::{BatchSummary, ReferenceBatch, ReferenceStore, StoreError},
    sync::{NoopSync, SyncCollaborator, SyncStatus, SyncStrategy},
};

/// Settings for [`AeroBase::open`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite database file; parent directories are created on open.
    pub db_path: PathBuf,
    /// Put the database in write-ahead-log mode.
    pub enable_wal: bool,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// How long a caller waits for a pooled connection.
    pub connection_timeout: Duration,
    /// Bounds applied during plan validation.
    pub limits: PlanLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("aerobase.db"),
            enable_wal: true,
            pool_size: 4,
            connection_timeout: Duration::from_secs(30),
            limits: PlanLimits::default(),
        }
    }
}

#[cfg(feature = "store-sqlite")]
impl Config {
    /// Pool settings derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            enable_wal: self.enable_wal,
            pool_size: self.pool_size,
            connection_timeout: self.connection_timeout,
        }
    }
}

/// One consistent set of geo-indexes.
///
/// Each kind is shared behind its own `Arc`, so rebuilding one kind reuses
/// the other two untouched.
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    airports: Arc<GeoIndex<Airport>>,
    waypoints: Arc<GeoIndex<Waypoint>>,
    navaids: Arc<GeoIndex<Navaid>>,
}

impl IndexSnapshot {
    fn load(store: &impl ReferenceStore) -> Result<Self, AeroBaseError> {
        Ok(Self {
            airports: Arc::new(GeoIndex::build(store.airports()?)?),
            waypoints: Arc::new(GeoIndex::build(store.waypoints()?)?),
            navaids: Arc::new(GeoIndex::build(store.navaids()?)?),
        })
    }

    /// A copy with the index for `table` rebuilt, or `None` when `table`
    /// is not indexed.
    fn rebuilt(
        &self,
        store: &impl ReferenceStore,
        table: Table,
    ) -> Result<Option<Self>, AeroBaseError> {
        let mut next = self.clone();
        match table {
            Table::Airports => next.airports = Arc::new(GeoIndex::build(store.airports()?)?),
            Table::Waypoints => next.waypoints = Arc::new(GeoIndex::build(store.waypoints()?)?),
            Table::Navaids => next.navaids = Arc::new(GeoIndex::build(store.navaids()?)?),
            Table::Airways
            | Table::AirwaySegments
            | Table::Airspaces
            | Table::AirspaceBoundaries => return Ok(None),
        }
        Ok(Some(next))
    }

    /// Airport index.
    pub fn airports(&self) -> &GeoIndex<Airport> {
        &self.airports
    }

    /// Waypoint index.
    pub fn waypoints(&self) -> &GeoIndex<Waypoint> {
        &self.waypoints
    }

    /// Navaid index.
    pub fn navaids(&self) -> &GeoIndex<Navaid> {
        &self.navaids
    }
}

/// Store table touched by a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Airports,
    Waypoints,
    Navaids,
    Airways,
    AirwaySegments,
    Airspaces,
    AirspaceBoundaries,
}

impl Table {
    const fn name(self) -> &'static str {
        match self {
            Self::Airports => "airports",
            Self::Waypoints => "waypoints",
            Self::Navaids => "navaids",
            Self::Airways => "airways",
            Self::AirwaySegments => "airway_segments",
            Self::Airspaces => "airspaces",
            Self::AirspaceBoundaries => "airspace_boundaries",
        }
    }

    /// Tables `summary` wrote at least one record to.
    fn touched(summary: &BatchSummary) -> impl Iterator<Item = Self> {
        [
            (Self::Airports, summary.airports),
            (Self::Waypoints, summary.waypoints),
            (Self::Navaids, summary.navaids),
            (Self::Airways, summary.airways),
            (Self::AirwaySegments, summary.airway_segments),
            (Self::Airspaces, summary.airspaces),
            (Self::AirspaceBoundaries, summary.airspace_boundaries),
        ]
        .into_iter()
        .filter_map(|(table, count)| (count > 0).then_some(table))
    }
}

/// The AeroBase engine.
///
/// `AeroBase` is `Send + Sync`; share it across threads behind an `Arc`.
pub struct AeroBase<S> {
    store: S,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    writer: Mutex<()>,
    identity: Box<dyn IdentityProvider>,
    sync: Box<dyn SyncCollaborator>,
    limits: PlanLimits,
}

impl<S> std::fmt::Debug for AeroBase<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AeroBase")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "store-sqlite")]
impl AeroBase<SqliteStore> {
    /// Open the SQLite database named by `config` and index its contents.
    ///
    /// # Errors
    /// Fails when the database cannot be opened or migrated, or when the
    /// stored data cannot be indexed.
    pub fn open(config: &Config) -> Result<Self, AeroBaseError> {
        let store = SqliteStore::open(&config.db_path, &config.store_options())?;
        Self::new(store, config.limits)
    }
}

impl<S: ReferenceStore> AeroBase<S> {
    /// Wrap `store`, building every index from its current contents.
    ///
    /// The device fingerprint comes from [`HostIdentityProvider`] and sync
    /// notifications go to [`NoopSync`] until replaced.
    ///
    /// # Errors
    /// Propagates store failures and duplicate identifiers.
    pub fn new(store: S, limits: PlanLimits) -> Result<Self, AeroBaseError> {
        let snapshot = IndexSnapshot::load(&store)?;
        log::info!(
            "indexed {} airports, {} waypoints, {} navaids",
            snapshot.airports.len(),
            snapshot.waypoints.len(),
            snapshot.navaids.len()
        );
        Ok(Self {
            store,
            snapshot: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
            identity: Box::new(HostIdentityProvider::default()),
            sync: Box::new(NoopSync),
            limits,
        })
    }

    /// Replace the device identity provider.
    #[must_use]
    pub fn with_identity_provider(mut self, provider: impl IdentityProvider + 'static) -> Self {
        self.identity = Box::new(provider);
        self
    }

    /// Replace the sync collaborator.
    #[must_use]
    pub fn with_sync(mut self, sync: impl SyncCollaborator + 'static) -> Self {
        self.sync = Box::new(sync);
        self
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// How the sync collaborator reconciles data.
    pub fn sync_strategy(&self) -> SyncStrategy {
        self.sync.strategy()
    }

    /// Current state of the sync collaborator.
    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    /// Limits applied during validation.
    pub const fn limits(&self) -> &PlanLimits {
        &self.limits
    }

    /// The current index snapshot.
    ///
    /// # Errors
    /// Returns [`AeroBaseError::Poisoned`] if a writer panicked mid-swap.
    pub fn snapshot(&self) -> Result<Arc<IndexSnapshot>, AeroBaseError> {
        self.snapshot
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| AeroBaseError::Poisoned {
                what: "index snapshot",
            })
    }

    /// Airports within `radius_nm` of `center`, nearest first.
    ///
    /// # Errors
    /// [`AeroBaseError::InvalidInput`] for a non-finite radius.
    pub fn find_airports_within(
        &self,
        center: Coordinate,
        radius_nm: f64,
    ) -> Result<Vec<Proximity<Airport>>, AeroBaseError> {
        check_radius(radius_nm)?;
        Ok(within(self.snapshot()?.airports(), center, radius_nm))
    }

    /// Waypoints within `radius_nm` of `center`, nearest first.
    ///
    /// # Errors
    /// [`AeroBaseError::InvalidInput`] for a non-finite radius.
    pub fn find_waypoints_within(
        &self,
        center: Coordinate,
        radius_nm: f64,
    ) -> Result<Vec<Proximity<Waypoint>>, AeroBaseError> {
        check_radius(radius_nm)?;
        Ok(within(self.snapshot()?.waypoints(), center, radius_nm))
    }

    /// Navaids within `radius_nm` of `center`, nearest first.
    ///
    /// # Errors
    /// [`AeroBaseError::InvalidInput`] for a non-finite radius.
    pub fn find_navaids_within(
        &self,
        center: Coordinate,
        radius_nm: f64,
    ) -> Result<Vec<Proximity<Navaid>>, AeroBaseError> {
        check_radius(radius_nm)?;
        Ok(within(self.snapshot()?.navaids(), center, radius_nm))
    }

    /// Closest airport to `center`; `None` only when there are no airports.
    pub fn find_nearest_airport(
        &self,
        center: Coordinate,
    ) -> Result<Option<Proximity<Airport>>, AeroBaseError> {
        Ok(self
            .snapshot()?
            .airports()
            .find_nearest(center)
            .map(Proximity::cloned))
    }

    /// Closest waypoint to `center`; `None` only when there are no waypoints.
    pub fn find_nearest_waypoint(
        &self,
        center: Coordinate,
    ) -> Result<Option<Proximity<Waypoint>>, AeroBaseError> {
        Ok(self
            .snapshot()?
            .waypoints()
            .find_nearest(center)
            .map(Proximity::cloned))
    }

    /// Closest navaid to `center`; `None` only when there are no navaids.
    pub fn find_nearest_navaid(
        &self,
        center: Coordinate,
    ) -> Result<Option<Proximity<Navaid>>, AeroBaseError> {
        Ok(self
            .snapshot()?
            .navaids()
            .find_nearest(center)
            .map(Proximity::cloned))
    }

    /// Airspaces whose lateral boundary contains `point` and, when
    /// `altitude_ft` is given, whose vertical limits include it.
    ///
    /// Airspaces with fewer than three boundary vertices never match.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn airspaces_containing(
        &self,
        point: Coordinate,
        altitude_ft: Option<i32>,
    ) -> Result<Vec<Airspace>, AeroBaseError> {
        let mut hits = Vec::new();
        for airspace in self.store.airspaces()? {
            if altitude_ft.is_some_and(|altitude| !airspace.contains_altitude(altitude)) {
                continue;
            }
            let ring: Vec<Coordinate> = self
                .store
                .airspace_boundary(&airspace.id)?
                .into_iter()
                .map(|vertex| vertex.coordinate)
                .collect();
            if point_in_polygon(point, &ring) {
                hits.push(airspace);
            }
        }
        Ok(hits)
    }

    /// Validate `plan` against the store and the configured limits.
    ///
    /// # Errors
    /// See [`flight::validate`].
    pub fn validate_flight_plan(&self, plan: &FlightPlan) -> Result<ValidatedPlan, AeroBaseError> {
        flight::validate(plan, &self.store, &self.limits)
    }

    /// Validate `plan` and compute its route.
    ///
    /// # Errors
    /// See [`flight::validate`].
    pub fn calculate_route(&self, plan: &FlightPlan) -> Result<FlightRoute, AeroBaseError> {
        let validated = self.validate_flight_plan(plan)?;
        Ok(flight::calculate_route(&validated))
    }

    /// Fuel required for `route` at `fuel_flow_per_hour`.
    ///
    /// # Errors
    /// [`AeroBaseError::InvalidInput`] for a non-positive flow.
    pub fn estimate_fuel(
        &self,
        route: &FlightRoute,
        fuel_flow_per_hour: f64,
    ) -> Result<FuelEstimate, AeroBaseError> {
        FuelEstimate::for_route(route, fuel_flow_per_hour)
    }

    /// The device registered for this installation, created on first call.
    ///
    /// Repeated calls return the same device id and refresh `last_seen`.
    ///
    /// # Errors
    /// Fails when the fingerprint cannot be derived or the store rejects the
    /// write.
    pub fn get_or_create_device_identity(&self) -> Result<Device, AeroBaseError> {
        let _guard = self.lock_writer()?;
        resolve_device(&self.store, self.identity.as_ref(), unix_now())
    }

    /// Insert or replace an airport and refresh the airport index.
    ///
    /// # Errors
    /// Propagates store failures; the index is left unchanged on error.
    pub fn upsert_airport(&self, airport: &Airport) -> Result<(), AeroBaseError> {
        self.mutate(Table::Airports, |store| store.upsert_airport(airport))
    }

    /// Insert or replace a waypoint and refresh the waypoint index.
    ///
    /// # Errors
    /// Propagates store failures; the index is left unchanged on error.
    pub fn upsert_waypoint(&self, waypoint: &Waypoint) -> Result<(), AeroBaseError> {
        self.mutate(Table::Waypoints, |store| {
            store.upsert_waypoint(waypoint)
        })
    }

    /// Insert or replace a navaid and refresh the navaid index.
    ///
    /// # Errors
    /// Propagates store failures; the index is left unchanged on error.
    pub fn upsert_navaid(&self, navaid: &Navaid) -> Result<(), AeroBaseError> {
        self.mutate(Table::Navaids, |store| store.upsert_navaid(navaid))
    }

    /// Insert or replace an airway.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn upsert_airway(&self, airway: &Airway) -> Result<(), AeroBaseError> {
        self.mutate(Table::Airways, |store| store.upsert_airway(airway))
    }

    /// Insert or replace an airway segment.
    ///
    /// # Errors
    /// Propagates store failures, including unknown airway or waypoints.
    pub fn upsert_airway_segment(&self, segment: &AirwaySegment) -> Result<(), AeroBaseError> {
        self.mutate(Table::AirwaySegments, |store| {
            store.upsert_airway_segment(segment)
        })
    }

    /// Delete an airport; returns whether it existed.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn delete_airport(&self, id: &str) -> Result<bool, AeroBaseError> {
        self.mutate(Table::Airports, |store| store.delete_airport(id))
    }

    /// Delete a waypoint and its segments; returns whether it existed.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn delete_waypoint(&self, id: &str) -> Result<bool, AeroBaseError> {
        self.mutate(Table::Waypoints, |store| store.delete_waypoint(id))
    }

    /// Delete a navaid; returns whether it existed.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn delete_navaid(&self, id: &str) -> Result<bool, AeroBaseError> {
        self.mutate(Table::Navaids, |store| store.delete_navaid(id))
    }

    /// Insert or replace an airspace.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn upsert_airspace(&self, airspace: &Airspace) -> Result<(), AeroBaseError> {
        self.mutate(Table::Airspaces, |store| store.upsert_airspace(airspace))
    }

    /// Insert or replace one boundary vertex of an existing airspace.
    ///
    /// # Errors
    /// Propagates store failures, including an unknown airspace.
    pub fn upsert_airspace_boundary(&self, vertex: &AirspaceBoundary) -> Result<(), AeroBaseError> {
        self.mutate(Table::AirspaceBoundaries, |store| {
            store.upsert_airspace_boundary(vertex)
        })
    }

    /// Delete an airspace and its boundary; returns whether it existed.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn delete_airspace(&self, id: &str) -> Result<bool, AeroBaseError> {
        self.mutate(Table::Airspaces, |store| store.delete_airspace(id))
    }

    /// Write every record in `batch` atomically, then rebuild all indexes.
    ///
    /// Readers see either none of the batch or all of it. When the store
    /// rejects any record, nothing is written and the snapshot is untouched.
    ///
    /// # Errors
    /// Propagates store failures and duplicate identifiers.
    pub fn apply_batch(&self, batch: &ReferenceBatch) -> Result<BatchSummary, AeroBaseError> {
        let _guard = self.lock_writer()?;
        self.store.apply_batch(batch)?;
        let snapshot = IndexSnapshot::load(&self.store)?;
        self.swap(snapshot)?;
        let summary = batch.summary();
        log::info!("applied reference batch: {summary:?}");
        for table in Table::touched(&summary) {
            self.sync.reference_data_changed(table.name());
        }
        Ok(summary)
    }

    /// Rebuild every index from the store and swap them in together.
    ///
    /// # Errors
    /// Propagates store failures and duplicate identifiers.
    pub fn rebuild_indexes(&self) -> Result<(), AeroBaseError> {
        let _guard = self.lock_writer()?;
        let snapshot = IndexSnapshot::load(&self.store)?;
        self.swap(snapshot)?;
        log::info!("rebuilt all geo-indexes");
        Ok(())
    }

    fn mutate<R>(
        &self,
        table: Table,
        write: impl FnOnce(&S) -> Result<R, StoreError>,
    ) -> Result<R, AeroBaseError> {
        let _guard = self.lock_writer()?;
        let outcome = write(&self.store)?;
        if let Some(next) = self.snapshot()?.rebuilt(&self.store, table)? {
            self.swap(next)?;
            log::debug!("rebuilt {} index", table.name());
        }
        self.sync.reference_data_changed(table.name());
        Ok(outcome)
    }

    fn swap(&self, next: IndexSnapshot) -> Result<(), AeroBaseError> {
        let mut current = self.snapshot.write().map_err(|_| AeroBaseError::Poisoned {
            what: "index snapshot",
        })?;
        *current = Arc::new(next);
        Ok(())
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, ()>, AeroBaseError> {
        self.writer
            .lock()
            .map_err(|_| AeroBaseError::Poisoned { what: "writer" })
    }
}

fn check_radius(radius_nm: f64) -> Result<(), AeroBaseError> {
    if radius_nm.is_finite() {
        Ok(())
    } else {
        Err(AeroBaseError::invalid_input(format!(
            "radius {radius_nm} is not finite"
        )))
    }
}

fn within<T: crate::index::Positioned + Clone>(
    index: &GeoIndex<T>,
    center: Coordinate,
    radius_nm: f64,
) -> Vec<Proximity<T>> {
    index
        .find_within(center, radius_nm)
        .into_iter()
        .map(Proximity::cloned)
        .collect()
}
