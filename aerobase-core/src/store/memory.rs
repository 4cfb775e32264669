//! Map-backed [`ReferenceStore`] for tests and ephemeral use.

use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use super::{ReferenceBatch, ReferenceStore, StoreError};
use crate::{
    device::Device,
    model::{Airport, Airspace, AirspaceBoundary, Airway, AirwaySegment, Navaid, Waypoint},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    airports: BTreeMap<String, Airport>,
    waypoints: BTreeMap<String, Waypoint>,
    navaids: BTreeMap<String, Navaid>,
    airways: BTreeMap<String, Airway>,
    segments: BTreeMap<String, AirwaySegment>,
    airspaces: BTreeMap<String, Airspace>,
    boundaries: BTreeMap<String, AirspaceBoundary>,
    devices: BTreeMap<String, Device>,
}

/// In-memory store holding every table in ordered maps.
///
/// Lookups are linear where the SQLite store would use an index; it is meant
/// for small datasets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create a store pre-populated with reference data.
    ///
    /// # Errors
    /// Fails on the first record that would violate a store constraint.
    pub fn with_records(
        airports: impl IntoIterator<Item = Airport>,
        waypoints: impl IntoIterator<Item = Waypoint>,
        navaids: impl IntoIterator<Item = Navaid>,
    ) -> Result<Self, StoreError> {
        let store = Self::default();
        for airport in airports {
            store.upsert_airport(&airport)?;
        }
        for waypoint in waypoints {
            store.upsert_waypoint(&waypoint)?;
        }
        for navaid in navaids {
            store.upsert_navaid(&navaid)?;
        }
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable {
        reason: "memory store lock poisoned".into(),
    }
}

impl ReferenceStore for MemoryStore {
    fn airports(&self) -> Result<Vec<Airport>, StoreError> {
        Ok(self.read()?.airports.values().cloned().collect())
    }

    fn waypoints(&self) -> Result<Vec<Waypoint>, StoreError> {
        Ok(self.read()?.waypoints.values().cloned().collect())
    }

    fn navaids(&self) -> Result<Vec<Navaid>, StoreError> {
        Ok(self.read()?.navaids.values().cloned().collect())
    }

    fn airport(&self, id: &str) -> Result<Option<Airport>, StoreError> {
        Ok(self.read()?.airports.get(id).cloned())
    }

    fn airport_by_icao(&self, icao: &str) -> Result<Option<Airport>, StoreError> {
        let icao = icao.trim();
        Ok(self
            .read()?
            .airports
            .values()
            .find(|airport| airport.icao.eq_ignore_ascii_case(icao))
            .cloned())
    }

    fn waypoint(&self, id: &str) -> Result<Option<Waypoint>, StoreError> {
        Ok(self.read()?.waypoints.get(id).cloned())
    }

    fn navaid(&self, id: &str) -> Result<Option<Navaid>, StoreError> {
        Ok(self.read()?.navaids.get(id).cloned())
    }

    fn airway(&self, id: &str) -> Result<Option<Airway>, StoreError> {
        Ok(self.read()?.airways.get(id).cloned())
    }

    fn segments_between(
        &self,
        from_waypoint_id: &str,
        to_waypoint_id: &str,
    ) -> Result<Vec<AirwaySegment>, StoreError> {
        let mut segments: Vec<AirwaySegment> = self
            .read()?
            .segments
            .values()
            .filter(|segment| segment.connects(from_waypoint_id, to_waypoint_id))
            .cloned()
            .collect();
        segments.sort_by(|a, b| {
            a.airway_id
                .cmp(&b.airway_id)
                .then(a.sequence.cmp(&b.sequence))
        });
        Ok(segments)
    }

    fn upsert_airport(&self, airport: &Airport) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if let Some(other) = tables
            .airports
            .values()
            .find(|other| other.id != airport.id && other.icao.eq_ignore_ascii_case(&airport.icao))
        {
            return Err(StoreError::Constraint {
                table: "airports",
                reason: format!("ICAO {} already belongs to {}", airport.icao, other.id),
            });
        }
        tables.airports.insert(airport.id.clone(), airport.clone());
        Ok(())
    }

    fn upsert_waypoint(&self, waypoint: &Waypoint) -> Result<(), StoreError> {
        self.write()?
            .waypoints
            .insert(waypoint.id.clone(), waypoint.clone());
        Ok(())
    }

    fn upsert_navaid(&self, navaid: &Navaid) -> Result<(), StoreError> {
        self.write()?.navaids.insert(navaid.id.clone(), navaid.clone());
        Ok(())
    }

    fn upsert_airway(&self, airway: &Airway) -> Result<(), StoreError> {
        self.write()?.airways.insert(airway.id.clone(), airway.clone());
        Ok(())
    }

    fn upsert_airway_segment(&self, segment: &AirwaySegment) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let missing = if !tables.airways.contains_key(&segment.airway_id) {
            Some(("airway", &segment.airway_id))
        } else if !tables.waypoints.contains_key(&segment.from_waypoint_id) {
            Some(("waypoint", &segment.from_waypoint_id))
        } else if !tables.waypoints.contains_key(&segment.to_waypoint_id) {
            Some(("waypoint", &segment.to_waypoint_id))
        } else {
            None
        };
        if let Some((kind, id)) = missing {
            return Err(StoreError::Constraint {
                table: "airway_segments",
                reason: format!("unknown {kind} {id}"),
            });
        }
        tables.segments.insert(segment.id.clone(), segment.clone());
        Ok(())
    }

    fn delete_airport(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.write()?.airports.remove(id).is_some())
    }

    fn delete_waypoint(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let existed = tables.waypoints.remove(id).is_some();
        tables
            .segments
            .retain(|_, segment| segment.from_waypoint_id != id && segment.to_waypoint_id != id);
        Ok(existed)
    }

    fn delete_navaid(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.write()?.navaids.remove(id).is_some())
    }

    fn airspaces(&self) -> Result<Vec<Airspace>, StoreError> {
        Ok(self.read()?.airspaces.values().cloned().collect())
    }

    fn airspace(&self, id: &str) -> Result<Option<Airspace>, StoreError> {
        Ok(self.read()?.airspaces.get(id).cloned())
    }

    fn airspace_boundary(&self, airspace_id: &str) -> Result<Vec<AirspaceBoundary>, StoreError> {
        let mut vertices: Vec<AirspaceBoundary> = self
            .read()?
            .boundaries
            .values()
            .filter(|vertex| vertex.airspace_id == airspace_id)
            .cloned()
            .collect();
        vertices.sort_by_key(|vertex| vertex.sequence);
        Ok(vertices)
    }

    fn upsert_airspace(&self, airspace: &Airspace) -> Result<(), StoreError> {
        self.write()?
            .airspaces
            .insert(airspace.id.clone(), airspace.clone());
        Ok(())
    }

    fn upsert_airspace_boundary(&self, vertex: &AirspaceBoundary) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.airspaces.contains_key(&vertex.airspace_id) {
            return Err(StoreError::Constraint {
                table: "airspace_boundaries",
                reason: format!("unknown airspace {}", vertex.airspace_id),
            });
        }
        tables.boundaries.insert(vertex.id.clone(), vertex.clone());
        Ok(())
    }

    fn delete_airspace(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let existed = tables.airspaces.remove(id).is_some();
        tables.boundaries.retain(|_, vertex| vertex.airspace_id != id);
        Ok(existed)
    }

    fn apply_batch(&self, batch: &ReferenceBatch) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let staged = Self {
            tables: RwLock::new(tables.clone()),
        };
        batch.write_each(&staged)?;
        *tables = staged.tables.into_inner().map_err(|_| poisoned())?;
        Ok(())
    }

    fn device_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Device>, StoreError> {
        Ok(self
            .read()?
            .devices
            .values()
            .find(|device| device.fingerprint == fingerprint)
            .cloned())
    }

    fn insert_device(&self, device: &Device) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables
            .devices
            .values()
            .any(|other| other.fingerprint == device.fingerprint)
        {
            return Err(StoreError::Constraint {
                table: "devices",
                reason: "fingerprint already registered".into(),
            });
        }
        tables.devices.insert(device.id.clone(), device.clone());
        Ok(())
    }

    fn touch_device(&self, id: &str, last_seen: i64) -> Result<(), StoreError> {
        if let Some(device) = self.write()?.devices.get_mut(id) {
            device.last_seen = last_seen;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AirspaceKind, AirwayKind, Coordinate, WaypointKind};
    use rstest::{fixture, rstest};

    fn coordinate(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    #[fixture]
    fn store() -> MemoryStore {
        let store = MemoryStore::with_records(
            [Airport::new("AP001", "ZBAA", "Beijing", coordinate(40.08, 116.58))
                .expect("airport")],
            [
                Waypoint::new("WP001", "ALPHA", coordinate(39.0, 117.0), WaypointKind::Fix)
                    .expect("waypoint"),
                Waypoint::new("WP002", "BRAVO", coordinate(38.0, 118.0), WaypointKind::Fix)
                    .expect("waypoint"),
            ],
            Vec::<Navaid>::new(),
        )
        .expect("seed store");
        store
            .upsert_airway(&Airway::new("AW001", "A1", AirwayKind::High).expect("airway"))
            .expect("airway");
        store
    }

    #[rstest]
    fn icao_lookup_ignores_case(store: MemoryStore) {
        let found = store.airport_by_icao("zbaa").expect("query");
        assert_eq!(found.map(|a| a.id), Some("AP001".to_owned()));
    }

    #[rstest]
    fn duplicate_icao_is_a_constraint_violation(store: MemoryStore) {
        let clash = Airport::new("AP002", "ZBAA", "Clash", coordinate(0.0, 0.0)).expect("airport");
        let err = store.upsert_airport(&clash).expect_err("duplicate ICAO");
        assert!(matches!(err, StoreError::Constraint { table: "airports", .. }));
    }

    #[rstest]
    fn segment_requires_known_references(store: MemoryStore) {
        let dangling = AirwaySegment::new("S1", "AW001", "WP001", "WP404", 1).expect("segment");
        assert!(store.upsert_airway_segment(&dangling).is_err());

        let segment = AirwaySegment::new("S1", "AW001", "WP001", "WP002", 1).expect("segment");
        store.upsert_airway_segment(&segment).expect("insert");
        assert_eq!(
            store.segments_between("WP001", "WP002").expect("query"),
            vec![segment]
        );
        assert!(store.segments_between("WP002", "WP001").expect("query").is_empty());
    }

    #[rstest]
    fn deleting_a_waypoint_drops_its_segments(store: MemoryStore) {
        let segment = AirwaySegment::new("S1", "AW001", "WP001", "WP002", 1).expect("segment");
        store.upsert_airway_segment(&segment).expect("insert");

        assert!(store.delete_waypoint("WP002").expect("delete"));
        assert!(!store.delete_waypoint("WP002").expect("delete"));
        assert!(store.segments_between("WP001", "WP002").expect("query").is_empty());
    }

    #[rstest]
    fn failed_batch_leaves_the_store_untouched(store: MemoryStore) {
        let batch = ReferenceBatch {
            waypoints: vec![
                Waypoint::new("WP003", "CHARLIE", coordinate(37.0, 119.0), WaypointKind::Fix)
                    .expect("waypoint"),
            ],
            airway_segments: vec![
                AirwaySegment::new("S1", "AW404", "WP001", "WP003", 1).expect("segment"),
            ],
            ..ReferenceBatch::default()
        };
        let err = store.apply_batch(&batch).expect_err("unknown airway");
        assert!(matches!(err, StoreError::Constraint { table: "airway_segments", .. }));
        assert_eq!(store.waypoint("WP003").expect("query"), None);
        assert_eq!(store.waypoints().expect("list").len(), 2);
    }

    #[rstest]
    fn airspace_boundary_is_ordered_and_cascades(store: MemoryStore) {
        let airspace = Airspace::new("AS001", "Beijing CTR", AirspaceKind::ControlZone)
            .expect("airspace");
        let corners = [(3, 40.5, 116.0), (1, 39.5, 116.0), (2, 39.5, 117.0)];
        let vertices: Vec<AirspaceBoundary> = corners
            .into_iter()
            .map(|(sequence, lat, lon)| {
                let id = format!("B{sequence}");
                AirspaceBoundary::new(id, "AS001", coordinate(lat, lon), sequence)
                    .expect("vertex")
            })
            .collect();
        let batch = ReferenceBatch {
            airspaces: vec![airspace.clone()],
            airspace_boundaries: vertices,
            ..ReferenceBatch::default()
        };
        store.apply_batch(&batch).expect("batch");

        assert_eq!(store.airspace("AS001").expect("query"), Some(airspace));
        let order: Vec<u32> = store
            .airspace_boundary("AS001")
            .expect("query")
            .iter()
            .map(|vertex| vertex.sequence)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);

        assert!(store.delete_airspace("AS001").expect("delete"));
        assert!(store.airspace_boundary("AS001").expect("query").is_empty());
        let orphan =
            AirspaceBoundary::new("B9", "AS001", coordinate(0.0, 0.0), 9).expect("vertex");
        assert!(store.upsert_airspace_boundary(&orphan).is_err());
    }
}
