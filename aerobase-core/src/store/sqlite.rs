//! SQLite-backed store behind an `r2d2` connection pool.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, ErrorCode, Params, Row, params};

use super::{ReferenceBatch, ReferenceStore, StoreError, schema};
use crate::{
    device::{Device, unix_now},
    model::{
        Airport, Airspace, AirspaceBoundary, AirspaceClass, AirspaceKind, Airway, AirwayKind,
        AirwaySegment, Coordinate, Navaid, NavaidKind, Waypoint, WaypointKind,
    },
};

/// Connection and pool tuning for [`SqliteStore::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Put the database in write-ahead-log mode.
    pub enable_wal: bool,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// How long a caller waits for a pooled connection.
    pub connection_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            enable_wal: true,
            pool_size: 4,
            connection_timeout: Duration::from_secs(30),
        }
    }
}

/// Reference store persisted in a single SQLite file.
pub struct SqliteStore {
    path: PathBuf,
    pool: Pool<SqliteConnectionManager>,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .field("max_connections", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and migrate it to
    /// [`SCHEMA_VERSION`](super::SCHEMA_VERSION).
    pub fn open(path: impl AsRef<Path>, options: &StoreOptions) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let enable_wal = options.enable_wal;
        let manager = SqliteConnectionManager::file(&path).with_init(move |conn| {
            if enable_wal {
                conn.execute_batch("PRAGMA journal_mode=WAL;")?;
            }
            conn.execute_batch(
                "PRAGMA foreign_keys=ON;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA cache_size=-64000;
                 PRAGMA temp_store=MEMORY;",
            )
        });
        let pool = Pool::builder()
            .max_size(options.pool_size.max(1))
            .connection_timeout(options.connection_timeout)
            .build(manager)
            .map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;

        let store = Self { path, pool };
        let version = schema::migrate(&mut *store.conn()?)?;
        log::debug!(
            "opened {} at schema version {version}",
            store.path.display()
        );
        Ok(store)
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        self.pool.get().map_err(|source| StoreError::Pool { source })
    }
}

/// Map constraint failures onto [`StoreError::Constraint`].
fn write_error(table: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |err| match err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::Constraint {
                table,
                reason: message.unwrap_or_else(|| code.to_string()),
            }
        }
        other => StoreError::Sqlite(other),
    }
}

fn collect_rows<T>(
    conn: &Connection,
    sql: &str,
    params: impl Params,
    decode: fn(&Row<'_>) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    let mut statement = conn.prepare(sql)?;
    let mut rows = statement.query(params)?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(decode(row)?);
    }
    Ok(records)
}

fn first_row<T>(
    conn: &Connection,
    sql: &str,
    params: impl Params,
    decode: fn(&Row<'_>) -> Result<T, StoreError>,
) -> Result<Option<T>, StoreError> {
    Ok(collect_rows(conn, sql, params, decode)?.into_iter().next())
}

fn coordinate_at(
    row: &Row<'_>,
    table: &'static str,
    id: &str,
    lat_idx: usize,
) -> Result<Coordinate, StoreError> {
    let latitude: f64 = row.get(lat_idx)?;
    let longitude: f64 = row.get(lat_idx + 1)?;
    Coordinate::new(latitude, longitude).map_err(|err| StoreError::Decode {
        table,
        id: id.to_owned(),
        reason: err.to_string(),
    })
}

const AIRPORT_COLUMNS: &str =
    "id, icao, iata, name, latitude, longitude, elevation, country, region";

fn decode_airport(row: &Row<'_>) -> Result<Airport, StoreError> {
    let id: String = row.get(0)?;
    let coordinate = coordinate_at(row, "airports", &id, 4)?;
    Ok(Airport {
        icao: row.get(1)?,
        iata: row.get(2)?,
        name: row.get(3)?,
        coordinate,
        elevation_ft: row.get(6)?,
        country: row.get(7)?,
        region: row.get(8)?,
        id,
    })
}

const WAYPOINT_COLUMNS: &str = "id, name, latitude, longitude, type, region";

fn decode_waypoint(row: &Row<'_>) -> Result<Waypoint, StoreError> {
    let id: String = row.get(0)?;
    let coordinate = coordinate_at(row, "waypoints", &id, 2)?;
    let kind: String = row.get(4)?;
    Ok(Waypoint {
        name: row.get(1)?,
        coordinate,
        kind: WaypointKind::from(kind.as_str()),
        region: row.get(5)?,
        id,
    })
}

const NAVAID_COLUMNS: &str =
    "id, name, type, latitude, longitude, frequency, range_nm, elevation, region";

fn decode_navaid(row: &Row<'_>) -> Result<Navaid, StoreError> {
    let id: String = row.get(0)?;
    let coordinate = coordinate_at(row, "navaids", &id, 3)?;
    let kind: String = row.get(2)?;
    Ok(Navaid {
        name: row.get(1)?,
        kind: NavaidKind::from(kind.as_str()),
        coordinate,
        frequency: row.get(5)?,
        range_nm: row.get(6)?,
        elevation_ft: row.get(7)?,
        region: row.get(8)?,
        id,
    })
}

fn decode_airway(row: &Row<'_>) -> Result<Airway, StoreError> {
    let kind: String = row.get(2)?;
    Ok(Airway {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: AirwayKind::from(kind.as_str()),
        min_altitude_ft: row.get(3)?,
        max_altitude_ft: row.get(4)?,
    })
}

fn decode_segment(row: &Row<'_>) -> Result<AirwaySegment, StoreError> {
    Ok(AirwaySegment {
        id: row.get(0)?,
        airway_id: row.get(1)?,
        from_waypoint_id: row.get(2)?,
        to_waypoint_id: row.get(3)?,
        sequence: row.get(4)?,
        distance_nm: row.get(5)?,
    })
}

fn decode_device(row: &Row<'_>) -> Result<Device, StoreError> {
    Ok(Device {
        id: row.get(0)?,
        fingerprint: row.get(1)?,
        hardware_info: row.get(2)?,
        created_at: row.get(3)?,
        last_seen: row.get(4)?,
    })
}

fn decode_airspace(row: &Row<'_>) -> Result<Airspace, StoreError> {
    let kind: String = row.get(2)?;
    let class: Option<String> = row.get(3)?;
    Ok(Airspace {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: AirspaceKind::from(kind.as_str()),
        class: class.as_deref().map(AirspaceClass::from),
        lower_limit_ft: row.get(4)?,
        upper_limit_ft: row.get(5)?,
    })
}

fn decode_boundary(row: &Row<'_>) -> Result<AirspaceBoundary, StoreError> {
    let id: String = row.get(0)?;
    let coordinate = coordinate_at(row, "airspace_boundaries", &id, 2)?;
    Ok(AirspaceBoundary {
        airspace_id: row.get(1)?,
        coordinate,
        sequence: row.get(4)?,
        id,
    })
}

fn put_airport(conn: &Connection, airport: &Airport) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO airports
         (id, icao, iata, name, latitude, longitude, elevation, country, region, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
           icao = excluded.icao, iata = excluded.iata, name = excluded.name,
           latitude = excluded.latitude, longitude = excluded.longitude,
           elevation = excluded.elevation, country = excluded.country,
           region = excluded.region",
        params![
            airport.id,
            airport.icao,
            airport.iata,
            airport.name,
            airport.coordinate.latitude(),
            airport.coordinate.longitude(),
            airport.elevation_ft,
            airport.country,
            airport.region,
            unix_now(),
        ],
    )
    .map_err(write_error("airports"))?;
    Ok(())
}

fn put_waypoint(conn: &Connection, waypoint: &Waypoint) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO waypoints (id, name, latitude, longitude, type, region, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name, latitude = excluded.latitude,
           longitude = excluded.longitude, type = excluded.type,
           region = excluded.region",
        params![
            waypoint.id,
            waypoint.name,
            waypoint.coordinate.latitude(),
            waypoint.coordinate.longitude(),
            waypoint.kind.as_str(),
            waypoint.region,
            unix_now(),
        ],
    )
    .map_err(write_error("waypoints"))?;
    Ok(())
}

fn put_navaid(conn: &Connection, navaid: &Navaid) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO navaids
         (id, name, type, latitude, longitude, frequency, range_nm, elevation, region,
          created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name, type = excluded.type, latitude = excluded.latitude,
           longitude = excluded.longitude, frequency = excluded.frequency,
           range_nm = excluded.range_nm, elevation = excluded.elevation,
           region = excluded.region",
        params![
            navaid.id,
            navaid.name,
            navaid.kind.as_str(),
            navaid.coordinate.latitude(),
            navaid.coordinate.longitude(),
            navaid.frequency,
            navaid.range_nm,
            navaid.elevation_ft,
            navaid.region,
            unix_now(),
        ],
    )
    .map_err(write_error("navaids"))?;
    Ok(())
}

fn put_airway(conn: &Connection, airway: &Airway) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO airways (id, name, type, min_altitude, max_altitude, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name, type = excluded.type,
           min_altitude = excluded.min_altitude, max_altitude = excluded.max_altitude",
        params![
            airway.id,
            airway.name,
            airway.kind.as_str(),
            airway.min_altitude_ft,
            airway.max_altitude_ft,
            unix_now(),
        ],
    )
    .map_err(write_error("airways"))?;
    Ok(())
}

fn put_segment(conn: &Connection, segment: &AirwaySegment) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO airway_segments
         (id, airway_id, from_waypoint_id, to_waypoint_id, sequence, distance, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
           airway_id = excluded.airway_id,
           from_waypoint_id = excluded.from_waypoint_id,
           to_waypoint_id = excluded.to_waypoint_id,
           sequence = excluded.sequence, distance = excluded.distance",
        params![
            segment.id,
            segment.airway_id,
            segment.from_waypoint_id,
            segment.to_waypoint_id,
            segment.sequence,
            segment.distance_nm,
            unix_now(),
        ],
    )
    .map_err(write_error("airway_segments"))?;
    Ok(())
}

fn put_airspace(conn: &Connection, airspace: &Airspace) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO airspaces (id, name, type, class, lower_limit, upper_limit, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name, type = excluded.type, class = excluded.class,
           lower_limit = excluded.lower_limit, upper_limit = excluded.upper_limit",
        params![
            airspace.id,
            airspace.name,
            airspace.kind.as_str(),
            airspace.class.as_ref().map(AirspaceClass::as_str),
            airspace.lower_limit_ft,
            airspace.upper_limit_ft,
            unix_now(),
        ],
    )
    .map_err(write_error("airspaces"))?;
    Ok(())
}

fn put_boundary(conn: &Connection, vertex: &AirspaceBoundary) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO airspace_boundaries (id, airspace_id, latitude, longitude, sequence)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
           airspace_id = excluded.airspace_id, latitude = excluded.latitude,
           longitude = excluded.longitude, sequence = excluded.sequence",
        params![
            vertex.id,
            vertex.airspace_id,
            vertex.coordinate.latitude(),
            vertex.coordinate.longitude(),
            vertex.sequence,
        ],
    )
    .map_err(write_error("airspace_boundaries"))?;
    Ok(())
}

fn put_batch(conn: &Connection, batch: &ReferenceBatch) -> Result<(), StoreError> {
    for airport in &batch.airports {
        put_airport(conn, airport)?;
    }
    for waypoint in &batch.waypoints {
        put_waypoint(conn, waypoint)?;
    }
    for navaid in &batch.navaids {
        put_navaid(conn, navaid)?;
    }
    for airway in &batch.airways {
        put_airway(conn, airway)?;
    }
    for segment in &batch.airway_segments {
        put_segment(conn, segment)?;
    }
    for airspace in &batch.airspaces {
        put_airspace(conn, airspace)?;
    }
    for vertex in &batch.airspace_boundaries {
        put_boundary(conn, vertex)?;
    }
    Ok(())
}

impl ReferenceStore for SqliteStore {
    fn airports(&self) -> Result<Vec<Airport>, StoreError> {
        let sql = format!("SELECT {AIRPORT_COLUMNS} FROM airports ORDER BY id");
        collect_rows(&*self.conn()?, &sql, [], decode_airport)
    }

    fn waypoints(&self) -> Result<Vec<Waypoint>, StoreError> {
        let sql = format!("SELECT {WAYPOINT_COLUMNS} FROM waypoints ORDER BY id");
        collect_rows(&*self.conn()?, &sql, [], decode_waypoint)
    }

    fn navaids(&self) -> Result<Vec<Navaid>, StoreError> {
        let sql = format!("SELECT {NAVAID_COLUMNS} FROM navaids ORDER BY id");
        collect_rows(&*self.conn()?, &sql, [], decode_navaid)
    }

    fn airport(&self, id: &str) -> Result<Option<Airport>, StoreError> {
        let sql = format!("SELECT {AIRPORT_COLUMNS} FROM airports WHERE id = ?1");
        first_row(&*self.conn()?, &sql, [id], decode_airport)
    }

    fn airport_by_icao(&self, icao: &str) -> Result<Option<Airport>, StoreError> {
        let sql = format!("SELECT {AIRPORT_COLUMNS} FROM airports WHERE icao = ?1");
        first_row(&*self.conn()?, &sql, [icao.trim()], decode_airport)
    }

    fn waypoint(&self, id: &str) -> Result<Option<Waypoint>, StoreError> {
        let sql = format!("SELECT {WAYPOINT_COLUMNS} FROM waypoints WHERE id = ?1");
        first_row(&*self.conn()?, &sql, [id], decode_waypoint)
    }

    fn navaid(&self, id: &str) -> Result<Option<Navaid>, StoreError> {
        let sql = format!("SELECT {NAVAID_COLUMNS} FROM navaids WHERE id = ?1");
        first_row(&*self.conn()?, &sql, [id], decode_navaid)
    }

    fn airway(&self, id: &str) -> Result<Option<Airway>, StoreError> {
        first_row(
            &*self.conn()?,
            "SELECT id, name, type, min_altitude, max_altitude FROM airways WHERE id = ?1",
            [id],
            decode_airway,
        )
    }

    fn segments_between(
        &self,
        from_waypoint_id: &str,
        to_waypoint_id: &str,
    ) -> Result<Vec<AirwaySegment>, StoreError> {
        collect_rows(
            &*self.conn()?,
            "SELECT id, airway_id, from_waypoint_id, to_waypoint_id, sequence, distance
             FROM airway_segments
             WHERE from_waypoint_id = ?1 AND to_waypoint_id = ?2
             ORDER BY airway_id, sequence",
            [from_waypoint_id, to_waypoint_id],
            decode_segment,
        )
    }

    fn upsert_airport(&self, airport: &Airport) -> Result<(), StoreError> {
        put_airport(&*self.conn()?, airport)
    }

    fn upsert_waypoint(&self, waypoint: &Waypoint) -> Result<(), StoreError> {
        put_waypoint(&*self.conn()?, waypoint)
    }

    fn upsert_navaid(&self, navaid: &Navaid) -> Result<(), StoreError> {
        put_navaid(&*self.conn()?, navaid)
    }

    fn upsert_airway(&self, airway: &Airway) -> Result<(), StoreError> {
        put_airway(&*self.conn()?, airway)
    }

    fn upsert_airway_segment(&self, segment: &AirwaySegment) -> Result<(), StoreError> {
        put_segment(&*self.conn()?, segment)
    }

    fn delete_airport(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn()?
            .execute("DELETE FROM airports WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    fn delete_waypoint(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM airway_segments WHERE from_waypoint_id = ?1 OR to_waypoint_id = ?1",
            [id],
        )?;
        let removed = tx.execute("DELETE FROM waypoints WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn delete_navaid(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn()?
            .execute("DELETE FROM navaids WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    fn airspaces(&self) -> Result<Vec<Airspace>, StoreError> {
        collect_rows(
            &*self.conn()?,
            "SELECT id, name, type, class, lower_limit, upper_limit FROM airspaces ORDER BY id",
            [],
            decode_airspace,
        )
    }

    fn airspace(&self, id: &str) -> Result<Option<Airspace>, StoreError> {
        first_row(
            &*self.conn()?,
            "SELECT id, name, type, class, lower_limit, upper_limit FROM airspaces WHERE id = ?1",
            [id],
            decode_airspace,
        )
    }

    fn airspace_boundary(&self, airspace_id: &str) -> Result<Vec<AirspaceBoundary>, StoreError> {
        collect_rows(
            &*self.conn()?,
            "SELECT id, airspace_id, latitude, longitude, sequence
             FROM airspace_boundaries WHERE airspace_id = ?1 ORDER BY sequence, id",
            [airspace_id],
            decode_boundary,
        )
    }

    fn upsert_airspace(&self, airspace: &Airspace) -> Result<(), StoreError> {
        put_airspace(&*self.conn()?, airspace)
    }

    fn upsert_airspace_boundary(&self, vertex: &AirspaceBoundary) -> Result<(), StoreError> {
        put_boundary(&*self.conn()?, vertex)
    }

    fn delete_airspace(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn()?
            .execute("DELETE FROM airspaces WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    fn apply_batch(&self, batch: &ReferenceBatch) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        put_batch(&tx, batch)?;
        tx.commit()?;
        log::debug!("committed batch of {:?}", batch.summary());
        Ok(())
    }

    fn device_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Device>, StoreError> {
        first_row(
            &*self.conn()?,
            "SELECT id, fingerprint, hardware_info, created_at, last_seen
             FROM devices WHERE fingerprint = ?1",
            [fingerprint],
            decode_device,
        )
    }

    fn insert_device(&self, device: &Device) -> Result<(), StoreError> {
        self.conn()?
            .execute(
                "INSERT INTO devices (id, fingerprint, hardware_info, created_at, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    device.id,
                    device.fingerprint,
                    device.hardware_info,
                    device.created_at,
                    device.last_seen,
                ],
            )
            .map_err(write_error("devices"))?;
        Ok(())
    }

    fn touch_device(&self, id: &str, last_seen: i64) -> Result<(), StoreError> {
        self.conn()?.execute(
            "UPDATE devices SET last_seen = ?2 WHERE id = ?1",
            params![id, last_seen],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    fn coordinate(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    #[fixture]
    fn temp_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::open(dir.path().join("nested/aerobase.db"), &StoreOptions::default())
            .expect("open store");
        (dir, store)
    }

    #[rstest]
    fn airport_round_trips(temp_store: (TempDir, SqliteStore)) {
        let (_dir, store) = temp_store;
        let airport = Airport::new("AP001", "ZBAA", "Beijing Capital", coordinate(40.0801, 116.5846))
            .expect("airport")
            .with_iata("PEK")
            .with_elevation(116)
            .with_country("CN");
        store.upsert_airport(&airport).expect("insert");

        assert_eq!(store.airport("AP001").expect("query"), Some(airport.clone()));
        assert_eq!(store.airport_by_icao("zbaa").expect("query"), Some(airport));
        assert_eq!(store.airports().expect("list").len(), 1);
    }

    #[rstest]
    fn duplicate_icao_is_a_constraint_violation(temp_store: (TempDir, SqliteStore)) {
        let (_dir, store) = temp_store;
        let first = Airport::new("AP001", "ZBAA", "One", coordinate(0.0, 0.0)).expect("airport");
        let second = Airport::new("AP002", "ZBAA", "Two", coordinate(1.0, 1.0)).expect("airport");
        store.upsert_airport(&first).expect("insert");
        let err = store.upsert_airport(&second).expect_err("duplicate ICAO");
        assert!(matches!(err, StoreError::Constraint { table: "airports", .. }));
    }

    #[rstest]
    fn navaid_and_waypoint_round_trip(temp_store: (TempDir, SqliteStore)) {
        let (_dir, store) = temp_store;
        let navaid = Navaid::new("NAV001", "PEK", NavaidKind::VorDme, coordinate(40.07, 116.6))
            .expect("navaid")
            .with_frequency(114.7)
            .with_range(130);
        let waypoint = Waypoint::new("WP001", "ALPHA", coordinate(39.0, 117.0), WaypointKind::Gps)
            .expect("waypoint")
            .with_region("ZB");
        store.upsert_navaid(&navaid).expect("navaid");
        store.upsert_waypoint(&waypoint).expect("waypoint");

        assert_eq!(store.navaid("NAV001").expect("query"), Some(navaid));
        assert_eq!(store.waypoint("WP001").expect("query"), Some(waypoint));
    }

    #[rstest]
    fn segments_follow_direction_and_cascade(temp_store: (TempDir, SqliteStore)) {
        let (_dir, store) = temp_store;
        for (id, lat) in [("WP001", 39.0), ("WP002", 38.0)] {
            let waypoint = Waypoint::new(id, id, coordinate(lat, 117.0), WaypointKind::Fix)
                .expect("waypoint");
            store.upsert_waypoint(&waypoint).expect("waypoint");
        }
        let airway = Airway::new("AW001", "A1", AirwayKind::High)
            .expect("airway")
            .with_altitudes(Some(10_000), Some(30_000));
        store.upsert_airway(&airway).expect("airway");
        let segment = AirwaySegment::new("S1", "AW001", "WP001", "WP002", 1).expect("segment");
        store.upsert_airway_segment(&segment).expect("segment");

        assert_eq!(store.airway("AW001").expect("query"), Some(airway));
        assert_eq!(
            store.segments_between("WP001", "WP002").expect("query"),
            vec![segment]
        );
        assert!(store.segments_between("WP002", "WP001").expect("query").is_empty());

        assert!(store.delete_waypoint("WP002").expect("delete"));
        assert!(store.segments_between("WP001", "WP002").expect("query").is_empty());
    }

    #[rstest]
    fn dangling_segment_is_rejected(temp_store: (TempDir, SqliteStore)) {
        let (_dir, store) = temp_store;
        let segment = AirwaySegment::new("S1", "AW404", "WP001", "WP002", 1).expect("segment");
        let err = store.upsert_airway_segment(&segment).expect_err("foreign keys on");
        assert!(matches!(err, StoreError::Constraint { .. }));
    }

    #[rstest]
    fn device_touch_updates_last_seen(temp_store: (TempDir, SqliteStore)) {
        let (_dir, store) = temp_store;
        let device = Device {
            id: "dev-1".into(),
            fingerprint: "fp".into(),
            hardware_info: None,
            created_at: 10,
            last_seen: 10,
        };
        store.insert_device(&device).expect("insert");
        store.touch_device("dev-1", 99).expect("touch");
        let stored = store
            .device_by_fingerprint("fp")
            .expect("query")
            .expect("present");
        assert_eq!(stored.last_seen, 99);
        assert_eq!(stored.created_at, 10);
    }

    #[rstest]
    fn failed_batch_rolls_back(temp_store: (TempDir, SqliteStore)) {
        let (_dir, store) = temp_store;
        let batch = ReferenceBatch {
            airports: vec![
                Airport::new("AP001", "ZBAA", "Beijing", coordinate(40.08, 116.58)).expect("airport"),
            ],
            airway_segments: vec![
                AirwaySegment::new("S1", "AW404", "WP001", "WP002", 1).expect("segment"),
            ],
            ..ReferenceBatch::default()
        };
        let err = store.apply_batch(&batch).expect_err("dangling segment");
        assert!(matches!(err, StoreError::Constraint { table: "airway_segments", .. }));
        assert!(store.airports().expect("list").is_empty());
    }

    #[rstest]
    fn airspaces_round_trip_and_cascade(temp_store: (TempDir, SqliteStore)) {
        let (_dir, store) = temp_store;
        let airspace = Airspace::new("AS001", "Beijing TMA", AirspaceKind::TerminalArea)
            .expect("airspace")
            .with_class(AirspaceClass::C)
            .with_limits(Some(3_000), Some(18_000));
        let vertices = vec![
            AirspaceBoundary::new("B2", "AS001", coordinate(39.5, 117.0), 2).expect("vertex"),
            AirspaceBoundary::new("B1", "AS001", coordinate(39.5, 116.0), 1).expect("vertex"),
            AirspaceBoundary::new("B3", "AS001", coordinate(40.5, 116.5), 3).expect("vertex"),
        ];
        let batch = ReferenceBatch {
            airspaces: vec![airspace.clone()],
            airspace_boundaries: vertices,
            ..ReferenceBatch::default()
        };
        store.apply_batch(&batch).expect("batch");

        assert_eq!(store.airspace("AS001").expect("query"), Some(airspace.clone()));
        assert_eq!(store.airspaces().expect("list"), vec![airspace]);
        let ids: Vec<String> = store
            .airspace_boundary("AS001")
            .expect("query")
            .into_iter()
            .map(|vertex| vertex.id)
            .collect();
        assert_eq!(ids, ["B1", "B2", "B3"]);

        assert!(store.delete_airspace("AS001").expect("delete"));
        assert!(store.airspace_boundary("AS001").expect("query").is_empty());
    }

    #[rstest]
    fn icao_lookup_trims_and_ignores_case(temp_store: (TempDir, SqliteStore)) {
        let (_dir, store) = temp_store;
        let airport =
            Airport::new("AP1", "ZBAA", "Beijing", coordinate(40.08, 116.58)).expect("airport");
        store.upsert_airport(&airport).expect("insert");
        let found = store.airport_by_icao(" zbaa ").expect("query");
        assert_eq!(found.map(|a| a.id), Some("AP1".to_owned()));
    }

    #[test]
    fn reopening_keeps_data_and_schema() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("aerobase.db");
        {
            let store = SqliteStore::open(&path, &StoreOptions::default()).expect("open");
            let airport =
                Airport::new("AP001", "KJFK", "Kennedy", coordinate(40.64, -73.78)).expect("airport");
            store.upsert_airport(&airport).expect("insert");
        }
        let store = SqliteStore::open(&path, &StoreOptions::default()).expect("reopen");
        let conn = store.conn().expect("connection");
        assert_eq!(
            schema::current_version(&conn).expect("version"),
            schema::SCHEMA_VERSION
        );
        assert_eq!(store.airports().expect("list").len(), 1);
    }
}
