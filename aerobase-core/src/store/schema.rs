//! Versioned SQLite schema and the migration runner.

use rusqlite::{Connection, OptionalExtension, params};

use super::StoreError;
use crate::device::unix_now;

/// Highest schema version this build knows how to create.
pub const SCHEMA_VERSION: u32 = 2;

/// Ordered migrations; each entry moves the schema to its version.
const MIGRATIONS: &[(u32, &str)] = &[
    (
        1,
        r"
    CREATE TABLE IF NOT EXISTS devices (
        id TEXT PRIMARY KEY,
        fingerprint TEXT UNIQUE NOT NULL,
        hardware_info TEXT,
        created_at INTEGER NOT NULL,
        last_seen INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS airports (
        id TEXT PRIMARY KEY,
        icao TEXT UNIQUE NOT NULL COLLATE NOCASE,
        iata TEXT,
        name TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        elevation INTEGER,
        country TEXT,
        region TEXT,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_airports_location ON airports(latitude, longitude);

    CREATE TABLE IF NOT EXISTS waypoints (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        region TEXT,
        type TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_waypoints_location ON waypoints(latitude, longitude);

    CREATE TABLE IF NOT EXISTS navaids (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        frequency REAL,
        range_nm INTEGER,
        elevation INTEGER,
        region TEXT,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_navaids_location ON navaids(latitude, longitude);

    CREATE TABLE IF NOT EXISTS airways (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        min_altitude INTEGER,
        max_altitude INTEGER,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS airway_segments (
        id TEXT PRIMARY KEY,
        airway_id TEXT NOT NULL,
        from_waypoint_id TEXT NOT NULL,
        to_waypoint_id TEXT NOT NULL,
        sequence INTEGER NOT NULL,
        distance REAL,
        created_at INTEGER NOT NULL,
        FOREIGN KEY (airway_id) REFERENCES airways(id) ON DELETE CASCADE,
        FOREIGN KEY (from_waypoint_id) REFERENCES waypoints(id),
        FOREIGN KEY (to_waypoint_id) REFERENCES waypoints(id)
    );
    CREATE INDEX IF NOT EXISTS idx_airway_segments_airway ON airway_segments(airway_id);
    CREATE INDEX IF NOT EXISTS idx_airway_segments_endpoints
        ON airway_segments(from_waypoint_id, to_waypoint_id);

    CREATE TABLE IF NOT EXISTS sync_metadata (
        table_name TEXT PRIMARY KEY,
        last_sync INTEGER NOT NULL,
        record_count INTEGER DEFAULT 0
    );
    ",
    ),
    (
        2,
        r"
    CREATE TABLE IF NOT EXISTS airspaces (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        class TEXT,
        lower_limit INTEGER,
        upper_limit INTEGER,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS airspace_boundaries (
        id TEXT PRIMARY KEY,
        airspace_id TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        sequence INTEGER NOT NULL,
        FOREIGN KEY (airspace_id) REFERENCES airspaces(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_airspace_boundaries_airspace
        ON airspace_boundaries(airspace_id, sequence);
    ",
    ),
];

/// Version recorded in `schema_version`, or `0` for a fresh database.
pub(crate) fn current_version(conn: &Connection) -> Result<u32, rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
    )?;
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Apply every migration newer than the recorded version.
///
/// Each migration runs in its own transaction, so a failure leaves the
/// schema at the last fully applied version. Running on an up-to-date
/// database is a no-op.
pub(crate) fn migrate(conn: &mut Connection) -> Result<u32, StoreError> {
    let start = current_version(conn)?;
    let mut version = start;
    for &(target, sql) in MIGRATIONS.iter().filter(|(target, _)| *target > start) {
        let apply = |conn: &mut Connection| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)?;
            tx.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![target, unix_now()],
            )?;
            tx.commit()
        };
        apply(conn).map_err(|source| StoreError::Migration {
            version: target,
            source,
        })?;
        log::info!("migrated schema from version {version} to {target}");
        version = target;
    }
    Ok(version)
}
