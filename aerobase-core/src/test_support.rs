//! Small reference dataset shared by unit, behaviour and downstream crate
//! tests.
//!
//! The airports are real; the waypoints and airway are invented so that the
//! route ZBAA → ALPHA → BRAVO → ZSSS crosses an airway restricted to
//! FL180–FL450.

use crate::{
    error::AeroBaseError,
    model::{
        Airport, Airspace, AirspaceBoundary, AirspaceClass, AirspaceKind, Airway, AirwayKind,
        AirwaySegment, Coordinate, Navaid, NavaidKind, Waypoint, WaypointKind,
    },
    store::{MemoryStore, ReferenceBatch, ReferenceStore},
};

fn at(latitude: f64, longitude: f64) -> Result<Coordinate, AeroBaseError> {
    Ok(Coordinate::new(latitude, longitude)?)
}

/// Beijing Capital, Shanghai Hongqiao, Shanghai Pudong and Guangzhou.
pub fn sample_airports() -> Result<Vec<Airport>, AeroBaseError> {
    Ok(vec![
        Airport::new("AP001", "ZBAA", "Beijing Capital", at(40.0801, 116.5846)?)?
            .with_iata("PEK")
            .with_elevation(116)
            .with_country("CN"),
        Airport::new("AP002", "ZSSS", "Shanghai Hongqiao", at(31.1979, 121.3363)?)?
            .with_iata("SHA")
            .with_elevation(10)
            .with_country("CN"),
        Airport::new("AP003", "ZSPD", "Shanghai Pudong", at(31.1443, 121.8083)?)?
            .with_iata("PVG")
            .with_elevation(13)
            .with_country("CN"),
        Airport::new("AP004", "ZGGG", "Guangzhou Baiyun", at(23.3924, 113.2988)?)?
            .with_iata("CAN")
            .with_elevation(50)
            .with_country("CN"),
    ])
}

/// Two fixes between Beijing and Shanghai.
pub fn sample_waypoints() -> Result<Vec<Waypoint>, AeroBaseError> {
    Ok(vec![
        Waypoint::new("WP001", "ALPHA", at(37.5, 118.0)?, WaypointKind::Fix)?,
        Waypoint::new("WP002", "BRAVO", at(34.5, 119.8)?, WaypointKind::Fix)?,
    ])
}

/// One VOR/DME near Beijing.
pub fn sample_navaids() -> Result<Vec<Navaid>, AeroBaseError> {
    Ok(vec![
        Navaid::new("NV001", "PEK", NavaidKind::VorDme, at(40.0636, 116.6017)?)?
            .with_frequency(114.7)
            .with_range(130),
    ])
}

/// Airway `A1`, usable from FL180 to FL450.
pub fn sample_airways() -> Result<Vec<Airway>, AeroBaseError> {
    Ok(vec![
        Airway::new("AW001", "A1", AirwayKind::High)?.with_altitudes(Some(18_000), Some(45_000)),
    ])
}

/// Segment `SEG1` of `A1`, from ALPHA to BRAVO.
pub fn sample_airway_segments() -> Result<Vec<AirwaySegment>, AeroBaseError> {
    Ok(vec![AirwaySegment::new("SEG1", "AW001", "WP001", "WP002", 1)?])
}

/// A class C control zone from the surface to 3,000 ft around Beijing
/// Capital.
pub fn sample_airspaces() -> Result<Vec<Airspace>, AeroBaseError> {
    Ok(vec![
        Airspace::new("AS001", "Beijing CTR", AirspaceKind::ControlZone)?
            .with_class(AirspaceClass::C)
            .with_limits(Some(0), Some(3_000)),
    ])
}

/// Four vertices boxing in `AS001`.
pub fn sample_airspace_boundaries() -> Result<Vec<AirspaceBoundary>, AeroBaseError> {
    let corners = [(39.8, 116.3), (39.8, 116.9), (40.4, 116.9), (40.4, 116.3)];
    let mut vertices = Vec::with_capacity(corners.len());
    for (sequence, (latitude, longitude)) in (1_u32..).zip(corners) {
        vertices.push(AirspaceBoundary::new(
            format!("ASB00{sequence}"),
            "AS001",
            at(latitude, longitude)?,
            sequence,
        )?);
    }
    Ok(vertices)
}

/// Every sample record as one batch.
pub fn sample_batch() -> Result<ReferenceBatch, AeroBaseError> {
    Ok(ReferenceBatch {
        airports: sample_airports()?,
        waypoints: sample_waypoints()?,
        navaids: sample_navaids()?,
        airways: sample_airways()?,
        airway_segments: sample_airway_segments()?,
        airspaces: sample_airspaces()?,
        airspace_boundaries: sample_airspace_boundaries()?,
    })
}

/// A memory store holding every sample record.
pub fn sample_store() -> Result<MemoryStore, AeroBaseError> {
    let store = MemoryStore::with_records(
        sample_airports()?,
        sample_waypoints()?,
        sample_navaids()?,
    )?;
    for airway in sample_airways()? {
        store.upsert_airway(&airway)?;
    }
    for segment in sample_airway_segments()? {
        store.upsert_airway_segment(&segment)?;
    }
    for airspace in sample_airspaces()? {
        store.upsert_airspace(&airspace)?;
    }
    for vertex in sample_airspace_boundaries()? {
        store.upsert_airspace_boundary(&vertex)?;
    }
    Ok(store)
}
