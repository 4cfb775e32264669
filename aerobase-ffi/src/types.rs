//! `#[repr(C)]` mirrors of the core types and their ownership helpers.
//!
//! Strings handed out are `CString`s leaked with `into_raw`; arrays are boxed
//! slices leaked with `Box::into_raw`. Each has exactly one matching free
//! function, which also nulls the freed pointers so a repeated free is a
//! no-op.

use std::{
    ffi::{CStr, CString, c_char},
    path::PathBuf,
    ptr,
    time::Duration,
};

use aerobase_core::{
    AeroBaseError, Airport, Config, Coordinate, Device, FlightPlan, FlightRoute, PlanLimits,
    Proximity, RouteLeg, Waypoint,
};

/// Engine settings. A null `db_path` selects `aerobase.db` in the working
/// directory; a null `fingerprint` derives one from the host.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AeroBaseConfig {
    /// UTF-8 path of the SQLite file, or null.
    pub db_path: *const c_char,
    /// Put the database in write-ahead-log mode.
    pub enable_wal: bool,
    /// Maximum pooled connections; `0` selects the default.
    pub pool_size: u32,
    /// Seconds to wait for a pooled connection; `0` selects the default.
    pub connection_timeout_secs: u32,
    /// Host-supplied device fingerprint, or null.
    pub fingerprint: *const c_char,
}

/// A position in degrees.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroBaseCoordinate {
    /// Latitude in `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in `[-180, 180]`.
    pub longitude: f64,
}

/// An airport returned by a radius query.
#[repr(C)]
#[derive(Debug)]
pub struct AeroBaseAirport {
    /// Store identifier.
    pub id: *mut c_char,
    /// ICAO code.
    pub icao: *mut c_char,
    /// IATA code, or null.
    pub iata: *mut c_char,
    /// Display name.
    pub name: *mut c_char,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Whether `elevation_ft` is meaningful.
    pub has_elevation: bool,
    /// Field elevation in feet.
    pub elevation_ft: i32,
    /// Country, or null.
    pub country: *mut c_char,
    /// Distance from the query point in nautical miles.
    pub distance_nm: f64,
}

/// A waypoint returned by a radius query.
#[repr(C)]
#[derive(Debug)]
pub struct AeroBaseWaypoint {
    /// Store identifier.
    pub id: *mut c_char,
    /// Display name.
    pub name: *mut c_char,
    /// Kind, e.g. `FIX` or `VOR`.
    pub kind: *mut c_char,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Distance from the query point in nautical miles.
    pub distance_nm: f64,
}

/// The device registered for this installation.
#[repr(C)]
#[derive(Debug)]
pub struct AeroBaseDevice {
    /// Device UUID.
    pub id: *mut c_char,
    /// Installation fingerprint.
    pub fingerprint: *mut c_char,
    /// Hardware description JSON, or null.
    pub hardware_info: *mut c_char,
    /// Registration time in unix seconds.
    pub created_at: i64,
    /// Most recent lookup in unix seconds.
    pub last_seen: i64,
}

/// A flight plan owned by the caller.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AeroBaseFlightPlan {
    /// Departure ICAO code.
    pub departure: *const c_char,
    /// Destination ICAO code.
    pub destination: *const c_char,
    /// Alternate ICAO code, or null.
    pub alternate: *const c_char,
    /// Cruise altitude in feet.
    pub cruise_altitude_ft: i32,
    /// Cruise speed in knots.
    pub cruise_speed_kt: i32,
    /// Waypoint ids in flight order; may be null when `route_len` is `0`.
    pub route: *const *const c_char,
    /// Number of entries in `route`.
    pub route_len: usize,
}

/// One point of a computed route.
#[repr(C)]
#[derive(Debug)]
pub struct AeroBaseRouteLeg {
    /// Airport ICAO code or waypoint id.
    pub id: *mut c_char,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Distance from the previous point in nautical miles.
    pub distance_from_previous_nm: f64,
    /// Distance from departure in nautical miles.
    pub cumulative_distance_nm: f64,
    /// Minutes from departure.
    pub minutes_from_departure: u32,
}

/// A computed route.
#[repr(C)]
#[derive(Debug)]
pub struct AeroBaseFlightRoute {
    /// Total distance in nautical miles.
    pub total_distance_nm: f64,
    /// Estimated en-route time in minutes.
    pub estimated_time_min: u32,
    /// Route points from departure to destination.
    pub legs: *mut AeroBaseRouteLeg,
    /// Number of entries in `legs`.
    pub legs_len: usize,
}

/// Leak `value` as a C string, dropping interior NULs.
pub(crate) fn c_string(value: &str) -> *mut c_char {
    CString::new(value.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

fn c_string_opt(value: Option<&str>) -> *mut c_char {
    value.map_or(ptr::null_mut(), c_string)
}

/// Reclaim a string from [`c_string`] and null the pointer.
///
/// # Safety
/// `slot` must be null or a pointer produced by [`c_string`] that has not
/// been freed.
pub(crate) unsafe fn free_c_string(slot: &mut *mut c_char) {
    if !slot.is_null() {
        // SAFETY: guaranteed by the caller.
        drop(unsafe { CString::from_raw(*slot) });
        *slot = ptr::null_mut();
    }
}

/// Borrow a caller-owned UTF-8 string.
///
/// # Safety
/// `value` must be null or point to a NUL-terminated string that outlives
/// the call.
pub(crate) unsafe fn read_str(
    value: *const c_char,
    field: &'static str,
) -> Result<String, AeroBaseError> {
    if value.is_null() {
        return Err(AeroBaseError::invalid_input(format!("{field} is null")));
    }
    // SAFETY: guaranteed by the caller.
    let raw = unsafe { CStr::from_ptr(value) };
    raw.to_str()
        .map(str::to_owned)
        .map_err(|_| AeroBaseError::invalid_input(format!("{field} is not UTF-8")))
}

/// Leak `items` as a boxed slice, returning null for an empty list.
pub(crate) fn leak_slice<T>(items: Vec<T>) -> (*mut T, usize) {
    if items.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let len = items.len();
    (Box::into_raw(items.into_boxed_slice()).cast::<T>(), len)
}

/// Reclaim a slice leaked by [`leak_slice`].
///
/// # Safety
/// `items`/`len` must come from [`leak_slice`] and not have been freed.
pub(crate) unsafe fn reclaim_slice<T>(items: *mut T, len: usize) -> Vec<T> {
    if items.is_null() || len == 0 {
        return Vec::new();
    }
    // SAFETY: guaranteed by the caller.
    unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(items, len)) }.into_vec()
}

impl AeroBaseConfig {
    /// Translate into the core configuration.
    ///
    /// # Safety
    /// String fields must be null or valid NUL-terminated strings.
    pub(crate) unsafe fn to_config(&self) -> Result<(Config, Option<String>), AeroBaseError> {
        let defaults = Config::default();
        let db_path = if self.db_path.is_null() {
            defaults.db_path
        } else {
            // SAFETY: guaranteed by the caller.
            PathBuf::from(unsafe { read_str(self.db_path, "db_path") }?)
        };
        let fingerprint = if self.fingerprint.is_null() {
            None
        } else {
            // SAFETY: guaranteed by the caller.
            Some(unsafe { read_str(self.fingerprint, "fingerprint") }?)
        };
        let config = Config {
            db_path,
            enable_wal: self.enable_wal,
            pool_size: if self.pool_size == 0 {
                defaults.pool_size
            } else {
                self.pool_size
            },
            connection_timeout: if self.connection_timeout_secs == 0 {
                defaults.connection_timeout
            } else {
                Duration::from_secs(u64::from(self.connection_timeout_secs))
            },
            limits: PlanLimits::default(),
        };
        Ok((config, fingerprint))
    }
}

impl TryFrom<AeroBaseCoordinate> for Coordinate {
    type Error = AeroBaseError;

    fn try_from(value: AeroBaseCoordinate) -> Result<Self, Self::Error> {
        Ok(Self::new(value.latitude, value.longitude)?)
    }
}

impl From<Proximity<Airport>> for AeroBaseAirport {
    fn from(hit: Proximity<Airport>) -> Self {
        let airport = hit.entity;
        Self {
            id: c_string(&airport.id),
            icao: c_string(&airport.icao),
            iata: c_string_opt(airport.iata.as_deref()),
            name: c_string(&airport.name),
            latitude: airport.coordinate.latitude(),
            longitude: airport.coordinate.longitude(),
            has_elevation: airport.elevation_ft.is_some(),
            elevation_ft: airport.elevation_ft.unwrap_or_default(),
            country: c_string_opt(airport.country.as_deref()),
            distance_nm: hit.distance_nm,
        }
    }
}

impl AeroBaseAirport {
    pub(crate) fn release(&mut self) {
        // SAFETY: every field was produced by `c_string` or is null.
        unsafe {
            free_c_string(&mut self.id);
            free_c_string(&mut self.icao);
            free_c_string(&mut self.iata);
            free_c_string(&mut self.name);
            free_c_string(&mut self.country);
        }
    }
}

impl From<Proximity<Waypoint>> for AeroBaseWaypoint {
    fn from(hit: Proximity<Waypoint>) -> Self {
        let waypoint = hit.entity;
        Self {
            id: c_string(&waypoint.id),
            name: c_string(&waypoint.name),
            kind: c_string(waypoint.kind.as_str()),
            latitude: waypoint.coordinate.latitude(),
            longitude: waypoint.coordinate.longitude(),
            distance_nm: hit.distance_nm,
        }
    }
}

impl AeroBaseWaypoint {
    pub(crate) fn release(&mut self) {
        // SAFETY: every field was produced by `c_string` or is null.
        unsafe {
            free_c_string(&mut self.id);
            free_c_string(&mut self.name);
            free_c_string(&mut self.kind);
        }
    }
}

impl From<Device> for AeroBaseDevice {
    fn from(device: Device) -> Self {
        Self {
            id: c_string(&device.id),
            fingerprint: c_string(&device.fingerprint),
            hardware_info: c_string_opt(device.hardware_info.as_deref()),
            created_at: device.created_at,
            last_seen: device.last_seen,
        }
    }
}

impl AeroBaseDevice {
    pub(crate) fn release(&mut self) {
        // SAFETY: every field was produced by `c_string` or is null.
        unsafe {
            free_c_string(&mut self.id);
            free_c_string(&mut self.fingerprint);
            free_c_string(&mut self.hardware_info);
        }
    }
}

impl AeroBaseFlightPlan {
    /// Copy the caller's plan into an owned [`FlightPlan`].
    ///
    /// # Safety
    /// Every string must be valid or, for `alternate`, null; `route` must
    /// point to `route_len` valid strings.
    pub(crate) unsafe fn to_plan(&self) -> Result<FlightPlan, AeroBaseError> {
        // SAFETY: guaranteed by the caller for every read below.
        let departure = unsafe { read_str(self.departure, "departure") }?;
        let destination = unsafe { read_str(self.destination, "destination") }?;
        let alternate = if self.alternate.is_null() {
            None
        } else {
            Some(unsafe { read_str(self.alternate, "alternate") }?)
        };
        let route = if self.route_len == 0 {
            Vec::new()
        } else if self.route.is_null() {
            return Err(AeroBaseError::invalid_input("route is null"));
        } else {
            let ids = unsafe { std::slice::from_raw_parts(self.route, self.route_len) };
            ids.iter()
                .map(|&id| unsafe { read_str(id, "route waypoint") })
                .collect::<Result<_, _>>()?
        };
        Ok(FlightPlan {
            departure,
            destination,
            alternate,
            cruise_altitude_ft: self.cruise_altitude_ft,
            cruise_speed_kt: self.cruise_speed_kt,
            route,
        })
    }
}

impl From<&RouteLeg> for AeroBaseRouteLeg {
    fn from(leg: &RouteLeg) -> Self {
        Self {
            id: c_string(&leg.id),
            latitude: leg.coordinate.latitude(),
            longitude: leg.coordinate.longitude(),
            distance_from_previous_nm: leg.distance_from_previous_nm,
            cumulative_distance_nm: leg.cumulative_distance_nm,
            minutes_from_departure: leg.minutes_from_departure,
        }
    }
}

impl From<&FlightRoute> for AeroBaseFlightRoute {
    fn from(route: &FlightRoute) -> Self {
        let legs = route.legs().iter().map(AeroBaseRouteLeg::from).collect();
        let (legs, legs_len) = leak_slice(legs);
        Self {
            total_distance_nm: route.total_distance(),
            estimated_time_min: route.estimated_time(),
            legs,
            legs_len,
        }
    }
}

impl AeroBaseFlightRoute {
    pub(crate) fn release(&mut self) {
        // SAFETY: `legs` came from `leak_slice` in `From<&FlightRoute>`.
        let legs = unsafe { reclaim_slice(self.legs, self.legs_len) };
        for mut leg in legs {
            // SAFETY: `id` was produced by `c_string`.
            unsafe { free_c_string(&mut leg.id) };
        }
        self.legs = ptr::null_mut();
        self.legs_len = 0;
    }
}
