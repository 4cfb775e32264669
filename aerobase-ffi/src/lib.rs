//! C ABI for the AeroBase engine.
//!
//! Engines live in a process-wide registry keyed by opaque `u64` handles, so
//! a call with a freed or forged handle fails with an error code instead of
//! touching freed memory. Every entry point:
//!
//! - clears the calling thread's last-error slot before doing anything;
//! - returns `0` on success or a negative [`ErrorKind`](aerobase_core::ErrorKind)
//!   code on failure, with the message available from [`aerobase_last_error`];
//! - catches panics and reports them as `-99`.
//!
//! Memory handed to the caller is released only through the matching
//! `aerobase_free_*` function. See `include/aerobase.h` for the C view.

use std::{
    collections::HashMap,
    ffi::{c_char, c_int},
    sync::{Arc, LazyLock, Mutex, MutexGuard},
};

use aerobase_core::{AeroBase, AeroBaseError, Coordinate, SqliteStore, StaticIdentityProvider};

mod error;
mod types;

pub use types::{
    AeroBaseAirport, AeroBaseConfig, AeroBaseCoordinate, AeroBaseDevice, AeroBaseFlightPlan,
    AeroBaseFlightRoute, AeroBaseRouteLeg, AeroBaseWaypoint,
};
use types::{leak_slice, reclaim_slice};

type Engine = AeroBase<SqliteStore>;

#[derive(Default)]
struct Registry {
    last_handle: u64,
    engines: HashMap<u64, Arc<Engine>>,
}

static REGISTRY: LazyLock<Mutex<Registry>> = LazyLock::new(|| Mutex::new(Registry::default()));

fn registry() -> Result<MutexGuard<'static, Registry>, AeroBaseError> {
    REGISTRY
        .lock()
        .map_err(|_| AeroBaseError::Poisoned { what: "handle registry" })
}

fn register(engine: Engine) -> Result<u64, AeroBaseError> {
    let mut registry = registry()?;
    registry.last_handle = registry.last_handle.checked_add(1).ok_or_else(|| {
        AeroBaseError::Unknown {
            reason: "handle space exhausted".into(),
        }
    })?;
    let handle = registry.last_handle;
    registry.engines.insert(handle, Arc::new(engine));
    Ok(handle)
}

/// Resolve `handle`; the registry lock is released before the engine is used.
fn engine(handle: u64) -> Result<Arc<Engine>, AeroBaseError> {
    registry()?
        .engines
        .get(&handle)
        .cloned()
        .ok_or_else(|| AeroBaseError::invalid_input(format!("unknown handle {handle}")))
}

fn require_out<T>(out: *mut T, field: &'static str) -> Result<(), AeroBaseError> {
    if out.is_null() {
        Err(AeroBaseError::invalid_input(format!("{field} is null")))
    } else {
        Ok(())
    }
}

/// Open an engine and return its handle, or `0` on failure.
///
/// # Safety
/// `config` must be null or point to a valid [`AeroBaseConfig`] whose
/// strings are null or NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_new(config: *const AeroBaseConfig) -> u64 {
    error::guard(
        |_| 0,
        || {
            // SAFETY: guaranteed by the caller.
            let raw = unsafe { config.as_ref() }
                .ok_or_else(|| AeroBaseError::invalid_input("config is null"))?;
            // SAFETY: guaranteed by the caller.
            let (config, fingerprint) = unsafe { raw.to_config() }?;
            let mut engine = AeroBase::open(&config)?;
            if let Some(fingerprint) = fingerprint {
                engine = engine.with_identity_provider(StaticIdentityProvider::new(fingerprint));
            }
            let handle = register(engine)?;
            log::info!("opened {} as handle {handle}", config.db_path.display());
            Ok(handle)
        },
    )
}

/// Release the engine behind `handle`. Later calls with the handle fail.
#[unsafe(no_mangle)]
pub extern "C" fn aerobase_free(handle: u64) -> c_int {
    error::status(|| {
        registry()?
            .engines
            .remove(&handle)
            .map(drop)
            .ok_or_else(|| AeroBaseError::invalid_input(format!("unknown handle {handle}")))
    })
}

/// Fetch or register this installation's device record.
///
/// # Safety
/// `out` must point to writable memory for one [`AeroBaseDevice`]. Release
/// it with [`aerobase_free_device`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_get_device_identity(
    handle: u64,
    out: *mut AeroBaseDevice,
) -> c_int {
    error::status(|| {
        require_out(out, "device")?;
        let device = engine(handle)?.get_or_create_device_identity()?;
        // SAFETY: `out` is non-null and writable per the caller.
        unsafe { out.write(AeroBaseDevice::from(device)) };
        Ok(())
    })
}

/// Release the strings inside `device` and null them. Safe to repeat.
///
/// # Safety
/// `device` must be null or point to a device filled by
/// [`aerobase_get_device_identity`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_free_device(device: *mut AeroBaseDevice) {
    // SAFETY: guaranteed by the caller.
    if let Some(device) = unsafe { device.as_mut() } {
        device.release();
    }
}

/// Airports within `radius_nm` of `center`, nearest first.
///
/// On success `*out` holds `*out_len` airports, or null when none matched.
///
/// # Safety
/// `out` and `out_len` must be valid for writes. Release the array with
/// [`aerobase_free_airports`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_find_airports_within(
    handle: u64,
    center: AeroBaseCoordinate,
    radius_nm: f64,
    out: *mut *mut AeroBaseAirport,
    out_len: *mut usize,
) -> c_int {
    error::status(|| {
        require_out(out, "out")?;
        require_out(out_len, "out_len")?;
        let hits =
            engine(handle)?.find_airports_within(Coordinate::try_from(center)?, radius_nm)?;
        let (items, len) = leak_slice(hits.into_iter().map(AeroBaseAirport::from).collect());
        // SAFETY: both pointers are non-null and writable per the caller.
        unsafe {
            out.write(items);
            out_len.write(len);
        }
        Ok(())
    })
}

/// Release an array from [`aerobase_find_airports_within`].
///
/// # Safety
/// `airports` and `len` must be exactly what the query returned, and the
/// array must not have been freed already.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_free_airports(airports: *mut AeroBaseAirport, len: usize) {
    // SAFETY: guaranteed by the caller.
    for mut airport in unsafe { reclaim_slice(airports, len) } {
        airport.release();
    }
}

/// Waypoints within `radius_nm` of `center`, nearest first.
///
/// # Safety
/// As for [`aerobase_find_airports_within`]; release the array with
/// [`aerobase_free_waypoints`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_find_waypoints_within(
    handle: u64,
    center: AeroBaseCoordinate,
    radius_nm: f64,
    out: *mut *mut AeroBaseWaypoint,
    out_len: *mut usize,
) -> c_int {
    error::status(|| {
        require_out(out, "out")?;
        require_out(out_len, "out_len")?;
        let hits =
            engine(handle)?.find_waypoints_within(Coordinate::try_from(center)?, radius_nm)?;
        let (items, len) = leak_slice(hits.into_iter().map(AeroBaseWaypoint::from).collect());
        // SAFETY: both pointers are non-null and writable per the caller.
        unsafe {
            out.write(items);
            out_len.write(len);
        }
        Ok(())
    })
}

/// Release an array from [`aerobase_find_waypoints_within`].
///
/// # Safety
/// As for [`aerobase_free_airports`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_free_waypoints(waypoints: *mut AeroBaseWaypoint, len: usize) {
    // SAFETY: guaranteed by the caller.
    for mut waypoint in unsafe { reclaim_slice(waypoints, len) } {
        waypoint.release();
    }
}

/// Validate a plan without computing its route.
///
/// # Safety
/// `plan` must point to a valid [`AeroBaseFlightPlan`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_validate_flight_plan(
    handle: u64,
    plan: *const AeroBaseFlightPlan,
) -> c_int {
    error::status(|| {
        // SAFETY: guaranteed by the caller.
        let raw = unsafe { plan.as_ref() }
            .ok_or_else(|| AeroBaseError::invalid_input("plan is null"))?;
        // SAFETY: guaranteed by the caller.
        let plan = unsafe { raw.to_plan() }?;
        engine(handle)?.validate_flight_plan(&plan).map(drop)
    })
}

/// Validate a plan and compute its route into `out`.
///
/// # Safety
/// `plan` must point to a valid [`AeroBaseFlightPlan`] and `out` must be
/// writable. Release the route with [`aerobase_free_route`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_calculate_route(
    handle: u64,
    plan: *const AeroBaseFlightPlan,
    out: *mut AeroBaseFlightRoute,
) -> c_int {
    error::status(|| {
        require_out(out, "route")?;
        // SAFETY: guaranteed by the caller.
        let raw = unsafe { plan.as_ref() }
            .ok_or_else(|| AeroBaseError::invalid_input("plan is null"))?;
        // SAFETY: guaranteed by the caller.
        let plan = unsafe { raw.to_plan() }?;
        let route = engine(handle)?.calculate_route(&plan)?;
        // SAFETY: `out` is non-null and writable per the caller.
        unsafe { out.write(AeroBaseFlightRoute::from(&route)) };
        Ok(())
    })
}

/// Release the legs of a route and null them. Safe to repeat.
///
/// # Safety
/// `route` must be null or point to a route filled by
/// [`aerobase_calculate_route`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aerobase_free_route(route: *mut AeroBaseFlightRoute) {
    // SAFETY: guaranteed by the caller.
    if let Some(route) = unsafe { route.as_mut() } {
        route.release();
    }
}

/// Message describing the calling thread's most recent failure, or null.
///
/// The pointer stays valid until the thread's next boundary call.
#[unsafe(no_mangle)]
pub extern "C" fn aerobase_last_error() -> *const c_char {
    error::last_error_ptr()
}

/// Code of the calling thread's most recent failure, or `0`.
#[unsafe(no_mangle)]
pub extern "C" fn aerobase_last_error_code() -> c_int {
    error::last_error_code()
}
