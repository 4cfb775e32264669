//! Resolve a draft plan against the store and enforce the planning rules.

use super::FlightPlan;
use crate::{
    error::AeroBaseError,
    model::{Airport, Waypoint},
    store::ReferenceStore,
};

/// Numeric bounds applied to every plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlanLimits {
    /// Lowest permitted cruise altitude, inclusive.
    pub min_altitude_ft: i32,
    /// Highest permitted cruise altitude, inclusive.
    pub max_altitude_ft: i32,
    /// Highest permitted cruise speed, inclusive.
    pub max_cruise_speed_kt: i32,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            min_altitude_ft: 1_000,
            max_altitude_ft: 60_000,
            max_cruise_speed_kt: 1_000,
        }
    }
}

/// A plan whose every reference resolved and whose every rule held.
///
/// Only [`validate`] constructs this type, so holding one is proof of a
/// successful validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPlan {
    plan: FlightPlan,
    departure: Airport,
    destination: Airport,
    alternate: Option<Airport>,
    waypoints: Vec<Waypoint>,
}

impl ValidatedPlan {
    /// The plan as submitted.
    pub const fn plan(&self) -> &FlightPlan {
        &self.plan
    }

    /// Resolved departure airport.
    pub const fn departure(&self) -> &Airport {
        &self.departure
    }

    /// Resolved destination airport.
    pub const fn destination(&self) -> &Airport {
        &self.destination
    }

    /// Resolved alternate airport, when one was filed.
    pub const fn alternate(&self) -> Option<&Airport> {
        self.alternate.as_ref()
    }

    /// Resolved route waypoints in flight order, duplicates included.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

fn resolve_airport(
    store: &(impl ReferenceStore + ?Sized),
    icao: &str,
) -> Result<Airport, AeroBaseError> {
    store
        .airport_by_icao(icao)?
        .ok_or_else(|| AeroBaseError::not_found("airport", icao.trim()))
}

/// Check `plan` against the store and `limits`.
///
/// Rules run in a fixed order and the first failure is returned:
///
/// 1. departure and destination must differ (ignoring case);
/// 2. departure, destination and alternate must resolve by ICAO code;
/// 3. every route waypoint must resolve by id;
/// 4. altitude and speed must fall within `limits`;
/// 5. every airway segment joining consecutive waypoints must permit the
///    cruise altitude.
///
/// # Errors
/// [`AeroBaseError::InvalidInput`] for rules 1 and 4,
/// [`AeroBaseError::NotFound`] for unresolved references and
/// [`AeroBaseError::FlightPlanning`] for airway restrictions. Store failures
/// propagate as [`AeroBaseError::Database`].
pub fn validate(
    plan: &FlightPlan,
    store: &(impl ReferenceStore + ?Sized),
    limits: &PlanLimits,
) -> Result<ValidatedPlan, AeroBaseError> {
    if plan
        .departure
        .trim()
        .eq_ignore_ascii_case(plan.destination.trim())
    {
        return Err(AeroBaseError::invalid_input(
            "departure and destination must differ",
        ));
    }

    let departure = resolve_airport(store, &plan.departure)?;
    let destination = resolve_airport(store, &plan.destination)?;
    let alternate = plan
        .alternate
        .as_deref()
        .map(|icao| resolve_airport(store, icao))
        .transpose()?;

    let waypoints = plan
        .route
        .iter()
        .map(|id| {
            store
                .waypoint(id)?
                .ok_or_else(|| AeroBaseError::not_found("waypoint", id.as_str()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let altitude = plan.cruise_altitude_ft;
    if !(limits.min_altitude_ft..=limits.max_altitude_ft).contains(&altitude) {
        return Err(AeroBaseError::invalid_input(format!(
            "cruise altitude {altitude} ft outside {}..={} ft",
            limits.min_altitude_ft, limits.max_altitude_ft
        )));
    }
    let speed = plan.cruise_speed_kt;
    if speed <= 0 || speed > limits.max_cruise_speed_kt {
        return Err(AeroBaseError::invalid_input(format!(
            "cruise speed {speed} kt outside 1..={} kt",
            limits.max_cruise_speed_kt
        )));
    }

    for pair in plan.route.windows(2) {
        let [from, to] = pair else { continue };
        check_airways(store, from, to, altitude)?;
    }

    Ok(ValidatedPlan {
        plan: plan.clone(),
        departure,
        destination,
        alternate,
        waypoints,
    })
}

fn check_airways(
    store: &(impl ReferenceStore + ?Sized),
    from: &str,
    to: &str,
    altitude_ft: i32,
) -> Result<(), AeroBaseError> {
    for segment in store.segments_between(from, to)? {
        let airway = store
            .airway(&segment.airway_id)?
            .ok_or_else(|| AeroBaseError::not_found("airway", segment.airway_id.as_str()))?;
        if !airway.permits_altitude(altitude_ft) {
            log::debug!(
                "segment {} on airway {} rejects {altitude_ft} ft",
                segment.id,
                airway.name
            );
            return Err(AeroBaseError::FlightPlanning {
                segment_id: segment.id,
                airway: airway.name,
                altitude_ft,
            });
        }
    }
    Ok(())
}
