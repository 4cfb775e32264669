//! Fuel planning for a computed route.

use super::FlightRoute;
use crate::error::AeroBaseError;

/// Final reserve, in minutes at the planned fuel flow.
pub const RESERVE_MINUTES: u32 = 45;

/// Taxi allowance as a fraction of trip fuel.
pub const TAXI_ALLOWANCE: f64 = 0.05;

/// Fuel required for a route, in the units of the supplied flow.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FuelEstimate {
    /// Fuel burned en route.
    pub trip: f64,
    /// Final reserve.
    pub reserve: f64,
    /// Taxi allowance.
    pub taxi: f64,
    /// Sum of the above.
    pub total: f64,
}

impl FuelEstimate {
    /// Estimate fuel for `route` at `fuel_flow_per_hour`.
    ///
    /// # Errors
    /// Returns [`AeroBaseError::InvalidInput`] when the flow is not a
    /// positive finite number.
    ///
    /// # Examples
    /// ```
    /// # use aerobase_core::FuelEstimate;
    /// # fn check(route: &aerobase_core::FlightRoute) -> Result<(), aerobase_core::AeroBaseError> {
    /// let fuel = FuelEstimate::for_route(route, 2_400.0)?;
    /// assert!(fuel.total > fuel.trip);
    /// # Ok(())
    /// # }
    /// ```
    pub fn for_route(route: &FlightRoute, fuel_flow_per_hour: f64) -> Result<Self, AeroBaseError> {
        if !fuel_flow_per_hour.is_finite() || fuel_flow_per_hour <= 0.0 {
            return Err(AeroBaseError::invalid_input(format!(
                "fuel flow {fuel_flow_per_hour} must be positive"
            )));
        }
        let trip = f64::from(route.estimated_time()) / 60.0 * fuel_flow_per_hour;
        let reserve = f64::from(RESERVE_MINUTES) / 60.0 * fuel_flow_per_hour;
        let taxi = trip * TAXI_ALLOWANCE;
        Ok(Self {
            trip,
            reserve,
            taxi,
            total: trip + reserve + taxi,
        })
    }
}

/// Arrival time in unix seconds for a departure and an en-route time.
pub const fn eta(departure_unix: i64, minutes: u32) -> i64 {
    departure_unix.saturating_add(minutes as i64 * 60)
}
