//! Flight plans, their validation, and route computation.
//!
//! A plan moves through three states, each with its own type:
//!
//! 1. [`FlightPlan`] is a draft as supplied by the caller.
//! 2. [`ValidatedPlan`] is produced only by [`validate`], with every
//!    reference resolved against the store.
//! 3. [`FlightRoute`] is produced only by [`calculate_route`] from a
//!    validated plan.
//!
//! A rejected plan is simply the `Err` returned by [`validate`].
//!
//! # Examples
//! ```
//! use aerobase_core::{
//!     Airport, Coordinate, FlightPlanBuilder, MemoryStore, Navaid, PlanLimits, Waypoint,
//!     calculate_route, validate,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::with_records(
//!     [
//!         Airport::new("AP001", "ZBAA", "Beijing", Coordinate::new(40.0801, 116.5846)?)?,
//!         Airport::new("AP002", "ZSSS", "Shanghai", Coordinate::new(31.1434, 121.8052)?)?,
//!     ],
//!     Vec::<Waypoint>::new(),
//!     Vec::<Navaid>::new(),
//! )?;
//! let plan = FlightPlanBuilder::new()
//!     .departure("ZBAA")
//!     .destination("ZSSS")
//!     .cruise_altitude(35_000)
//!     .cruise_speed(450)
//!     .build()?;
//!
//! let validated = validate(&plan, &store, &PlanLimits::default())?;
//! let route = calculate_route(&validated);
//! assert!(route.total_distance() > 500.0);
//! assert_eq!(route.legs().len(), 2);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

use crate::model::Coordinate;

mod fuel;
mod planner;
mod validator;
mod wind;

pub use fuel::{FuelEstimate, RESERVE_MINUTES, TAXI_ALLOWANCE, eta};
pub use planner::calculate_route;
pub use validator::{PlanLimits, ValidatedPlan, validate};
pub use wind::{Wind, ground_speed, wind_adjusted_minutes, wind_correction_angle};

/// A draft flight plan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightPlan {
    /// Departure ICAO code.
    pub departure: String,
    /// Destination ICAO code.
    pub destination: String,
    /// Alternate ICAO code.
    #[cfg_attr(feature = "serde", serde(default))]
    pub alternate: Option<String>,
    /// Cruise altitude in feet.
    pub cruise_altitude_ft: i32,
    /// Cruise true airspeed in knots.
    pub cruise_speed_kt: i32,
    /// Waypoint identifiers in flight order; duplicates are allowed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub route: Vec<String>,
}

/// Errors raised by [`FlightPlanBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanBuildError {
    /// A required field was never set.
    #[error("flight plan is missing its {field}")]
    Missing {
        /// Name of the missing field.
        field: &'static str,
    },
}

/// Incremental constructor for [`FlightPlan`].
#[derive(Debug, Clone, Default)]
pub struct FlightPlanBuilder {
    departure: Option<String>,
    destination: Option<String>,
    alternate: Option<String>,
    cruise_altitude_ft: Option<i32>,
    cruise_speed_kt: Option<i32>,
    route: Vec<String>,
}

impl FlightPlanBuilder {
    /// Start an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the departure ICAO code.
    #[must_use]
    pub fn departure(mut self, icao: impl Into<String>) -> Self {
        self.departure = Some(icao.into());
        self
    }

    /// Set the destination ICAO code.
    #[must_use]
    pub fn destination(mut self, icao: impl Into<String>) -> Self {
        self.destination = Some(icao.into());
        self
    }

    /// Set the alternate ICAO code.
    #[must_use]
    pub fn alternate(mut self, icao: impl Into<String>) -> Self {
        self.alternate = Some(icao.into());
        self
    }

    /// Set the cruise altitude in feet.
    #[must_use]
    pub const fn cruise_altitude(mut self, feet: i32) -> Self {
        self.cruise_altitude_ft = Some(feet);
        self
    }

    /// Set the cruise speed in knots.
    #[must_use]
    pub const fn cruise_speed(mut self, knots: i32) -> Self {
        self.cruise_speed_kt = Some(knots);
        self
    }

    /// Append a waypoint to the route.
    #[must_use]
    pub fn waypoint(mut self, id: impl Into<String>) -> Self {
        self.route.push(id.into());
        self
    }

    /// Finish the plan.
    ///
    /// # Errors
    /// Returns [`PlanBuildError::Missing`] for the first unset required field.
    pub fn build(self) -> Result<FlightPlan, PlanBuildError> {
        let missing = |field| PlanBuildError::Missing { field };
        Ok(FlightPlan {
            departure: self.departure.ok_or_else(|| missing("departure"))?,
            destination: self.destination.ok_or_else(|| missing("destination"))?,
            alternate: self.alternate,
            cruise_altitude_ft: self
                .cruise_altitude_ft
                .ok_or_else(|| missing("cruise altitude"))?,
            cruise_speed_kt: self.cruise_speed_kt.ok_or_else(|| missing("cruise speed"))?,
            route: self.route,
        })
    }
}

/// One point of a computed route with its running totals.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteLeg {
    /// Airport ICAO code or waypoint id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Position.
    pub coordinate: Coordinate,
    /// Great-circle distance from the previous point.
    pub distance_from_previous_nm: f64,
    /// Distance flown from departure.
    pub cumulative_distance_nm: f64,
    /// Initial true course from the previous point; `None` at departure.
    pub course_from_previous_deg: Option<f64>,
    /// Minutes from departure at cruise speed, rounded half up.
    pub minutes_from_departure: u32,
}

/// A validated plan with its computed distance and time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FlightRoute {
    plan: FlightPlan,
    total_distance: f64,
    estimated_time: u32,
    legs: Vec<RouteLeg>,
}

impl FlightRoute {
    /// The plan the route was computed from.
    pub const fn plan(&self) -> &FlightPlan {
        &self.plan
    }

    /// Total great-circle distance in nautical miles.
    pub const fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Estimated en-route time in whole minutes.
    pub const fn estimated_time(&self) -> u32 {
        self.estimated_time
    }

    /// Every polyline point from departure to destination.
    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }
}

/// Whole minutes to fly `distance_nm` at `speed_kt`, rounded half up.
pub(crate) fn minutes_at(distance_nm: f64, speed_kt: i32) -> u32 {
    let minutes = (distance_nm / f64::from(speed_kt) * 60.0).round();
    // `as` saturates; validated speeds keep this finite and non-negative.
    minutes as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builder_collects_every_field() {
        let plan = FlightPlanBuilder::new()
            .departure("ZBAA")
            .destination("ZSSS")
            .alternate("ZSPD")
            .cruise_altitude(35_000)
            .cruise_speed(450)
            .waypoint("WP001")
            .waypoint("WP001")
            .build()
            .expect("complete plan");
        assert_eq!(plan.alternate.as_deref(), Some("ZSPD"));
        assert_eq!(plan.route, vec!["WP001", "WP001"]);
    }

    #[rstest]
    #[case(FlightPlanBuilder::new().destination("ZSSS").cruise_altitude(1).cruise_speed(1), "departure")]
    #[case(FlightPlanBuilder::new().departure("ZBAA").cruise_altitude(1).cruise_speed(1), "destination")]
    #[case(FlightPlanBuilder::new().departure("ZBAA").destination("ZSSS").cruise_speed(1), "cruise altitude")]
    #[case(FlightPlanBuilder::new().departure("ZBAA").destination("ZSSS").cruise_altitude(1), "cruise speed")]
    fn builder_reports_missing_field(
        #[case] builder: FlightPlanBuilder,
        #[case] field: &'static str,
    ) {
        assert_eq!(
            builder.build().expect_err("incomplete plan"),
            PlanBuildError::Missing { field }
        );
    }

    #[rstest]
    #[case(100.0, 200, 30)]
    #[case(7.5, 450, 1)]
    #[case(3.75, 450, 1)]
    #[case(3.7, 450, 0)]
    #[case(0.0, 120, 0)]
    fn minutes_round_half_up(#[case] distance: f64, #[case] speed: i32, #[case] expected: u32) {
        assert_eq!(minutes_at(distance, speed), expected);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn plan_deserialises_with_optional_fields_omitted() {
        let plan: FlightPlan = serde_json::from_str(
            r#"{"departure":"ZBAA","destination":"ZSSS","cruise_altitude_ft":35000,"cruise_speed_kt":450}"#,
        )
        .expect("valid JSON");
        assert!(plan.route.is_empty());
        assert!(plan.alternate.is_none());
    }
}
