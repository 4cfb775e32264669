//! Wind triangle helpers.
//!
//! Directions are true degrees the wind blows *from*; speeds are knots.

use super::FlightRoute;
use crate::error::AeroBaseError;

/// A steady wind.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wind {
    /// Direction the wind blows from, true degrees.
    pub direction_deg: f64,
    /// Wind speed in knots.
    pub speed_kt: f64,
}

impl Wind {
    /// Validates and constructs a [`Wind`].
    ///
    /// # Errors
    /// Returns [`AeroBaseError::InvalidInput`] for a non-finite direction or
    /// a speed that is negative or not finite.
    pub fn new(direction_deg: f64, speed_kt: f64) -> Result<Self, AeroBaseError> {
        if !direction_deg.is_finite() {
            return Err(AeroBaseError::invalid_input(format!(
                "wind direction {direction_deg} is not finite"
            )));
        }
        if !speed_kt.is_finite() || speed_kt < 0.0 {
            return Err(AeroBaseError::invalid_input(format!(
                "wind speed {speed_kt} must be zero or positive"
            )));
        }
        Ok(Self {
            direction_deg,
            speed_kt,
        })
    }

    fn relative_angle(self, true_course_deg: f64) -> f64 {
        (self.direction_deg - true_course_deg).to_radians()
    }
}

/// Heading correction in degrees needed to hold `true_course_deg`; positive
/// means turn right.
///
/// `None` when the crosswind component exceeds `true_airspeed_kt` or the
/// airspeed is not positive.
pub fn wind_correction_angle(
    wind: Wind,
    true_course_deg: f64,
    true_airspeed_kt: f64,
) -> Option<f64> {
    if true_airspeed_kt.is_nan() || true_airspeed_kt <= 0.0 {
        return None;
    }
    let ratio = wind.speed_kt * wind.relative_angle(true_course_deg).sin() / true_airspeed_kt;
    (ratio.abs() <= 1.0).then(|| ratio.asin().to_degrees())
}

/// Ground speed along `true_course_deg`: the airspeed less the headwind
/// component.
pub fn ground_speed(wind: Wind, true_course_deg: f64, true_airspeed_kt: f64) -> f64 {
    true_airspeed_kt - wind.speed_kt * wind.relative_angle(true_course_deg).cos()
}

/// En-route minutes for `route` flown at `true_airspeed_kt` in `wind`,
/// rounded half up.
///
/// Each leg uses the ground speed along its own initial course.
///
/// # Errors
/// Returns [`AeroBaseError::InvalidInput`] when the airspeed is not positive
/// or the wind stops the aircraft on some leg.
pub fn wind_adjusted_minutes(
    route: &FlightRoute,
    true_airspeed_kt: f64,
    wind: Wind,
) -> Result<u32, AeroBaseError> {
    if !true_airspeed_kt.is_finite() || true_airspeed_kt <= 0.0 {
        return Err(AeroBaseError::invalid_input(format!(
            "true airspeed {true_airspeed_kt} must be positive"
        )));
    }
    let mut hours = 0.0;
    for leg in route.legs() {
        let Some(course) = leg.course_from_previous_deg else {
            continue;
        };
        let speed = ground_speed(wind, course, true_airspeed_kt);
        if speed <= 0.0 {
            return Err(AeroBaseError::invalid_input(format!(
                "ground speed on the leg to {} is {speed:.1} kt",
                leg.id
            )));
        }
        hours += leg.distance_from_previous_nm / speed;
    }
    // `as` saturates; the guard above keeps this finite and non-negative.
    Ok((hours * 60.0).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::{FlightPlan, RouteLeg};
    use crate::model::Coordinate;
    use rstest::rstest;

    fn calm() -> Wind {
        Wind::new(0.0, 0.0).expect("wind")
    }

    fn northbound(distance_nm: f64) -> FlightRoute {
        let leg = |id: &str, lat: f64, distance: f64, course: Option<f64>| RouteLeg {
            id: id.into(),
            name: id.into(),
            coordinate: Coordinate::new(lat, 0.0).expect("coordinate"),
            distance_from_previous_nm: distance,
            cumulative_distance_nm: distance,
            course_from_previous_deg: course,
            minutes_from_departure: 0,
        };
        FlightRoute {
            plan: FlightPlan {
                departure: "AAAA".into(),
                destination: "BBBB".into(),
                alternate: None,
                cruise_altitude_ft: 30_000,
                cruise_speed_kt: 200,
                route: Vec::new(),
            },
            total_distance: distance_nm,
            estimated_time: 0,
            legs: vec![
                leg("AAAA", 0.0, 0.0, None),
                leg("BBBB", 1.0, distance_nm, Some(0.0)),
            ],
        }
    }

    #[rstest]
    #[case(180.0, 220.0)]
    #[case(0.0, 180.0)]
    #[case(90.0, 200.0)]
    fn ground_speed_adds_the_tailwind(#[case] from: f64, #[case] expected: f64) {
        let wind = Wind::new(from, 20.0).expect("wind");
        assert!((ground_speed(wind, 0.0, 200.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn crosswind_from_the_right_needs_a_right_correction() {
        let wind = Wind::new(90.0, 20.0).expect("wind");
        let angle = wind_correction_angle(wind, 0.0, 200.0).expect("solvable");
        assert!((angle - 0.1_f64.asin().to_degrees()).abs() < 1e-9);
        assert!(angle > 0.0);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-10.0)]
    #[case(f64::NAN)]
    fn correction_needs_airspeed(#[case] airspeed: f64) {
        assert_eq!(wind_correction_angle(calm(), 0.0, airspeed), None);
    }

    #[test]
    fn overpowering_crosswind_has_no_correction() {
        let wind = Wind::new(270.0, 300.0).expect("wind");
        assert_eq!(wind_correction_angle(wind, 0.0, 200.0), None);
    }

    #[rstest]
    #[case(Wind::new(0.0, 0.0), 60)]
    #[case(Wind::new(180.0, 50.0), 48)]
    #[case(Wind::new(0.0, 50.0), 80)]
    fn wind_changes_the_time_en_route(
        #[case] wind: Result<Wind, AeroBaseError>,
        #[case] minutes: u32,
    ) {
        let route = northbound(200.0);
        let wind = wind.expect("wind");
        assert_eq!(
            wind_adjusted_minutes(&route, 200.0, wind).expect("minutes"),
            minutes
        );
    }

    #[test]
    fn headwind_stronger_than_airspeed_is_rejected() {
        let wind = Wind::new(0.0, 250.0).expect("wind");
        let err = wind_adjusted_minutes(&northbound(100.0), 200.0, wind).expect_err("stalled");
        assert!(matches!(err, AeroBaseError::InvalidInput { .. }));
    }

    #[rstest]
    #[case(f64::NAN, 10.0)]
    #[case(90.0, -1.0)]
    #[case(90.0, f64::INFINITY)]
    fn wind_rejects_unusable_values(#[case] direction: f64, #[case] speed: f64) {
        assert!(Wind::new(direction, speed).is_err());
    }
}
