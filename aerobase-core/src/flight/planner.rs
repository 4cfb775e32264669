//! Route computation over a validated plan.

use super::{FlightRoute, RouteLeg, ValidatedPlan, minutes_at};
use crate::{distance, model::Coordinate};

/// Compute the great-circle polyline departure → waypoints → destination.
///
/// The alternate is not flown. Each leg records its distance from the
/// previous point, the running total, the initial true course and the
/// elapsed minutes at cruise speed.
pub fn calculate_route(validated: &ValidatedPlan) -> FlightRoute {
    let plan = validated.plan();
    let speed = plan.cruise_speed_kt;

    let departure = validated.departure();
    let destination = validated.destination();
    let points = std::iter::once((&departure.icao, &departure.name, departure.coordinate))
        .chain(
            validated
                .waypoints()
                .iter()
                .map(|waypoint| (&waypoint.id, &waypoint.name, waypoint.coordinate)),
        )
        .chain(std::iter::once((
            &destination.icao,
            &destination.name,
            destination.coordinate,
        )));

    let mut legs: Vec<RouteLeg> = Vec::with_capacity(validated.waypoints().len() + 2);
    let mut previous: Option<Coordinate> = None;
    let mut cumulative = 0.0;
    for (id, name, coordinate) in points {
        let (distance, course) = previous.map_or((0.0, None), |from| {
            (
                distance::haversine_nm(from, coordinate),
                Some(distance::initial_course_deg(from, coordinate)),
            )
        });
        cumulative += distance;
        legs.push(RouteLeg {
            id: id.clone(),
            name: name.clone(),
            coordinate,
            distance_from_previous_nm: distance,
            cumulative_distance_nm: cumulative,
            course_from_previous_deg: course,
            minutes_from_departure: minutes_at(cumulative, speed),
        });
        previous = Some(coordinate);
    }

    log::debug!(
        "route {} -> {}: {cumulative:.1} nm over {} legs",
        departure.icao,
        destination.icao,
        legs.len().saturating_sub(1)
    );

    FlightRoute {
        plan: plan.clone(),
        total_distance: cumulative,
        estimated_time: minutes_at(cumulative, speed),
        legs,
    }
}
