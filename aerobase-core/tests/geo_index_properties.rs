//! Property tests for the geo-index, distance math and plan validation.

use aerobase_core::{
    Coordinate, ErrorKind, FlightPlanBuilder, GeoIndex, MemoryStore, PlanLimits, Waypoint,
    WaypointKind, distance::haversine_nm, validate,
};
use proptest::prelude::*;

fn coordinate() -> impl Strategy<Value = Coordinate> {
    (-90.0_f64..=90.0, -180.0_f64..=180.0)
        .prop_map(|(lat, lon)| Coordinate::new(lat, lon).expect("strategy stays in range"))
}

fn waypoints(max: usize) -> impl Strategy<Value = Vec<Waypoint>> {
    prop::collection::vec(coordinate(), 0..max).prop_map(|coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                Waypoint::new(format!("WP{i:04}"), "FIX", c, WaypointKind::Fix)
                    .expect("valid waypoint")
            })
            .collect()
    })
}

fn brute_force(points: &[Waypoint], center: Coordinate, radius_nm: f64) -> Vec<String> {
    let mut hits: Vec<(f64, String)> = points
        .iter()
        .map(|w| (haversine_nm(center, w.coordinate), w.id.clone()))
        .filter(|(d, _)| *d <= radius_nm)
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    hits.into_iter().map(|(_, id)| id).collect()
}

proptest! {
    #[test]
    fn radius_query_matches_brute_force(
        points in waypoints(120),
        center in coordinate(),
        radius in 1.0_f64..3_000.0,
    ) {
        let index = GeoIndex::build(points.clone()).expect("unique ids");
        let hits = index.find_within(center, radius);

        for pair in hits.windows(2) {
            prop_assert!(pair[0].distance_nm <= pair[1].distance_nm);
        }
        for hit in &hits {
            prop_assert!(hit.distance_nm <= radius);
        }
        let ids: Vec<String> = hits.iter().map(|h| h.entity.id.clone()).collect();
        prop_assert_eq!(ids, brute_force(&points, center, radius));
    }

    #[test]
    fn nearest_matches_brute_force(points in waypoints(120), center in coordinate()) {
        let index = GeoIndex::build(points.clone()).expect("unique ids");
        let expected = brute_force(&points, center, f64::INFINITY).into_iter().next();
        let found = index.find_nearest(center).map(|hit| hit.entity.id.clone());
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn results_ignore_insertion_order(
        points in waypoints(80),
        center in coordinate(),
        radius in 1.0_f64..5_000.0,
    ) {
        let forward = GeoIndex::build(points.clone()).expect("unique ids");
        let backward = GeoIndex::build(points.into_iter().rev()).expect("unique ids");

        let ids = |index: &GeoIndex<Waypoint>| -> Vec<String> {
            index
                .find_within(center, radius)
                .into_iter()
                .map(|hit| hit.entity.id.clone())
                .collect()
        };
        prop_assert_eq!(ids(&forward), ids(&backward));
        prop_assert_eq!(
            forward.find_nearest(center).map(|h| h.entity.id.clone()),
            backward.find_nearest(center).map(|h| h.entity.id.clone())
        );
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_identity(a in coordinate(), b in coordinate()) {
        prop_assert_eq!(haversine_nm(a, a), 0.0);
        prop_assert!((haversine_nm(a, b) - haversine_nm(b, a)).abs() < 1e-9);
        prop_assert!(haversine_nm(a, b) <= std::f64::consts::PI * 3440.065 + 1e-6);
    }

    #[test]
    fn identical_endpoints_are_always_invalid(
        code in "[A-Za-z0-9]{4}",
        altitude in any::<i32>(),
        speed in any::<i32>(),
    ) {
        let plan = FlightPlanBuilder::new()
            .departure(code.to_uppercase())
            .destination(code.to_lowercase())
            .cruise_altitude(altitude)
            .cruise_speed(speed)
            .build()
            .expect("complete plan");
        let err = validate(&plan, &MemoryStore::default(), &PlanLimits::default())
            .expect_err("same airport");
        prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
