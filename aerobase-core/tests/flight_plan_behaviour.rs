//! Behavioural tests for plan validation and route computation against a
//! SQLite-backed engine.

use aerobase_core::{
    AeroBase, AeroBaseError, Airport, Airway, AirwayKind, AirwaySegment, Config, Coordinate,
    ErrorKind, FlightPlanBuilder, FlightRoute, SqliteStore, Waypoint, WaypointKind,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

type Engine = Option<(TempDir, AeroBase<SqliteStore>)>;
type Outcome = Option<Result<FlightRoute, AeroBaseError>>;

fn coordinate(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).expect("valid coordinate")
}

#[fixture]
fn engine() -> RefCell<Engine> {
    RefCell::new(None)
}

#[fixture]
fn plan() -> RefCell<FlightPlanBuilder> {
    RefCell::new(FlightPlanBuilder::new())
}

#[fixture]
fn outcome() -> RefCell<Outcome> {
    RefCell::new(None)
}

#[given("an engine seeded with Beijing and Shanghai")]
fn given_engine(#[from(engine)] engine: &RefCell<Engine>) {
    let dir = TempDir::new().expect("temp dir");
    let config = Config {
        db_path: dir.path().join("aerobase.db"),
        ..Config::default()
    };
    let base = AeroBase::open(&config).expect("engine opens");
    base.upsert_airport(
        &Airport::new("AP001", "ZBAA", "Beijing Capital", coordinate(40.0801, 116.5846))
            .expect("airport"),
    )
    .expect("seed ZBAA");
    base.upsert_airport(
        &Airport::new("AP002", "ZSSS", "Shanghai Hongqiao", coordinate(31.1979, 121.3363))
            .expect("airport"),
    )
    .expect("seed ZSSS");
    base.upsert_waypoint(
        &Waypoint::new("WP001", "ALPHA", coordinate(37.5, 118.0), WaypointKind::Fix)
            .expect("waypoint"),
    )
    .expect("seed ALPHA");
    base.upsert_waypoint(
        &Waypoint::new("WP002", "BRAVO", coordinate(34.5, 119.8), WaypointKind::Fix)
            .expect("waypoint"),
    )
    .expect("seed BRAVO");
    base.upsert_airway(
        &Airway::new("AW001", "A1", AirwayKind::High)
            .expect("airway")
            .with_altitudes(Some(18_000), Some(45_000)),
    )
    .expect("seed A1");
    base.upsert_airway_segment(
        &AirwaySegment::new("SEG1", "AW001", "WP001", "WP002", 1).expect("segment"),
    )
    .expect("seed SEG1");
    *engine.borrow_mut() = Some((dir, base));
}

#[given("a plan from ZBAA to ZSSS at 35000 feet and 450 knots")]
fn given_direct_plan(#[from(plan)] plan: &RefCell<FlightPlanBuilder>) {
    *plan.borrow_mut() = FlightPlanBuilder::new()
        .departure("ZBAA")
        .destination("ZSSS")
        .cruise_altitude(35_000)
        .cruise_speed(450);
}

#[given("a plan from ZBAA back to ZBAA")]
fn given_circular_plan(#[from(plan)] plan: &RefCell<FlightPlanBuilder>) {
    *plan.borrow_mut() = FlightPlanBuilder::new()
        .departure("ZBAA")
        .destination("zbaa")
        .cruise_altitude(35_000)
        .cruise_speed(450);
}

#[given("the plan flies ALPHA then BRAVO at 12000 feet")]
fn given_low_airway_route(#[from(plan)] plan: &RefCell<FlightPlanBuilder>) {
    let builder = plan.replace(FlightPlanBuilder::new());
    *plan.borrow_mut() = builder
        .cruise_altitude(12_000)
        .waypoint("WP001")
        .waypoint("WP002");
}

#[given("the plan flies an unknown waypoint")]
fn given_unknown_waypoint(#[from(plan)] plan: &RefCell<FlightPlanBuilder>) {
    let builder = plan.replace(FlightPlanBuilder::new());
    *plan.borrow_mut() = builder.waypoint("WP404");
}

#[when("I calculate the route")]
fn when_calculate(
    #[from(engine)] engine: &RefCell<Engine>,
    #[from(plan)] plan: &RefCell<FlightPlanBuilder>,
    #[from(outcome)] outcome: &RefCell<Outcome>,
) {
    let engine = engine.borrow();
    let (_, base) = engine.as_ref().expect("engine seeded");
    let draft = plan.borrow().clone().build().expect("plan complete");
    *outcome.borrow_mut() = Some(base.calculate_route(&draft));
}

fn rejection(outcome: &RefCell<Outcome>) -> AeroBaseError {
    match outcome.replace(None).expect("route attempted") {
        Ok(route) => panic!("expected a rejection, got {route:?}"),
        Err(err) => err,
    }
}

#[then("the route covers about 581 nautical miles in 78 minutes")]
fn then_direct_route(#[from(outcome)] outcome: &RefCell<Outcome>) {
    let outcome = outcome.borrow();
    let route = outcome
        .as_ref()
        .expect("route attempted")
        .as_ref()
        .expect("route computed");
    assert!(
        (route.total_distance() - 581.27).abs() < 0.05,
        "unexpected distance {}",
        route.total_distance()
    );
    assert_eq!(route.estimated_time(), 78);
    assert_eq!(route.legs().len(), 2);
}

#[then("the plan is rejected on segment SEG1 of airway A1")]
fn then_airway_rejection(#[from(outcome)] outcome: &RefCell<Outcome>) {
    match rejection(outcome) {
        AeroBaseError::FlightPlanning {
            segment_id,
            airway,
            altitude_ft,
        } => {
            assert_eq!(segment_id, "SEG1");
            assert_eq!(airway, "A1");
            assert_eq!(altitude_ft, 12_000);
        }
        other => panic!("expected an airway restriction, got {other}"),
    }
}

#[then("the plan is rejected as invalid input")]
fn then_invalid(#[from(outcome)] outcome: &RefCell<Outcome>) {
    assert_eq!(rejection(outcome).kind(), ErrorKind::InvalidInput);
}

#[then("the plan is rejected because a reference was not found")]
fn then_not_found(#[from(outcome)] outcome: &RefCell<Outcome>) {
    assert_eq!(rejection(outcome).kind(), ErrorKind::NotFound);
}

#[scenario(path = "tests/features/flight_plan.feature", index = 0)]
fn scenario_direct_route(
    engine: RefCell<Engine>,
    plan: RefCell<FlightPlanBuilder>,
    outcome: RefCell<Outcome>,
) {
    let _ = (engine, plan, outcome);
}

#[scenario(path = "tests/features/flight_plan.feature", index = 1)]
fn scenario_airway_floor(
    engine: RefCell<Engine>,
    plan: RefCell<FlightPlanBuilder>,
    outcome: RefCell<Outcome>,
) {
    let _ = (engine, plan, outcome);
}

#[scenario(path = "tests/features/flight_plan.feature", index = 2)]
fn scenario_same_airport(
    engine: RefCell<Engine>,
    plan: RefCell<FlightPlanBuilder>,
    outcome: RefCell<Outcome>,
) {
    let _ = (engine, plan, outcome);
}

#[scenario(path = "tests/features/flight_plan.feature", index = 3)]
fn scenario_unknown_waypoint(
    engine: RefCell<Engine>,
    plan: RefCell<FlightPlanBuilder>,
    outcome: RefCell<Outcome>,
) {
    let _ = (engine, plan, outcome);
}
