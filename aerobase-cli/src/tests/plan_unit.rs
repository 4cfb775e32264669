//! Focused unit tests covering plan loading and the `validate`/`route`
//! commands.

use super::helpers::{Workspace, output_json, plan, write_utf8};
use super::*;
use crate::plan::{
    PlanConfig, RouteArgs, ValidateArgs, load_plan, route_config_from_layers_for_test,
    run_route_with, run_validate_with,
};
use aerobase_core::ErrorKind;
use rstest::{fixture, rstest};

#[fixture]
fn seeded() -> Workspace {
    Workspace::seeded()
}

fn route_args(workspace: &Workspace, plan_path: Utf8PathBuf) -> RouteArgs {
    RouteArgs {
        plan_path: Some(plan_path),
        db_path: Some(workspace.db_path.clone()),
        ..RouteArgs::default()
    }
}

#[rstest]
fn validate_without_plan_errors() {
    match PlanConfig::try_from(ValidateArgs::default()) {
        Err(CliError::MissingArgument { field, env }) => {
            assert_eq!(field, ARG_PLAN);
            assert_eq!(env, ENV_VALIDATE_PLAN);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn route_without_plan_names_its_own_variable() {
    match PlanConfig::try_from(RouteArgs::default()) {
        Err(CliError::MissingArgument { env, .. }) => assert_eq!(env, ENV_ROUTE_PLAN),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn load_plan_decodes_json_with_optional_fields_omitted() {
    let workspace = Workspace::new();
    let path = workspace.root.join("plan.json");
    write_utf8(
        &path,
        b"{\"departure\":\"ZBAA\",\"destination\":\"ZSSS\",\
          \"cruise_altitude_ft\":35000,\"cruise_speed_kt\":450}",
    );

    let decoded = load_plan(&path).expect("plan should decode");
    assert_eq!(decoded, plan("ZBAA", "ZSSS", &[]));
}

#[rstest]
fn load_plan_rejects_invalid_json() {
    let workspace = Workspace::new();
    let path = workspace.root.join("plan.json");
    write_utf8(&path, b"{ not valid json");

    match load_plan(&path) {
        Err(CliError::ParseInput { field, path: reported, .. }) => {
            assert_eq!(field, ARG_PLAN);
            assert_eq!(reported, path);
        }
        other => panic!("expected ParseInput, found {other:?}"),
    }
}

#[rstest]
fn load_plan_io_error_returns_open_error() {
    let workspace = Workspace::new();
    let path = workspace.root.join("missing.json");

    match load_plan(&path) {
        Err(CliError::OpenInput { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected OpenInput, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "fuel_flow": "plenty" }));

    match route_config_from_layers_for_test(composer.layers()) {
        Err(CliError::Configuration(_)) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "db_path": "/from-file/aerobase.db",
            "fuel_flow": 900.0,
            "departure_time": 1_700_000_000,
        }),
        None,
    );
    composer.push_environment(json!({
        "plan_path": "/from-env/plan.json",
        "db_path": "/from-env/aerobase.db",
    }));
    composer.push_cli(json!({ "fuel_flow": 1200.0 }));

    let config =
        route_config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.plan_path, Utf8PathBuf::from("/from-env/plan.json"));
    assert_eq!(config.db_path, Utf8PathBuf::from("/from-env/aerobase.db"));
    assert_eq!(config.fuel_flow, Some(1200.0));
    assert_eq!(config.departure_time, Some(1_700_000_000));
}

#[rstest]
fn validate_prints_resolved_references(#[from(seeded)] workspace: Workspace) {
    let plan_path = workspace.write_plan(&plan("zbaa", "ZSSS", &["WP001", "WP002"]));
    let args = ValidateArgs {
        plan_path: Some(plan_path),
        db_path: Some(workspace.db_path.clone()),
    };
    let mut out = Vec::new();
    run_validate_with(args, &mut out).expect("plan should validate");

    let report = output_json(&out);
    assert_eq!(report["valid"], true);
    assert_eq!(report["departure"]["icao"], "ZBAA");
    assert_eq!(report["destination"]["icao"], "ZSSS");
    assert!(report["alternate"].is_null());
    assert_eq!(report["waypoints"][1]["name"], "BRAVO");
}

#[rstest]
#[case::same_airport(plan("ZBAA", "zbaa", &[]), ErrorKind::InvalidInput)]
#[case::unknown_airport(plan("ZBAA", "KJFK", &[]), ErrorKind::NotFound)]
#[case::unknown_waypoint(plan("ZBAA", "ZSSS", &["WP404"]), ErrorKind::NotFound)]
fn validate_surfaces_engine_errors(
    #[from(seeded)] workspace: Workspace,
    #[case] flight_plan: aerobase_core::FlightPlan,
    #[case] expected: ErrorKind,
) {
    let args = ValidateArgs {
        plan_path: Some(workspace.write_plan(&flight_plan)),
        db_path: Some(workspace.db_path.clone()),
    };
    let err = run_validate_with(args, &mut Vec::new()).expect_err("plan should be rejected");
    let kind = err.engine_error().map(aerobase_core::AeroBaseError::kind);
    assert_eq!(kind, Some(expected));
}

#[rstest]
fn route_without_extras_omits_fuel_and_arrival(#[from(seeded)] workspace: Workspace) {
    let plan_path = workspace.write_plan(&plan("ZBAA", "ZSSS", &[]));
    let mut out = Vec::new();
    run_route_with(route_args(&workspace, plan_path), &mut out).expect("route");

    let report = output_json(&out);
    assert_eq!(report["route"]["estimated_time"], 78);
    assert_eq!(report["route"]["legs"].as_array().map(Vec::len), Some(2));
    assert!(report.get("fuel").is_none());
    assert!(report.get("arrival_time").is_none());
}

#[rstest]
fn route_with_fuel_flow_and_departure_time(#[from(seeded)] workspace: Workspace) {
    let plan_path = workspace.write_plan(&plan("ZBAA", "ZSSS", &["WP001", "WP002"]));
    let args = RouteArgs {
        fuel_flow: Some(1_000.0),
        departure_time: Some(1_700_000_000),
        ..route_args(&workspace, plan_path)
    };
    let mut out = Vec::new();
    run_route_with(args, &mut out).expect("route");

    let report = output_json(&out);
    let total_distance = report["route"]["total_distance"].as_f64().expect("distance");
    assert!((total_distance - 581.54).abs() < 0.05);
    assert_eq!(report["route"]["estimated_time"], 78);
    assert_eq!(report["route"]["legs"].as_array().map(Vec::len), Some(4));

    let fuel = &report["fuel"];
    let figure = |name: &str| fuel[name].as_f64().expect("fuel figure");
    assert!((figure("trip") - 1_300.0).abs() < 1e-6);
    assert!((figure("reserve") - 750.0).abs() < 1e-6);
    assert!((figure("taxi") - 65.0).abs() < 1e-6);
    assert!((figure("total") - 2_115.0).abs() < 1e-6);
    assert_eq!(report["arrival_time"], 1_700_000_000_i64 + 78 * 60);
}

#[rstest]
fn route_rejects_non_positive_fuel_flow(#[from(seeded)] workspace: Workspace) {
    let plan_path = workspace.write_plan(&plan("ZBAA", "ZSSS", &[]));
    let args = RouteArgs {
        fuel_flow: Some(0.0),
        ..route_args(&workspace, plan_path)
    };
    let err = run_route_with(args, &mut Vec::new()).expect_err("zero flow");
    let kind = err.engine_error().map(aerobase_core::AeroBaseError::kind);
    assert_eq!(kind, Some(ErrorKind::InvalidInput));
}

#[rstest]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
fn route_rejects_non_finite_fuel_flow(#[from(seeded)] workspace: Workspace, #[case] flow: f64) {
    let plan_path = workspace.write_plan(&plan("ZBAA", "ZSSS", &[]));
    let args = RouteArgs {
        fuel_flow: Some(flow),
        ..route_args(&workspace, plan_path)
    };
    let err = run_route_with(args, &mut Vec::new()).expect_err("non-finite flow");
    let kind = err.engine_error().map(aerobase_core::AeroBaseError::kind);
    assert_eq!(kind, Some(ErrorKind::InvalidInput));
}
