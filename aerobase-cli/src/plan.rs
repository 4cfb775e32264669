//! Flight-plan commands: `validate` and `route`.
//!
//! Both read a JSON-encoded [`FlightPlan`]:
//!
//! ```json
//! {
//!   "departure": "ZBAA",
//!   "destination": "ZSSS",
//!   "cruise_altitude_ft": 35000,
//!   "cruise_speed_kt": 450,
//!   "route": ["WP001", "WP002"]
//! }
//! ```

use std::io::Write;

use aerobase_core::{Airport, FlightPlan, FlightRoute, FuelEstimate, Waypoint, flight::eta};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DB_PATH, ARG_DEPARTURE_TIME, ARG_FUEL_FLOW, ARG_PLAN, CliError, ENV_ROUTE_PLAN,
    ENV_VALIDATE_PLAN, ensure_finite,
    io::{read_json, write_json},
    open_engine, resolve_db_path,
};

/// CLI arguments for the `validate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "validate",
    long_about = "Check that a flight plan's airports and waypoints exist, \
                 that its cruise altitude and speed are within limits and \
                 that every airway leg permits the cruise altitude.",
    about = "Check a flight plan against the reference data"
)]
#[ortho_config(prefix = "AEROBASE")]
pub(crate) struct ValidateArgs {
    /// Path to a JSON file containing a flight plan.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) plan_path: Option<Utf8PathBuf>,
    /// Path to the SQLite reference database.
    #[arg(long = ARG_DB_PATH, value_name = "path")]
    #[serde(default)]
    pub(crate) db_path: Option<Utf8PathBuf>,
}

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "route",
    long_about = "Validate a flight plan, then print its legs with distances, \
                 courses and elapsed minutes. With --fuel-flow the output \
                 also carries trip, reserve and taxi fuel; with \
                 --departure-time it carries the arrival time.",
    about = "Compute the route for a flight plan"
)]
#[ortho_config(prefix = "AEROBASE")]
pub(crate) struct RouteArgs {
    /// Path to a JSON file containing a flight plan.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) plan_path: Option<Utf8PathBuf>,
    /// Path to the SQLite reference database.
    #[arg(long = ARG_DB_PATH, value_name = "path")]
    #[serde(default)]
    pub(crate) db_path: Option<Utf8PathBuf>,
    /// Fuel burned per hour of flight.
    #[arg(long = ARG_FUEL_FLOW, value_name = "units")]
    #[serde(default)]
    pub(crate) fuel_flow: Option<f64>,
    /// Departure time in unix seconds.
    #[arg(long = ARG_DEPARTURE_TIME, value_name = "seconds")]
    #[serde(default)]
    pub(crate) departure_time: Option<i64>,
}

/// Resolved `validate` or `route` configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlanConfig {
    pub(crate) plan_path: Utf8PathBuf,
    pub(crate) db_path: Utf8PathBuf,
    pub(crate) fuel_flow: Option<f64>,
    pub(crate) departure_time: Option<i64>,
}

impl ValidateArgs {
    pub(crate) fn into_config(self) -> Result<PlanConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PlanConfig::try_from(merged)
    }
}

impl RouteArgs {
    pub(crate) fn into_config(self) -> Result<PlanConfig, CliError> {
        ensure_finite(ARG_FUEL_FLOW, self.fuel_flow)?;
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PlanConfig::try_from(merged)
    }
}

impl TryFrom<ValidateArgs> for PlanConfig {
    type Error = CliError;

    fn try_from(args: ValidateArgs) -> Result<Self, Self::Error> {
        let plan_path = args.plan_path.ok_or(CliError::MissingArgument {
            field: ARG_PLAN,
            env: ENV_VALIDATE_PLAN,
        })?;
        Ok(Self {
            plan_path,
            db_path: resolve_db_path(args.db_path),
            fuel_flow: None,
            departure_time: None,
        })
    }
}

impl TryFrom<RouteArgs> for PlanConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let plan_path = args.plan_path.ok_or(CliError::MissingArgument {
            field: ARG_PLAN,
            env: ENV_ROUTE_PLAN,
        })?;
        Ok(Self {
            plan_path,
            db_path: resolve_db_path(args.db_path),
            fuel_flow: args.fuel_flow,
            departure_time: args.departure_time,
        })
    }
}

/// Loads a JSON-encoded [`FlightPlan`] from disk.
pub(super) fn load_plan(path: &Utf8Path) -> Result<FlightPlan, CliError> {
    read_json(path, ARG_PLAN)
}

/// Resolved references of a plan that passed validation.
#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    departure: &'a Airport,
    destination: &'a Airport,
    alternate: Option<&'a Airport>,
    waypoints: &'a [Waypoint],
}

/// A computed route with its optional fuel and arrival figures.
#[derive(Debug, Serialize)]
struct RouteReport<'a> {
    route: &'a FlightRoute,
    #[serde(skip_serializing_if = "Option::is_none")]
    fuel: Option<FuelEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arrival_time: Option<i64>,
}

pub(super) fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_validate_with(args, &mut stdout)
}

pub(super) fn run_validate_with(
    args: ValidateArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let plan = load_plan(&config.plan_path)?;
    let engine = open_engine(&config.db_path, None)?;
    let validated = engine.validate_flight_plan(&plan)?;
    let report = ValidationReport {
        valid: true,
        departure: validated.departure(),
        destination: validated.destination(),
        alternate: validated.alternate(),
        waypoints: validated.waypoints(),
    };
    write_json(writer, &report)
}

pub(super) fn run_route(args: RouteArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_route_with(args, &mut stdout)
}

pub(super) fn run_route_with(args: RouteArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let plan = load_plan(&config.plan_path)?;
    let engine = open_engine(&config.db_path, None)?;
    let route = engine.calculate_route(&plan)?;
    let fuel = config
        .fuel_flow
        .map(|flow| engine.estimate_fuel(&route, flow))
        .transpose()?;
    let arrival_time = config
        .departure_time
        .map(|departure| eta(departure, route.estimated_time()));
    log::info!(
        "route {} -> {}: {:.1} nm, {} min",
        plan.departure,
        plan.destination,
        route.total_distance(),
        route.estimated_time()
    );
    let report = RouteReport {
        route: &route,
        fuel,
        arrival_time,
    };
    write_json(writer, &report)
}

#[cfg(test)]
pub(crate) fn route_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<PlanConfig, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    PlanConfig::try_from(merged)
}
