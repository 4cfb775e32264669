//! Command-line interface over the AeroBase reference database.
//!
//! Every subcommand layers its options from CLI flags, configuration files
//! and `AEROBASE_CMDS_<COMMAND>_<FIELD>` environment variables, opens the
//! SQLite database named by `--db-path` and prints its result as JSON.
#![forbid(unsafe_code)]

use aerobase_core::{AeroBase, AeroBaseError, Config, SqliteStore, StaticIdentityProvider};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};

mod device;
mod error;
mod import;
mod io;
mod plan;
mod query;

pub use error::CliError;

use device::{DeviceArgs, run_device};
use import::{ImportArgs, run_import};
use plan::{RouteArgs, ValidateArgs, run_route, run_validate};
use query::{NearbyArgs, NearestArgs, run_nearby, run_nearest};

const ARG_DB_PATH: &str = "db-path";
const ARG_LAT: &str = "lat";
const ARG_LON: &str = "lon";
const ARG_RADIUS: &str = "radius";
const ARG_KIND: &str = "kind";
const ARG_PLAN: &str = "plan";
const ARG_FUEL_FLOW: &str = "fuel-flow";
const ARG_DEPARTURE_TIME: &str = "departure-time";
const ARG_FINGERPRINT: &str = "fingerprint";
const ARG_BUNDLE: &str = "bundle";

const ENV_NEARBY_LAT: &str = "AEROBASE_CMDS_NEARBY_LAT";
const ENV_NEARBY_LON: &str = "AEROBASE_CMDS_NEARBY_LON";
const ENV_NEARBY_RADIUS: &str = "AEROBASE_CMDS_NEARBY_RADIUS";
const ENV_NEAREST_LAT: &str = "AEROBASE_CMDS_NEAREST_LAT";
const ENV_NEAREST_LON: &str = "AEROBASE_CMDS_NEAREST_LON";
const ENV_VALIDATE_PLAN: &str = "AEROBASE_CMDS_VALIDATE_PLAN_PATH";
const ENV_ROUTE_PLAN: &str = "AEROBASE_CMDS_ROUTE_PLAN_PATH";
const ENV_IMPORT_BUNDLE: &str = "AEROBASE_CMDS_IMPORT_BUNDLE_PATH";

const DEFAULT_DB_PATH: &str = "aerobase.db";

/// Run the AeroBase CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Nearby(args) => run_nearby(args),
        Command::Nearest(args) => run_nearest(args),
        Command::Validate(args) => run_validate(args),
        Command::Route(args) => run_route(args),
        Command::Device(args) => run_device(args),
        Command::Import(args) => run_import(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "aerobase",
    about = "Query and plan against an offline aviation reference database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List airports, waypoints or navaids within a radius.
    Nearby(NearbyArgs),
    /// Find the closest airport, waypoint or navaid.
    Nearest(NearestArgs),
    /// Check a flight plan against the reference data.
    Validate(ValidateArgs),
    /// Compute the route, timings and fuel for a flight plan.
    Route(RouteArgs),
    /// Show the device registered for this installation.
    Device(DeviceArgs),
    /// Load reference data from a JSON bundle.
    Import(ImportArgs),
}

/// Reject a NaN or infinite option before configuration merging, which
/// round-trips values through JSON where they become `null`.
fn ensure_finite(field: &'static str, value: Option<f64>) -> Result<(), CliError> {
    match value {
        Some(number) if !number.is_finite() => Err(CliError::Engine(
            AeroBaseError::invalid_input(format!("--{field} must be finite, got {number}")),
        )),
        _ => Ok(()),
    }
}

fn resolve_db_path(db_path: Option<Utf8PathBuf>) -> Utf8PathBuf {
    db_path.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DB_PATH))
}

/// Open the engine over the database at `db_path`.
fn open_engine(
    db_path: &Utf8Path,
    fingerprint: Option<&str>,
) -> Result<AeroBase<SqliteStore>, CliError> {
    let config = Config {
        db_path: db_path.as_std_path().to_path_buf(),
        ..Config::default()
    };
    let engine = AeroBase::open(&config).map_err(|source| CliError::OpenDatabase {
        path: db_path.to_path_buf(),
        source,
    })?;
    log::debug!("opened reference database at {db_path}");
    Ok(match fingerprint {
        Some(fingerprint) => {
            engine.with_identity_provider(StaticIdentityProvider::new(fingerprint))
        }
        None => engine,
    })
}

#[cfg(test)]
mod tests;
