//! Spatial query commands: `nearby` and `nearest`.

use std::io::Write;

use aerobase_core::{AeroBaseError, Coordinate};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DB_PATH, ARG_KIND, ARG_LAT, ARG_LON, ARG_RADIUS, CliError, ENV_NEARBY_LAT, ENV_NEARBY_LON,
    ENV_NEARBY_RADIUS, ENV_NEAREST_LAT, ENV_NEAREST_LON, ensure_finite, io::write_json,
    open_engine, resolve_db_path,
};

/// Which reference table a query searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum EntityKind {
    #[default]
    Airport,
    Waypoint,
    Navaid,
}

/// CLI arguments for the `nearby` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "nearby",
    long_about = "List every airport, waypoint or navaid whose great-circle \
                 distance from the given position is within the radius, \
                 nearest first.",
    about = "List reference points within a radius"
)]
#[ortho_config(prefix = "AEROBASE")]
pub(crate) struct NearbyArgs {
    /// Path to the SQLite reference database.
    #[arg(long = ARG_DB_PATH, value_name = "path")]
    #[serde(default)]
    pub(crate) db_path: Option<Utf8PathBuf>,
    /// Latitude of the search centre in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the search centre in degrees.
    #[arg(long = ARG_LON, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Search radius in nautical miles.
    #[arg(long = ARG_RADIUS, value_name = "nm")]
    #[serde(default)]
    pub(crate) radius: Option<f64>,
    /// Table to search; airports by default.
    #[arg(long = ARG_KIND, value_enum)]
    #[serde(default)]
    pub(crate) kind: Option<EntityKind>,
}

impl NearbyArgs {
    pub(crate) fn into_config(self) -> Result<NearbyConfig, CliError> {
        ensure_finite(ARG_LAT, self.lat)?;
        ensure_finite(ARG_LON, self.lon)?;
        ensure_finite(ARG_RADIUS, self.radius)?;
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        NearbyConfig::try_from(merged)
    }
}

/// Resolved `nearby` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NearbyConfig {
    pub(crate) db_path: Utf8PathBuf,
    pub(crate) center: Coordinate,
    pub(crate) radius_nm: f64,
    pub(crate) kind: EntityKind,
}

impl TryFrom<NearbyArgs> for NearbyConfig {
    type Error = CliError;

    fn try_from(args: NearbyArgs) -> Result<Self, Self::Error> {
        let center = centre(args.lat, args.lon, ENV_NEARBY_LAT, ENV_NEARBY_LON)?;
        let radius_nm = args.radius.ok_or(CliError::MissingArgument {
            field: ARG_RADIUS,
            env: ENV_NEARBY_RADIUS,
        })?;
        Ok(Self {
            db_path: resolve_db_path(args.db_path),
            center,
            radius_nm,
            kind: args.kind.unwrap_or_default(),
        })
    }
}

/// CLI arguments for the `nearest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "nearest",
    about = "Find the closest airport, waypoint or navaid"
)]
#[ortho_config(prefix = "AEROBASE")]
pub(crate) struct NearestArgs {
    /// Path to the SQLite reference database.
    #[arg(long = ARG_DB_PATH, value_name = "path")]
    #[serde(default)]
    pub(crate) db_path: Option<Utf8PathBuf>,
    /// Latitude of the query point in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the query point in degrees.
    #[arg(long = ARG_LON, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Table to search; airports by default.
    #[arg(long = ARG_KIND, value_enum)]
    #[serde(default)]
    pub(crate) kind: Option<EntityKind>,
}

impl NearestArgs {
    pub(crate) fn into_config(self) -> Result<NearestConfig, CliError> {
        ensure_finite(ARG_LAT, self.lat)?;
        ensure_finite(ARG_LON, self.lon)?;
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        NearestConfig::try_from(merged)
    }
}

/// Resolved `nearest` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NearestConfig {
    pub(crate) db_path: Utf8PathBuf,
    pub(crate) center: Coordinate,
    pub(crate) kind: EntityKind,
}

impl TryFrom<NearestArgs> for NearestConfig {
    type Error = CliError;

    fn try_from(args: NearestArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            db_path: resolve_db_path(args.db_path),
            center: centre(args.lat, args.lon, ENV_NEAREST_LAT, ENV_NEAREST_LON)?,
            kind: args.kind.unwrap_or_default(),
        })
    }
}

fn centre(
    lat: Option<f64>,
    lon: Option<f64>,
    lat_env: &'static str,
    lon_env: &'static str,
) -> Result<Coordinate, CliError> {
    let lat = lat.ok_or(CliError::MissingArgument {
        field: ARG_LAT,
        env: lat_env,
    })?;
    let lon = lon.ok_or(CliError::MissingArgument {
        field: ARG_LON,
        env: lon_env,
    })?;
    Coordinate::new(lat, lon).map_err(|err| CliError::Engine(AeroBaseError::from(err)))
}

pub(super) fn run_nearby(args: NearbyArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_nearby_with(args, &mut stdout)
}

pub(super) fn run_nearby_with(args: NearbyArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let engine = open_engine(&config.db_path, None)?;
    let (center, radius) = (config.center, config.radius_nm);
    match config.kind {
        EntityKind::Airport => write_json(writer, &engine.find_airports_within(center, radius)?),
        EntityKind::Waypoint => write_json(writer, &engine.find_waypoints_within(center, radius)?),
        EntityKind::Navaid => write_json(writer, &engine.find_navaids_within(center, radius)?),
    }
}

pub(super) fn run_nearest(args: NearestArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_nearest_with(args, &mut stdout)
}

pub(super) fn run_nearest_with(args: NearestArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let engine = open_engine(&config.db_path, None)?;
    let center = config.center;
    match config.kind {
        EntityKind::Airport => write_json(writer, &engine.find_nearest_airport(center)?),
        EntityKind::Waypoint => write_json(writer, &engine.find_nearest_waypoint(center)?),
        EntityKind::Navaid => write_json(writer, &engine.find_nearest_navaid(center)?),
    }
}
