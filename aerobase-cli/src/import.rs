//! The `import` command: bulk-load reference data from a JSON bundle.

use std::io::Write;

use aerobase_core::ReferenceBatch;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_BUNDLE, ARG_DB_PATH, CliError, ENV_IMPORT_BUNDLE,
    io::{read_json, write_json},
    open_engine, resolve_db_path,
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Insert or replace the airports, waypoints, navaids, airways, \
                 airway segments, airspaces and airspace boundaries listed in \
                 a JSON bundle, then rebuild the spatial indexes once. The \
                 bundle is written in one transaction: if any record is \
                 rejected, nothing is imported.",
    about = "Load reference data from a JSON bundle"
)]
#[ortho_config(prefix = "AEROBASE")]
pub(crate) struct ImportArgs {
    /// Path to the JSON bundle.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) bundle_path: Option<Utf8PathBuf>,
    /// Path to the SQLite reference database.
    #[arg(long = ARG_DB_PATH, value_name = "path")]
    #[serde(default)]
    pub(crate) db_path: Option<Utf8PathBuf>,
}

/// Loads a JSON-encoded [`ReferenceBatch`] from disk. Every list may be
/// omitted.
pub(super) fn load_bundle(path: &Utf8Path) -> Result<ReferenceBatch, CliError> {
    read_json(path, ARG_BUNDLE)
}

pub(super) fn run_import(args: ImportArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_import_with(args, &mut stdout)
}

pub(super) fn run_import_with(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let bundle_path = merged.bundle_path.ok_or(CliError::MissingArgument {
        field: ARG_BUNDLE,
        env: ENV_IMPORT_BUNDLE,
    })?;
    let bundle = load_bundle(&bundle_path)?;
    let engine = open_engine(&resolve_db_path(merged.db_path), None)?;
    let summary = engine.apply_batch(&bundle)?;
    log::info!(
        "imported {} airports, {} waypoints, {} navaids, {} airways, {} segments, {} airspaces",
        summary.airports,
        summary.waypoints,
        summary.navaids,
        summary.airways,
        summary.airway_segments,
        summary.airspaces
    );
    write_json(writer, &summary)
}
