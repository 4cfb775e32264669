//! The `device` command.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DB_PATH, ARG_FINGERPRINT, CliError, io::write_json, open_engine, resolve_db_path,
};

/// CLI arguments for the `device` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "device",
    long_about = "Print the device registered for this installation, \
                 registering it on first use. The fingerprint is derived \
                 from the host unless one is supplied.",
    about = "Show the device registered for this installation"
)]
#[ortho_config(prefix = "AEROBASE")]
pub(crate) struct DeviceArgs {
    /// Path to the SQLite reference database.
    #[arg(long = ARG_DB_PATH, value_name = "path")]
    #[serde(default)]
    pub(crate) db_path: Option<Utf8PathBuf>,
    /// Use this fingerprint instead of deriving one from the host.
    #[arg(long = ARG_FINGERPRINT, value_name = "text")]
    #[serde(default)]
    pub(crate) fingerprint: Option<String>,
}

pub(super) fn run_device(args: DeviceArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_device_with(args, &mut stdout)
}

pub(super) fn run_device_with(args: DeviceArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let db_path = resolve_db_path(merged.db_path);
    let engine = open_engine(&db_path, merged.fingerprint.as_deref())?;
    let device = engine.get_or_create_device_identity()?;
    write_json(writer, &device)
}
