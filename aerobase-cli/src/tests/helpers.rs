//! Test helpers for seeding a reference database through the CLI.

use super::*;
use crate::import::{ImportArgs, run_import_with};
use aerobase_core::{FlightPlan, ReferenceBatch, test_support};
use tempfile::TempDir;

/// A temporary directory holding a reference database.
pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
    pub(super) db_path: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let db_path = root.join("aerobase.db");
        Self {
            _dir: dir,
            root,
            db_path,
        }
    }

    /// A workspace whose database holds the sample records.
    pub(super) fn seeded() -> Self {
        let workspace = Self::new();
        let bundle_path = write_bundle(&workspace, &sample_bundle());
        let args = ImportArgs {
            bundle_path: Some(bundle_path),
            db_path: Some(workspace.db_path.clone()),
        };
        let mut sink = Vec::new();
        run_import_with(args, &mut sink).expect("import sample bundle");
        workspace
    }

    /// Write `plan` as JSON and return its path.
    pub(super) fn write_plan(&self, plan: &FlightPlan) -> Utf8PathBuf {
        let path = self.root.join("plan.json");
        let payload = serde_json::to_vec_pretty(plan).expect("serialize plan");
        write_utf8(&path, &payload);
        path
    }
}

pub(super) fn sample_bundle() -> ReferenceBatch {
    test_support::sample_batch().expect("sample batch")
}

/// Write `bundle` as JSON and return its path.
pub(super) fn write_bundle(workspace: &Workspace, bundle: &ReferenceBatch) -> Utf8PathBuf {
    let path = workspace.root.join("bundle.json");
    let payload = serde_json::to_vec(bundle).expect("serialize bundle");
    write_utf8(&path, &payload);
    path
}

pub(super) fn plan(departure: &str, destination: &str, route: &[&str]) -> FlightPlan {
    FlightPlan {
        departure: departure.to_owned(),
        destination: destination.to_owned(),
        alternate: None,
        cruise_altitude_ft: 35_000,
        cruise_speed_kt: 450,
        route: route.iter().map(|id| (*id).to_owned()).collect(),
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write test file");
}

pub(super) fn output_json(buffer: &[u8]) -> serde_json::Value {
    let text = std::str::from_utf8(buffer).expect("stdout utf-8");
    serde_json::from_str(text).expect("output should be JSON")
}
