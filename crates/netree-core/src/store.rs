//! Flat-file JSON persistence for the device tree
//!
//! The file holds a JSON array of flat [`DeviceRecord`]s in tree insertion
//! order. Loading replays the records through [`Tree::add_node`] in file
//! order, so parents must appear before their children.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::device::DeviceRecord;
use crate::error::StoreError;
use crate::tree::Tree;
use crate::validate::parse_device;

/// Outcome of replaying a file into a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// JSON file backing the device inventory
#[derive(Debug, Clone)]
pub struct DeviceStore {
    path: PathBuf,
}

impl DeviceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the tree's contents with the file's records
    ///
    /// Failures are logged and reported as `false`; the tree is left empty
    /// if the file could not be read at all.
    pub fn load_tree(&self, tree: &mut Tree) -> bool {
        tree.clear();
        match self.try_load(tree) {
            Ok(report) => {
                info!(
                    path = %self.path.display(),
                    loaded = report.loaded,
                    skipped = report.skipped,
                    "Loaded device inventory"
                );
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error loading device inventory");
                false
            }
        }
    }

    /// Overwrite the file with the tree's current records
    pub fn save_tree(&self, tree: &Tree) -> bool {
        match self.try_save(&tree.records()) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error saving device inventory");
                false
            }
        }
    }

    /// Read the file and add each record in order, skipping rejected ones
    pub fn try_load(&self, tree: &mut Tree) -> Result<LoadReport, StoreError> {
        let content = std::fs::read_to_string(&self.path)?;
        let records: Vec<Value> = serde_json::from_str(&content)?;
        let mut report = LoadReport::default();

        for raw in records {
            let record = match parse_device(raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Skipping invalid device record");
                    report.skipped += 1;
                    continue;
                }
            };

            let id = record.id;
            match tree.add_node(record) {
                Ok(()) => report.loaded += 1,
                Err(e) => {
                    warn!(device = %id, error = %e, "Skipping device record");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    /// Write records to a sibling temp file, then rename it over the target
    pub fn try_save(&self, records: &[DeviceRecord]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
