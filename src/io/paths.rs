use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use directories::ProjectDirs;

use super::day_io::StoreError;

/// Layout of the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DataPaths { root: root.into() }
    }

    /// Explicit directory if given, else the platform data directory.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, StoreError> {
        if let Some(dir) = explicit {
            return Ok(DataPaths::new(dir));
        }
        let dirs = ProjectDirs::from("", "", "dayplan").ok_or(StoreError::NoDataDir)?;
        Ok(DataPaths::new(dirs.data_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn days_dir(&self) -> PathBuf {
        self.root.join("days")
    }

    pub fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.days_dir().join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    pub fn inventory_file(&self) -> PathBuf {
        self.root.join("inventory.json")
    }

    pub fn outbox_file(&self) -> PathBuf {
        self.root.join("outbox.json")
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join(".state.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("dayplan.log")
    }

    /// Create the root and `days/` if missing
    pub fn ensure(&self) -> Result<(), StoreError> {
        let days = self.days_dir();
        std::fs::create_dir_all(&days).map_err(|source| StoreError::Write { path: days, source })
    }
}

/// Date encoded in a day file name (`days/2025-03-10.json`)
pub fn date_of_day_file(path: &Path) -> Option<NaiveDate> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}
