use std::fs;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::paths::DataPaths;

/// Persisted TUI state (`.state.json`), best effort
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    /// Day shown when the TUI last exited
    #[serde(default)]
    pub last_date: Option<NaiveDate>,
}

pub fn read_ui_state(paths: &DataPaths) -> Option<UiState> {
    let content = fs::read_to_string(paths.state_file()).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn write_ui_state(paths: &DataPaths, state: &UiState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    fs::create_dir_all(paths.root())?;
    fs::write(paths.state_file(), content)
}
