//! File logging for the `dp` binary. Events go to a JSON lines file so the
//! terminal the TUI draws on stays clean.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;

use crate::io::DataPaths;
use crate::model::LogConfig;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// `DAYPLAN_LOG` if set, else `dayplan.log` in the data directory
pub fn log_path(paths: &DataPaths) -> PathBuf {
    env::var_os("DAYPLAN_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.log_file())
}

/// Unknown level names fall back to `info`.
pub fn level_filter(config: &LogConfig) -> LevelFilter {
    LevelFilter::from_str(config.level.trim()).unwrap_or(LevelFilter::INFO)
}

/// Install the global subscriber once. Failure to open the file leaves
/// logging off.
pub fn init(paths: &DataPaths, config: &LogConfig) {
    let level = level_filter(config);
    if level == LevelFilter::OFF {
        return;
    }
    let _ = TRACING_INIT.get_or_init(|| {
        let path = log_path(paths);
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
            return;
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_max_level(level)
            .with_writer(Mutex::new(file))
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        let config = |level: &str| LogConfig {
            level: level.to_string(),
        };
        assert_eq!(level_filter(&config("debug")), LevelFilter::DEBUG);
        assert_eq!(level_filter(&config("OFF")), LevelFilter::OFF);
        assert_eq!(level_filter(&config("loud")), LevelFilter::INFO);
    }
}
