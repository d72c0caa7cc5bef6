use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::lock::{FileLock, LockError};
use super::paths::DataPaths;
use crate::model::DaySchedule;

/// Error type for data directory I/O
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not locate a data directory; pass --data-dir or set DAYPLAN_DIR")]
    NoDataDir,
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not parse config.toml: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Write via a temp file in the same directory, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a JSON file; a missing file yields `T::default()`.
pub(crate) fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-print `value` to `path` atomically, under the data directory lock.
pub(crate) fn write_json<T: Serialize>(paths: &DataPaths, path: &Path, value: &T) -> Result<(), StoreError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    fs::create_dir_all(paths.root()).map_err(|source| StoreError::Write {
        path: paths.root().to_path_buf(),
        source,
    })?;
    let _lock = FileLock::acquire_default(paths.root())?;
    atomic_write(path, text.as_bytes()).map_err(|source| {
        warn!(path = %path.display(), error = %source, "write failed");
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Load one day. A missing file is an empty day.
pub fn load_day(paths: &DataPaths, date: NaiveDate) -> Result<DaySchedule, StoreError> {
    let path = paths.day_file(date);
    let mut day = read_json::<Option<DaySchedule>>(&path)?.unwrap_or_else(|| DaySchedule::new(date));
    day.date = date;
    day.sort_blocks();
    day.seed_id_seq();
    Ok(day)
}

pub fn save_day(paths: &DataPaths, day: &DaySchedule) -> Result<(), StoreError> {
    let path = paths.day_file(day.date);
    write_json(paths, &path, day)?;
    debug!(date = %day.date, blocks = day.blocks.len(), "day saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, BlockType, ClockTime};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn missing_day_is_empty() {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        let day = load_day(&paths, date()).unwrap();
        assert_eq!(day, DaySchedule::new(date()));
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        let mut day = DaySchedule::new(date());
        day.blocks.push(Block::new(
            "b1".into(),
            BlockType::Meeting,
            ClockTime::new(14, 0).unwrap(),
            30,
        ));
        save_day(&paths, &day).unwrap();
        assert!(paths.day_file(date()).exists());
        assert!(!paths.root().join(".lock").exists());
        assert_eq!(load_day(&paths, date()).unwrap(), day);
    }

    #[test]
    fn load_sorts_hand_edited_files() {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        fs::create_dir_all(paths.days_dir()).unwrap();
        fs::write(
            paths.day_file(date()),
            r#"{"date":"2025-03-10","blocks":[
                {"id":"b2","start":"13:00","duration_min":30,"block_type":"admin"},
                {"id":"b1","start":"08:00","duration_min":30,"block_type":"break"}]}"#,
        )
        .unwrap();
        let day = load_day(&paths, date()).unwrap();
        assert_eq!(day.blocks[0].id, "b1");
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        fs::create_dir_all(paths.days_dir()).unwrap();
        fs::write(paths.day_file(date()), "{ nope").unwrap();
        assert!(matches!(load_day(&paths, date()), Err(StoreError::Json { .. })));
    }

    #[test]
    fn atomic_write_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/test.txt");
        atomic_write(&path, b"hello").unwrap();
        atomic_write(&path, b"bye").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "bye");
    }
}
