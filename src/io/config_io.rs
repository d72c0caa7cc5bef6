use std::fs;
use std::io;

use toml_edit::{DocumentMut, Item, Table, value};

use super::day_io::{StoreError, atomic_write};
use super::paths::DataPaths;
use crate::model::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigEditError {
    #[error("key must look like section.name, got {0:?}")]
    BadKey(String),
    #[error("config.toml is not valid TOML: {0}")]
    Syntax(#[from] toml_edit::TomlError),
    #[error("{key} = {value:?} is not accepted: {reason}")]
    Rejected {
        key: String,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parsed config; a missing file gives the defaults.
pub fn load_config(paths: &DataPaths) -> Result<AppConfig, StoreError> {
    let path = paths.config_file();
    match fs::read_to_string(&path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(StoreError::Read { path, source }),
    }
}

/// Raw document for round-trip-safe editing. Missing file is an empty document.
pub fn read_document(paths: &DataPaths) -> Result<DocumentMut, ConfigEditError> {
    let path = paths.config_file();
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(source) => return Err(StoreError::Read { path, source }.into()),
    };
    Ok(text.parse()?)
}

pub fn write_document(paths: &DataPaths, doc: &DocumentMut) -> Result<(), StoreError> {
    let path = paths.config_file();
    atomic_write(&path, doc.to_string().as_bytes()).map_err(|source| StoreError::Write { path, source })
}

/// Set `section.name` (or `section.sub.name`) to `raw`, keeping comments and
/// layout. Integers and booleans are stored as such, everything else as a
/// string. The edited document must still parse as a valid config.
pub fn set_value(doc: &mut DocumentMut, key: &str, raw: &str) -> Result<(), ConfigEditError> {
    let parts: Vec<&str> = key.split('.').map(str::trim).collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigEditError::BadKey(key.to_string()));
    }
    let (name, sections) = parts.split_last().ok_or_else(|| ConfigEditError::BadKey(key.to_string()))?;

    let mut table: &mut Table = doc.as_table_mut();
    for section in sections {
        if !table.contains_key(section) {
            table.insert(section, Item::Table(Table::new()));
        }
        table = table[*section]
            .as_table_mut()
            .ok_or_else(|| ConfigEditError::BadKey(key.to_string()))?;
    }
    table[*name] = typed_value(raw);

    toml::from_str::<AppConfig>(&doc.to_string()).map_err(|e| ConfigEditError::Rejected {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.message().to_string(),
    })?;
    Ok(())
}

fn typed_value(raw: &str) -> Item {
    if let Ok(n) = raw.parse::<i64>() {
        value(n)
    } else if let Ok(b) = raw.parse::<bool>() {
        value(b)
    } else {
        value(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"# my planner
[schedule]
day_start = "08:00" # early bird

[sync]
endpoint = "http://localhost:3000"
"#;

    #[test]
    fn missing_config_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&DataPaths::new(tmp.path())).unwrap();
        assert_eq!(config.schedule.default_block_minutes, 60);
    }

    #[test]
    fn set_keeps_comments() {
        let mut doc: DocumentMut = SAMPLE.parse().unwrap();
        set_value(&mut doc, "sync.user_id", "user_1").unwrap();
        set_value(&mut doc, "schedule.default_task_minutes", "25").unwrap();
        let text = doc.to_string();
        assert!(text.contains("# early bird"));
        assert!(text.contains("user_id = \"user_1\""));
        assert!(text.contains("default_task_minutes = 25"));
        let config: AppConfig = toml::from_str(&text).unwrap();
        assert!(config.sync.is_ready());
    }

    #[test]
    fn set_creates_nested_tables() {
        let mut doc = DocumentMut::new();
        set_value(&mut doc, "ui.type_colors.meeting", "#FF0000").unwrap();
        let config: AppConfig = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.ui.type_colors["meeting"], "#FF0000");
    }

    #[test]
    fn rejects_bad_values() {
        let mut doc: DocumentMut = SAMPLE.parse().unwrap();
        let err = set_value(&mut doc, "schedule.day_start", "25:00").unwrap_err();
        assert!(matches!(err, ConfigEditError::Rejected { .. }));
        assert!(matches!(
            set_value(&mut doc, "toplevel", "x"),
            Err(ConfigEditError::BadKey(_))
        ));
    }

    #[test]
    fn write_round_trip() {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        let doc: DocumentMut = SAMPLE.parse().unwrap();
        write_document(&paths, &doc).unwrap();
        assert_eq!(fs::read_to_string(paths.config_file()).unwrap(), SAMPLE);
        assert_eq!(read_document(&paths).unwrap().to_string(), SAMPLE);
        let config = load_config(&paths).unwrap();
        assert_eq!(config.schedule.day_start.to_string(), "08:00");
    }
}
