use std::path::{Path, PathBuf};
use std::sync::mpsc;

use chrono::NaiveDate;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::paths::date_of_day_file;

/// A day file changed on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayChanged(pub NaiveDate);

/// Watches `days/` so edits made by another process (`dp add`, a text
/// editor) reach the open TUI.
pub struct DayWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<DayChanged>,
}

impl DayWatcher {
    pub fn start(days_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let root = days_dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                for date in changed_dates(&root, &event.paths) {
                    let _ = tx.send(DayChanged(date));
                }
            },
            Config::default(),
        )?;

        watcher.watch(days_dir, RecursiveMode::NonRecursive)?;
        Ok(DayWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Dates changed since the last poll, deduplicated.
    pub fn poll(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = Vec::new();
        while let Ok(DayChanged(date)) = self.rx.try_recv() {
            if !dates.contains(&date) {
                dates.push(date);
            }
        }
        dates
    }
}

/// Day files among `paths`; temp files from atomic writes are skipped.
fn changed_dates(root: &Path, paths: &[PathBuf]) -> Vec<NaiveDate> {
    paths
        .iter()
        .filter(|p| p.starts_with(root))
        .filter_map(|p| date_of_day_file(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_day_files_count() {
        let root = Path::new("/data/days");
        let paths = vec![
            root.join("2025-03-10.json"),
            root.join(".tmpAbC123"),
            PathBuf::from("/elsewhere/2025-03-11.json"),
        ];
        assert_eq!(
            changed_dates(root, &paths),
            vec![NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()]
        );
    }
}
