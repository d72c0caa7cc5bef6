use tracing::debug;

use super::day_io::{StoreError, read_json, write_json};
use super::paths::DataPaths;
use crate::sync::outbox::{Outbox, RetryPolicy};

/// Load the sync journal left by earlier runs.
pub fn load_outbox(paths: &DataPaths, policy: RetryPolicy) -> Result<Outbox, StoreError> {
    let mut outbox: Outbox = read_json(&paths.outbox_file())?;
    outbox.set_policy(policy);
    if !outbox.is_empty() {
        debug!(pending = outbox.len(), "journal loaded");
    }
    Ok(outbox)
}

pub fn save_outbox(paths: &DataPaths, outbox: &Outbox) -> Result<(), StoreError> {
    write_json(paths, &paths.outbox_file(), outbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::intent::{Change, RemoteIntent, Rollback};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn pending_changes_survive_restart() {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let mut outbox = load_outbox(&paths, RetryPolicy::default()).unwrap();
        assert!(outbox.is_empty());
        outbox.push(Change {
            intent: RemoteIntent::DeleteBlock {
                date,
                block_id: "b1".into(),
            },
            rollback: Rollback {
                date,
                block_id: "b1".into(),
                before: None,
                index: 0,
                inventory: vec![],
            },
        });
        save_outbox(&paths, &outbox).unwrap();

        let back = load_outbox(&paths, RetryPolicy::default()).unwrap();
        assert_eq!(back.len(), 1);
        assert!(back.has_pending_for(date));
    }
}
