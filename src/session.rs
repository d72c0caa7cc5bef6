//! The data directory as one unit: config, day files, inventory and the
//! sync journal. Both the CLI and the TUI record changes through here so a
//! change is on disk and queued before anything is sent.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::editor::EditorSettings;
use crate::io::{DataPaths, StoreError, config_io, day_io, inventory_io, journal_io};
use crate::model::{AppConfig, DaySchedule, Inventory};
use crate::ops::quick_command::QuickCommandTable;
use crate::sync::intent::Change;
use crate::sync::outbox::{Abandoned, Outbox, RetryPolicy};

pub struct Session {
    pub paths: DataPaths,
    pub config: AppConfig,
    pub outbox: Outbox,
}

impl Session {
    /// Load config and journal, creating the directory layout if needed.
    pub fn open(paths: DataPaths) -> Result<Self, StoreError> {
        paths.ensure()?;
        let config = config_io::load_config(&paths)?;
        let outbox = journal_io::load_outbox(&paths, RetryPolicy::from(&config.sync))?;
        Ok(Session {
            paths,
            config,
            outbox,
        })
    }

    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings::from(&self.config.schedule)
    }

    pub fn quick_commands(&self) -> QuickCommandTable {
        QuickCommandTable::with_overrides(&self.config.quick_commands)
    }

    pub fn load_day(&self, date: NaiveDate) -> Result<DaySchedule, StoreError> {
        day_io::load_day(&self.paths, date)
    }

    pub fn load_inventory(&self) -> Result<Inventory, StoreError> {
        inventory_io::load_inventory(&self.paths)
    }

    pub fn save_inventory(&self, inventory: &Inventory) -> Result<(), StoreError> {
        inventory_io::save_inventory(&self.paths, inventory)
    }

    pub fn save_day(&self, day: &DaySchedule) -> Result<(), StoreError> {
        day_io::save_day(&self.paths, day)
    }

    pub fn save_outbox(&self) -> Result<(), StoreError> {
        journal_io::save_outbox(&self.paths, &self.outbox)
    }

    /// Save `day` and queue `changes` for the backend.
    pub fn record(&mut self, day: &DaySchedule, changes: Vec<Change>) -> Result<(), StoreError> {
        self.save_day(day)?;
        if changes.is_empty() {
            return Ok(());
        }
        for change in changes {
            self.outbox.push(change);
        }
        self.save_outbox()
    }

    /// Undo an abandoned change in the files on disk.
    pub fn roll_back(&mut self, abandoned: &Abandoned) -> Result<(), StoreError> {
        let mut inventory: Option<Inventory> = None;
        for rollback in abandoned.rollbacks() {
            let mut day = self.load_day(rollback.date)?;
            rollback.apply(&mut day);
            self.save_day(&day)?;
            if !rollback.inventory.is_empty() {
                if inventory.is_none() {
                    inventory = Some(self.load_inventory()?);
                }
                if let Some(inv) = inventory.as_mut() {
                    rollback.apply_inventory(inv);
                }
            }
        }
        if let Some(inv) = &inventory {
            self.save_inventory(inv)?;
        }
        warn!(
            change = %abandoned.entry.intent.describe(),
            reason = %abandoned.reason,
            "change rolled back"
        );
        Ok(())
    }

    /// Replace the cached inventory with a fresh copy from the backend.
    pub fn store_inventory(&self, inventory: &Inventory) -> Result<(), StoreError> {
        info!(
            projects = inventory.projects.len(),
            backlog = inventory.backlog.len(),
            "inventory refreshed"
        );
        self.save_inventory(inventory)
    }
}
