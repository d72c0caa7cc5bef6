//! Keyboard state machine for one day's schedule.
//!
//! [`Editor::handle_key`] is a reducer: it updates the schedule, cursor and
//! overlay stack in memory and returns the side effects (persisting a change,
//! switching day, ...) for the caller to carry out. Nothing here does I/O.

pub mod cursor;
mod edit;
mod grab;
pub mod key;
mod navigate;
pub mod popups;

use chrono::NaiveDate;
use tracing::debug;

use crate::model::{Block, ClockTime, DaySchedule, Inventory, ScheduleConfig};
use crate::ops::block_ops;
use crate::ops::quick_command::QuickCommandTable;
use crate::sync::intent::{Change, RemoteIntent, Rollback};

pub use cursor::{BlockFocus, Cursor, Slot};
pub use edit::{BlockEdit, BlockField, LineBuffer, TaskEdit, TaskField, TimeMask};
pub use grab::GrabState;
pub use key::{Key, KeyCode, Modifiers};
pub use popups::{Menu, Overlay, PickItem, RangeField, SlashAction, TaskPicker, TimeRange};

/// Schedule defaults the reducer needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    pub day_start: ClockTime,
    pub default_block_minutes: u32,
    pub default_task_minutes: u32,
    pub time_step_minutes: u32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        EditorSettings::from(&ScheduleConfig::default())
    }
}

impl From<&ScheduleConfig> for EditorSettings {
    fn from(config: &ScheduleConfig) -> Self {
        EditorSettings {
            day_start: config.day_start,
            default_block_minutes: config.default_block_minutes,
            default_task_minutes: config.default_task_minutes,
            time_step_minutes: config.time_step_minutes,
        }
    }
}

/// Which modal session owns the keyboard below the overlays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Grab(GrabState),
    EditBlock(BlockEdit),
    EditTask(TaskEdit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// Typed in a gap: a quick command or a new block's label
    Command,
    /// Typed in an input slot: a new task
    TaskTitle,
}

/// Text typed at the cursor before Enter. Never empty while present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub kind: CaptureKind,
    pub buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

/// Side effect requested by a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Save the day and queue the change for the backend
    Persist(Change),
    SwitchDay(NaiveDate),
    Refresh,
    /// Inventory assignment flags changed locally
    InventoryChanged,
    Quit,
}

#[derive(Debug, Clone)]
pub struct Editor {
    pub schedule: DaySchedule,
    pub inventory: Inventory,
    pub cursor: Cursor,
    pub mode: Mode,
    /// Modal stack; the last entry owns the keyboard
    pub overlays: Vec<Overlay>,
    pub capture: Option<Capture>,
    pub status: Option<Status>,
    pub settings: EditorSettings,
    pub quick_commands: QuickCommandTable,
    effects: Vec<Effect>,
}

impl Editor {
    pub fn new(mut schedule: DaySchedule) -> Self {
        schedule.seed_id_seq();
        Editor {
            schedule,
            inventory: Inventory::default(),
            cursor: Cursor::between(None),
            mode: Mode::Navigate,
            overlays: Vec::new(),
            capture: None,
            status: None,
            settings: EditorSettings::default(),
            quick_commands: QuickCommandTable::default(),
            effects: Vec::new(),
        }
    }

    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_settings(mut self, settings: EditorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_quick_commands(mut self, table: QuickCommandTable) -> Self {
        self.quick_commands = table;
        self
    }

    /// Handle one key press and return the effects it produced.
    pub fn handle_key(&mut self, key: Key) -> Vec<Effect> {
        self.status = None;

        if key.has_ctrl() && key.code == KeyCode::Char('q') {
            self.effects.push(Effect::Quit);
        } else if !self.overlays.is_empty() {
            popups::handle_overlay(self, key);
        } else {
            match &self.mode {
                Mode::Grab(_) => grab::handle_grab(self, key),
                Mode::EditBlock(_) => edit::handle_edit_block(self, key),
                Mode::EditTask(_) => edit::handle_edit_task(self, key),
                Mode::Navigate => navigate::handle_navigate(self, key),
            }
        }

        self.clamp_cursor();
        std::mem::take(&mut self.effects)
    }

    /// True while a grab, edit or overlay is active. Reloads from disk or
    /// the backend wait until this is false.
    pub fn is_busy(&self) -> bool {
        self.mode != Mode::Navigate || !self.overlays.is_empty()
    }

    /// Show a different day from the top.
    pub fn load_day(&mut self, schedule: DaySchedule) {
        self.schedule = schedule;
        self.schedule.seed_id_seq();
        self.cursor = Cursor::between(None);
        self.mode = Mode::Navigate;
        self.overlays.clear();
        self.capture = None;
    }

    /// Replace the current day's contents (external edit or refresh),
    /// keeping the cursor where it can stay.
    pub fn replace_schedule(&mut self, schedule: DaySchedule) {
        self.schedule = schedule;
        self.schedule.sort_blocks();
        self.schedule.seed_id_seq();
        self.clamp_cursor();
    }

    /// Undo a change the backend rejected. Any grab or edit in progress is
    /// dropped since its indices may no longer hold.
    pub fn apply_rollback(&mut self, rollback: &Rollback, reason: &str) {
        if rollback.date == self.schedule.date {
            self.mode = Mode::Navigate;
            self.overlays.clear();
            rollback.apply(&mut self.schedule);
        }
        rollback.apply_inventory(&mut self.inventory);
        self.clamp_cursor();
        self.set_error(format!("sync failed, change reverted: {}", reason));
    }

    pub fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.clamped(&self.schedule);
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn top_overlay(&self) -> Option<&Overlay> {
        self.overlays.last()
    }

    fn push_capture(&mut self, kind: CaptureKind, c: char) {
        match &mut self.capture {
            Some(capture) => capture.buffer.push(c),
            None if c.is_whitespace() => {}
            None => {
                self.capture = Some(Capture {
                    kind,
                    buffer: c.to_string(),
                })
            }
        }
    }

    fn pop_capture(&mut self) {
        if let Some(capture) = &mut self.capture {
            capture.buffer.pop();
            if capture.buffer.is_empty() {
                self.capture = None;
            }
        }
    }

    fn suggested_start(&self, after: Option<usize>) -> ClockTime {
        self.schedule.suggested_start(after, self.settings.day_start)
    }

    /// Rollback that restores block `index` as it is now
    fn snapshot(&self, index: usize) -> Rollback {
        let block = &self.schedule.blocks[index];
        Rollback {
            date: self.schedule.date,
            block_id: block.id.clone(),
            before: Some(block.clone()),
            index,
            inventory: Vec::new(),
        }
    }

    fn persist(&mut self, intent: RemoteIntent, rollback: Rollback) {
        debug!(change = %intent.describe(), date = %intent.date(), "local change");
        self.effects.push(Effect::Persist(Change { intent, rollback }));
    }

    fn persist_block_update(&mut self, index: usize, rollback: Rollback) {
        let intent = RemoteIntent::UpdateBlock {
            date: self.schedule.date,
            block: self.schedule.blocks[index].clone(),
        };
        self.persist(intent, rollback);
    }

    fn persist_task_update(&mut self, index: usize, task: usize, rollback: Rollback) {
        let block = &self.schedule.blocks[index];
        let intent = RemoteIntent::UpdateTask {
            date: self.schedule.date,
            block_id: block.id.clone(),
            task: block.tasks[task].clone(),
        };
        self.persist(intent, rollback);
    }

    /// Insert a new block into the gap after `after`, restore time order
    /// and focus it.
    fn create_block(&mut self, block: Block, after: Option<usize>) {
        let gap = after.map_or(0, |i| i + 1);
        let id = block.id.clone();
        let index = block_ops::insert_block_sorted(&mut self.schedule, gap, block);
        self.cursor = Cursor::header(index);
        let block = &self.schedule.blocks[index];
        let message = format!("added {} {}", block.start, block.title());
        let intent = RemoteIntent::CreateBlock {
            date: self.schedule.date,
            block: block.clone(),
        };
        let rollback = Rollback {
            date: self.schedule.date,
            block_id: id,
            before: None,
            index,
            inventory: Vec::new(),
        };
        self.set_status(message);
        self.persist(intent, rollback);
    }
}

/// Functional form of [`Editor::handle_key`].
pub fn reduce(mut editor: Editor, key: Key) -> (Editor, Vec<Effect>) {
    let effects = editor.handle_key(key);
    (editor, effects)
}
