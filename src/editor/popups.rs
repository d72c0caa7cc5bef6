use chrono::{Duration, NaiveDate};

use crate::model::{Block, BlockType, ClockTime, InventorySource, Task, TaskOrigin};
use crate::ops::block_ops;
use crate::sync::intent::{InventoryFlag, RemoteIntent};
use crate::util::fuzzy;

use super::edit::{LineBuffer, TimeMask};
use super::grab;
use super::{Cursor, Editor, Effect, Key, KeyCode, Mode, Slot};

/// What a key did to a single-select menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    Pending,
    Select,
    Cancel,
}

/// Filterable single-select list. Typing filters, Up/Down move the
/// highlight, Enter selects, Escape cancels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu<T> {
    items: Vec<(String, T)>,
    filter: String,
    visible: Vec<usize>,
    highlight: usize,
}

impl<T> Menu<T> {
    pub fn new(items: Vec<(String, T)>) -> Self {
        let visible = (0..items.len()).collect();
        Menu {
            items,
            filter: String::new(),
            visible,
            highlight: 0,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Position of the highlight within `visible()`
    pub fn highlight(&self) -> usize {
        self.highlight
    }

    /// Items passing the filter, best match first
    pub fn visible(&self) -> impl Iterator<Item = (&str, &T)> {
        self.visible.iter().map(|&i| {
            let (label, value) = &self.items[i];
            (label.as_str(), value)
        })
    }

    pub fn current(&self) -> Option<&T> {
        self.visible
            .get(self.highlight)
            .map(|&i| &self.items[i].1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn refilter(&mut self) {
        self.visible = fuzzy::rank(&self.filter, self.items.iter().map(|(l, _)| l.as_str()));
        self.highlight = 0;
    }

    fn move_highlight(&mut self, delta: i32) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        self.highlight = (self.highlight as i32 + delta).rem_euclid(len as i32) as usize;
    }

    pub fn handle_key(&mut self, key: Key) -> MenuEvent {
        match key.code {
            KeyCode::Esc => return MenuEvent::Cancel,
            KeyCode::Enter if self.current().is_some() => return MenuEvent::Select,
            KeyCode::Up | KeyCode::BackTab => self.move_highlight(-1),
            KeyCode::Down | KeyCode::Tab => self.move_highlight(1),
            KeyCode::Backspace => {
                if self.filter.pop().is_some() {
                    self.refilter();
                }
            }
            _ => {
                if let Some(c) = key.printable() {
                    self.filter.push(c);
                    self.refilter();
                }
            }
        }
        MenuEvent::Pending
    }
}

impl Menu<BlockType> {
    /// Every block type, highlighting `current` when given
    pub fn block_types(current: Option<BlockType>) -> Self {
        let mut menu = Menu::new(
            BlockType::ALL
                .iter()
                .map(|t| (t.label().to_string(), *t))
                .collect(),
        );
        if let Some(current) = current {
            menu.highlight = BlockType::ALL.iter().position(|t| *t == current).unwrap_or(0);
        }
        menu
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashAction {
    Block(BlockType),
    Routine,
    Event,
    JumpToDay,
}

fn slash_menu() -> Menu<SlashAction> {
    let mut items: Vec<(String, SlashAction)> = BlockType::ALL
        .iter()
        .filter(|t| !matches!(t, BlockType::Routine | BlockType::Event))
        .map(|t| (t.label().to_string(), SlashAction::Block(*t)))
        .collect();
    items.push(("Routine\u{2026}".into(), SlashAction::Routine));
    items.push(("Event\u{2026}".into(), SlashAction::Event));
    items.push(("Jump to day\u{2026}".into(), SlashAction::JumpToDay));
    Menu::new(items)
}

/// Why the block-type menu is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePurpose {
    /// Creating a block in the gap after `after`
    NewBlock {
        label: Option<String>,
        after: Option<usize>,
    },
    /// Picking the type field of the block being edited
    EditField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Start,
    End,
}

/// Start/end entry for a new block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub block_type: BlockType,
    pub label: Option<String>,
    pub after: Option<usize>,
    pub start: TimeMask,
    pub end: TimeMask,
    pub field: RangeField,
}

impl TimeRange {
    fn new(
        block_type: BlockType,
        label: Option<String>,
        after: Option<usize>,
        start: ClockTime,
        minutes: u32,
    ) -> Self {
        TimeRange {
            block_type,
            label,
            after,
            start: TimeMask::new(start),
            end: TimeMask::new(start.saturating_add(minutes)),
            field: RangeField::Start,
        }
    }

    fn focused(&mut self) -> &mut TimeMask {
        match self.field {
            RangeField::Start => &mut self.start,
            RangeField::End => &mut self.end,
        }
    }

    /// Start and duration, or a message explaining what is wrong
    pub fn resolve(&self) -> Result<(ClockTime, u32), String> {
        let start = self.start.value().map_err(|e| format!("start: {}", e))?;
        let end = self.end.value().map_err(|e| format!("end: {}", e))?;
        if end <= start {
            return Err("end must be after start".into());
        }
        Ok((start, start.minutes_until(end)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEditor {
    pub buffer: LineBuffer,
}

impl LinkEditor {
    pub fn new(link: &str) -> Self {
        LinkEditor {
            buffer: LineBuffer::new(link),
        }
    }
}

/// An inventory task offered by a picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub id: String,
    pub title: String,
    pub duration_min: u32,
    pub project_id: Option<String>,
}

/// Multi-select picker over project or backlog tasks. `chosen` keeps
/// selection order and is independent of the highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPicker {
    pub source: InventorySource,
    pub block_index: usize,
    pub slot: Slot,
    pub menu: Menu<PickItem>,
    pub chosen: Vec<PickItem>,
    submitting: bool,
}

impl TaskPicker {
    pub fn new(source: InventorySource, block_index: usize, slot: Slot, items: Vec<(String, PickItem)>) -> Self {
        TaskPicker {
            source,
            block_index,
            slot,
            menu: Menu::new(items),
            chosen: Vec::new(),
            submitting: false,
        }
    }

    pub fn is_chosen(&self, id: &str) -> bool {
        self.chosen.iter().any(|c| c.id == id)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Add or remove the highlighted item from the batch.
    pub fn toggle_current(&mut self) {
        let Some(item) = self.menu.current().cloned() else {
            return;
        };
        match self.chosen.iter().position(|c| c.id == item.id) {
            Some(i) => {
                self.chosen.remove(i);
            }
            None => self.chosen.push(item),
        }
    }

    /// The batch to insert: the chosen items, or the highlight when nothing
    /// is chosen. Returns None once a commit has already been taken.
    pub fn take_commit(&mut self) -> Option<Vec<PickItem>> {
        if self.submitting {
            return None;
        }
        let batch = if self.chosen.is_empty() {
            vec![self.menu.current()?.clone()]
        } else {
            std::mem::take(&mut self.chosen)
        };
        self.submitting = true;
        Some(batch)
    }
}

/// A modal popup. The top of `Editor::overlays` owns the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    SlashMenu {
        menu: Menu<SlashAction>,
        after: Option<usize>,
    },
    BlockTypeMenu {
        menu: Menu<BlockType>,
        purpose: TypePurpose,
    },
    TimeRange(TimeRange),
    /// Start time for a block dropped out of grab mode
    TimeConfirm(TimeMask),
    RoutinePicker {
        menu: Menu<String>,
        after: Option<usize>,
    },
    EventPicker {
        menu: Menu<String>,
        after: Option<usize>,
    },
    TaskCommandMenu {
        menu: Menu<InventorySource>,
        block_index: usize,
        slot: Slot,
    },
    TaskPicker(TaskPicker),
    DayPicker {
        date: NaiveDate,
    },
    LinkEditor(LinkEditor),
}

impl Overlay {
    pub fn title(&self) -> &'static str {
        match self {
            Overlay::SlashMenu { .. } => "Insert",
            Overlay::BlockTypeMenu { .. } => "Block type",
            Overlay::TimeRange(_) => "Time",
            Overlay::TimeConfirm(_) => "Start at",
            Overlay::RoutinePicker { .. } => "Routine",
            Overlay::EventPicker { .. } => "Event",
            Overlay::TaskCommandMenu { .. } => "Add from",
            Overlay::TaskPicker(p) => match p.source {
                InventorySource::Project => "Project tasks",
                InventorySource::Backlog => "Backlog",
            },
            Overlay::DayPicker { .. } => "Go to day",
            Overlay::LinkEditor(_) => "Meeting link",
        }
    }
}

pub(super) fn open_slash_menu(ed: &mut Editor, after: Option<usize>) {
    ed.overlays.push(Overlay::SlashMenu {
        menu: slash_menu(),
        after,
    });
}

pub(super) fn open_task_command_menu(ed: &mut Editor, block_index: usize, slot: Slot) {
    let menu = Menu::new(vec![
        ("Project task\u{2026}".to_string(), InventorySource::Project),
        ("Backlog task\u{2026}".to_string(), InventorySource::Backlog),
    ]);
    ed.overlays.push(Overlay::TaskCommandMenu {
        menu,
        block_index,
        slot,
    });
}

pub(super) fn open_day_picker(ed: &mut Editor) {
    let date = ed.schedule.date;
    ed.overlays.push(Overlay::DayPicker { date });
}

pub(super) fn open_block_type_menu(ed: &mut Editor, label: Option<String>, after: Option<usize>) {
    ed.overlays.push(Overlay::BlockTypeMenu {
        menu: Menu::block_types(None),
        purpose: TypePurpose::NewBlock { label, after },
    });
}

fn open_time_range(ed: &mut Editor, block_type: BlockType, label: Option<String>, after: Option<usize>) {
    let start = ed.suggested_start(after);
    let minutes = ed.settings.default_block_minutes;
    ed.overlays.push(Overlay::TimeRange(TimeRange::new(
        block_type, label, after, start, minutes,
    )));
}

/// Route a key to the top overlay. The overlay is popped while it handles
/// the key and pushed back if it stays open.
pub(super) fn handle_overlay(ed: &mut Editor, key: Key) {
    let Some(overlay) = ed.overlays.pop() else {
        return;
    };
    let keep = match overlay {
        Overlay::SlashMenu { mut menu, after } => match menu.handle_key(key) {
            MenuEvent::Select => {
                if let Some(action) = menu.current().copied() {
                    slash_selected(ed, action, after);
                }
                None
            }
            MenuEvent::Cancel => None,
            MenuEvent::Pending => Some(Overlay::SlashMenu { menu, after }),
        },
        Overlay::BlockTypeMenu { mut menu, purpose } => match menu.handle_key(key) {
            MenuEvent::Select => {
                if let Some(block_type) = menu.current().copied() {
                    block_type_selected(ed, block_type, purpose);
                }
                None
            }
            MenuEvent::Cancel => None,
            MenuEvent::Pending => Some(Overlay::BlockTypeMenu { menu, purpose }),
        },
        Overlay::TimeRange(range) => handle_time_range(ed, range, key),
        Overlay::TimeConfirm(mask) => handle_time_confirm(ed, mask, key),
        Overlay::RoutinePicker { mut menu, after } => match menu.handle_key(key) {
            MenuEvent::Select => {
                if let Some(id) = menu.current().cloned() {
                    create_from_routine(ed, &id, after);
                }
                None
            }
            MenuEvent::Cancel => None,
            MenuEvent::Pending => Some(Overlay::RoutinePicker { menu, after }),
        },
        Overlay::EventPicker { mut menu, after } => match menu.handle_key(key) {
            MenuEvent::Select => {
                if let Some(id) = menu.current().cloned() {
                    create_from_event(ed, &id, after);
                }
                None
            }
            MenuEvent::Cancel => None,
            MenuEvent::Pending => Some(Overlay::EventPicker { menu, after }),
        },
        Overlay::TaskCommandMenu {
            mut menu,
            block_index,
            slot,
        } => match menu.handle_key(key) {
            MenuEvent::Select => {
                if let Some(source) = menu.current().copied() {
                    open_task_picker(ed, source, block_index, slot);
                }
                None
            }
            MenuEvent::Cancel => None,
            MenuEvent::Pending => Some(Overlay::TaskCommandMenu {
                menu,
                block_index,
                slot,
            }),
        },
        Overlay::TaskPicker(picker) => handle_task_picker(ed, picker, key),
        Overlay::DayPicker { date } => handle_day_picker(ed, date, key),
        Overlay::LinkEditor(editor) => handle_link_editor(ed, editor, key),
    };
    if let Some(overlay) = keep {
        ed.overlays.push(overlay);
    }
}

fn slash_selected(ed: &mut Editor, action: SlashAction, after: Option<usize>) {
    match action {
        SlashAction::Block(block_type) => open_time_range(ed, block_type, None, after),
        SlashAction::Routine => {
            if ed.inventory.routines.is_empty() {
                ed.set_error("no routines in inventory");
                return;
            }
            let menu = Menu::new(
                ed.inventory
                    .routines
                    .iter()
                    .map(|r| (r.name.clone(), r.id.clone()))
                    .collect(),
            );
            ed.overlays.push(Overlay::RoutinePicker { menu, after });
        }
        SlashAction::Event => {
            if ed.inventory.events.is_empty() {
                ed.set_error("no events in inventory");
                return;
            }
            let menu = Menu::new(
                ed.inventory
                    .events
                    .iter()
                    .map(|e| (format!("{} {}", e.start, e.name), e.id.clone()))
                    .collect(),
            );
            ed.overlays.push(Overlay::EventPicker { menu, after });
        }
        SlashAction::JumpToDay => open_day_picker(ed),
    }
}

fn block_type_selected(ed: &mut Editor, block_type: BlockType, purpose: TypePurpose) {
    match purpose {
        TypePurpose::NewBlock { label, after } => open_time_range(ed, block_type, label, after),
        TypePurpose::EditField => {
            if let Mode::EditBlock(edit) = &mut ed.mode {
                edit.block_type = block_type;
            }
        }
    }
}

fn handle_time_range(ed: &mut Editor, mut range: TimeRange, key: Key) -> Option<Overlay> {
    match key.code {
        KeyCode::Esc => return None,
        KeyCode::Tab | KeyCode::BackTab => {
            range.field = match range.field {
                RangeField::Start => RangeField::End,
                RangeField::End => RangeField::Start,
            };
        }
        KeyCode::Enter => match range.resolve() {
            Ok((start, minutes)) => {
                let mut block = Block::new(
                    block_ops::next_block_id(&mut ed.schedule),
                    range.block_type,
                    start,
                    minutes,
                );
                block.label = range.label.filter(|l| !l.is_empty());
                ed.capture = None;
                ed.create_block(block, range.after);
                return None;
            }
            Err(msg) => ed.set_error(msg),
        },
        _ => {
            let step = ed.settings.time_step_minutes;
            range.focused().handle_key(key, step);
        }
    }
    Some(Overlay::TimeRange(range))
}

fn handle_time_confirm(ed: &mut Editor, mut mask: TimeMask, key: Key) -> Option<Overlay> {
    match key.code {
        KeyCode::Esc => {
            grab::cancel_grab(ed);
            return None;
        }
        KeyCode::Enter => match mask.value() {
            Ok(start) => {
                grab::drop_block(ed, start);
                return None;
            }
            Err(e) => ed.set_error(format!("invalid time: {}", e)),
        },
        _ => {
            let step = ed.settings.time_step_minutes;
            mask.handle_key(key, step);
        }
    }
    Some(Overlay::TimeConfirm(mask))
}

fn create_from_routine(ed: &mut Editor, routine_id: &str, after: Option<usize>) {
    let Some(routine) = ed.inventory.routines.iter().find(|r| r.id == routine_id).cloned() else {
        return;
    };
    let start = routine.start.unwrap_or_else(|| ed.suggested_start(after));
    let minutes = match routine.duration_min {
        0 => ed.settings.default_block_minutes,
        n => n,
    };
    let mut block = Block::new(
        block_ops::next_block_id(&mut ed.schedule),
        BlockType::Routine,
        start,
        minutes,
    );
    block.label = Some(routine.name.clone());
    block.meta.recurring = true;
    block.meta.routine_id = Some(routine.id.clone());
    let ids = block_ops::next_task_ids(&mut ed.schedule, routine.tasks.len());
    block.tasks = routine
        .tasks
        .iter()
        .zip(ids)
        .map(|(rt, id)| Task::new(id, rt.title.clone(), rt.duration_min))
        .collect();
    ed.capture = None;
    ed.create_block(block, after);
}

fn create_from_event(ed: &mut Editor, event_id: &str, after: Option<usize>) {
    let Some(event) = ed.inventory.events.iter().find(|e| e.id == event_id).cloned() else {
        return;
    };
    let minutes = match event.duration_min {
        0 => ed.settings.default_block_minutes,
        n => n,
    };
    let mut block = Block::new(
        block_ops::next_block_id(&mut ed.schedule),
        BlockType::Event,
        event.start,
        minutes,
    );
    block.label = Some(event.name);
    block.meta.event_id = Some(event.id);
    block.meta.meeting_link = event.meeting_link;
    block.meta.location = event.location;
    ed.capture = None;
    ed.create_block(block, after);
}

fn open_task_picker(ed: &mut Editor, source: InventorySource, block_index: usize, slot: Slot) {
    let items: Vec<(String, PickItem)> = ed
        .inventory
        .pickable(source)
        .into_iter()
        .map(|(task, label)| {
            let item = PickItem {
                id: task.id.clone(),
                title: task.title.clone(),
                duration_min: task.duration_min,
                project_id: task.project_id.clone(),
            };
            (label, item)
        })
        .collect();
    if items.is_empty() {
        ed.set_status("nothing left to pick");
        return;
    }
    ed.overlays.push(Overlay::TaskPicker(TaskPicker::new(
        source,
        block_index,
        slot,
        items,
    )));
}

fn handle_task_picker(ed: &mut Editor, mut picker: TaskPicker, key: Key) -> Option<Overlay> {
    let toggles = key.code == KeyCode::Tab
        || (key.code == KeyCode::Enter && !key.modifiers.is_empty());
    if toggles {
        picker.toggle_current();
        return Some(Overlay::TaskPicker(picker));
    }
    match key.code {
        KeyCode::Esc => None,
        KeyCode::Enter => match picker.take_commit() {
            Some(batch) => {
                insert_picked(ed, &picker, batch);
                None
            }
            None => Some(Overlay::TaskPicker(picker)),
        },
        _ => {
            picker.menu.handle_key(key);
            Some(Overlay::TaskPicker(picker))
        }
    }
}

/// Insert a picked batch as one change and mark the inventory tasks assigned.
fn insert_picked(ed: &mut Editor, picker: &TaskPicker, batch: Vec<PickItem>) {
    let index = picker.block_index;
    let Some(block) = ed.schedule.blocks.get(index) else {
        return;
    };
    let at = picker.slot.insert_index().min(block.tasks.len());
    let block_id = block.id.clone();
    let mut rollback = ed.snapshot(index);

    let ids = block_ops::next_task_ids(&mut ed.schedule, batch.len());
    let default_minutes = ed.settings.default_task_minutes;
    let tasks: Vec<Task> = batch
        .iter()
        .zip(ids)
        .map(|(item, id)| {
            let minutes = match item.duration_min {
                0 => default_minutes,
                n => n,
            };
            let mut task = Task::new(id, item.title.clone(), minutes);
            task.project_id = item.project_id.clone();
            task.origin = Some(TaskOrigin {
                source: picker.source,
                task_id: item.id.clone(),
            });
            task
        })
        .collect();

    let block = &mut ed.schedule.blocks[index];
    for (offset, task) in tasks.iter().enumerate() {
        block.tasks.insert(at + offset, task.clone());
    }
    for item in &batch {
        ed.inventory.set_assigned(picker.source, &item.id, true);
        rollback.inventory.push(InventoryFlag {
            source: picker.source,
            task_id: item.id.clone(),
            assigned: false,
        });
    }

    ed.cursor = Cursor::slot(index, Slot::After(at + tasks.len() - 1));
    ed.set_status(format!("added {} task(s)", tasks.len()));
    let date = ed.schedule.date;
    ed.persist(
        RemoteIntent::InsertTasks {
            date,
            block_id,
            index: at,
            tasks,
        },
        rollback,
    );
    ed.effects.push(Effect::InventoryChanged);
}

fn handle_day_picker(ed: &mut Editor, date: NaiveDate, key: Key) -> Option<Overlay> {
    let shift = |days: i64| date.checked_add_signed(Duration::days(days)).unwrap_or(date);
    let date = match key.code {
        KeyCode::Esc => return None,
        KeyCode::Enter => {
            if date != ed.schedule.date {
                ed.effects.push(Effect::SwitchDay(date));
            }
            return None;
        }
        KeyCode::Left => shift(-1),
        KeyCode::Right => shift(1),
        KeyCode::Up => shift(-7),
        KeyCode::Down => shift(7),
        _ => date,
    };
    Some(Overlay::DayPicker { date })
}

fn handle_link_editor(ed: &mut Editor, mut editor: LinkEditor, key: Key) -> Option<Overlay> {
    match key.code {
        KeyCode::Esc => None,
        KeyCode::Enter => {
            if let Mode::EditBlock(edit) = &mut ed.mode {
                let link = editor.buffer.as_str().trim();
                edit.meeting_link = (!link.is_empty()).then(|| link.to_string());
            }
            None
        }
        _ => {
            editor.buffer.handle_key(key);
            Some(Overlay::LinkEditor(editor))
        }
    }
}
