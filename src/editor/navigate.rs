use chrono::Duration;

use crate::model::{Block, Task};
use crate::ops::{block_ops, task_ops};
use crate::sync::intent::{InventoryFlag, RemoteIntent};

use super::cursor::{step_backward, step_forward};
use super::edit::{enter_block_edit, enter_task_edit};
use super::grab::{enter_block_grab, enter_task_grab};
use super::popups::{open_block_type_menu, open_day_picker, open_slash_menu, open_task_command_menu};
use super::{BlockFocus, CaptureKind, Cursor, Editor, Effect, Key, KeyCode, Slot};

pub(super) fn handle_navigate(ed: &mut Editor, key: Key) {
    if key.has_ctrl() {
        handle_global(ed, key);
        return;
    }

    if ed.cursor == Cursor::None {
        if key.code != KeyCode::Esc {
            ed.cursor = Cursor::between(None);
        }
        return;
    }

    if key.code == KeyCode::Esc {
        escape(ed);
        return;
    }

    match ed.cursor {
        Cursor::None => {}
        Cursor::Between { after } => handle_between(ed, after, key),
        Cursor::Block {
            index,
            focus: BlockFocus::Header,
        } => handle_header(ed, index, key),
        Cursor::Block {
            index,
            focus: BlockFocus::Slot(slot),
        } => handle_slot(ed, index, slot, key),
        Cursor::Block {
            index,
            focus: BlockFocus::Task(task),
        } => handle_task(ed, index, task, key),
    }
}

/// Ctrl chords that work from any cursor position
fn handle_global(ed: &mut Editor, key: Key) {
    let date = ed.schedule.date;
    match key.code {
        KeyCode::Char('d') => open_day_picker(ed),
        KeyCode::Char('r') => ed.effects.push(Effect::Refresh),
        KeyCode::Left => {
            if let Some(prev) = date.checked_sub_signed(Duration::days(1)) {
                ed.effects.push(Effect::SwitchDay(prev));
            }
        }
        KeyCode::Right => {
            if let Some(next) = date.checked_add_signed(Duration::days(1)) {
                ed.effects.push(Effect::SwitchDay(next));
            }
        }
        _ => {}
    }
}

/// Clear the capture, else step focus outward one level.
fn escape(ed: &mut Editor) {
    if ed.capture.take().is_some() {
        return;
    }
    ed.cursor = match ed.cursor {
        Cursor::Block {
            index,
            focus: BlockFocus::Task(t),
        } => Cursor::slot(index, Slot::After(t)),
        Cursor::Block { index, .. } => Cursor::between(Some(index)),
        other => other,
    };
}

fn handle_between(ed: &mut Editor, after: Option<usize>, key: Key) {
    let typing = ed.capture.is_some();
    let below = after.map_or(0, |i| i + 1);
    match key.code {
        KeyCode::Down if !typing => {
            if below < ed.schedule.blocks.len() {
                ed.cursor = Cursor::header(below);
            }
        }
        KeyCode::Up if !typing => {
            if let Some(i) = after {
                ed.cursor = Cursor::header(i);
            }
        }
        KeyCode::Enter if typing => submit_command(ed, after),
        KeyCode::Enter => {
            if below < ed.schedule.blocks.len() {
                ed.cursor = Cursor::header(below);
            }
        }
        KeyCode::Backspace => ed.pop_capture(),
        KeyCode::Char('/') if !typing && key.printable().is_some() => open_slash_menu(ed, after),
        _ => {
            if let Some(c) = key.printable() {
                ed.push_capture(CaptureKind::Command, c);
            }
        }
    }
}

/// Enter on a command capture: a quick command creates the block at once,
/// anything else becomes the label of a block picked from the type menu.
fn submit_command(ed: &mut Editor, after: Option<usize>) {
    let Some(text) = ed.capture.as_ref().map(|c| c.buffer.trim().to_string()) else {
        return;
    };
    match ed.quick_commands.parse(&text) {
        Some(qc) => {
            let mut block = Block::new(
                block_ops::next_block_id(&mut ed.schedule),
                qc.block_type,
                qc.time,
                ed.settings.default_block_minutes,
            );
            if qc.label != qc.block_type.label() {
                block.label = Some(qc.label);
            }
            ed.capture = None;
            ed.create_block(block, after);
        }
        None => open_block_type_menu(ed, Some(text), after),
    }
}

fn handle_header(ed: &mut Editor, index: usize, key: Key) {
    let Some(block) = ed.schedule.blocks.get(index) else {
        return;
    };
    let task_count = block.tasks.len();
    match key.code {
        KeyCode::Up | KeyCode::BackTab => ed.cursor = Cursor::between(index.checked_sub(1)),
        KeyCode::Down => ed.cursor = Cursor::between(Some(index)),
        KeyCode::Tab => ed.cursor = Cursor::slot(index, Slot::BeforeFirst),
        KeyCode::Enter => {
            let slot = match task_count {
                0 => Slot::BeforeFirst,
                n => Slot::After(n - 1),
            };
            ed.cursor = Cursor::slot(index, slot);
        }
        KeyCode::Delete | KeyCode::Backspace => {
            let confirmed = key.has_shift() || key.has_ctrl();
            delete_block(ed, index, confirmed);
        }
        KeyCode::Char('g') if key.printable().is_some() => enter_block_grab(ed, index),
        KeyCode::Char('e') if key.printable().is_some() => enter_block_edit(ed, index),
        _ => {}
    }
}

fn delete_block(ed: &mut Editor, index: usize, confirmed: bool) {
    let Some(block) = ed.schedule.blocks.get(index) else {
        return;
    };
    if !block.tasks.is_empty() && !confirmed {
        let n = block.tasks.len();
        ed.set_error(format!("block has {} task(s): Shift+Delete to remove it", n));
        return;
    }
    let rollback = ed.snapshot(index);
    let Some(removed) = block_ops::remove_block(&mut ed.schedule, index) else {
        return;
    };
    ed.cursor = Cursor::between(index.checked_sub(1));
    ed.set_status(format!("deleted {} {}", removed.start, removed.title()));
    let date = ed.schedule.date;
    ed.persist(
        RemoteIntent::DeleteBlock {
            date,
            block_id: removed.id,
        },
        rollback,
    );
}

/// Down/Tab and Up/Shift+Tab walk the slots and tasks of a block.
/// Returns true when the key moved the cursor.
fn walk_block(ed: &mut Editor, index: usize, focus: BlockFocus, key: Key) -> bool {
    if ed.capture.is_some() {
        return false;
    }
    let task_count = ed.schedule.blocks.get(index).map_or(0, |b| b.tasks.len());
    let next = match key.code {
        KeyCode::Down | KeyCode::Tab => step_forward(focus, task_count),
        KeyCode::Up | KeyCode::BackTab => step_backward(focus),
        _ => return false,
    };
    ed.cursor = match next {
        Some(focus) => Cursor::Block { index, focus },
        None => Cursor::header(index),
    };
    true
}

fn handle_slot(ed: &mut Editor, index: usize, slot: Slot, key: Key) {
    if walk_block(ed, index, BlockFocus::Slot(slot), key) {
        return;
    }
    let typing = ed.capture.is_some();
    match key.code {
        KeyCode::Enter if typing => submit_task(ed, index, slot),
        KeyCode::Backspace => ed.pop_capture(),
        KeyCode::Char('/') if !typing && key.printable().is_some() => {
            open_task_command_menu(ed, index, slot)
        }
        _ => {
            if let Some(c) = key.printable() {
                ed.push_capture(CaptureKind::TaskTitle, c);
            }
        }
    }
}

fn submit_task(ed: &mut Editor, index: usize, slot: Slot) {
    let Some(capture) = ed.capture.take() else {
        return;
    };
    let (title, minutes) = task_ops::parse_task_entry(&capture.buffer);
    if title.is_empty() || index >= ed.schedule.blocks.len() {
        return;
    }
    let rollback = ed.snapshot(index);
    let task = Task::new(
        block_ops::next_task_id(&mut ed.schedule),
        title,
        minutes.unwrap_or(ed.settings.default_task_minutes),
    );
    let block = &mut ed.schedule.blocks[index];
    let at = task_ops::insert_task(block, slot.insert_index(), task.clone());
    let block_id = block.id.clone();
    ed.cursor = Cursor::slot(index, Slot::After(at));
    let date = ed.schedule.date;
    ed.persist(
        RemoteIntent::CreateTask {
            date,
            block_id,
            index: at,
            task,
        },
        rollback,
    );
}

fn handle_task(ed: &mut Editor, index: usize, task: usize, key: Key) {
    if walk_block(ed, index, BlockFocus::Task(task), key) {
        return;
    }
    match key.code {
        KeyCode::Enter => enter_task_edit(ed, index, task),
        KeyCode::Delete | KeyCode::Backspace => delete_task(ed, index, task),
        _ => match key.printable() {
            Some(' ' | 'x') => toggle_task(ed, index, task),
            Some('g') => enter_task_grab(ed, index, task),
            Some('e') => enter_task_edit(ed, index, task),
            _ => {}
        },
    }
}

fn toggle_task(ed: &mut Editor, index: usize, task: usize) {
    if ed.schedule.blocks.get(index).is_none_or(|b| task >= b.tasks.len()) {
        return;
    }
    let rollback = ed.snapshot(index);
    if task_ops::toggle_complete(&mut ed.schedule.blocks[index], task).is_some() {
        ed.persist_task_update(index, task, rollback);
    }
}

/// Delete a task, or hand it back to the inventory when it came from there.
/// Focus moves to the slot before it.
fn delete_task(ed: &mut Editor, index: usize, task: usize) {
    if ed.schedule.blocks.get(index).is_none_or(|b| task >= b.tasks.len()) {
        return;
    }
    let mut rollback = ed.snapshot(index);
    let block = &mut ed.schedule.blocks[index];
    let Some(removed) = task_ops::remove_task(block, task) else {
        return;
    };
    let block_id = block.id.clone();
    let date = ed.schedule.date;
    ed.cursor = match task {
        0 => Cursor::slot(index, Slot::BeforeFirst),
        t => Cursor::slot(index, Slot::After(t - 1)),
    };

    let intent = match removed.origin {
        Some(origin) => {
            ed.inventory.set_assigned(origin.source, &origin.task_id, false);
            rollback.inventory.push(InventoryFlag {
                source: origin.source,
                task_id: origin.task_id.clone(),
                assigned: true,
            });
            ed.effects.push(Effect::InventoryChanged);
            ed.set_status(format!("returned \"{}\" to inventory", removed.title));
            RemoteIntent::UnassignTask {
                date,
                block_id,
                task_id: removed.id,
                origin,
            }
        }
        None => RemoteIntent::DeleteTask {
            date,
            block_id,
            task_id: removed.id,
        },
    };
    ed.persist(intent, rollback);
}
