use tracing::debug;

use crate::model::{Block, ClockTime};
use crate::ops::{block_ops, task_ops};
use crate::sync::intent::{RemoteIntent, Rollback};

use super::edit::TimeMask;
use super::popups::Overlay;
use super::{Cursor, Editor, Key, KeyCode, Mode};

/// A block or task being moved with the arrow keys. `before` is the
/// owning block as it was when the grab started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabState {
    Block {
        origin_index: usize,
        index: usize,
        before: Block,
    },
    Task {
        block_index: usize,
        origin_index: usize,
        index: usize,
        before: Block,
    },
}

pub(super) fn enter_block_grab(ed: &mut Editor, index: usize) {
    let Some(block) = ed.schedule.blocks.get(index) else {
        return;
    };
    ed.mode = Mode::Grab(GrabState::Block {
        origin_index: index,
        index,
        before: block.clone(),
    });
}

pub(super) fn enter_task_grab(ed: &mut Editor, block_index: usize, task: usize) {
    let Some(block) = ed.schedule.blocks.get(block_index) else {
        return;
    };
    if task >= block.tasks.len() {
        return;
    }
    ed.mode = Mode::Grab(GrabState::Task {
        block_index,
        origin_index: task,
        index: task,
        before: block.clone(),
    });
}

pub(super) fn handle_grab(ed: &mut Editor, key: Key) {
    if !key.modifiers.is_empty() {
        return;
    }
    let direction = match key.code {
        KeyCode::Up => -1,
        KeyCode::Down => 1,
        KeyCode::Esc => {
            cancel_grab(ed);
            return;
        }
        KeyCode::Enter | KeyCode::Char('g') => {
            release(ed);
            return;
        }
        _ => return,
    };

    let Mode::Grab(state) = &mut ed.mode else {
        return;
    };
    match state {
        GrabState::Block { index, .. } => {
            if let Some(new) = block_ops::swap_block(&mut ed.schedule, *index, direction) {
                *index = new;
                ed.cursor = Cursor::header(new);
            }
        }
        GrabState::Task {
            block_index, index, ..
        } => {
            let Some(block) = ed.schedule.blocks.get_mut(*block_index) else {
                return;
            };
            if let Some(new) = task_ops::swap_task(block, *index, direction) {
                *index = new;
                ed.cursor = Cursor::task(*block_index, new);
            }
        }
    }
}

fn release(ed: &mut Editor) {
    match &ed.mode {
        Mode::Grab(GrabState::Block { index, .. }) => {
            let suggested = suggested_drop_start(ed, *index);
            ed.overlays.push(Overlay::TimeConfirm(TimeMask::new(suggested)));
        }
        Mode::Grab(GrabState::Task { .. }) => {
            let Mode::Grab(GrabState::Task {
                block_index,
                origin_index,
                index,
                before,
            }) = std::mem::replace(&mut ed.mode, Mode::Navigate)
            else {
                return;
            };
            ed.cursor = Cursor::task(block_index, index);
            if index == origin_index {
                return;
            }
            let Some(block) = ed.schedule.blocks.get(block_index) else {
                return;
            };
            debug!(block = %block.id, from = origin_index, to = index, "task moved");
            let intent = RemoteIntent::ReorderTasks {
                date: ed.schedule.date,
                block_id: block.id.clone(),
                task_ids: task_ops::task_ids(block),
            };
            let rollback = Rollback {
                date: ed.schedule.date,
                block_id: before.id.clone(),
                before: Some(before),
                index: block_index,
                inventory: Vec::new(),
            };
            ed.persist(intent, rollback);
        }
        _ => {}
    }
}

/// End of the block above the drop position, else the block's own start.
fn suggested_drop_start(ed: &Editor, index: usize) -> ClockTime {
    match index.checked_sub(1).and_then(|i| ed.schedule.blocks.get(i)) {
        Some(above) => above.end(),
        None => ed
            .schedule
            .blocks
            .get(index)
            .map_or(ed.settings.day_start, |b| b.start),
    }
}

/// Put the grabbed block or task back where it started.
pub(super) fn cancel_grab(ed: &mut Editor) {
    match std::mem::replace(&mut ed.mode, Mode::Navigate) {
        Mode::Grab(GrabState::Block {
            origin_index,
            index,
            ..
        }) => {
            block_ops::move_block(&mut ed.schedule, index, origin_index);
            ed.cursor = Cursor::header(origin_index);
        }
        Mode::Grab(GrabState::Task {
            block_index,
            origin_index,
            index,
            ..
        }) => {
            if let Some(block) = ed.schedule.blocks.get_mut(block_index) {
                task_ops::move_task(block, index, origin_index);
            }
            ed.cursor = Cursor::task(block_index, origin_index);
        }
        other => ed.mode = other,
    }
}

/// Finish a block grab: apply the confirmed start, re-sort and follow.
pub(super) fn drop_block(ed: &mut Editor, start: ClockTime) {
    let Mode::Grab(GrabState::Block {
        origin_index,
        index,
        before,
    }) = std::mem::replace(&mut ed.mode, Mode::Navigate)
    else {
        return;
    };
    let Some(block) = ed.schedule.blocks.get_mut(index) else {
        return;
    };
    block.start = start;
    let id = block.id.clone();
    let new_index = block_ops::resort(&mut ed.schedule, &id).unwrap_or(index);
    ed.cursor = Cursor::header(new_index);
    if start == before.start && new_index == origin_index {
        return;
    }
    debug!(block = %id, from = origin_index, to = new_index, %start, "block moved");
    let rollback = Rollback {
        date: ed.schedule.date,
        block_id: id,
        before: Some(before),
        index: origin_index,
        inventory: Vec::new(),
    };
    ed.persist_block_update(new_index, rollback);
}
