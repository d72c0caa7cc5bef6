use crate::model::{BlockType, ClockTime, TimeParseError};
use crate::ops::block_ops;
use crate::util::unicode;

use super::popups::{LinkEditor, Menu, Overlay, TypePurpose};
use super::{Cursor, Editor, Key, KeyCode, Mode};

/// Fixed `HH:MM` input with a cursor over the five character positions.
/// Position 2 is the colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMask {
    digits: [u8; 4],
    cursor: usize,
}

const COLON: usize = 2;
const LAST: usize = 4;

impl TimeMask {
    pub fn new(time: ClockTime) -> Self {
        let mut mask = TimeMask {
            digits: [0; 4],
            cursor: 0,
        };
        mask.set(time);
        mask
    }

    pub fn set(&mut self, time: ClockTime) {
        let (h, m) = (time.hour(), time.minute());
        self.digits = [h / 10, h % 10, m / 10, m % 10];
    }

    pub fn text(&self) -> String {
        let [a, b, c, d] = self.digits;
        format!("{}{}:{}{}", a, b, c, d)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(LAST);
    }

    pub fn value(&self) -> Result<ClockTime, TimeParseError> {
        ClockTime::parse(&self.text())
    }

    pub fn left(&mut self) {
        self.cursor = match self.cursor {
            0 => 0,
            3 => 1,
            n => n - 1,
        };
    }

    pub fn right(&mut self) {
        self.cursor = match self.cursor {
            1 => 3,
            n => (n + 1).min(LAST),
        };
    }

    /// Overwrite the digit under the cursor and advance. Returns false when
    /// the key was rejected (cursor on the colon, not a digit, or a digit
    /// that cannot start an hour or minute).
    pub fn type_digit(&mut self, c: char) -> bool {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        let d = d as u8;
        let slot = match self.cursor {
            COLON => return false,
            0 if d > 2 => return false,
            3 if d > 5 => return false,
            n if n < COLON => n,
            n => n - 1,
        };
        self.digits[slot] = d;
        if self.cursor < LAST {
            self.right();
        }
        true
    }

    /// Shift the time by `delta` minutes, wrapping within the day.
    /// No-op while the mask holds an invalid time.
    pub fn nudge(&mut self, delta: i32) -> bool {
        match self.value() {
            Ok(t) => {
                self.set(t.wrapping_add(delta));
                true
            }
            Err(_) => false,
        }
    }

    /// Route a key to the mask; true when it was consumed.
    pub fn handle_key(&mut self, key: Key, step: u32) -> bool {
        match key.code {
            KeyCode::Left | KeyCode::Backspace => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = LAST,
            KeyCode::Up => {
                self.nudge(step as i32);
            }
            KeyCode::Down => {
                self.nudge(-(step as i32));
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.type_digit(c);
            }
            _ => return false,
        }
        true
    }
}

/// Single-line text input with a grapheme-aware cursor (byte offset)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    pub fn new(text: &str) -> Self {
        LineBuffer {
            text: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Display column of the cursor
    pub fn cursor_col(&self) -> usize {
        unicode::byte_offset_to_display_col(&self.text, self.cursor)
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(self.cursor..next, "");
        }
    }

    pub fn left(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = next;
        }
    }

    pub fn handle_key(&mut self, key: Key) -> bool {
        if let Some(c) = key.printable() {
            self.insert(c);
            return true;
        }
        match key.code {
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.len(),
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockField {
    Type,
    Time,
}

/// In-place edit of a block's type, start time and meeting link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEdit {
    pub block_index: usize,
    pub field: BlockField,
    pub block_type: BlockType,
    pub time: TimeMask,
    pub meeting_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Name,
    Duration,
}

/// In-place edit of a task's name and duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEdit {
    pub block_index: usize,
    pub task_index: usize,
    pub field: TaskField,
    pub name: LineBuffer,
    pub duration: String,
}

const MAX_DURATION_DIGITS: usize = 4;
const DURATION_STEP: u32 = 5;

pub(super) fn enter_block_edit(ed: &mut Editor, index: usize) {
    let Some(block) = ed.schedule.blocks.get(index) else {
        return;
    };
    ed.mode = Mode::EditBlock(BlockEdit {
        block_index: index,
        field: BlockField::Time,
        block_type: block.block_type,
        time: TimeMask::new(block.start),
        meeting_link: block.meta.meeting_link.clone(),
    });
}

pub(super) fn enter_task_edit(ed: &mut Editor, index: usize, task: usize) {
    let Some(t) = ed.schedule.blocks.get(index).and_then(|b| b.tasks.get(task)) else {
        return;
    };
    ed.mode = Mode::EditTask(TaskEdit {
        block_index: index,
        task_index: task,
        field: TaskField::Name,
        name: LineBuffer::new(&t.title),
        duration: t.duration_min.to_string(),
    });
}

pub(super) fn handle_edit_block(ed: &mut Editor, key: Key) {
    let step = ed.settings.time_step_minutes;
    let Mode::EditBlock(edit) = &mut ed.mode else {
        return;
    };

    if key.has_ctrl() && key.code == KeyCode::Char('l') {
        let link = edit.meeting_link.clone().unwrap_or_default();
        ed.overlays.push(Overlay::LinkEditor(LinkEditor::new(&link)));
        return;
    }

    match key.code {
        KeyCode::Esc => {
            let index = edit.block_index;
            ed.mode = Mode::Navigate;
            ed.cursor = Cursor::header(index);
        }
        KeyCode::Enter => {
            let Mode::EditBlock(edit) = std::mem::replace(&mut ed.mode, Mode::Navigate) else {
                return;
            };
            commit_block_edit(ed, edit);
        }
        KeyCode::Tab | KeyCode::BackTab => {
            edit.field = match edit.field {
                BlockField::Type => BlockField::Time,
                BlockField::Time => BlockField::Type,
            };
        }
        _ => match edit.field {
            BlockField::Type => match key.code {
                KeyCode::Down => edit.block_type = edit.block_type.next(),
                KeyCode::Up => edit.block_type = edit.block_type.prev(),
                KeyCode::Char('/') => {
                    let current = edit.block_type;
                    ed.overlays.push(Overlay::BlockTypeMenu {
                        menu: Menu::block_types(Some(current)),
                        purpose: TypePurpose::EditField,
                    });
                }
                _ => {}
            },
            BlockField::Time => {
                edit.time.handle_key(key, step);
            }
        },
    }
}

fn commit_block_edit(ed: &mut Editor, edit: BlockEdit) {
    let start = match edit.time.value() {
        Ok(t) => t,
        Err(e) => {
            ed.set_error(format!("invalid time: {}", e));
            ed.mode = Mode::EditBlock(edit);
            return;
        }
    };
    let index = edit.block_index;
    let Some(block) = ed.schedule.blocks.get(index) else {
        return;
    };
    ed.cursor = Cursor::header(index);
    if block.start == start
        && block.block_type == edit.block_type
        && block.meta.meeting_link == edit.meeting_link
    {
        return;
    }

    let rollback = ed.snapshot(index);
    let block = &mut ed.schedule.blocks[index];
    block.start = start;
    block.block_type = edit.block_type;
    block.meta.meeting_link = edit.meeting_link;
    let id = block.id.clone();
    let new_index = block_ops::resort(&mut ed.schedule, &id).unwrap_or(index);
    ed.cursor = Cursor::header(new_index);
    ed.persist_block_update(new_index, rollback);
}

pub(super) fn handle_edit_task(ed: &mut Editor, key: Key) {
    let Mode::EditTask(edit) = &mut ed.mode else {
        return;
    };
    match key.code {
        KeyCode::Esc => {
            let cursor = Cursor::task(edit.block_index, edit.task_index);
            ed.mode = Mode::Navigate;
            ed.cursor = cursor;
        }
        KeyCode::Enter => {
            let Mode::EditTask(edit) = std::mem::replace(&mut ed.mode, Mode::Navigate) else {
                return;
            };
            commit_task_edit(ed, edit);
        }
        KeyCode::Tab | KeyCode::BackTab => {
            edit.field = match edit.field {
                TaskField::Name => TaskField::Duration,
                TaskField::Duration => TaskField::Name,
            };
        }
        _ => match edit.field {
            TaskField::Name => {
                edit.name.handle_key(key);
            }
            TaskField::Duration => edit_duration(&mut edit.duration, key),
        },
    }
}

fn edit_duration(buffer: &mut String, key: Key) {
    let current: u32 = buffer.parse().unwrap_or(0);
    match key.code {
        KeyCode::Char(c) if c.is_ascii_digit() && !key.has_ctrl() => {
            if buffer.len() < MAX_DURATION_DIGITS {
                buffer.push(c);
            }
        }
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Up => *buffer = (current + DURATION_STEP).to_string(),
        KeyCode::Down => *buffer = current.saturating_sub(DURATION_STEP).to_string(),
        _ => {}
    }
}

fn commit_task_edit(ed: &mut Editor, edit: TaskEdit) {
    let title = edit.name.as_str().trim().to_string();
    if title.is_empty() {
        ed.set_error("task name cannot be empty");
        ed.mode = Mode::EditTask(edit);
        return;
    }
    let Ok(duration) = edit.duration.parse::<u32>() else {
        ed.set_error("duration must be a number of minutes");
        ed.mode = Mode::EditTask(edit);
        return;
    };

    let (index, t) = (edit.block_index, edit.task_index);
    let Some(task) = ed.schedule.blocks.get(index).and_then(|b| b.tasks.get(t)) else {
        return;
    };
    ed.cursor = Cursor::task(index, t);
    if task.title == title && task.duration_min == duration {
        return;
    }

    let rollback = ed.snapshot(index);
    let task = &mut ed.schedule.blocks[index].tasks[t];
    task.title = title;
    task.duration_min = duration;
    ed.persist_task_update(index, t, rollback);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(s: &str) -> TimeMask {
        TimeMask::new(ClockTime::parse(s).unwrap())
    }

    #[test]
    fn digits_overwrite_and_skip_colon() {
        let mut m = mask("09:00");
        m.right();
        m.right();
        assert_eq!(m.cursor(), 3);
        assert!(m.type_digit('4'));
        assert_eq!(m.text(), "09:40");
        assert_eq!(m.cursor(), 4);
    }

    #[test]
    fn digit_on_colon_is_noop() {
        let mut m = mask("09:00");
        m.set_cursor(2);
        assert!(!m.type_digit('5'));
        assert_eq!(m.text(), "09:00");
        assert_eq!(m.cursor(), 2);
    }

    #[test]
    fn invalid_leading_digits_rejected() {
        let mut m = mask("09:00");
        assert!(!m.type_digit('3'));
        m.set_cursor(3);
        assert!(!m.type_digit('7'));
        assert_eq!(m.text(), "09:00");
    }

    #[test]
    fn typing_full_time_left_to_right() {
        let mut m = mask("00:00");
        for c in "1745".chars() {
            assert!(m.type_digit(c));
        }
        assert_eq!(m.value().unwrap(), ClockTime::new(17, 45).unwrap());
    }

    #[test]
    fn hour_over_23_fails_validation() {
        let mut m = mask("20:00");
        m.set_cursor(1);
        m.type_digit('7');
        assert_eq!(m.text(), "27:00");
        assert!(m.value().is_err());
        assert!(!m.nudge(15));
    }

    #[test]
    fn nudge_wraps() {
        let mut m = mask("23:50");
        m.nudge(15);
        assert_eq!(m.text(), "00:05");
        m.nudge(-15);
        assert_eq!(m.text(), "23:50");
    }

    #[test]
    fn line_buffer_edits_graphemes() {
        let mut b = LineBuffer::new("cafe\u{301}");
        b.backspace();
        assert_eq!(b.as_str(), "caf");
        b.handle_key(Key::plain(KeyCode::Home));
        b.insert('x');
        assert_eq!(b.as_str(), "xcaf");
        assert_eq!(b.cursor_col(), 1);
        b.delete();
        assert_eq!(b.as_str(), "xaf");
    }

    #[test]
    fn duration_field_appends_and_nudges() {
        let mut d = String::from("1");
        edit_duration(&mut d, Key::char('5'));
        assert_eq!(d, "15");
        edit_duration(&mut d, Key::plain(KeyCode::Up));
        assert_eq!(d, "20");
        edit_duration(&mut d, Key::plain(KeyCode::Backspace));
        assert_eq!(d, "2");
        edit_duration(&mut d, Key::plain(KeyCode::Down));
        assert_eq!(d, "0");
    }
}
