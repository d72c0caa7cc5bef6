use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::editor::{
    BlockEdit, BlockField, BlockFocus, CaptureKind, Cursor, Editor, GrabState, Mode, Slot,
    TaskEdit, TaskField,
};
use crate::model::{Block, Task, format_minutes};
use crate::tui::theme::Theme;

use super::cursor_spans;

/// Rows of the timeline plus the row the cursor is on
pub struct Timeline {
    pub lines: Vec<Line<'static>>,
    pub cursor_row: Option<usize>,
}

pub fn render_timeline(frame: &mut Frame, editor: &Editor, theme: &Theme, area: Rect) {
    let timeline = build_timeline(editor, theme);
    let height = area.height as usize;
    let scroll = match timeline.cursor_row {
        Some(row) if height > 0 && row >= height.saturating_sub(2) => {
            (row + 3).saturating_sub(height).min(timeline.lines.len().saturating_sub(1))
        }
        _ => 0,
    };
    let paragraph = Paragraph::new(timeline.lines)
        .style(Style::default().bg(theme.background))
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);
}

pub fn build_timeline(editor: &Editor, theme: &Theme) -> Timeline {
    let mut builder = Builder {
        editor,
        theme,
        lines: Vec::new(),
        cursor_row: None,
    };

    builder.gap(None);
    for (index, block) in editor.schedule.blocks.iter().enumerate() {
        builder.header(index, block);
        let focused = editor.cursor.selected_block_index() == Some(index);
        if focused {
            builder.slot(index, Slot::BeforeFirst);
        }
        for (t, task) in block.tasks.iter().enumerate() {
            builder.task(index, t, task, block);
            if focused {
                builder.slot(index, Slot::After(t));
            }
        }
        builder.gap(Some(index));
    }

    Timeline {
        lines: builder.lines,
        cursor_row: builder.cursor_row,
    }
}

struct Builder<'a> {
    editor: &'a Editor,
    theme: &'a Theme,
    lines: Vec<Line<'static>>,
    cursor_row: Option<usize>,
}

impl Builder<'_> {
    fn push(&mut self, spans: Vec<Span<'static>>, at_cursor: bool) {
        if at_cursor {
            self.cursor_row = Some(self.lines.len());
            let bg = self.theme.selection_bg;
            let spans = spans
                .into_iter()
                .map(|s| {
                    let style = s.style.bg(bg);
                    s.style(style)
                })
                .collect::<Vec<_>>();
            self.lines.push(Line::from(spans).style(Style::default().bg(bg)));
        } else {
            self.lines.push(Line::from(spans));
        }
    }

    fn base(&self) -> Style {
        Style::default().fg(self.theme.text).bg(self.theme.background)
    }

    fn dim(&self) -> Style {
        Style::default().fg(self.theme.dim).bg(self.theme.background)
    }

    fn typed(&self, kind: CaptureKind) -> Option<&str> {
        self.editor
            .capture
            .as_ref()
            .filter(|c| c.kind == kind)
            .map(|c| c.buffer.as_str())
    }

    /// Space after block `after`, or before the first block
    fn gap(&mut self, after: Option<usize>) {
        let at_cursor = self.editor.cursor == Cursor::between(after);
        let blocks = &self.editor.schedule.blocks;

        let mut spans = vec![Span::styled("  \u{2506} ", self.dim())];
        if at_cursor && let Some(text) = self.typed(CaptureKind::Command) {
            let text = text.to_string();
            spans.push(Span::styled("\u{203A} ", Style::default().fg(self.theme.highlight)));
            spans.extend(cursor_spans(&text, text.len(), self.base(), self.theme));
        } else {
            let free = match after {
                Some(i) => blocks
                    .get(i + 1)
                    .map(|next| blocks[i].end().minutes_until(next.start))
                    .unwrap_or(0),
                None => 0,
            };
            if free > 0 {
                spans.push(Span::styled(format!("{} free", format_minutes(free)), self.dim()));
            } else if at_cursor && blocks.is_empty() {
                spans.push(Span::styled(
                    "type a quick command like d930, or / for the menu",
                    self.dim(),
                ));
            } else if at_cursor {
                spans.push(Span::styled("type to add a block here", self.dim()));
            }
        }
        self.push(spans, at_cursor);
    }

    fn header(&mut self, index: usize, block: &Block) {
        let at_cursor = self.editor.cursor == Cursor::header(index);
        let color = self.theme.type_color(block.block_type);
        let accent = Style::default().fg(color).bg(self.theme.background);

        let grabbed = matches!(
            &self.editor.mode,
            Mode::Grab(GrabState::Block { index: i, .. }) if *i == index
        );
        let marker = if grabbed { "\u{21C5}" } else { "\u{2590}" };
        let mut spans = vec![Span::styled(format!(" {} ", marker), accent)];

        match &self.editor.mode {
            Mode::EditBlock(edit) if edit.block_index == index => {
                spans.extend(self.block_edit_spans(edit, block));
            }
            _ => {
                spans.push(Span::styled(
                    format!("{}-{}  ", block.start, block.end()),
                    self.base(),
                ));
                spans.push(Span::styled(
                    block.title().to_string(),
                    accent.add_modifier(Modifier::BOLD),
                ));
                if !block.tasks.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}/{}", block.completed_count(), block.tasks.len()),
                        self.dim(),
                    ));
                }
                if block.meta.meeting_link.is_some() {
                    spans.push(Span::styled("  \u{1F517}", self.dim()));
                }
                if block.meta.recurring {
                    spans.push(Span::styled("  \u{21BB}", self.dim()));
                }
            }
        }
        self.push(spans, at_cursor || grabbed);
    }

    fn block_edit_spans(&self, edit: &BlockEdit, block: &Block) -> Vec<Span<'static>> {
        let focus = Style::default()
            .fg(self.theme.text_bright)
            .bg(self.theme.background)
            .add_modifier(Modifier::UNDERLINED);
        let mut spans = Vec::new();

        let time_text = edit.time.text();
        if edit.field == BlockField::Time {
            spans.extend(cursor_spans(&time_text, edit.time.cursor(), focus, self.theme));
        } else {
            spans.push(Span::styled(time_text, self.base()));
        }
        spans.push(Span::styled(
            format!(" ({})  ", format_minutes(block.duration())),
            self.dim(),
        ));

        let type_style = if edit.field == BlockField::Type {
            focus.fg(self.theme.type_color(edit.block_type))
        } else {
            Style::default().fg(self.theme.type_color(edit.block_type))
        };
        spans.push(Span::styled(
            format!("\u{25C2} {} \u{25B8}", edit.block_type.label()),
            type_style,
        ));
        if let Some(link) = &edit.meeting_link {
            spans.push(Span::styled(format!("  {}", link), self.dim()));
        }
        spans
    }

    fn slot(&mut self, index: usize, slot: Slot) {
        let at_cursor = self.editor.cursor == Cursor::slot(index, slot);
        let mut spans = vec![Span::styled("      + ", self.dim())];
        if at_cursor {
            match self.typed(CaptureKind::TaskTitle) {
                Some(text) => {
                    let text = text.to_string();
                    spans.extend(cursor_spans(&text, text.len(), self.base(), self.theme));
                }
                None => spans.push(Span::styled(
                    "type a task (30m suffix sets length), / to pick from inventory",
                    self.dim(),
                )),
            }
        }
        self.push(spans, at_cursor);
    }

    fn task(&mut self, index: usize, t: usize, task: &Task, block: &Block) {
        let at_cursor = self.editor.cursor
            == Cursor::Block {
                index,
                focus: BlockFocus::Task(t),
            };
        let grabbed = matches!(
            &self.editor.mode,
            Mode::Grab(GrabState::Task { block_index, index: i, .. })
                if *block_index == index && *i == t
        );
        let check = if task.completed { "[x]" } else { "[ ]" };
        let marker = if grabbed { "\u{21C5}" } else { " " };
        let mut spans = vec![Span::styled(
            format!("   {} {} ", marker, check),
            Style::default()
                .fg(self.theme.type_color(block.block_type))
                .bg(self.theme.background),
        )];

        match &self.editor.mode {
            Mode::EditTask(edit) if edit.block_index == index && edit.task_index == t => {
                spans.extend(self.task_edit_spans(edit));
            }
            _ => {
                let title_style = if task.completed {
                    self.dim().add_modifier(Modifier::CROSSED_OUT)
                } else {
                    self.base()
                };
                spans.push(Span::styled(task.title.clone(), title_style));
                spans.push(Span::styled(
                    format!("  {}", format_minutes(task.duration_min)),
                    self.dim(),
                ));
                if task.origin.is_some() {
                    spans.push(Span::styled("  \u{2197}", self.dim()));
                }
            }
        }
        self.push(spans, at_cursor || grabbed);
    }

    fn task_edit_spans(&self, edit: &TaskEdit) -> Vec<Span<'static>> {
        let focus = Style::default()
            .fg(self.theme.text_bright)
            .bg(self.theme.background)
            .add_modifier(Modifier::UNDERLINED);
        let mut spans = Vec::new();
        if edit.field == TaskField::Name {
            spans.extend(cursor_spans(edit.name.as_str(), edit.name.cursor(), focus, self.theme));
        } else {
            spans.push(Span::styled(edit.name.as_str().to_string(), self.base()));
        }
        spans.push(Span::styled("  ", self.base()));
        if edit.field == TaskField::Duration {
            let text = edit.duration.as_str();
            spans.extend(cursor_spans(text, text.len(), focus, self.theme));
            spans.push(Span::styled("m", focus));
        } else {
            spans.push(Span::styled(format!("{}m", edit.duration), self.dim()));
        }
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Key, KeyCode};
    use crate::model::DaySchedule;
    use crate::tui::render::test_helpers::*;

    fn rows(test: &TestApp) -> Vec<String> {
        let timeline = build_timeline(test.editor(), &test.app.theme);
        timeline
            .lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    #[test]
    fn blocks_tasks_and_gaps() {
        let test = app_with_day(sample_day());
        let rows = rows(&test);
        assert_eq!(rows.len(), 7);
        assert!(rows[1].contains("09:00-09:45  Deep Work  1/2"));
        assert!(rows[2].contains("[ ] Draft outline  30m"));
        assert!(rows[3].contains("[x] Review notes  15m"));
        assert!(rows[4].contains("4h15m free"));
        assert!(rows[5].contains("14:00-14:30  Standup"));
        assert!(!rows.iter().any(|r| r.contains("type a task")));
    }

    #[test]
    fn focused_block_shows_input_slots() {
        let mut test = app_with_day(sample_day());
        test.down(1).press(Key::plain(KeyCode::Tab));
        let rows = rows(&test);
        // gap, header, slot, task, slot, task, slot, gap, header, gap
        assert_eq!(rows.len(), 10);
        assert!(rows[2].contains("type a task"));
        let timeline = build_timeline(test.editor(), &test.app.theme);
        assert_eq!(timeline.cursor_row, Some(2));
    }

    #[test]
    fn capture_text_renders_in_the_gap() {
        let mut test = app_with_day(DaySchedule::new(test_date()));
        let before = rows(&test);
        assert!(before[0].contains("quick command"));
        test.type_str("m14");
        let after = rows(&test);
        assert!(after[0].contains("\u{203A} m14"));
    }

    #[test]
    fn edit_mode_shows_time_mask() {
        let mut test = app_with_day(sample_day());
        test.down(1).type_str("e");
        let rows = rows(&test);
        assert!(rows[1].contains("09:00 (45m)"));
        assert!(rows[1].contains("Deep Work"));
    }

    #[test]
    fn render_scrolls_to_cursor() {
        let mut day = DaySchedule::new(test_date());
        for h in 6..20u8 {
            day.blocks.push(Block::new(
                format!("b{}", h),
                crate::model::BlockType::Admin,
                crate::model::ClockTime::new(h, 0).unwrap(),
                60,
            ));
        }
        let mut test = app_with_day(day);
        test.down(26);
        let output = render_app(&test.app);
        assert!(output.contains("19:00-20:00"));
        assert!(!output.contains("06:00-07:00"));
    }
}
