use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::editor::{BlockFocus, Cursor, Editor, Mode, Overlay};
use crate::tui::app::App;

use super::push_right_aligned;

/// Render the status row (bottom of screen): mode tag, then the editor's
/// message or key hints for where the cursor is.
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let width = area.width as usize;
    let editor = &app.editor;

    let mut spans: Vec<Span<'static>> = Vec::new();
    if let Some(tag) = mode_tag(editor) {
        spans.push(Span::styled(
            format!(" {} ", tag),
            Style::default()
                .fg(bg)
                .bg(theme.highlight)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(" ", Style::default().bg(bg)));
    }

    match &editor.status {
        Some(status) => {
            let color = if status.is_error { theme.red } else { theme.text_bright };
            spans.push(Span::styled(
                format!(" {}", status.text),
                Style::default().fg(color).bg(bg),
            ));
        }
        None => {
            let hint = key_hints(editor);
            push_right_aligned(&mut spans, format!("{} ", hint), theme.dim, bg, width);
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// Short tag for anything other than plain navigation
pub fn mode_tag(editor: &Editor) -> Option<&'static str> {
    if let Some(top) = editor.top_overlay() {
        return Some(top.title());
    }
    match editor.mode {
        Mode::Navigate => None,
        Mode::Grab(_) => Some("MOVE"),
        Mode::EditBlock(_) | Mode::EditTask(_) => Some("EDIT"),
    }
}

pub fn key_hints(editor: &Editor) -> &'static str {
    if let Some(top) = editor.top_overlay() {
        return match top {
            Overlay::TaskPicker(_) => "type filter  Tab select  Enter add  Esc close",
            Overlay::TimeRange(_) | Overlay::TimeConfirm(_) => "digits/\u{2191}\u{2193} time  Enter ok  Esc cancel",
            Overlay::DayPicker { .. } => "\u{2190}\u{2192}\u{2191}\u{2193} date  Enter go  Esc cancel",
            Overlay::LinkEditor(_) => "Enter save  Esc cancel",
            _ => "type filter  \u{2191}\u{2193} move  Enter pick  Esc close",
        };
    }
    match editor.mode {
        Mode::Grab(_) => "\u{2191}\u{2193} move  Enter drop  Esc cancel",
        Mode::EditBlock(_) => "Tab field  \u{2191}\u{2193} change  ^L link  Enter save  Esc cancel",
        Mode::EditTask(_) => "Tab field  Enter save  Esc cancel",
        Mode::Navigate => match editor.cursor {
            Cursor::None | Cursor::Between { .. } => "type d930  / menu  ^\u{2190}^\u{2192} day  ^D go to  ^Q quit",
            Cursor::Block {
                focus: BlockFocus::Header,
                ..
            } => "Tab tasks  e edit  g move  Del delete",
            Cursor::Block {
                focus: BlockFocus::Slot(_),
                ..
            } => "type a task  / inventory  Esc out",
            Cursor::Block {
                focus: BlockFocus::Task(_),
                ..
            } => "Space done  e edit  g move  Del delete",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Key, KeyCode};
    use crate::tui::render::test_helpers::*;

    fn last_row(test: &TestApp) -> String {
        render_app(&test.app).lines().last().unwrap_or("").to_string()
    }

    #[test]
    fn hints_follow_the_cursor() {
        let mut test = app_with_day(sample_day());
        assert!(last_row(&test).contains("/ menu"));
        test.down(1);
        assert!(last_row(&test).contains("Tab tasks"));
        test.press(Key::plain(KeyCode::Tab)).down(1);
        assert!(last_row(&test).contains("Space done"));
    }

    #[test]
    fn mode_tag_for_grab_and_overlays() {
        let mut test = app_with_day(sample_day());
        test.down(1).type_str("g");
        assert_eq!(mode_tag(test.editor()), Some("MOVE"));
        assert!(last_row(&test).contains("MOVE"));
        test.press(Key::plain(KeyCode::Esc));
        assert_eq!(mode_tag(test.editor()), None);
        test.press(Key::ctrl(KeyCode::Char('d')));
        assert_eq!(mode_tag(test.editor()), Some("Go to day"));
    }

    #[test]
    fn errors_replace_hints() {
        let mut test = app_with_day(sample_day());
        test.app.editor.set_error("sync failed, change reverted: overlap");
        let row = last_row(&test);
        assert!(row.contains("change reverted"));
        assert!(!row.contains("/ menu"));
    }
}
