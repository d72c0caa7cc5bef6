pub mod overlay;
pub mod status_row;
pub mod timeline;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::model::format_minutes;
use crate::util::unicode;

use super::app::{App, SyncState};
use super::theme::Theme;

/// Main render function: header, timeline, status row, then the top overlay
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header + separator
            Constraint::Min(1),    // timeline
            Constraint::Length(1), // status row
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    timeline::render_timeline(frame, &app.editor, &app.theme, chunks[1]);
    status_row::render_status_row(frame, app, chunks[2]);

    if let Some(top) = app.editor.top_overlay() {
        overlay::render_overlay(frame, top, &app.theme, chunks[1]);
    }
}

/// `Mon 10 Mar 2025   3h15m planned` on the left, sync state on the right
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let width = area.width as usize;
    let schedule = &app.editor.schedule;

    let left = vec![
        Span::styled(
            format!(" {}", schedule.date.format("%a %d %b %Y")),
            Style::default()
                .fg(theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   {} planned", format_minutes(schedule.planned_minutes())),
            Style::default().fg(theme.dim).bg(bg),
        ),
    ];

    let (label, color) = match app.sync_state() {
        SyncState::LocalOnly { queued: 0 } => ("local only".to_string(), theme.dim),
        SyncState::LocalOnly { queued } => (format!("local only, {} queued", queued), theme.dim),
        SyncState::Synced => ("\u{25CF} synced".to_string(), theme.green),
        SyncState::Pending { queued } => (format!("\u{25CB} {} to sync", queued), theme.yellow),
        SyncState::Retrying { queued, error } => {
            let error = unicode::truncate_to_width(&error, width / 2);
            (format!("\u{25CB} {} queued, retrying: {}", queued, error), theme.red)
        }
    };
    let mut spans = left;
    push_right_aligned(&mut spans, format!("{} ", label), color, bg, width);

    let separator = Span::styled(
        "\u{2500}".repeat(width),
        Style::default().fg(theme.dim).bg(bg),
    );
    let paragraph = Paragraph::new(vec![Line::from(spans), Line::from(separator)])
        .style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// Pad `spans` so `text` ends at the right edge. Skipped when it doesn't fit.
pub(super) fn push_right_aligned(
    spans: &mut Vec<Span<'static>>,
    text: String,
    fg: ratatui::style::Color,
    bg: ratatui::style::Color,
    width: usize,
) {
    let used = spans_width(spans);
    let text_width = unicode::display_width(&text);
    if used + text_width < width {
        spans.push(Span::styled(
            " ".repeat(width - used - text_width),
            Style::default().bg(bg),
        ));
        spans.push(Span::styled(text, Style::default().fg(fg).bg(bg)));
    }
}

/// Compute total display width of a slice of spans
pub(super) fn spans_width(spans: &[Span]) -> usize {
    spans
        .iter()
        .map(|s| unicode::display_width(&s.content))
        .sum()
}

/// Text with the grapheme at byte offset `cursor` drawn reversed, or a bar
/// after the text when the cursor is at the end.
pub(super) fn cursor_spans(text: &str, cursor: usize, style: Style, theme: &Theme) -> Vec<Span<'static>> {
    let cursor = cursor.min(text.len());
    let mut spans = vec![Span::styled(text[..cursor].to_string(), style)];
    match unicode::next_grapheme_boundary(text, cursor) {
        Some(end) => {
            spans.push(Span::styled(
                text[cursor..end].to_string(),
                style.add_modifier(Modifier::REVERSED),
            ));
            spans.push(Span::styled(text[end..].to_string(), style));
        }
        None => spans.push(Span::styled("\u{258C}", style.fg(theme.highlight))),
    }
    spans
}
