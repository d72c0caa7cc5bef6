use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::editor::{Menu, Overlay, RangeField, TaskPicker, TimeMask, TimeRange};
use crate::model::format_minutes;
use crate::tui::theme::Theme;
use crate::util::unicode;

use super::cursor_spans;

const POPUP_WIDTH: u16 = 44;
/// Cells inside the popup border
const ROW_WIDTH: usize = POPUP_WIDTH as usize - 2;
const MAX_MENU_ROWS: usize = 12;

/// Draw the top overlay as a bordered popup near the top of `area`.
pub fn render_overlay(frame: &mut Frame, overlay: &Overlay, theme: &Theme, area: Rect) {
    let lines = overlay_lines(overlay, theme);
    let height = (lines.len() as u16 + 2).min(area.height);
    let width = POPUP_WIDTH.min(area.width);
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + 1.min(area.height.saturating_sub(height)),
        width,
        height,
    );

    frame.render_widget(Clear, popup);
    let bg = theme.background;
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", overlay.title()),
            Style::default()
                .fg(theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.popup_border).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), inner);
}

pub fn overlay_lines(overlay: &Overlay, theme: &Theme) -> Vec<Line<'static>> {
    match overlay {
        Overlay::SlashMenu { menu, .. } => menu_lines(menu, theme, |_| None),
        Overlay::BlockTypeMenu { menu, .. } => {
            menu_lines(menu, theme, |t| Some(Style::default().fg(theme.type_color(*t))))
        }
        Overlay::RoutinePicker { menu, .. }
        | Overlay::EventPicker { menu, .. } => menu_lines(menu, theme, |_| None),
        Overlay::TaskCommandMenu { menu, .. } => menu_lines(menu, theme, |_| None),
        Overlay::TaskPicker(picker) => picker_lines(picker, theme),
        Overlay::TimeRange(range) => range_lines(range, theme),
        Overlay::TimeConfirm(mask) => vec![
            mask_line("Start", mask, true, theme),
            hint_line("digits or \u{2191}\u{2193} adjust, Enter place, Esc cancel", theme),
        ],
        Overlay::DayPicker { date } => vec![
            Line::from(Span::styled(
                format!(" {}", date.format("%A %d %B %Y")),
                Style::default()
                    .fg(theme.text_bright)
                    .add_modifier(Modifier::BOLD),
            )),
            hint_line("\u{2190}\u{2192} day, \u{2191}\u{2193} week, Enter go", theme),
        ],
        Overlay::LinkEditor(editor) => {
            let mut spans = vec![Span::raw(" ")];
            spans.extend(cursor_spans(
                editor.buffer.as_str(),
                editor.buffer.cursor(),
                Style::default().fg(theme.text_bright),
                theme,
            ));
            vec![
                Line::from(spans),
                hint_line("Enter save, empty clears, Esc cancel", theme),
            ]
        }
    }
}

/// Filter prompt plus the visible items, highlight marked
fn menu_lines<T>(
    menu: &Menu<T>,
    theme: &Theme,
    accent: impl Fn(&T) -> Option<Style>,
) -> Vec<Line<'static>> {
    let mut lines = vec![filter_line(menu.filter(), theme)];
    let highlight = menu.highlight();
    let mut any = false;
    for (i, (label, value)) in menu.visible().enumerate().take(MAX_MENU_ROWS) {
        any = true;
        let selected = i == highlight;
        let style = if selected {
            Style::default()
                .fg(theme.text_bright)
                .bg(theme.selection_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            accent(value).unwrap_or(Style::default().fg(theme.text))
        };
        let marker = if selected { "\u{25B8}" } else { " " };
        let text = unicode::pad_to_width(&format!("{} {}", marker, label), ROW_WIDTH);
        lines.push(Line::from(Span::styled(text, style)));
    }
    if !any {
        lines.push(hint_line("no matches", theme));
    }
    lines
}

fn picker_lines(picker: &TaskPicker, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![filter_line(picker.menu.filter(), theme)];
    let highlight = picker.menu.highlight();
    for (i, (_, item)) in picker.menu.visible().enumerate().take(MAX_MENU_ROWS) {
        let selected = i == highlight;
        let check = if picker.is_chosen(&item.id) { "[x]" } else { "[ ]" };
        let style = if selected {
            Style::default().fg(theme.text_bright).bg(theme.selection_bg)
        } else {
            Style::default().fg(theme.text)
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {} {}", check, unicode::truncate_to_width(&item.title, ROW_WIDTH - 12)),
                style,
            ),
            Span::styled(
                format!("  {}", format_minutes(item.duration_min)),
                Style::default().fg(theme.dim),
            ),
        ]));
    }
    let footer = match picker.chosen.len() {
        0 => "Tab select, Enter add".to_string(),
        n => format!("{} selected, Enter add", n),
    };
    lines.push(hint_line(&footer, theme));
    lines
}

fn range_lines(range: &TimeRange, theme: &Theme) -> Vec<Line<'static>> {
    let mut title = vec![Span::styled(
        format!(" {}", range.block_type.label()),
        Style::default()
            .fg(theme.type_color(range.block_type))
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(label) = &range.label {
        title.push(Span::styled(format!("  {}", label), Style::default().fg(theme.text)));
    }
    vec![
        Line::from(title),
        mask_line("Start", &range.start, range.field == RangeField::Start, theme),
        mask_line("End  ", &range.end, range.field == RangeField::End, theme),
        hint_line("Tab switch, Enter create, Esc cancel", theme),
    ]
}

fn mask_line(label: &str, mask: &TimeMask, focused: bool, theme: &Theme) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(" {}  ", label),
        Style::default().fg(theme.dim),
    )];
    let text = mask.text();
    if focused {
        spans.extend(cursor_spans(
            &text,
            mask.cursor(),
            Style::default().fg(theme.text_bright),
            theme,
        ));
    } else {
        spans.push(Span::styled(text, Style::default().fg(theme.text)));
    }
    Line::from(spans)
}

fn filter_line(filter: &str, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(" \u{203A} ", Style::default().fg(theme.highlight)),
        Span::styled(filter.to_string(), Style::default().fg(theme.text_bright)),
    ])
}

fn hint_line(text: &str, theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {}", text),
        Style::default().fg(theme.dim),
    ))
}
