use serde::Serialize;

use crate::model::{Block, DaySchedule, Inventory, format_minutes};
use crate::ops::quick_command::QuickCommand;
use crate::sync::outbox::JournalEntry;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct DayJson<'a> {
    pub date: String,
    pub planned_minutes: u32,
    pub pending_sync: bool,
    pub blocks: Vec<BlockJson<'a>>,
}

#[derive(Serialize)]
pub struct BlockJson<'a> {
    pub number: usize,
    pub end: String,
    #[serde(flatten)]
    pub block: &'a Block,
}

#[derive(Serialize)]
pub struct JournalEntryJson {
    pub seq: u64,
    pub date: String,
    pub change: String,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Serialize)]
pub struct ParseJson<'a> {
    pub token: &'a str,
    #[serde(flatten)]
    pub command: &'a QuickCommand,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn day_to_json(day: &DaySchedule, pending_sync: bool) -> DayJson<'_> {
    DayJson {
        date: day.date.format("%Y-%m-%d").to_string(),
        planned_minutes: day.planned_minutes(),
        pending_sync,
        blocks: day
            .blocks
            .iter()
            .enumerate()
            .map(|(i, block)| BlockJson {
                number: i + 1,
                end: block.end().to_string(),
                block,
            })
            .collect(),
    }
}

pub fn journal_entry_to_json(entry: &JournalEntry) -> JournalEntryJson {
    JournalEntryJson {
        seq: entry.seq,
        date: entry.intent.date().format("%Y-%m-%d").to_string(),
        change: entry.intent.describe(),
        attempts: entry.attempts,
        last_error: entry.last_error.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// `1  09:00-10:00  Deep Work  (deep-work, 1/2 done)`
pub fn format_block_line(number: usize, block: &Block) -> String {
    let mut detail = block.block_type.as_str().to_string();
    if !block.tasks.is_empty() {
        detail.push_str(&format!(", {}/{} done", block.completed_count(), block.tasks.len()));
    }
    if block.meta.recurring {
        detail.push_str(", recurring");
    }
    format!(
        "{:>2}  {}-{}  {}  ({})",
        number,
        block.start,
        block.end(),
        block.title(),
        detail
    )
}

pub fn format_day(day: &DaySchedule, pending_sync: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "{}  {} planned{}",
        day.date.format("%a %Y-%m-%d"),
        format_minutes(day.planned_minutes()),
        if pending_sync { "  (unsynced changes)" } else { "" }
    )];
    if day.blocks.is_empty() {
        lines.push("  no blocks".to_string());
        return lines;
    }
    for (i, block) in day.blocks.iter().enumerate() {
        lines.push(format_block_line(i + 1, block));
        for task in &block.tasks {
            let check = if task.completed { 'x' } else { ' ' };
            lines.push(format!(
                "      [{}] {} ({})",
                check,
                task.title,
                format_minutes(task.duration_min)
            ));
        }
        if let Some(link) = &block.meta.meeting_link {
            lines.push(format!("      link: {}", link));
        }
    }
    lines
}

pub fn format_inventory(inventory: &Inventory) -> Vec<String> {
    let mut lines = Vec::new();
    let mark = |assigned: bool| if assigned { "*" } else { " " };

    lines.push("Projects".to_string());
    for project in &inventory.projects {
        lines.push(format!("  {}", project.name));
        for task in &project.tasks {
            lines.push(format!(
                "   {} {} ({})",
                mark(task.assigned),
                task.title,
                format_minutes(task.duration_min)
            ));
        }
    }
    lines.push("Backlog".to_string());
    for task in &inventory.backlog {
        lines.push(format!(
            "   {} {} ({})",
            mark(task.assigned),
            task.title,
            format_minutes(task.duration_min)
        ));
    }
    lines.push("Routines".to_string());
    for routine in &inventory.routines {
        let start = routine.start.map(|s| format!(" at {}", s)).unwrap_or_default();
        lines.push(format!("  {}{} ({} tasks)", routine.name, start, routine.tasks.len()));
    }
    lines.push("Events".to_string());
    for event in &inventory.events {
        lines.push(format!(
            "  {} {} ({})",
            event.start,
            event.name,
            format_minutes(event.duration_min)
        ));
    }
    lines
}

pub fn format_journal_entry(entry: &JournalEntry) -> String {
    let mut line = format!(
        "#{}  {}  {}",
        entry.seq,
        entry.intent.date().format("%Y-%m-%d"),
        entry.intent.describe()
    );
    if entry.attempts > 0 {
        line.push_str(&format!("  ({} failed", entry.attempts));
        if let Some(err) = &entry.last_error {
            line.push_str(&format!(": {}", err));
        }
        line.push(')');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockType, ClockTime, Task};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day() -> DaySchedule {
        let mut day = DaySchedule::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        let mut block = Block::new(
            "b1".into(),
            BlockType::DeepWork,
            ClockTime::new(9, 0).unwrap(),
            60,
        );
        block.tasks.push(Task::new("t1".into(), "Draft".into(), 30));
        let mut done = Task::new("t2".into(), "Review".into(), 15);
        done.completed = true;
        block.tasks.push(done);
        day.blocks.push(block);
        day
    }

    #[test]
    fn text_day() {
        let lines = format_day(&day(), false);
        assert_eq!(
            lines,
            vec![
                "Mon 2025-03-10  45m planned",
                " 1  09:00-09:45  Deep Work  (deep-work, 1/2 done)",
                "      [ ] Draft (30m)",
                "      [x] Review (15m)",
            ]
        );
    }

    #[test]
    fn empty_day_says_so() {
        let empty = DaySchedule::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        let lines = format_day(&empty, true);
        assert!(lines[0].ends_with("(unsynced changes)"));
        assert_eq!(lines[1], "  no blocks");
    }

    #[test]
    fn json_day_flattens_blocks() {
        let day = day();
        let value = serde_json::to_value(day_to_json(&day, false)).unwrap();
        assert_eq!(value["planned_minutes"], 45);
        assert_eq!(value["blocks"][0]["number"], 1);
        assert_eq!(value["blocks"][0]["id"], "b1");
        assert_eq!(value["blocks"][0]["end"], "09:45");
    }
}
