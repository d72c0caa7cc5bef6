//! Property tests for the editor reducer: whatever keys arrive, the cursor
//! stays inside the schedule and the model stays consistent.

use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;

use dayplan::editor::{Editor, Key, KeyCode, Modifiers};
use dayplan::model::{Block, BlockType, ClockTime, DaySchedule, Inventory, InventoryTask, Task};

fn day() -> DaySchedule {
    let mut day = DaySchedule::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    let mut work = Block::new(
        "b1".into(),
        BlockType::DeepWork,
        ClockTime::new(9, 0).unwrap(),
        60,
    );
    work.tasks.push(Task::new("t1".into(), "Outline".into(), 30));
    work.tasks.push(Task::new("t2".into(), "Draft".into(), 45));
    day.blocks.push(work);
    day.blocks.push(Block::new(
        "b2".into(),
        BlockType::Meeting,
        ClockTime::new(13, 0).unwrap(),
        30,
    ));
    day
}

fn inventory() -> Inventory {
    Inventory {
        backlog: vec![InventoryTask {
            id: "i1".into(),
            title: "Expense report".into(),
            duration_min: 20,
            project_id: None,
            assigned: false,
        }],
        ..Default::default()
    }
}

fn arb_key() -> impl Strategy<Value = Key> {
    let code = prop_oneof![
        Just(KeyCode::Up),
        Just(KeyCode::Down),
        Just(KeyCode::Left),
        Just(KeyCode::Right),
        Just(KeyCode::Enter),
        Just(KeyCode::Esc),
        Just(KeyCode::Tab),
        Just(KeyCode::BackTab),
        Just(KeyCode::Backspace),
        Just(KeyCode::Delete),
        prop::sample::select(vec!['/', 'g', 'e', 'x', ' ', 'd', 'm', '1', '4', '9', '3', '0', 'a'])
            .prop_map(KeyCode::Char),
    ];
    let modifiers = prop_oneof![
        6 => Just(Modifiers::NONE),
        1 => Just(Modifiers::SHIFT),
        1 => Just(Modifiers::CTRL),
    ];
    (code, modifiers).prop_map(|(code, m)| Key::new(code, m))
}

proptest! {
    #[test]
    fn cursor_stays_in_bounds(keys in prop::collection::vec(arb_key(), 1..120)) {
        let mut editor = Editor::new(day()).with_inventory(inventory());
        for key in keys {
            let _ = editor.handle_key(key);
            prop_assert!(
                editor.cursor.is_in_bounds(&editor.schedule),
                "cursor {:?} out of bounds after {:?}",
                editor.cursor,
                key
            );
        }
    }

    #[test]
    fn block_ids_stay_unique(keys in prop::collection::vec(arb_key(), 1..120)) {
        let mut editor = Editor::new(day()).with_inventory(inventory());
        for key in keys {
            let _ = editor.handle_key(key);
            let ids: HashSet<&str> = editor.schedule.blocks.iter().map(|b| b.id.as_str()).collect();
            prop_assert_eq!(ids.len(), editor.schedule.blocks.len());
        }
    }

    #[test]
    fn capture_is_never_empty(keys in prop::collection::vec(arb_key(), 1..120)) {
        let mut editor = Editor::new(day()).with_inventory(inventory());
        for key in keys {
            let _ = editor.handle_key(key);
            if let Some(capture) = &editor.capture {
                prop_assert!(!capture.buffer.is_empty());
            }
        }
    }
}
