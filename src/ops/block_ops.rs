use crate::model::{Block, DaySchedule};

/// Id prefix for blocks on this day (`20250310-b`)
pub fn block_id_prefix(schedule: &DaySchedule) -> String {
    schedule.id_prefix('b')
}

/// Id prefix for tasks on this day (`20250310-t`)
pub fn task_id_prefix(schedule: &DaySchedule) -> String {
    schedule.id_prefix('t')
}

/// Fresh block id, above every number the day has handed out before.
pub fn next_block_id(schedule: &mut DaySchedule) -> String {
    let prefix = block_id_prefix(schedule);
    let n = schedule.highest_id(&prefix).max(schedule.id_seq.block) + 1;
    schedule.id_seq.block = n;
    format!("{}{}", prefix, n)
}

pub fn next_task_id(schedule: &mut DaySchedule) -> String {
    next_task_ids(schedule, 1).remove(0)
}

/// `count` consecutive fresh task ids, for batch inserts.
pub fn next_task_ids(schedule: &mut DaySchedule, count: usize) -> Vec<String> {
    let prefix = task_id_prefix(schedule);
    let first = schedule.highest_id(&prefix).max(schedule.id_seq.task) + 1;
    let ids: Vec<String> = (first..first + count as u64)
        .map(|n| format!("{}{}", prefix, n))
        .collect();
    schedule.id_seq.task = schedule.id_seq.task.max(first + count as u64 - 1);
    ids
}

/// Insert a block at `index` (clamped to the list length). Returns the index used.
pub fn insert_block(schedule: &mut DaySchedule, index: usize, block: Block) -> usize {
    let index = index.min(schedule.blocks.len());
    schedule.blocks.insert(index, block);
    index
}

/// Insert a block and restore time order. Returns the block's final index.
pub fn insert_block_sorted(schedule: &mut DaySchedule, index: usize, block: Block) -> usize {
    let id = block.id.clone();
    insert_block(schedule, index, block);
    resort(schedule, &id).unwrap_or(0)
}

pub fn remove_block(schedule: &mut DaySchedule, index: usize) -> Option<Block> {
    (index < schedule.blocks.len()).then(|| schedule.blocks.remove(index))
}

/// Swap the block at `index` with its neighbour in `direction` (-1 up, +1 down).
/// Returns the block's new index, or None at the boundary.
pub fn swap_block(schedule: &mut DaySchedule, index: usize, direction: i32) -> Option<usize> {
    let target = neighbour(index, direction, schedule.blocks.len())?;
    schedule.blocks.swap(index, target);
    Some(target)
}

/// Move the block at `from` to `to`, shifting the others.
pub fn move_block(schedule: &mut DaySchedule, from: usize, to: usize) {
    if from >= schedule.blocks.len() {
        return;
    }
    let block = schedule.blocks.remove(from);
    let to = to.min(schedule.blocks.len());
    schedule.blocks.insert(to, block);
}

/// Re-sort by time and return where `block_id` ended up.
pub fn resort(schedule: &mut DaySchedule, block_id: &str) -> Option<usize> {
    schedule.sort_blocks();
    schedule.position_of(block_id)
}

pub(crate) fn neighbour(index: usize, direction: i32, len: usize) -> Option<usize> {
    if index >= len {
        return None;
    }
    if direction < 0 {
        index.checked_sub(1)
    } else {
        (index + 1 < len).then_some(index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockType, ClockTime, IdSeq, Task};
    use chrono::NaiveDate;

    fn t(h: u8, m: u8) -> ClockTime {
        ClockTime::new(h, m).unwrap()
    }

    fn sample() -> DaySchedule {
        let mut d = DaySchedule::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        d.blocks = vec![
            Block::new("20250310-b1".into(), BlockType::DeepWork, t(9, 0), 60),
            Block::new("20250310-b2".into(), BlockType::Admin, t(10, 0), 30),
            Block::new("20250310-b3".into(), BlockType::Meeting, t(13, 0), 60),
        ];
        d
    }

    fn ids(d: &DaySchedule) -> Vec<&str> {
        d.blocks.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn next_ids_skip_existing() {
        let mut d = sample();
        assert_eq!(next_block_id(&mut d), "20250310-b4");
        assert_eq!(next_task_id(&mut d), "20250310-t1");
        d.blocks[0].tasks.push(Task::new("20250310-t7".into(), "x".into(), 5));
        assert_eq!(next_task_id(&mut d), "20250310-t8");
        assert_eq!(next_task_ids(&mut d, 2), vec!["20250310-t9", "20250310-t10"]);
        assert_eq!(d.id_seq, IdSeq { block: 4, task: 10 });
    }

    #[test]
    fn next_id_ignores_foreign_ids() {
        let mut d = sample();
        d.blocks[0].id = "6650f2c1a9".into();
        assert_eq!(next_block_id(&mut d), "20250310-b4");
    }

    #[test]
    fn deleted_ids_are_not_handed_out_again() {
        let mut d = sample();
        d.seed_id_seq();
        let removed = remove_block(&mut d, 2).unwrap();
        assert_eq!(removed.id, "20250310-b3");
        assert_eq!(next_block_id(&mut d), "20250310-b4");

        let json = serde_json::to_string(&d).unwrap();
        let mut reloaded: DaySchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(next_block_id(&mut reloaded), "20250310-b5");
    }

    #[test]
    fn insert_sorted_finds_time_slot() {
        let mut d = sample();
        let block = Block::new("new".into(), BlockType::Break, t(10, 30), 15);
        let idx = insert_block_sorted(&mut d, 0, block);
        assert_eq!(idx, 2);
        assert_eq!(ids(&d), vec!["20250310-b1", "20250310-b2", "new", "20250310-b3"]);
    }

    #[test]
    fn swap_respects_bounds() {
        let mut d = sample();
        assert_eq!(swap_block(&mut d, 0, -1), None);
        assert_eq!(swap_block(&mut d, 2, 1), None);
        assert_eq!(swap_block(&mut d, 0, 1), Some(1));
        assert_eq!(ids(&d), vec!["20250310-b2", "20250310-b1", "20250310-b3"]);
    }

    #[test]
    fn move_block_shifts_others() {
        let mut d = sample();
        move_block(&mut d, 2, 0);
        assert_eq!(ids(&d), vec!["20250310-b3", "20250310-b1", "20250310-b2"]);
        move_block(&mut d, 0, 99);
        assert_eq!(ids(&d), vec!["20250310-b1", "20250310-b2", "20250310-b3"]);
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut d = sample();
        assert!(remove_block(&mut d, 5).is_none());
        assert_eq!(remove_block(&mut d, 1).unwrap().id, "20250310-b2");
    }
}
