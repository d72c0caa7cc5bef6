use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::block::Block;
use super::time::ClockTime;

/// Highest block and task numbers ever handed out on a day. Ids of deleted
/// items are never reused, since queued changes refer to them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSeq {
    #[serde(default)]
    pub block: u64,
    #[serde(default)]
    pub task: u64,
}

impl IdSeq {
    pub fn is_zero(&self) -> bool {
        self.block == 0 && self.task == 0
    }

    /// Keep the higher of each counter.
    pub fn merge(&mut self, other: IdSeq) {
        self.block = self.block.max(other.block);
        self.task = self.task.max(other.task);
    }
}

/// All blocks planned for one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "IdSeq::is_zero")]
    pub id_seq: IdSeq,
}

impl DaySchedule {
    pub fn new(date: NaiveDate) -> Self {
        DaySchedule {
            date,
            blocks: Vec::new(),
            id_seq: IdSeq::default(),
        }
    }

    /// Stable sort by start time; equal starts keep their relative order.
    pub fn sort_blocks(&mut self) {
        self.blocks.sort_by_key(|b| b.start);
    }

    pub fn is_sorted(&self) -> bool {
        self.blocks.windows(2).all(|w| w[0].start <= w[1].start)
    }

    pub fn position_of(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == block_id)
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    pub fn block_mut(&mut self, block_id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == block_id)
    }

    /// Sum of effective block durations
    pub fn planned_minutes(&self) -> u32 {
        self.blocks.iter().map(|b| b.duration()).sum()
    }

    pub fn task_count(&self) -> usize {
        self.blocks.iter().map(|b| b.tasks.len()).sum()
    }

    /// Suggested start for a block inserted after `after`: the end of that
    /// block, or `day_start` when inserting before the first block.
    pub fn suggested_start(&self, after: Option<usize>, day_start: ClockTime) -> ClockTime {
        match after.and_then(|i| self.blocks.get(i)) {
            Some(prev) => prev.end(),
            None => day_start,
        }
    }

    /// Id prefix for blocks (`20250310-b`) or tasks (`20250310-t`)
    pub fn id_prefix(&self, kind: char) -> String {
        format!("{}-{}", self.date.format("%Y%m%d"), kind)
    }

    /// Highest number used by an id of the form `{prefix}{n}`
    pub fn highest_id(&self, prefix: &str) -> u64 {
        self.ids()
            .filter_map(|id| id.strip_prefix(prefix))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
    }

    /// Raise the id counters to cover the ids already on the day, so
    /// deleting the newest block or task cannot free its number.
    pub fn seed_id_seq(&mut self) {
        let seen = IdSeq {
            block: self.highest_id(&self.id_prefix('b')),
            task: self.highest_id(&self.id_prefix('t')),
        };
        self.id_seq.merge(seen);
    }

    /// Every block and task id used on this day
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().flat_map(|b| {
            std::iter::once(b.id.as_str()).chain(b.tasks.iter().map(|t| t.id.as_str()))
        })
    }
}
