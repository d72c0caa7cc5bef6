use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::time::ClockTime;

/// Kind of time block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    DeepWork,
    Admin,
    Break,
    Meeting,
    Personal,
    Event,
    Routine,
}

impl BlockType {
    pub const ALL: [BlockType; 7] = [
        BlockType::DeepWork,
        BlockType::Admin,
        BlockType::Break,
        BlockType::Meeting,
        BlockType::Personal,
        BlockType::Event,
        BlockType::Routine,
    ];

    /// Wire name (`deep-work`, `admin`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::DeepWork => "deep-work",
            BlockType::Admin => "admin",
            BlockType::Break => "break",
            BlockType::Meeting => "meeting",
            BlockType::Personal => "personal",
            BlockType::Event => "event",
            BlockType::Routine => "routine",
        }
    }

    /// Human label
    pub fn label(self) -> &'static str {
        match self {
            BlockType::DeepWork => "Deep Work",
            BlockType::Admin => "Admin",
            BlockType::Break => "Break",
            BlockType::Meeting => "Meeting",
            BlockType::Personal => "Personal",
            BlockType::Event => "Event",
            BlockType::Routine => "Routine",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    /// Next type in declaration order, wrapping.
    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    /// Previous type in declaration order, wrapping.
    pub fn prev(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.position() + len - 1) % len]
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        BlockType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown block type: {}", s))
    }
}

/// Where an inventory-sourced task came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventorySource {
    Project,
    Backlog,
}

/// Non-owning back-reference to the inventory task a scheduled task was picked from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOrigin {
    pub source: InventorySource,
    pub task_id: String,
}

/// A task scheduled inside a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub duration_min: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<TaskOrigin>,
}

impl Task {
    pub fn new(id: String, title: String, duration_min: u32) -> Self {
        Task {
            id,
            title,
            duration_min,
            completed: false,
            project_id: None,
            origin: None,
        }
    }
}

/// Optional block metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    #[serde(default)]
    pub recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A scheduled time segment owning an ordered list of tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub start: ClockTime,
    /// Explicit duration, used when the block has no tasks
    pub duration_min: u32,
    pub block_type: BlockType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub meta: BlockMeta,
}

impl Block {
    pub fn new(id: String, block_type: BlockType, start: ClockTime, duration_min: u32) -> Self {
        Block {
            id,
            start,
            duration_min,
            block_type,
            label: None,
            tasks: Vec::new(),
            meta: BlockMeta::default(),
        }
    }

    /// Effective duration: the sum of task durations when there are tasks.
    pub fn duration(&self) -> u32 {
        if self.tasks.is_empty() {
            self.duration_min
        } else {
            self.tasks.iter().map(|t| t.duration_min).sum()
        }
    }

    pub fn end(&self) -> ClockTime {
        self.start.saturating_add(self.duration())
    }

    /// Label if set, otherwise the block type's label
    pub fn title(&self) -> &str {
        self.label.as_deref().unwrap_or(self.block_type.label())
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}
