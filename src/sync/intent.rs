use chrono::NaiveDate;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::model::{Block, DaySchedule, Inventory, InventorySource, Task, TaskOrigin};

/// What the backend must do to mirror a local change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RemoteIntent {
    CreateBlock {
        date: NaiveDate,
        block: Block,
    },
    UpdateBlock {
        date: NaiveDate,
        block: Block,
    },
    DeleteBlock {
        date: NaiveDate,
        block_id: String,
    },
    CreateTask {
        date: NaiveDate,
        block_id: String,
        index: usize,
        task: Task,
    },
    UpdateTask {
        date: NaiveDate,
        block_id: String,
        task: Task,
    },
    DeleteTask {
        date: NaiveDate,
        block_id: String,
        task_id: String,
    },
    /// Remove an inventory-sourced task from its block and hand it back
    UnassignTask {
        date: NaiveDate,
        block_id: String,
        task_id: String,
        origin: TaskOrigin,
    },
    ReorderTasks {
        date: NaiveDate,
        block_id: String,
        task_ids: Vec<String>,
    },
    InsertTasks {
        date: NaiveDate,
        block_id: String,
        index: usize,
        tasks: Vec<Task>,
    },
}

/// HTTP shape of an intent
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl RemoteIntent {
    pub fn date(&self) -> NaiveDate {
        match self {
            RemoteIntent::CreateBlock { date, .. }
            | RemoteIntent::UpdateBlock { date, .. }
            | RemoteIntent::DeleteBlock { date, .. }
            | RemoteIntent::CreateTask { date, .. }
            | RemoteIntent::UpdateTask { date, .. }
            | RemoteIntent::DeleteTask { date, .. }
            | RemoteIntent::UnassignTask { date, .. }
            | RemoteIntent::ReorderTasks { date, .. }
            | RemoteIntent::InsertTasks { date, .. } => *date,
        }
    }

    /// Block the intent touches
    pub fn block_id(&self) -> &str {
        match self {
            RemoteIntent::CreateBlock { block, .. } | RemoteIntent::UpdateBlock { block, .. } => {
                &block.id
            }
            RemoteIntent::DeleteBlock { block_id, .. }
            | RemoteIntent::CreateTask { block_id, .. }
            | RemoteIntent::UpdateTask { block_id, .. }
            | RemoteIntent::DeleteTask { block_id, .. }
            | RemoteIntent::UnassignTask { block_id, .. }
            | RemoteIntent::ReorderTasks { block_id, .. }
            | RemoteIntent::InsertTasks { block_id, .. } => block_id,
        }
    }

    /// Short human description for logs and the status row
    pub fn describe(&self) -> String {
        match self {
            RemoteIntent::CreateBlock { block, .. } => {
                format!("create block {} {}", block.start, block.title())
            }
            RemoteIntent::UpdateBlock { block, .. } => {
                format!("update block {} {}", block.start, block.title())
            }
            RemoteIntent::DeleteBlock { block_id, .. } => format!("delete block {}", block_id),
            RemoteIntent::CreateTask { task, .. } => format!("create task \"{}\"", task.title),
            RemoteIntent::UpdateTask { task, .. } => format!("update task \"{}\"", task.title),
            RemoteIntent::DeleteTask { task_id, .. } => format!("delete task {}", task_id),
            RemoteIntent::UnassignTask { task_id, .. } => format!("unassign task {}", task_id),
            RemoteIntent::ReorderTasks { block_id, .. } => {
                format!("reorder tasks in {}", block_id)
            }
            RemoteIntent::InsertTasks { tasks, .. } => format!("insert {} tasks", tasks.len()),
        }
    }

    /// Inventory assignment this intent establishes once the backend has it
    pub fn inventory_flags(&self) -> Vec<InventoryFlag> {
        match self {
            RemoteIntent::InsertTasks { tasks, .. } => tasks
                .iter()
                .filter_map(|t| t.origin.as_ref())
                .map(|origin| InventoryFlag {
                    source: origin.source,
                    task_id: origin.task_id.clone(),
                    assigned: true,
                })
                .collect(),
            RemoteIntent::UnassignTask { origin, .. } => vec![InventoryFlag {
                source: origin.source,
                task_id: origin.task_id.clone(),
                assigned: false,
            }],
            _ => Vec::new(),
        }
    }

    /// Map to the planner API route
    pub fn endpoint(&self) -> Endpoint {
        let ymd = |d: &NaiveDate| d.format("%Y-%m-%d").to_string();
        match self {
            RemoteIntent::CreateBlock { date, block } => Endpoint {
                method: Method::POST,
                path: "/api/blocks".to_string(),
                body: Some(json!({ "date": ymd(date), "block": block })),
            },
            RemoteIntent::UpdateBlock { date, block } => Endpoint {
                method: Method::PUT,
                path: format!("/api/blocks/{}", block.id),
                body: Some(json!({ "date": ymd(date), "block": block })),
            },
            RemoteIntent::DeleteBlock { date, block_id } => Endpoint {
                method: Method::DELETE,
                path: format!("/api/blocks/{}?date={}", block_id, ymd(date)),
                body: None,
            },
            RemoteIntent::CreateTask {
                date,
                block_id,
                index,
                task,
            } => Endpoint {
                method: Method::POST,
                path: "/api/tasks".to_string(),
                body: Some(json!({
                    "date": ymd(date),
                    "blockId": block_id,
                    "index": index,
                    "task": task,
                })),
            },
            RemoteIntent::UpdateTask {
                date,
                block_id,
                task,
            } => Endpoint {
                method: Method::PUT,
                path: format!("/api/tasks/{}", task.id),
                body: Some(json!({ "date": ymd(date), "blockId": block_id, "task": task })),
            },
            RemoteIntent::DeleteTask {
                date,
                block_id,
                task_id,
            } => Endpoint {
                method: Method::DELETE,
                path: format!("/api/tasks/{}?date={}&blockId={}", task_id, ymd(date), block_id),
                body: None,
            },
            RemoteIntent::UnassignTask {
                date,
                block_id,
                task_id,
                origin,
            } => Endpoint {
                method: Method::POST,
                path: format!("/api/tasks/{}/unassign", task_id),
                body: Some(json!({
                    "date": ymd(date),
                    "blockId": block_id,
                    "source": origin.source,
                    "inventoryTaskId": origin.task_id,
                })),
            },
            RemoteIntent::ReorderTasks {
                date,
                block_id,
                task_ids,
            } => Endpoint {
                method: Method::PUT,
                path: format!("/api/blocks/{}/tasks/order", block_id),
                body: Some(json!({ "date": ymd(date), "taskIds": task_ids })),
            },
            RemoteIntent::InsertTasks {
                date,
                block_id,
                index,
                tasks,
            } => Endpoint {
                method: Method::POST,
                path: format!("/api/blocks/{}/tasks/batch", block_id),
                body: Some(json!({ "date": ymd(date), "index": index, "tasks": tasks })),
            },
        }
    }
}

/// Inventory flag to restore on rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryFlag {
    pub source: InventorySource,
    pub task_id: String,
    pub assigned: bool,
}

/// Snapshot that undoes one local change: the block as it was before (None
/// when the change created it) and where it sat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollback {
    pub date: NaiveDate,
    pub block_id: String,
    pub before: Option<Block>,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory: Vec<InventoryFlag>,
}

impl Rollback {
    /// Restore the block in `schedule` and re-sort.
    pub fn apply(&self, schedule: &mut DaySchedule) {
        if schedule.date != self.date {
            return;
        }
        let current = schedule.position_of(&self.block_id);
        match (&self.before, current) {
            (None, Some(i)) => {
                schedule.blocks.remove(i);
            }
            (None, None) => {}
            (Some(block), Some(i)) => schedule.blocks[i] = block.clone(),
            (Some(block), None) => {
                let at = self.index.min(schedule.blocks.len());
                schedule.blocks.insert(at, block.clone());
            }
        }
        schedule.sort_blocks();
    }

    /// Restore inventory assignment flags.
    pub fn apply_inventory(&self, inventory: &mut Inventory) {
        for flag in &self.inventory {
            inventory.set_assigned(flag.source, &flag.task_id, flag.assigned);
        }
    }
}

/// A local change paired with its remote intent and how to undo it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub intent: RemoteIntent,
    pub rollback: Rollback,
}
