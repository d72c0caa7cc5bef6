use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Block, Task};

use super::block_ops::neighbour;

static DURATION_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.*?)\s+(?:(?P<h>\d{1,2})h)?(?:(?P<m>\d{1,3})m)?$")
        .expect("duration suffix regex")
});

/// Split typed task text into a title and an optional trailing duration
/// (`Write report 45m`, `Deploy 1h`, `Review 1h30m`).
pub fn parse_task_entry(input: &str) -> (String, Option<u32>) {
    let input = input.trim();
    if let Some(caps) = DURATION_SUFFIX_RE.captures(input) {
        let hours = caps.name("h").and_then(|m| m.as_str().parse::<u32>().ok());
        let minutes = caps.name("m").and_then(|m| m.as_str().parse::<u32>().ok());
        let title = caps.name("title").map_or("", |m| m.as_str().trim());
        if (hours.is_some() || minutes.is_some()) && !title.is_empty() {
            let total = hours.unwrap_or(0) * 60 + minutes.unwrap_or(0);
            return (title.to_string(), Some(total));
        }
    }
    (input.to_string(), None)
}

/// Insert a task at `index` (clamped). Returns the index used.
pub fn insert_task(block: &mut Block, index: usize, task: Task) -> usize {
    let index = index.min(block.tasks.len());
    block.tasks.insert(index, task);
    index
}

pub fn remove_task(block: &mut Block, index: usize) -> Option<Task> {
    (index < block.tasks.len()).then(|| block.tasks.remove(index))
}

/// Swap a task with its neighbour; returns the new index or None at the boundary.
pub fn swap_task(block: &mut Block, index: usize, direction: i32) -> Option<usize> {
    let target = neighbour(index, direction, block.tasks.len())?;
    block.tasks.swap(index, target);
    Some(target)
}

pub fn move_task(block: &mut Block, from: usize, to: usize) {
    if from >= block.tasks.len() {
        return;
    }
    let task = block.tasks.remove(from);
    let to = to.min(block.tasks.len());
    block.tasks.insert(to, task);
}

/// Flip the completed flag; returns the new value.
pub fn toggle_complete(block: &mut Block, index: usize) -> Option<bool> {
    let task = block.tasks.get_mut(index)?;
    task.completed = !task.completed;
    Some(task.completed)
}

pub fn task_ids(block: &Block) -> Vec<String> {
    block.tasks.iter().map(|t| t.id.clone()).collect()
}
