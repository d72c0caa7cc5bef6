use serde::{Deserialize, Serialize};

use super::block::InventorySource;
use super::time::ClockTime;

/// An unscheduled task in a project or the backlog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub duration_min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// True while the task sits in some block
    #[serde(default)]
    pub assigned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<InventoryTask>,
}

/// A recurring block template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<ClockTime>,
    #[serde(default)]
    pub duration_min: u32,
    #[serde(default)]
    pub tasks: Vec<RoutineTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineTask {
    pub title: String,
    #[serde(default)]
    pub duration_min: u32,
}

/// A fixed calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub start: ClockTime,
    #[serde(default)]
    pub duration_min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Everything the pickers can pull into a day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub backlog: Vec<InventoryTask>,
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Inventory {
    /// Unassigned tasks from a source, paired with a display label.
    /// Project tasks are labelled `Project / Task`.
    pub fn pickable(&self, source: InventorySource) -> Vec<(&InventoryTask, String)> {
        match source {
            InventorySource::Project => self
                .projects
                .iter()
                .flat_map(|p| {
                    p.tasks
                        .iter()
                        .filter(|t| !t.assigned)
                        .map(move |t| (t, format!("{} / {}", p.name, t.title)))
                })
                .collect(),
            InventorySource::Backlog => self
                .backlog
                .iter()
                .filter(|t| !t.assigned)
                .map(|t| (t, t.title.clone()))
                .collect(),
        }
    }

    pub fn find_task(&self, source: InventorySource, task_id: &str) -> Option<&InventoryTask> {
        match source {
            InventorySource::Project => self
                .projects
                .iter()
                .flat_map(|p| p.tasks.iter())
                .find(|t| t.id == task_id),
            InventorySource::Backlog => self.backlog.iter().find(|t| t.id == task_id),
        }
    }

    /// Set the `assigned` flag; returns false when the task is unknown.
    pub fn set_assigned(&mut self, source: InventorySource, task_id: &str, assigned: bool) -> bool {
        let task = match source {
            InventorySource::Project => self
                .projects
                .iter_mut()
                .flat_map(|p| p.tasks.iter_mut())
                .find(|t| t.id == task_id),
            InventorySource::Backlog => self.backlog.iter_mut().find(|t| t.id == task_id),
        };
        match task {
            Some(t) => {
                t.assigned = assigned;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, title: &str, assigned: bool) -> InventoryTask {
        InventoryTask {
            id: id.into(),
            title: title.into(),
            duration_min: 30,
            project_id: None,
            assigned,
        }
    }

    fn inventory() -> Inventory {
        Inventory {
            projects: vec![Project {
                id: "p1".into(),
                name: "Website".into(),
                tasks: vec![task("p1-1", "Hero copy", false), task("p1-2", "Deploy", true)],
            }],
            backlog: vec![task("bl-1", "Renew passport", false)],
            ..Default::default()
        }
    }

    #[test]
    fn pickable_skips_assigned_and_labels_projects() {
        let inv = inventory();
        let items = inv.pickable(InventorySource::Project);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].1, "Website / Hero copy");
        assert_eq!(inv.pickable(InventorySource::Backlog).len(), 1);
    }

    #[test]
    fn set_assigned_round_trip() {
        let mut inv = inventory();
        assert!(inv.set_assigned(InventorySource::Backlog, "bl-1", true));
        assert!(inv.pickable(InventorySource::Backlog).is_empty());
        assert!(inv.set_assigned(InventorySource::Backlog, "bl-1", false));
        assert!(!inv.set_assigned(InventorySource::Project, "missing", true));
    }

    #[test]
    fn deserializes_with_defaults() {
        let inv: Inventory = serde_json::from_str(r#"{"backlog":[{"id":"x","title":"T"}]}"#).unwrap();
        assert_eq!(inv.backlog[0].duration_min, 0);
        assert!(!inv.backlog[0].assigned);
        assert!(inv.projects.is_empty());
    }
}
