//! Task entity type - work items owned by a milestone
//!
//! Dependencies reference other tasks in the same project by id. No cycle
//! checking is performed on the dependency list.

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Priority};
use crate::core::identity::{EntityId, EntityPrefix};

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Completed,
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Review => write!(f, "review"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl TaskStatus {
    /// Whether the task still needs work (not completed or cancelled)
    pub fn is_open(&self) -> bool {
        !matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// A unit of work inside a milestone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: EntityId,

    pub project_id: EntityId,
    pub milestone_id: EntityId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Assignee; may no longer resolve to a stored user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<EntityId>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub estimated_hours: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,

    /// Same-project task ids this task waits on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<EntityId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: EntityId,
    pub milestone_id: EntityId,
    pub title: String,
    pub description: String,
    pub assigned_to: Option<EntityId>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub estimated_hours: f64,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub dependencies: Vec<EntityId>,
}

impl NewTask {
    pub fn new(project_id: EntityId, milestone_id: EntityId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            milestone_id,
            title: title.into(),
            description: String::new(),
            assigned_to: None,
            status: TaskStatus::default(),
            priority: Priority::default(),
            estimated_hours: 0.0,
            start_date: None,
            due_date: None,
            dependencies: Vec::new(),
        }
    }
}

/// Partial update for a task; unset fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<EntityId>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub dependencies: Option<Vec<EntityId>>,
}

impl TaskUpdate {
    /// Shallow-merge the set fields onto an existing record
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(assignee) = self.assigned_to {
            task.assigned_to = Some(assignee);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(hours) = self.estimated_hours {
            task.estimated_hours = hours;
        }
        if let Some(hours) = self.actual_hours {
            task.actual_hours = Some(hours);
        }
        if let Some(date) = self.start_date {
            task.start_date = Some(date);
        }
        if let Some(date) = self.due_date {
            task.due_date = Some(date);
        }
        if let Some(date) = self.completed_date {
            task.completed_date = Some(date);
        }
        if let Some(deps) = self.dependencies {
            task.dependencies = deps;
        }
    }
}

impl Entity for Task {
    const PREFIX: &'static str = "TASK";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Task {
    /// Create a task with fresh id and timestamps
    pub fn new(input: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Task),
            project_id: input.project_id,
            milestone_id: input.milestone_id,
            title: input.title,
            description: input.description,
            assigned_to: input.assigned_to,
            status: input.status,
            priority: input.priority,
            estimated_hours: input.estimated_hours,
            actual_hours: None,
            start_date: input.start_date,
            due_date: input.due_date,
            completed_date: None,
            dependencies: input.dependencies,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_roundtrip() {
        let task = Task::new(NewTask::new(
            EntityId::new(EntityPrefix::Prj),
            EntityId::new(EntityPrefix::Ms),
            "Structural drawings",
        ));

        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();

        assert_eq!(task.id, parsed.id);
        assert_eq!(parsed.status, TaskStatus::Todo);
        assert!(parsed.dependencies.is_empty());
    }

    #[test]
    fn test_status_is_open() {
        assert!(TaskStatus::Todo.is_open());
        assert!(TaskStatus::Review.is_open());
        assert!(!TaskStatus::Completed.is_open());
        assert!(!TaskStatus::Cancelled.is_open());
    }

    #[test]
    fn test_task_update_merges() {
        let mut task = Task::new(NewTask::new(
            EntityId::new(EntityPrefix::Prj),
            EntityId::new(EntityPrefix::Ms),
            "Structural drawings",
        ));

        TaskUpdate {
            status: Some(TaskStatus::InProgress),
            actual_hours: Some(12.5),
            ..Default::default()
        }
        .apply(&mut task);

        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.actual_hours, Some(12.5));
        assert_eq!(task.title, "Structural drawings");
    }
}
