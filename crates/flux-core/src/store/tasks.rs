use chrono::Utc;
use tracing::info;

use super::{Store, contains_ci, eq_ci};
use crate::error::CoreError;
use crate::id::{self, prefix};
use crate::model::{Status, Task};

/// Fields for a new task. Status defaults to `planning`.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub project_id: String,
    pub epic_id: Option<String>,
    pub status: Option<Status>,
    pub depends_on: Vec<String>,
    pub notes: Option<String>,
    pub agent: Option<String>,
}

/// Partial update; `None` fields keep their current value.
///
/// `epic_id` and `agent` are doubly optional: the outer `None` means
/// "leave unchanged", `Some(None)` clears the assignment.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub depends_on: Option<Vec<String>>,
    pub notes: Option<String>,
    pub epic_id: Option<Option<String>>,
    pub agent: Option<Option<String>>,
    pub archived: Option<bool>,
}

/// Task list filters. String filters are case-insensitive; `search`
/// substring-matches title and notes.
#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub project_id: Option<String>,
    pub epic_id: Option<String>,
    pub status: Option<Status>,
    pub agent: Option<String>,
    pub include_archived: bool,
    pub search: Option<String>,
}

/// Result of a status mutation, carrying what a `task.status_changed`
/// payload needs.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub task: Task,
    pub previous: Status,
    pub changed: bool,
}

impl Store {
    /// Tasks matching the given filters. Archived tasks are hidden unless
    /// `include_archived` is set.
    #[must_use]
    pub fn tasks(&self, filters: &TaskFilters) -> Vec<&Task> {
        self.data
            .tasks
            .iter()
            .filter(|t| filters.include_archived || !t.archived)
            .filter(|t| filters.project_id.as_deref().is_none_or(|p| t.project_id == p))
            .filter(|t| {
                filters
                    .epic_id
                    .as_deref()
                    .is_none_or(|e| t.epic_id.as_deref() == Some(e))
            })
            .filter(|t| filters.status.is_none_or(|s| t.status == s))
            .filter(|t| {
                filters
                    .agent
                    .as_deref()
                    .is_none_or(|a| t.agent.as_deref().is_some_and(|own| eq_ci(own, a)))
            })
            .filter(|t| {
                filters
                    .search
                    .as_deref()
                    .is_none_or(|q| contains_ci(&t.title, q) || contains_ci(&t.notes, q))
            })
            .collect()
    }

    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.data.tasks.iter().find(|t| t.id == id)
    }

    pub fn create_task(&mut self, new: NewTask) -> Result<Task, CoreError> {
        let now = Utc::now();
        let task = Task {
            id: id::new_id(prefix::TASK),
            title: new.title,
            status: new.status.unwrap_or(Status::Planning),
            depends_on: new.depends_on,
            notes: new.notes.unwrap_or_default(),
            epic_id: new.epic_id,
            project_id: new.project_id,
            agent: new.agent,
            archived: false,
            created_at: now,
            updated_at: now,
        };
        info!(task = %task.id, project = %task.project_id, "create task");
        self.commit(|data| {
            data.tasks.push(task.clone());
            task
        })
    }

    /// Partial update. A status change is checked against the transition
    /// table here, inside the store, so every caller gets the same gate.
    /// Returns `Ok(None)` when the id is unknown.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Option<Task>, CoreError> {
        let Some(current) = self.task(id) else {
            return Ok(None);
        };
        if let Some(next) = patch.status {
            current.status.can_transition_to(next)?;
        }
        let id = id.to_string();
        self.commit(move |data| {
            let task = data.tasks.iter_mut().find(|t| t.id == id)?;
            if let Some(title) = patch.title {
                task.title = title;
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            if let Some(depends_on) = patch.depends_on {
                task.depends_on = depends_on;
            }
            if let Some(notes) = patch.notes {
                task.notes = notes;
            }
            if let Some(epic_id) = patch.epic_id {
                task.epic_id = epic_id;
            }
            if let Some(agent) = patch.agent {
                task.agent = agent;
            }
            if let Some(archived) = patch.archived {
                task.archived = archived;
            }
            task.updated_at = Utc::now();
            Some(task.clone())
        })
    }

    /// Status-only mutation reporting whether anything actually changed,
    /// so the caller can decide to fire `task.status_changed`.
    pub fn update_task_status(
        &mut self,
        id: &str,
        status: Status,
    ) -> Result<Option<StatusChange>, CoreError> {
        let Some(current) = self.task(id) else {
            return Ok(None);
        };
        let previous = current.status;
        let task = match self.update_task(
            id,
            TaskPatch {
                status: Some(status),
                ..TaskPatch::default()
            },
        )? {
            Some(task) => task,
            None => return Ok(None),
        };
        Ok(Some(StatusChange {
            changed: previous != task.status,
            previous,
            task,
        }))
    }

    /// Hard delete. The deleted id is pruned from every other task's
    /// `depends_on` list, preserving the order of the remaining ids.
    pub fn delete_task(&mut self, id: &str) -> Result<bool, CoreError> {
        if self.task(id).is_none() {
            return Ok(false);
        }
        let id = id.to_string();
        info!(task = %id, "delete task (prunes dependency references)");
        self.commit(move |data| {
            data.tasks.retain(|t| t.id != id);
            for task in &mut data.tasks {
                if task.depends_on.iter().any(|d| *d == id) {
                    task.depends_on.retain(|d| *d != id);
                    task.updated_at = Utc::now();
                }
            }
            true
        })
    }
}
