//! Blocked-status derivation over the task dependency graph.
//!
//! A task is **blocked** iff it has a non-empty `depends_on` list and at
//! least one referenced task exists with status ≠ done. Dangling ids are
//! "not found ⇒ not blocking" and are silently ignored; referential
//! integrity on deletion keeps them rare, but imported data may carry them.

use crate::model::{Status, Task};
use crate::store::{Store, TaskFilters};

impl Store {
    /// Whether the task has at least one incomplete, existing dependency.
    /// Unknown task ids are not blocked.
    #[must_use]
    pub fn is_blocked(&self, task_id: &str) -> bool {
        self.task(task_id)
            .is_some_and(|task| !self.blockers_of(task).is_empty())
    }

    /// The existing, incomplete tasks the given task is waiting on.
    /// Empty for unknown ids, empty dependency lists, and dangling refs.
    #[must_use]
    pub fn blockers(&self, task_id: &str) -> Vec<&Task> {
        self.task(task_id)
            .map(|task| self.blockers_of(task))
            .unwrap_or_default()
    }

    /// Unarchived, not-done tasks in the project with no active blockers:
    /// the "what can I pick up next" view.
    #[must_use]
    pub fn ready_tasks(&self, project_id: &str) -> Vec<&Task> {
        let filters = TaskFilters {
            project_id: Some(project_id.to_string()),
            ..TaskFilters::default()
        };
        self.tasks(&filters)
            .into_iter()
            .filter(|t| t.status != Status::Done)
            .filter(|t| self.blockers_of(t).is_empty())
            .collect()
    }

    fn blockers_of(&self, task: &Task) -> Vec<&Task> {
        task.depends_on
            .iter()
            .filter_map(|dep_id| self.task(dep_id))
            .filter(|dep| dep.status != Status::Done)
            .collect()
    }
}
