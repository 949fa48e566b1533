//! Archive/cleanup sweeps for a project's board.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::error::CoreError;
use crate::model::{Epic, Status, Task};
use crate::store::Store;

/// Which sweeps `cleanup_project` should run. Both default on.
#[derive(Debug, Clone, Copy)]
pub struct CleanupOptions {
    pub archive_tasks: bool,
    pub archive_epics: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            archive_tasks: true,
            archive_epics: true,
        }
    }
}

/// Counts reported back from a cleanup run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CleanupReport {
    pub archived_tasks: usize,
    pub deleted_epics: usize,
}

impl Store {
    /// Archive every done, unarchived task in the project. Idempotent: a
    /// second run finds nothing left to archive. Returns the tasks swept so
    /// callers can fire `task.archived` per task; the count is `len()`.
    pub fn archive_done_tasks(&mut self, project_id: &str) -> Result<Vec<Task>, CoreError> {
        let project_id = project_id.to_string();
        self.commit(move |data| {
            let mut archived = Vec::new();
            for task in data.tasks.iter_mut().filter(|t| {
                t.project_id == project_id && t.status == Status::Done && !t.archived
            }) {
                task.archived = true;
                task.updated_at = Utc::now();
                archived.push(task.clone());
            }
            archived
        })
    }

    /// Hard-delete every epic in the project with zero active (unarchived)
    /// tasks, clearing `epic_id` on any archived tasks still pointing at
    /// them. Epics are deliberately not soft-archived: they are lightweight
    /// containers and nothing references one after the clearing pass.
    /// Returns the deleted epics.
    pub fn archive_empty_epics(&mut self, project_id: &str) -> Result<Vec<Epic>, CoreError> {
        let project_id = project_id.to_string();
        self.commit(move |data| {
            let empty_ids: Vec<String> = data
                .epics
                .iter()
                .filter(|e| e.project_id == project_id)
                .filter(|e| {
                    !data
                        .tasks
                        .iter()
                        .any(|t| t.epic_id.as_deref() == Some(e.id.as_str()) && !t.archived)
                })
                .map(|e| e.id.clone())
                .collect();

            let mut deleted = Vec::new();
            data.epics.retain(|e| {
                if empty_ids.contains(&e.id) {
                    deleted.push(e.clone());
                    false
                } else {
                    true
                }
            });
            for task in data
                .tasks
                .iter_mut()
                .filter(|t| t.epic_id.as_deref().is_some_and(|e| empty_ids.iter().any(|id| id == e)))
            {
                task.epic_id = None;
                task.updated_at = Utc::now();
            }
            deleted
        })
    }

    /// Run the configured sweeps for one project. The sweeps are
    /// independent commits: a failure in the second leaves the first
    /// applied, which matches the board's recoverable, re-runnable design.
    pub fn cleanup_project(
        &mut self,
        project_id: &str,
        options: CleanupOptions,
    ) -> Result<CleanupReport, CoreError> {
        let mut report = CleanupReport::default();
        if options.archive_tasks {
            report.archived_tasks = self.archive_done_tasks(project_id)?.len();
        }
        if options.archive_epics {
            report.deleted_epics = self.archive_empty_epics(project_id)?.len();
        }
        info!(
            project = project_id,
            archived_tasks = report.archived_tasks,
            deleted_epics = report.deleted_epics,
            "cleanup sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::CleanupOptions;
    use crate::model::Status;
    use crate::store::tests_support::{seed_epic, seed_project, seed_task};
    use crate::store::{Store, TaskFilters};

    fn finish(store: &mut Store, task_id: &str) {
        store.update_task_status(task_id, Status::Todo).unwrap();
        store.update_task_status(task_id, Status::Done).unwrap();
    }

    #[test]
    fn archive_done_tasks_is_idempotent() {
        let mut store = Store::in_memory();
        let project = seed_project(&mut store, "P");
        let done = seed_task(&mut store, &project.id, None, "Done work");
        seed_task(&mut store, &project.id, None, "Open work");
        finish(&mut store, &done.id);

        let first = store.archive_done_tasks(&project.id).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, done.id);
        assert!(first[0].archived);

        let second = store.archive_done_tasks(&project.id).unwrap();
        assert!(second.is_empty(), "second sweep archives nothing new");
    }

    #[test]
    fn archive_ignores_other_projects() {
        let mut store = Store::in_memory();
        let ours = seed_project(&mut store, "Ours");
        let theirs = seed_project(&mut store, "Theirs");
        let foreign = seed_task(&mut store, &theirs.id, None, "Foreign done");
        finish(&mut store, &foreign.id);

        assert!(store.archive_done_tasks(&ours.id).unwrap().is_empty());
        assert!(!store.task(&foreign.id).unwrap().archived);
    }

    #[test]
    fn empty_epics_are_deleted_and_references_cleared() {
        let mut store = Store::in_memory();
        let project = seed_project(&mut store, "P");
        let busy = seed_epic(&mut store, &project.id, "Busy");
        let empty = seed_epic(&mut store, &project.id, "Empty");
        seed_task(&mut store, &project.id, Some(&busy.id), "Active work");

        let archived_task = seed_task(&mut store, &project.id, Some(&empty.id), "Finished");
        finish(&mut store, &archived_task.id);
        store.archive_done_tasks(&project.id).unwrap();

        let deleted = store.archive_empty_epics(&project.id).unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id, empty.id);
        assert!(store.epic(&busy.id).is_some());

        let orphan = store.task(&archived_task.id).unwrap();
        assert_eq!(orphan.epic_id, None, "archived task no longer points at a ghost");
    }

    #[test]
    fn cleanup_runs_sweeps_per_flags() {
        let mut store = Store::in_memory();
        let project = seed_project(&mut store, "P");
        seed_epic(&mut store, &project.id, "Empty");
        let done = seed_task(&mut store, &project.id, None, "Done");
        finish(&mut store, &done.id);

        let report = store
            .cleanup_project(
                &project.id,
                CleanupOptions {
                    archive_tasks: true,
                    archive_epics: false,
                },
            )
            .unwrap();
        assert_eq!(report.archived_tasks, 1);
        assert_eq!(report.deleted_epics, 0);
        assert_eq!(store.epics(Some(&project.id)).len(), 1);

        let report = store
            .cleanup_project(&project.id, CleanupOptions::default())
            .unwrap();
        assert_eq!(report.archived_tasks, 0);
        assert_eq!(report.deleted_epics, 1);

        let remaining = store.tasks(&TaskFilters {
            project_id: Some(project.id.clone()),
            include_archived: true,
            ..TaskFilters::default()
        });
        assert_eq!(remaining.len(), 1, "archived task is kept, not deleted");
    }
}
