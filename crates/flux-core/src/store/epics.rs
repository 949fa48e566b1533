use chrono::Utc;
use tracing::info;

use super::Store;
use crate::error::CoreError;
use crate::id::{self, prefix};
use crate::model::{Epic, Status};

/// Fields for a new epic. Status defaults to `planning`.
#[derive(Debug, Clone)]
pub struct NewEpic {
    pub title: String,
    pub project_id: String,
    pub status: Option<Status>,
    pub depends_on: Vec<String>,
    pub notes: Option<String>,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct EpicPatch {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub depends_on: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl Store {
    /// Epics, optionally restricted to one project.
    #[must_use]
    pub fn epics(&self, project_id: Option<&str>) -> Vec<&Epic> {
        self.data
            .epics
            .iter()
            .filter(|e| project_id.is_none_or(|p| e.project_id == p))
            .collect()
    }

    #[must_use]
    pub fn epic(&self, id: &str) -> Option<&Epic> {
        self.data.epics.iter().find(|e| e.id == id)
    }

    pub fn create_epic(&mut self, new: NewEpic) -> Result<Epic, CoreError> {
        let now = Utc::now();
        let epic = Epic {
            id: id::new_id(prefix::EPIC),
            title: new.title,
            status: new.status.unwrap_or(Status::Planning),
            depends_on: new.depends_on,
            notes: new.notes.unwrap_or_default(),
            project_id: new.project_id,
            created_at: now,
            updated_at: now,
        };
        info!(epic = %epic.id, project = %epic.project_id, "create epic");
        self.commit(|data| {
            data.epics.push(epic.clone());
            epic
        })
    }

    /// Returns `Ok(None)` when the id is unknown. Epic status is free-form
    /// board metadata; the task transition table does not apply here.
    pub fn update_epic(&mut self, id: &str, patch: EpicPatch) -> Result<Option<Epic>, CoreError> {
        if self.epic(id).is_none() {
            return Ok(None);
        }
        let id = id.to_string();
        self.commit(move |data| {
            let epic = data.epics.iter_mut().find(|e| e.id == id)?;
            if let Some(title) = patch.title {
                epic.title = title;
            }
            if let Some(status) = patch.status {
                epic.status = status;
            }
            if let Some(depends_on) = patch.depends_on {
                epic.depends_on = depends_on;
            }
            if let Some(notes) = patch.notes {
                epic.notes = notes;
            }
            epic.updated_at = Utc::now();
            Some(epic.clone())
        })
    }

    /// Hard delete. Tasks that referenced the epic survive with `epic_id`
    /// cleared; an epic is a grouping, not an owner.
    pub fn delete_epic(&mut self, id: &str) -> Result<bool, CoreError> {
        if self.epic(id).is_none() {
            return Ok(false);
        }
        let id = id.to_string();
        info!(epic = %id, "delete epic (clears task references)");
        self.commit(move |data| {
            data.epics.retain(|e| e.id != id);
            for task in data
                .tasks
                .iter_mut()
                .filter(|t| t.epic_id.as_deref() == Some(id.as_str()))
            {
                task.epic_id = None;
                task.updated_at = Utc::now();
            }
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EpicPatch, NewEpic};
    use crate::model::Status;
    use crate::store::Store;
    use crate::store::tests_support::{seed_project, seed_task};

    #[test]
    fn create_defaults_to_planning() {
        let mut store = Store::in_memory();
        let project = seed_project(&mut store, "P");
        let epic = store
            .create_epic(NewEpic {
                title: "Checkout".to_string(),
                project_id: project.id.clone(),
                status: None,
                depends_on: vec![],
                notes: None,
            })
            .unwrap();

        assert!(epic.id.starts_with("ep-"));
        assert_eq!(epic.status, Status::Planning);
        assert_eq!(store.epics(Some(&project.id)).len(), 1);
        assert!(store.epics(Some("pr-other")).is_empty());
    }

    #[test]
    fn update_merges_fields() {
        let mut store = Store::in_memory();
        let project = seed_project(&mut store, "P");
        let epic = store
            .create_epic(NewEpic {
                title: "Checkout".to_string(),
                project_id: project.id,
                status: None,
                depends_on: vec![],
                notes: None,
            })
            .unwrap();

        let updated = store
            .update_epic(
                &epic.id,
                EpicPatch {
                    status: Some(Status::InProgress),
                    ..EpicPatch::default()
                },
            )
            .unwrap()
            .expect("exists");

        assert_eq!(updated.status, Status::InProgress);
        assert_eq!(updated.title, "Checkout");
    }

    #[test]
    fn delete_clears_task_references_but_keeps_tasks() {
        let mut store = Store::in_memory();
        let project = seed_project(&mut store, "P");
        let epic = store
            .create_epic(NewEpic {
                title: "Checkout".to_string(),
                project_id: project.id.clone(),
                status: None,
                depends_on: vec![],
                notes: None,
            })
            .unwrap();
        let task = seed_task(&mut store, &project.id, Some(&epic.id), "T");

        assert!(store.delete_epic(&epic.id).unwrap());
        let survivor = store.task(&task.id).expect("task survives");
        assert_eq!(survivor.epic_id, None);
    }
}
