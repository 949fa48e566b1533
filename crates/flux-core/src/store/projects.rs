use chrono::Utc;
use tracing::info;

use super::Store;
use crate::error::CoreError;
use crate::id::{self, prefix};
use crate::model::Project;

/// Fields for a new project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Store {
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.data.projects
    }

    #[must_use]
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.data.projects.iter().find(|p| p.id == id)
    }

    pub fn create_project(&mut self, new: NewProject) -> Result<Project, CoreError> {
        let now = Utc::now();
        let project = Project {
            id: id::new_id(prefix::PROJECT),
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        info!(project = %project.id, "create project");
        self.commit(|data| {
            data.projects.push(project.clone());
            project
        })
    }

    /// Returns `Ok(None)` when the id is unknown.
    pub fn update_project(
        &mut self,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, CoreError> {
        if self.project(id).is_none() {
            return Ok(None);
        }
        let id = id.to_string();
        self.commit(move |data| {
            let project = data.projects.iter_mut().find(|p| p.id == id)?;
            if let Some(name) = patch.name {
                project.name = name;
            }
            if let Some(description) = patch.description {
                project.description = Some(description);
            }
            project.updated_at = Utc::now();
            Some(project.clone())
        })
    }

    /// Hard delete with cascade: every epic and task owned by the project
    /// goes with it. Returns `false` when the id is unknown.
    pub fn delete_project(&mut self, id: &str) -> Result<bool, CoreError> {
        if self.project(id).is_none() {
            return Ok(false);
        }
        let id = id.to_string();
        info!(project = %id, "delete project (cascades epics and tasks)");
        self.commit(move |data| {
            data.projects.retain(|p| p.id != id);
            data.epics.retain(|e| e.project_id != id);
            data.tasks.retain(|t| t.project_id != id);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{NewProject, ProjectPatch};
    use crate::store::Store;
    use crate::store::tests_support::{seed_epic, seed_task};

    #[test]
    fn create_assigns_id_and_timestamps() {
        let mut store = Store::in_memory();
        let project = store
            .create_project(NewProject {
                name: "Shopfront".to_string(),
                description: Some("storefront rebuild".to_string()),
            })
            .unwrap();

        assert!(project.id.starts_with("pr-"));
        assert_eq!(project.created_at, project.updated_at);
        assert_eq!(store.projects().len(), 1);
    }

    #[test]
    fn update_merges_and_refreshes_updated_at_only() {
        let mut store = Store::in_memory();
        let project = store
            .create_project(NewProject {
                name: "Old".to_string(),
                description: None,
            })
            .unwrap();

        let updated = store
            .update_project(
                &project.id,
                ProjectPatch {
                    name: Some("New".to_string()),
                    description: None,
                },
            )
            .unwrap()
            .expect("exists");

        assert_eq!(updated.name, "New");
        assert_eq!(updated.description, None);
        assert_eq!(updated.created_at, project.created_at);
        assert!(updated.updated_at >= project.updated_at);
    }

    #[test]
    fn unknown_id_is_none_not_error() {
        let mut store = Store::in_memory();
        assert!(
            store
                .update_project("pr-missing", ProjectPatch::default())
                .unwrap()
                .is_none()
        );
        assert!(!store.delete_project("pr-missing").unwrap());
    }

    #[test]
    fn delete_cascades_epics_and_tasks() {
        let mut store = Store::in_memory();
        let keep = store
            .create_project(NewProject {
                name: "Keep".to_string(),
                description: None,
            })
            .unwrap();
        let doomed = store
            .create_project(NewProject {
                name: "Doomed".to_string(),
                description: None,
            })
            .unwrap();

        let epic = seed_epic(&mut store, &doomed.id, "Doomed epic");
        seed_task(&mut store, &doomed.id, Some(&epic.id), "Doomed task");
        let kept_task = seed_task(&mut store, &keep.id, None, "Kept task");

        assert!(store.delete_project(&doomed.id).unwrap());
        assert!(store.project(&doomed.id).is_none());
        assert!(store.data().epics.is_empty());
        assert_eq!(store.data().tasks.len(), 1);
        assert_eq!(store.data().tasks[0].id, kept_task.id);
    }
}
