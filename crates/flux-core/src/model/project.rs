use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root aggregate. Owns its epics and tasks via `project_id`; deleting a
/// project hard-deletes both transitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
