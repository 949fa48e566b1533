use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::Status;

/// A grouping of related tasks within a project.
///
/// Epics share the task status domain but not the task transition table;
/// their status is free-form board metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    pub id: String,
    pub title: String,
    pub status: Status,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
