use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The four board columns shared by tasks and epics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Planning,
    Todo,
    InProgress,
    Done,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// The single forbidden edge is `planning -> in_progress`: planned work
    /// must pass through `todo` before it can start. Every other pair is
    /// allowed, including no-op transitions (which fire no event).
    pub const fn can_transition_to(self, target: Self) -> Result<(), InvalidTransition> {
        if matches!((self, target), (Self::Planning, Self::InProgress)) {
            return Err(InvalidTransition {
                from: self,
                to: target,
            });
        }
        Ok(())
    }
}

/// Error returned when a status transition is rejected by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {expected}: '{got}'")]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('-', "_")
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "planning" => Ok(Self::Planning),
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

/// A unit of work on a project board.
///
/// `depends_on` holds raw task ids; whether the task is *blocked* is derived
/// on read from the referenced tasks' statuses and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: Status,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub epic_id: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
