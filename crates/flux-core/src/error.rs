use std::fmt;

use thiserror::Error;

use crate::model::task::InvalidTransition;
use crate::storage::StorageError;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    EntityNotFound,
    InvalidStatusTransition,
    ValidationFailed,
    DuplicateSku,
    DuplicateEmail,
    StoreWriteFailed,
    LockContention,
    CorruptDataFile,
    DeliveryFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::EntityNotFound => "E2001",
            Self::InvalidStatusTransition => "E2002",
            Self::ValidationFailed => "E2003",
            Self::DuplicateSku => "E2004",
            Self::DuplicateEmail => "E2005",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::CorruptDataFile => "E5003",
            Self::DeliveryFailed => "E6001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Workspace not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::EntityNotFound => "Entity not found",
            Self::InvalidStatusTransition => "Invalid status transition",
            Self::ValidationFailed => "Validation failed",
            Self::DuplicateSku => "Duplicate product SKU",
            Self::DuplicateEmail => "Duplicate customer email",
            Self::StoreWriteFailed => "Data file write failed",
            Self::LockContention => "Lock contention",
            Self::CorruptDataFile => "Corrupt data file",
            Self::DeliveryFailed => "Webhook delivery failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `flux init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .flux/config.toml and retry."),
            Self::EntityNotFound => None,
            Self::InvalidStatusTransition => {
                Some("Tasks in planning must pass through todo before in_progress.")
            }
            Self::ValidationFailed => None,
            Self::DuplicateSku => Some("SKUs are case-insensitive and must be unique."),
            Self::DuplicateEmail => Some("Customer emails are case-insensitive and must be unique."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other `flux` process releases its lock.")
            }
            Self::CorruptDataFile => Some("Restore .flux/flux.json from backup."),
            Self::DeliveryFailed => Some("Check the webhook URL and endpoint logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the store, quote engine, and dispatch engine.
///
/// Unknown-id lookups are not errors: mutators return `Ok(None)` / `Ok(false)`
/// and callers translate that into a not-found response.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unresolvable reference or out-of-range input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A product with the same SKU (case-insensitive) already exists.
    #[error("duplicate sku '{sku}'")]
    DuplicateSku { sku: String },

    /// A customer with the same email (case-insensitive) already exists.
    #[error("duplicate email '{email}'")]
    DuplicateEmail { email: String },

    /// A task status change rejected by the transition table.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    /// Adapter I/O failure; the in-memory state has been rolled back.
    #[error(transparent)]
    Persistence(#[from] StorageError),
}

impl CoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::DuplicateSku { .. } => ErrorCode::DuplicateSku,
            Self::DuplicateEmail { .. } => ErrorCode::DuplicateEmail,
            Self::Transition(_) => ErrorCode::InvalidStatusTransition,
            Self::Persistence(err) => err.code(),
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
