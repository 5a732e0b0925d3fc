//! Domain types for the remote stack API.
//!
//! These are the crate's own representations of CloudFormation resources;
//! SDK wire types are converted at the adapter boundary so the engine and
//! its tests never depend on the SDK directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a deployed stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackStatus {
    /// Stack creation is in progress.
    CreateInProgress,
    /// Stack creation failed.
    CreateFailed,
    /// Stack creation completed.
    CreateComplete,
    /// Rollback of a failed creation is in progress.
    RollbackInProgress,
    /// Rollback of a failed creation failed.
    RollbackFailed,
    /// Rollback of a failed creation completed.
    RollbackComplete,
    /// Stack deletion is in progress.
    DeleteInProgress,
    /// Stack deletion failed.
    DeleteFailed,
    /// Stack deletion completed.
    DeleteComplete,
    /// Stack update is in progress.
    UpdateInProgress,
    /// Post-update cleanup is in progress.
    UpdateCompleteCleanupInProgress,
    /// Stack update completed.
    UpdateComplete,
    /// Stack update failed.
    UpdateFailed,
    /// Rollback of a failed update is in progress.
    UpdateRollbackInProgress,
    /// Rollback of a failed update failed.
    UpdateRollbackFailed,
    /// Post-update-rollback cleanup is in progress.
    UpdateRollbackCompleteCleanupInProgress,
    /// Rollback of a failed update completed.
    UpdateRollbackComplete,
    /// Stack is awaiting change set review.
    ReviewInProgress,
    /// A status this client does not model.
    Other(String),
}

impl StackStatus {
    /// Parses a status from its wire representation.
    #[must_use]
    pub fn from_wire(status: &str) -> Self {
        match status {
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "CREATE_FAILED" => Self::CreateFailed,
            "CREATE_COMPLETE" => Self::CreateComplete,
            "ROLLBACK_IN_PROGRESS" => Self::RollbackInProgress,
            "ROLLBACK_FAILED" => Self::RollbackFailed,
            "ROLLBACK_COMPLETE" => Self::RollbackComplete,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            "DELETE_FAILED" => Self::DeleteFailed,
            "DELETE_COMPLETE" => Self::DeleteComplete,
            "UPDATE_IN_PROGRESS" => Self::UpdateInProgress,
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS" => Self::UpdateCompleteCleanupInProgress,
            "UPDATE_COMPLETE" => Self::UpdateComplete,
            "UPDATE_FAILED" => Self::UpdateFailed,
            "UPDATE_ROLLBACK_IN_PROGRESS" => Self::UpdateRollbackInProgress,
            "UPDATE_ROLLBACK_FAILED" => Self::UpdateRollbackFailed,
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS" => {
                Self::UpdateRollbackCompleteCleanupInProgress
            }
            "UPDATE_ROLLBACK_COMPLETE" => Self::UpdateRollbackComplete,
            "REVIEW_IN_PROGRESS" => Self::ReviewInProgress,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire representation of this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateFailed => "CREATE_FAILED",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::RollbackComplete => "ROLLBACK_COMPLETE",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateCompleteCleanupInProgress => "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
            Self::UpdateComplete => "UPDATE_COMPLETE",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            Self::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            Self::UpdateRollbackCompleteCleanupInProgress => {
                "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS"
            }
            Self::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            Self::ReviewInProgress => "REVIEW_IN_PROGRESS",
            Self::Other(other) => other,
        }
    }

    /// Returns true if this status means the stack is logically absent.
    ///
    /// Summaries in a deleted status are excluded from diffing.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::DeleteFailed | Self::DeleteComplete)
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a resource within a stack event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceStatus {
    /// Resource creation is in progress.
    CreateInProgress,
    /// Resource creation failed.
    CreateFailed,
    /// Resource creation completed.
    CreateComplete,
    /// Resource deletion is in progress.
    DeleteInProgress,
    /// Resource deletion failed.
    DeleteFailed,
    /// Resource deletion completed.
    DeleteComplete,
    /// Resource deletion was skipped.
    DeleteSkipped,
    /// Resource update is in progress.
    UpdateInProgress,
    /// Resource update failed.
    UpdateFailed,
    /// Resource update completed.
    UpdateComplete,
    /// Resource rollback is in progress.
    RollbackInProgress,
    /// Resource rollback failed.
    RollbackFailed,
    /// Resource rollback completed.
    RollbackComplete,
    /// A status this client does not model.
    Other(String),
}

impl ResourceStatus {
    /// Parses a status from its wire representation.
    #[must_use]
    pub fn from_wire(status: &str) -> Self {
        match status {
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "CREATE_FAILED" => Self::CreateFailed,
            "CREATE_COMPLETE" => Self::CreateComplete,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            "DELETE_FAILED" => Self::DeleteFailed,
            "DELETE_COMPLETE" => Self::DeleteComplete,
            "DELETE_SKIPPED" => Self::DeleteSkipped,
            "UPDATE_IN_PROGRESS" => Self::UpdateInProgress,
            "UPDATE_FAILED" => Self::UpdateFailed,
            "UPDATE_COMPLETE" => Self::UpdateComplete,
            "ROLLBACK_IN_PROGRESS" => Self::RollbackInProgress,
            "ROLLBACK_FAILED" => Self::RollbackFailed,
            "ROLLBACK_COMPLETE" => Self::RollbackComplete,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire representation of this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateFailed => "CREATE_FAILED",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::DeleteSkipped => "DELETE_SKIPPED",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::UpdateComplete => "UPDATE_COMPLETE",
            Self::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::RollbackComplete => "ROLLBACK_COMPLETE",
            Self::Other(other) => other,
        }
    }

    /// Returns true if this status ends the operation for the resource.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::CreateComplete
                | Self::CreateFailed
                | Self::UpdateComplete
                | Self::UpdateFailed
                | Self::DeleteComplete
                | Self::DeleteFailed
        )
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A read-only snapshot of a deployed stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSummary {
    /// Stack name.
    pub name: String,
    /// Current lifecycle status.
    pub status: StackStatus,
}

impl StackSummary {
    /// Creates a summary with the given name and status.
    #[must_use]
    pub fn new(name: impl Into<String>, status: StackStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// A single entry in a stack's append-only event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEvent {
    /// Unique event id; the stream never re-uses ids.
    pub id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Logical id of the affected resource; equals the stack name for
    /// stack-level events.
    pub logical_resource_id: String,
    /// Type of the affected resource.
    pub resource_type: String,
    /// Status the resource transitioned to.
    pub status: ResourceStatus,
    /// Optional reason accompanying the status.
    pub reason: Option<String>,
}

/// A named value exported by a deployed stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    /// Export name, unique within the account and region.
    pub name: String,
    /// Exported value.
    pub value: String,
    /// Id of the stack that owns the export.
    pub exporting_stack_id: Option<String>,
}

/// A key/value tag attached to a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Creates a tag with the given key and value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A template parameter passed to create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter key, as declared by the template.
    pub key: String,
    /// Parameter value.
    pub value: String,
}

impl Parameter {
    /// Creates a parameter with the given key and value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
