//! Error types for the stackform reconciliation engine.
//!
//! The hierarchy mirrors the operation surface: remote CloudFormation
//! failures, template loading and parsing failures, and per-stack operation
//! failures that carry the operation name and stack name for context.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for stackform operations.
#[derive(Debug, Error)]
pub enum StackformError {
    /// Remote CloudFormation API errors.
    #[error("CloudFormation error: {0}")]
    Cloud(#[from] CloudError),

    /// Template loading and parsing errors.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// A single stack operation failed.
    #[error("unable to {action} stack, {stack_name}: {source}")]
    Operation {
        /// The operation that failed (create, update, delete, upsert).
        action: String,
        /// Name of the stack the operation targeted.
        stack_name: String,
        /// The underlying API error.
        source: CloudError,
    },

    /// Waiting for a long-running operation to complete failed.
    #[error("failed while waiting for {action} to finish for stack, {stack_name}: {source}")]
    Wait {
        /// The operation being awaited.
        action: String,
        /// Name of the stack being awaited.
        stack_name: String,
        /// The underlying API error.
        source: CloudError,
    },

    /// Listing a paginated collection failed.
    #[error("failed to list {what}: {source}")]
    List {
        /// The collection being listed (stacks, exports).
        what: String,
        /// The underlying API error.
        source: CloudError,
    },

    /// A batch apply aborted on its first failing change.
    #[error("failed to apply changes: {0}")]
    Apply(#[source] Box<StackformError>),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors returned by the remote stack API.
#[derive(Debug, Clone, Error)]
pub enum CloudError {
    /// The API rejected or failed a request, with a service error code.
    #[error("{code}: {message}")]
    Api {
        /// Service error code (e.g. `ValidationError`).
        code: String,
        /// Error message from the service.
        message: String,
    },

    /// A resource did not reach the awaited state (waiter failure state
    /// or exhausted wait budget).
    #[error("resource not ready: {message}")]
    ResourceNotReady {
        /// Description of the waiter outcome.
        message: String,
    },

    /// The request was cancelled before completion.
    #[error("request cancelled")]
    Cancelled,

    /// Transport-level failure talking to the service.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The service returned a response the client could not use.
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// Description of the response problem.
        message: String,
    },
}

/// Template loading and parsing errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A template file could not be read.
    #[error("unable to read template, {path}: {source}")]
    Read {
        /// Path to the unreadable template.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// A template directory could not be traversed.
    #[error("unable to read dir, {path}: {source}")]
    ReadDir {
        /// Path to the unreadable directory.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// A template body could not be parsed.
    #[error("unable to parse template for stack, {stack_name}: {message}")]
    Parse {
        /// Name of the stack whose template failed to parse.
        stack_name: String,
        /// Description of the parse failure.
        message: String,
    },
}

/// Result type alias for stackform operations.
pub type Result<T> = std::result::Result<T, StackformError>;

/// Service error code for CloudFormation validation failures.
const VALIDATION_ERROR: &str = "ValidationError";

impl CloudError {
    /// Creates an API error with the given code and message.
    #[must_use]
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error with the given message.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a validation error, as CloudFormation would report it.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::api(VALIDATION_ERROR, message)
    }

    /// Returns true if this is a CloudFormation validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == VALIDATION_ERROR)
    }

    /// Returns true if the service reported that an update had nothing
    /// to change.
    #[must_use]
    pub fn is_no_updates_required(&self) -> bool {
        match self {
            Self::Api { code, message } => {
                code == VALIDATION_ERROR && message.contains("No updates are to be performed.")
            }
            _ => false,
        }
    }

    /// Returns true if the service reported that the stack does not exist.
    #[must_use]
    pub fn is_does_not_exist(&self) -> bool {
        match self {
            Self::Api { code, message } => {
                code == VALIDATION_ERROR && message.contains("does not exist")
            }
            _ => false,
        }
    }

    /// Returns true if a waiter gave up before the resource settled.
    #[must_use]
    pub const fn is_resource_not_ready(&self) -> bool {
        matches!(self, Self::ResourceNotReady { .. })
    }

    /// Returns true if the request was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl StackformError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps an API error with the operation and stack name that failed.
    #[must_use]
    pub fn operation(
        action: impl Into<String>,
        stack_name: impl Into<String>,
        source: CloudError,
    ) -> Self {
        Self::Operation {
            action: action.into(),
            stack_name: stack_name.into(),
            source,
        }
    }

    /// Wraps an API error produced while awaiting operation completion.
    #[must_use]
    pub fn wait(
        action: impl Into<String>,
        stack_name: impl Into<String>,
        source: CloudError,
    ) -> Self {
        Self::Wait {
            action: action.into(),
            stack_name: stack_name.into(),
            source,
        }
    }

    /// Wraps an API error produced while listing a collection.
    #[must_use]
    pub fn list(what: impl Into<String>, source: CloudError) -> Self {
        Self::List {
            what: what.into(),
            source,
        }
    }

    /// Wraps an error that aborted a batch apply.
    #[must_use]
    pub fn apply(source: Self) -> Self {
        Self::Apply(Box::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_updates_required_detection() {
        let err = CloudError::validation("No updates are to be performed.");
        assert!(err.is_validation());
        assert!(err.is_no_updates_required());
        assert!(!err.is_does_not_exist());
    }

    #[test]
    fn test_does_not_exist_detection() {
        let err = CloudError::validation("Stack with id app-web does not exist");
        assert!(err.is_does_not_exist());
        assert!(!err.is_no_updates_required());
    }

    #[test]
    fn test_other_codes_are_not_validation() {
        let err = CloudError::api("Throttling", "Rate exceeded");
        assert!(!err.is_validation());
        assert!(!err.is_does_not_exist());
    }

    #[test]
    fn test_operation_wrapping_names_the_stack() {
        let err = StackformError::operation(
            "create",
            "app-web",
            CloudError::api("AlreadyExistsException", "Stack exists"),
        );
        let text = err.to_string();
        assert!(text.contains("create"));
        assert!(text.contains("app-web"));
    }
}
