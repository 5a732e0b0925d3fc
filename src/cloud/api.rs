//! The capability trait the reconciliation engine consumes.
//!
//! The engine talks to exactly this surface; the AWS adapter lives in
//! [`super::aws`] and tests substitute an in-memory fake.

use async_trait::async_trait;

use crate::error::CloudError;

use super::types::{Export, Parameter, StackEvent, StackSummary, Tag};

/// Result type for remote API calls.
pub type CloudResult<T> = std::result::Result<T, CloudError>;

/// One page of results plus the continuation token for the next page.
pub type Page<T> = (Vec<T>, Option<String>);

/// Remote stack API capabilities consumed by the engine.
///
/// Paginated operations take the previous continuation token and return a
/// [`Page`]; callers loop until the token comes back `None`. The
/// `wait_until_*` operations are long-poll primitives that block until the
/// named stack settles or the wait budget is exhausted.
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Starts creating a stack.
    async fn create_stack(
        &self,
        name: &str,
        template_body: &str,
        parameters: &[Parameter],
        tags: &[Tag],
    ) -> CloudResult<()>;

    /// Starts updating a stack.
    async fn update_stack(
        &self,
        name: &str,
        template_body: &str,
        parameters: &[Parameter],
        tags: &[Tag],
    ) -> CloudResult<()>;

    /// Starts deleting a stack.
    async fn delete_stack(&self, name: &str) -> CloudResult<()>;

    /// Fetches the currently deployed template body for a stack.
    async fn get_template(&self, name: &str) -> CloudResult<String>;

    /// Lists one page of stack summaries.
    async fn list_stacks(&self, next_token: Option<&str>) -> CloudResult<Page<StackSummary>>;

    /// Lists one page of exports.
    async fn list_exports(&self, next_token: Option<&str>) -> CloudResult<Page<Export>>;

    /// Lists one page of a stack's event stream, newest first.
    async fn describe_stack_events(
        &self,
        stack_name: &str,
        next_token: Option<&str>,
    ) -> CloudResult<Page<StackEvent>>;

    /// Blocks until stack creation completes.
    async fn wait_until_create_complete(&self, stack_name: &str) -> CloudResult<()>;

    /// Blocks until stack update completes.
    async fn wait_until_update_complete(&self, stack_name: &str) -> CloudResult<()>;

    /// Blocks until stack deletion completes.
    async fn wait_until_delete_complete(&self, stack_name: &str) -> CloudResult<()>;
}
