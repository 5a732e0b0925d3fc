//! In-memory [`StackApi`] fake for engine tests.
//!
//! Calls are recorded as strings, mutating calls can be scripted to fail,
//! and paginated calls pop pre-loaded pages. An exhausted page queue yields
//! an empty final page so pagination loops terminate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CloudError;

use super::api::{CloudResult, Page, StackApi};
use super::types::{Export, Parameter, StackEvent, StackSummary, Tag};

/// Recording fake for the remote stack API.
#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    /// Recorded calls, e.g. `"create app-web"`.
    pub calls: Mutex<Vec<String>>,
    /// Error returned by `create_stack`, if any.
    pub create_error: Mutex<Option<CloudError>>,
    /// Error returned by `update_stack`, if any.
    pub update_error: Mutex<Option<CloudError>>,
    /// Error returned by `delete_stack`, if any.
    pub delete_error: Mutex<Option<CloudError>>,
    /// Result returned by `get_template`.
    pub template: Mutex<Option<CloudResult<String>>>,
    /// Pages returned by successive `list_stacks` calls.
    pub stack_pages: Mutex<VecDeque<Page<StackSummary>>>,
    /// Error returned by `list_stacks`, if any.
    pub list_stacks_error: Mutex<Option<CloudError>>,
    /// Pages returned by successive `list_exports` calls.
    pub export_pages: Mutex<VecDeque<Page<Export>>>,
    /// Error returned by `list_exports`, if any.
    pub list_exports_error: Mutex<Option<CloudError>>,
    /// Results returned by successive `describe_stack_events` calls.
    pub event_pages: Mutex<VecDeque<CloudResult<Page<StackEvent>>>>,
    /// Error returned by `wait_until_create_complete`, if any.
    pub wait_create_error: Mutex<Option<CloudError>>,
    /// Error returned by `wait_until_update_complete`, if any.
    pub wait_update_error: Mutex<Option<CloudError>>,
    /// Error returned by `wait_until_delete_complete`, if any.
    pub wait_delete_error: Mutex<Option<CloudError>>,
    /// How long `wait_until_*` sleeps before resolving.
    pub wait_delay: Duration,
}

impl FakeApi {
    /// Returns the recorded call log.
    pub fn recorded(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the recorded calls with the given prefix.
    pub fn recorded_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn scripted_error(&self, slot: &Mutex<Option<CloudError>>) -> CloudResult<()> {
        match slot.lock().unwrap().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StackApi for FakeApi {
    async fn create_stack(
        &self,
        name: &str,
        _template_body: &str,
        _parameters: &[Parameter],
        _tags: &[Tag],
    ) -> CloudResult<()> {
        self.record(format!("create {name}"));
        self.scripted_error(&self.create_error)
    }

    async fn update_stack(
        &self,
        name: &str,
        _template_body: &str,
        _parameters: &[Parameter],
        _tags: &[Tag],
    ) -> CloudResult<()> {
        self.record(format!("update {name}"));
        self.scripted_error(&self.update_error)
    }

    async fn delete_stack(&self, name: &str) -> CloudResult<()> {
        self.record(format!("delete {name}"));
        self.scripted_error(&self.delete_error)
    }

    async fn get_template(&self, name: &str) -> CloudResult<String> {
        self.record(format!("get_template {name}"));
        self.template
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn list_stacks(&self, _next_token: Option<&str>) -> CloudResult<Page<StackSummary>> {
        self.record("list_stacks");
        self.scripted_error(&self.list_stacks_error)?;
        Ok(self
            .stack_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((Vec::new(), None)))
    }

    async fn list_exports(&self, _next_token: Option<&str>) -> CloudResult<Page<Export>> {
        self.record("list_exports");
        self.scripted_error(&self.list_exports_error)?;
        Ok(self
            .export_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((Vec::new(), None)))
    }

    async fn describe_stack_events(
        &self,
        stack_name: &str,
        _next_token: Option<&str>,
    ) -> CloudResult<Page<StackEvent>> {
        self.record(format!("describe_events {stack_name}"));
        self.event_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok((Vec::new(), None)))
    }

    async fn wait_until_create_complete(&self, stack_name: &str) -> CloudResult<()> {
        self.record(format!("wait_create {stack_name}"));
        tokio::time::sleep(self.wait_delay).await;
        self.scripted_error(&self.wait_create_error)
    }

    async fn wait_until_update_complete(&self, stack_name: &str) -> CloudResult<()> {
        self.record(format!("wait_update {stack_name}"));
        tokio::time::sleep(self.wait_delay).await;
        self.scripted_error(&self.wait_update_error)
    }

    async fn wait_until_delete_complete(&self, stack_name: &str) -> CloudResult<()> {
        self.record(format!("wait_delete {stack_name}"));
        tokio::time::sleep(self.wait_delay).await;
        self.scripted_error(&self.wait_delete_error)
    }
}
