//! AWS CloudFormation implementation of [`StackApi`].
//!
//! All SDK type, error, and timestamp conversion happens here; nothing
//! outside this module names an SDK type.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_cloudformation::client::Waiters;
use aws_sdk_cloudformation::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudformation::types::{
    Capability, Parameter as AwsParameter, StackEvent as AwsStackEvent,
    StackSummary as AwsStackSummary, Tag as AwsTag,
};
use aws_sdk_cloudformation::Client;
use aws_smithy_runtime_api::client::waiters::error::WaiterError;
use chrono::{DateTime, Utc};
use tracing::trace;

use crate::error::CloudError;

use super::api::{CloudResult, Page, StackApi};
use super::types::{Export, Parameter, ResourceStatus, StackEvent, StackStatus, StackSummary, Tag};

/// CloudFormation-backed stack API.
#[derive(Debug, Clone)]
pub struct AwsCloudFormation {
    /// CloudFormation SDK client.
    client: Client,
    /// Wait budget handed to SDK waiters.
    wait_timeout: Duration,
}

impl AwsCloudFormation {
    /// Creates an adapter over an already-configured SDK client.
    #[must_use]
    pub const fn new(client: Client, wait_timeout: Duration) -> Self {
        Self {
            client,
            wait_timeout,
        }
    }

    /// Creates an adapter from ambient AWS configuration (environment,
    /// shared config files, instance metadata).
    pub async fn from_env(wait_timeout: Duration) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), wait_timeout)
    }
}

#[async_trait]
impl StackApi for AwsCloudFormation {
    async fn create_stack(
        &self,
        name: &str,
        template_body: &str,
        parameters: &[Parameter],
        tags: &[Tag],
    ) -> CloudResult<()> {
        trace!("create_stack: {name}");

        self.client
            .create_stack()
            .stack_name(name)
            .template_body(template_body)
            .set_parameters(to_aws_parameters(parameters))
            .set_tags(to_aws_tags(tags))
            .capabilities(Capability::CapabilityIam)
            .capabilities(Capability::CapabilityNamedIam)
            .send()
            .await
            .map_err(api_error)?;

        Ok(())
    }

    async fn update_stack(
        &self,
        name: &str,
        template_body: &str,
        parameters: &[Parameter],
        tags: &[Tag],
    ) -> CloudResult<()> {
        trace!("update_stack: {name}");

        self.client
            .update_stack()
            .stack_name(name)
            .template_body(template_body)
            .set_parameters(to_aws_parameters(parameters))
            .set_tags(to_aws_tags(tags))
            .capabilities(Capability::CapabilityIam)
            .capabilities(Capability::CapabilityNamedIam)
            .send()
            .await
            .map_err(api_error)?;

        Ok(())
    }

    async fn delete_stack(&self, name: &str) -> CloudResult<()> {
        trace!("delete_stack: {name}");

        self.client
            .delete_stack()
            .stack_name(name)
            .send()
            .await
            .map_err(api_error)?;

        Ok(())
    }

    async fn get_template(&self, name: &str) -> CloudResult<String> {
        let resp = self
            .client
            .get_template()
            .stack_name(name)
            .send()
            .await
            .map_err(api_error)?;

        resp.template_body()
            .map(ToString::to_string)
            .ok_or_else(|| CloudError::InvalidResponse {
                message: format!("no template body returned for stack, {name}"),
            })
    }

    async fn list_stacks(&self, next_token: Option<&str>) -> CloudResult<Page<StackSummary>> {
        let resp = self
            .client
            .list_stacks()
            .set_next_token(next_token.map(ToString::to_string))
            .send()
            .await
            .map_err(api_error)?;

        let summaries = resp.stack_summaries().iter().map(to_summary).collect();
        Ok((summaries, resp.next_token().map(ToString::to_string)))
    }

    async fn list_exports(&self, next_token: Option<&str>) -> CloudResult<Page<Export>> {
        let resp = self
            .client
            .list_exports()
            .set_next_token(next_token.map(ToString::to_string))
            .send()
            .await
            .map_err(api_error)?;

        let exports = resp
            .exports()
            .iter()
            .map(|e| Export {
                name: e.name().unwrap_or_default().to_string(),
                value: e.value().unwrap_or_default().to_string(),
                exporting_stack_id: e.exporting_stack_id().map(ToString::to_string),
            })
            .collect();

        Ok((exports, resp.next_token().map(ToString::to_string)))
    }

    async fn describe_stack_events(
        &self,
        stack_name: &str,
        next_token: Option<&str>,
    ) -> CloudResult<Page<StackEvent>> {
        let resp = self
            .client
            .describe_stack_events()
            .stack_name(stack_name)
            .set_next_token(next_token.map(ToString::to_string))
            .send()
            .await
            .map_err(api_error)?;

        let events = resp.stack_events().iter().map(to_event).collect();
        Ok((events, resp.next_token().map(ToString::to_string)))
    }

    async fn wait_until_create_complete(&self, stack_name: &str) -> CloudResult<()> {
        self.client
            .wait_until_stack_create_complete()
            .stack_name(stack_name)
            .wait(self.wait_timeout)
            .await
            .map(|_| ())
            .map_err(|err| waiter_error("create", stack_name, &err))
    }

    async fn wait_until_update_complete(&self, stack_name: &str) -> CloudResult<()> {
        self.client
            .wait_until_stack_update_complete()
            .stack_name(stack_name)
            .wait(self.wait_timeout)
            .await
            .map(|_| ())
            .map_err(|err| waiter_error("update", stack_name, &err))
    }

    async fn wait_until_delete_complete(&self, stack_name: &str) -> CloudResult<()> {
        self.client
            .wait_until_stack_delete_complete()
            .stack_name(stack_name)
            .wait(self.wait_timeout)
            .await
            .map(|_| ())
            .map_err(|err| waiter_error("delete", stack_name, &err))
    }
}

/// Converts domain parameters to SDK parameters; `None` when empty.
fn to_aws_parameters(parameters: &[Parameter]) -> Option<Vec<AwsParameter>> {
    if parameters.is_empty() {
        return None;
    }

    Some(
        parameters
            .iter()
            .map(|p| {
                AwsParameter::builder()
                    .parameter_key(&p.key)
                    .parameter_value(&p.value)
                    .build()
            })
            .collect(),
    )
}

/// Converts domain tags to SDK tags; `None` when empty.
fn to_aws_tags(tags: &[Tag]) -> Option<Vec<AwsTag>> {
    if tags.is_empty() {
        return None;
    }

    Some(
        tags.iter()
            .map(|t| AwsTag::builder().key(&t.key).value(&t.value).build())
            .collect(),
    )
}

/// Converts an SDK stack summary to the domain type.
fn to_summary(summary: &AwsStackSummary) -> StackSummary {
    StackSummary {
        name: summary.stack_name().unwrap_or_default().to_string(),
        status: summary
            .stack_status()
            .map_or_else(|| StackStatus::Other(String::new()), |s| {
                StackStatus::from_wire(s.as_str())
            }),
    }
}

/// Converts an SDK stack event to the domain type.
fn to_event(event: &AwsStackEvent) -> StackEvent {
    StackEvent {
        id: event.event_id().unwrap_or_default().to_string(),
        timestamp: to_timestamp(event.timestamp()),
        logical_resource_id: event.logical_resource_id().unwrap_or_default().to_string(),
        resource_type: event.resource_type().unwrap_or_default().to_string(),
        status: event
            .resource_status()
            .map_or_else(|| ResourceStatus::Other(String::new()), |s| {
                ResourceStatus::from_wire(s.as_str())
            }),
        reason: event.resource_status_reason().map(ToString::to_string),
    }
}

/// Converts an SDK timestamp to UTC; a missing or unrepresentable
/// timestamp falls back to now.
fn to_timestamp(dt: Option<&AwsDateTime>) -> DateTime<Utc> {
    dt.and_then(|d| DateTime::from_timestamp(d.secs(), d.subsec_nanos()))
        .unwrap_or_else(Utc::now)
}

/// Maps an SDK operation error to a [`CloudError`], keeping the service
/// error code when one is present.
fn api_error<E>(err: SdkError<E>) -> CloudError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    match err.code() {
        Some(code) => {
            let code = code.to_string();
            let message = err.message().unwrap_or_default().to_string();
            CloudError::Api { code, message }
        }
        None => CloudError::transport(format!("{err:?}")),
    }
}

/// Maps a waiter outcome to a [`CloudError`]. A failure state or an
/// exhausted wait budget becomes `ResourceNotReady`, which delete
/// treats as already-gone.
fn waiter_error<O, E>(action: &str, stack_name: &str, err: &WaiterError<O, E>) -> CloudError {
    match err {
        WaiterError::ExceededMaxWait(_) | WaiterError::FailureState(_) => {
            CloudError::ResourceNotReady {
                message: format!(
                    "stack {stack_name} did not reach {action} complete before the waiter gave up"
                ),
            }
        }
        _ => CloudError::transport(format!(
            "waiter for {action} failed for stack, {stack_name}"
        )),
    }
}
