//! Remote stack API: domain types, capability trait, and the AWS adapter.

pub mod api;
pub mod aws;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use api::{CloudResult, Page, StackApi};
pub use aws::AwsCloudFormation;
pub use types::{Export, Parameter, ResourceStatus, StackEvent, StackStatus, StackSummary, Tag};
