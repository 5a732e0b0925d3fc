// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Additional strictness - Leave nothing unchecked
#![warn(missing_docs)]                // Public items should be documented
#![warn(unused_imports)]              // Unused imports are flagged
#![warn(unused_must_use)]             // Must handle Result and Option explicitly

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Stackform
//!
//! A declarative, idempotent, and reconcilable deployment engine for
//! CloudFormation stacks.
//!
//! ## Overview
//!
//! Stackform treats a directory of CloudFormation templates as the desired
//! state of an environment and converges the deployed stacks toward it:
//!
//! - Load stack definitions from `*.template` files
//! - Diff desired stacks against deployed stack summaries
//! - Apply ordered create, update, and delete changes
//! - Stream stack events to the console while operations run
//!
//! ## Architecture
//!
//! The system is built around **desired state reconciliation**:
//!
//! 1. **Desired State**: Templates loaded from a directory
//! 2. **Observed State**: Stack summaries queried from the remote API
//! 3. **Manager**: Compares states and executes the resulting changes
//!
//! Applying is sequential and convergent: on failure the run aborts
//! without rollback, and re-running picks up where it stopped.
//!
//! ## Modules
//!
//! - [`stack`]: Stack definitions, template loading, and changes
//! - [`diff`]: Change calculation between observed and desired state
//! - [`manager`]: Reconciliation engine
//! - [`observer`]: Live stack event streaming
//! - [`cloud`]: Remote stack API trait and its `CloudFormation` binding
//! - [`options`]: Reconciliation options
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```no_run
//! use stackform::{calculate_changes, AwsCloudFormation, Manager, Options};
//!
//! # async fn deploy() -> stackform::Result<()> {
//! let options = Options::builder().prefix("prod").build();
//! let api = AwsCloudFormation::from_env(options.wait_timeout()).await;
//! let manager = Manager::new(api, options);
//!
//! let desired = stackform::load_all("templates", manager.options())?;
//! let observed = manager.list().await?;
//!
//! let changes = calculate_changes(&observed, &desired);
//! manager.apply(&changes).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod cloud;
pub mod diff;
pub mod error;
pub mod manager;
pub mod observer;
pub mod options;
pub mod stack;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands};
pub use cloud::{
    AwsCloudFormation, Export, Parameter, ResourceStatus, StackApi, StackEvent, StackStatus,
    StackSummary, Tag,
};
pub use diff::calculate_changes;
pub use error::{CloudError, Result, StackformError, TemplateError};
pub use manager::Manager;
pub use observer::observe_events;
pub use options::{Options, OptionsBuilder, DEFAULT_WAIT_TIMEOUT};
pub use stack::{load_all, Change, Operation, Stack};
