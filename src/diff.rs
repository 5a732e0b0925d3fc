//! Change calculation between desired and observed stack sets.
//!
//! Pure set-difference by stack name. Ordering is load-bearing: inserts
//! and updates keep desired-list order, deletes are appended afterwards in
//! observed-list order, and the manager later walks deletes in reverse.

use tracing::debug;

use crate::cloud::StackSummary;
use crate::stack::{Change, Operation, Stack};

/// Computes the changes needed to converge observed state to desired state.
///
/// Observed summaries in a deleted status are logically absent and dropped
/// before diffing. Name comparison is exact; the caller guarantees desired
/// names are unique within the pass.
#[must_use]
pub fn calculate_changes(observed: &[StackSummary], desired: &[Stack]) -> Vec<Change> {
    let live: Vec<&StackSummary> = observed.iter().filter(|s| !s.status.is_deleted()).collect();

    let mut changes = Vec::new();

    for want in desired {
        let operation = if live.iter().any(|got| got.name == want.name) {
            Operation::Update
        } else {
            Operation::Insert
        };
        changes.push(Change {
            operation,
            stack: want.clone(),
        });
    }

    for got in &live {
        if !desired.iter().any(|want| want.name == got.name) {
            changes.push(Change {
                operation: Operation::Delete,
                stack: Stack::named(&got.name),
            });
        }
    }

    debug!(
        "calculated {} changes from {} desired and {} observed stacks",
        changes.len(),
        desired.len(),
        observed.len()
    );

    changes
}
