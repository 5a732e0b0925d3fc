//! Live event observation for in-flight stack operations.
//!
//! [`observe_events`] polls a stack's event stream on a fixed tick,
//! deduplicates by event id, prints fresh events oldest-first, and resolves
//! once the stack itself reports a terminal status. The manager races this
//! future against the remote wait-until-complete call; whichever side
//! finishes first drops the other.

use std::collections::HashSet;

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use tokio::time::{self, MissedTickBehavior};

use crate::cloud::{ResourceStatus, StackApi, StackEvent};
use crate::error::CloudError;

/// Fixed polling interval for the event stream.
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(6);

/// Backoff after a transient fetch failure.
const ERROR_BACKOFF: std::time::Duration = std::time::Duration::from_secs(12);

/// How far before startup events are still announced. Events older than
/// this belong to an earlier operation.
const LOOKBACK_SECS: i64 = 12;

/// Observes the event stream of one stack until it reaches a terminal
/// status.
///
/// Completion is only honored from the second tick onward, so a terminal
/// event left over from a previous operation does not end observation
/// before the current operation has produced any events.
///
/// The future has no output: it resolves when a terminal stack event is
/// seen and is cancelled by being dropped.
pub async fn observe_events<A>(api: &A, stack_name: &str)
where
    A: StackApi + ?Sized,
{
    let mut ticker = time::interval_at(time::Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let floor = Utc::now() - chrono::Duration::seconds(LOOKBACK_SECS);
    let mut seen: HashSet<String> = HashSet::new();
    let mut iteration: u64 = 0;

    'tick: loop {
        ticker.tick().await;

        let mut token: Option<String> = None;
        loop {
            let page = match api.describe_stack_events(stack_name, token.as_deref()).await {
                Ok(page) => page,
                Err(err) => {
                    if is_error_shown(&err) {
                        println!("describe stack events failed for stack, {stack_name} - {err}");
                    }
                    time::sleep(ERROR_BACKOFF).await;
                    iteration += 1;
                    continue 'tick;
                }
            };

            let (events, next) = page;
            let fresh = collect_fresh(events, &mut seen, floor);

            // Accumulated newest-first; print oldest-first.
            for event in fresh.iter().rev() {
                print_event(event);

                if iteration > 0 && is_complete(stack_name, event) {
                    return;
                }
            }

            match next {
                Some(t) => token = Some(t),
                None => break,
            }
        }

        iteration += 1;
    }
}

/// Filters one newest-first page down to unseen events at or after the
/// time floor, recording their ids.
///
/// Scanning stops at the first event older than the floor; the stream is
/// chronologically ordered, so everything after it is older still.
fn collect_fresh(
    events: Vec<StackEvent>,
    seen: &mut HashSet<String>,
    floor: DateTime<Utc>,
) -> Vec<StackEvent> {
    let mut fresh = Vec::new();

    for event in events {
        if event.timestamp < floor {
            break;
        }
        if !seen.insert(event.id.clone()) {
            continue;
        }
        fresh.push(event);
    }

    fresh
}

/// Returns true if the event marks the stack itself as settled.
fn is_complete(stack_name: &str, event: &StackEvent) -> bool {
    event.logical_resource_id == stack_name && event.status.is_terminal()
}

/// Display severity of an event, classified by status substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    /// Failures and deletions.
    Error,
    /// Updates.
    Warn,
    /// Creations.
    Info,
    /// Everything else.
    Neutral,
}

/// Classifies a resource status for display.
fn classify(status: &ResourceStatus) -> Severity {
    let status = status.as_str();
    if status.contains("FAILED") || status.contains("DELETE") {
        Severity::Error
    } else if status.contains("UPDATE") {
        Severity::Warn
    } else if status.contains("CREATE") {
        Severity::Info
    } else {
        Severity::Neutral
    }
}

/// Prints one event line, colored by severity.
fn print_event(event: &StackEvent) {
    let text = format!(
        "{} {:<25} {:<35} {:<35} {}",
        event
            .timestamp
            .with_timezone(&Local)
            .format("%Y/%m/%d %H:%M:%S"),
        event.logical_resource_id,
        event.resource_type,
        event.status,
        event.reason.as_deref().unwrap_or_default(),
    );

    let line = match classify(&event.status) {
        Severity::Error => text.red(),
        Severity::Warn => text.yellow(),
        Severity::Info => text.green(),
        Severity::Neutral => text.blue(),
    };

    println!("{line}");
}

/// Returns true if a fetch error is worth announcing. Cancellations and
/// validation errors are expected noise: a stack has no event stream until
/// its create call has registered.
fn is_error_shown(err: &CloudError) -> bool {
    !(err.is_cancelled() || err.is_validation())
}
