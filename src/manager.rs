//! Reconciliation manager for stack operations.
//!
//! The manager drives a batch of changes to completion against the remote
//! stack API. Every mutating operation is a long-running remote operation:
//! the manager issues the call, then races an event observer against the
//! remote wait-until-complete primitive. Observer-detected completion
//! unblocks the operation early; either way the losing future is dropped.
//!
//! Apply is deliberately sequential. Deletes run first, in reverse list
//! order, then inserts and updates in list order, so teardown approximates
//! dependency safety and the observer output stays readable.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::info;

use crate::cloud::{Export, Parameter, StackApi, StackSummary, Tag};
use crate::error::{Result, StackformError, TemplateError};
use crate::observer::observe_events;
use crate::options::Options;
use crate::stack::{Change, Operation, Stack};

/// Orchestrates create, update, delete, and upsert operations.
#[derive(Debug)]
pub struct Manager<A> {
    /// Remote stack API handle.
    api: A,
    /// Reconciliation options.
    options: Options,
}

impl<A: StackApi> Manager<A> {
    /// Creates a manager over the given API handle and options.
    #[must_use]
    pub const fn new(api: A, options: Options) -> Self {
        Self { api, options }
    }

    /// Returns the configured options.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Applies a batch of changes: deletes first in reverse list order,
    /// then inserts and updates in list order.
    ///
    /// Aborts on the first failing operation. Already-applied changes are
    /// not rolled back; re-running reconciliation converges, since
    /// completed changes no longer diff as pending.
    ///
    /// # Errors
    ///
    /// Returns the first operation failure, wrapped with the failing
    /// stack's name.
    pub async fn apply(&self, changes: &[Change]) -> Result<()> {
        let begin = Instant::now();
        let result = self.apply_changes(changes).await;

        // The summary line is emitted whether the batch succeeded or
        // aborted partway through.
        match &result {
            Ok(()) => info!("applied {} changes ({:?})", changes.len(), begin.elapsed()),
            Err(err) => info!(
                "applied {} changes ({:?}): {err}",
                changes.len(),
                begin.elapsed()
            ),
        }

        result
    }

    async fn apply_changes(&self, changes: &[Change]) -> Result<()> {
        for change in changes.iter().rev() {
            if change.operation != Operation::Delete {
                continue;
            }
            self.delete(&change.stack.name)
                .await
                .map_err(StackformError::apply)?;
        }

        for change in changes {
            match change.operation {
                Operation::Insert => self
                    .create(&change.stack)
                    .await
                    .map_err(StackformError::apply)?,
                Operation::Update => self
                    .update(&change.stack)
                    .await
                    .map_err(StackformError::apply)?,
                Operation::Delete => {}
            }
        }

        Ok(())
    }

    /// Creates a stack and blocks until the operation settles.
    ///
    /// # Errors
    ///
    /// Returns an error if the create call or the completion wait fails.
    pub async fn create(&self, stack: &Stack) -> Result<()> {
        if self.options.dry_run() {
            info!("dry run: create not applied for stack, {}", stack.name);
            return Ok(());
        }

        let begin = Instant::now();
        let parameters =
            select_parameters(&stack.template_body, self.options.parameters(), &stack.name)?;
        let tags = self.merged_tags(stack);

        self.api
            .create_stack(&stack.name, &stack.template_body, &parameters, &tags)
            .await
            .map_err(|source| StackformError::operation("create", &stack.name, source))?;

        tokio::select! {
            () = observe_events(&self.api, &stack.name) => {}
            result = self.api.wait_until_create_complete(&stack.name) => {
                result.map_err(|source| StackformError::wait("create", &stack.name, source))?;
            }
        }

        info!("created stack, {} ({:?})", stack.name, begin.elapsed());
        Ok(())
    }

    /// Updates a stack and blocks until the operation settles.
    ///
    /// An update the service reports as having nothing to change is a
    /// no-op success.
    ///
    /// # Errors
    ///
    /// Returns an error if the update call or the completion wait fails.
    pub async fn update(&self, stack: &Stack) -> Result<()> {
        if self.options.dry_run() {
            info!("dry run: update not applied for stack, {}", stack.name);
            return Ok(());
        }

        let begin = Instant::now();
        let parameters =
            select_parameters(&stack.template_body, self.options.parameters(), &stack.name)?;
        let tags = self.merged_tags(stack);

        if let Err(source) = self
            .api
            .update_stack(&stack.name, &stack.template_body, &parameters, &tags)
            .await
        {
            if source.is_no_updates_required() {
                info!("skipping update: no updates required for stack, {}", stack.name);
                return Ok(());
            }
            return Err(StackformError::operation("update", &stack.name, source));
        }

        tokio::select! {
            () = observe_events(&self.api, &stack.name) => {}
            result = self.api.wait_until_update_complete(&stack.name) => {
                result.map_err(|source| StackformError::wait("update", &stack.name, source))?;
            }
        }

        info!("updated stack, {} ({:?})", stack.name, begin.elapsed());
        Ok(())
    }

    /// Deletes a stack and blocks until the operation settles.
    ///
    /// A resource-not-ready outcome from the completion wait is success:
    /// the stack was already gone or removed concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete call or the completion wait fails.
    pub async fn delete(&self, stack_name: &str) -> Result<()> {
        if self.options.dry_run() {
            info!("dry run: delete not applied for stack, {stack_name}");
            return Ok(());
        }

        let begin = Instant::now();

        self.api
            .delete_stack(stack_name)
            .await
            .map_err(|source| StackformError::operation("delete", stack_name, source))?;

        tokio::select! {
            () = observe_events(&self.api, stack_name) => {}
            result = self.api.wait_until_delete_complete(stack_name) => {
                if let Err(source) = result {
                    if !source.is_resource_not_ready() {
                        return Err(StackformError::wait("delete", stack_name, source));
                    }
                }
            }
        }

        info!("deleted stack, {stack_name} ({:?})", begin.elapsed());
        Ok(())
    }

    /// Creates the stack if absent, updates it only if its template
    /// differs from the deployed one.
    ///
    /// Template comparison is format-aware: both bodies are parsed and
    /// deep-compared, so formatting and key order do not count as drift.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fetch, parse, or the delegated
    /// operation fails.
    pub async fn upsert(&self, stack: &Stack) -> Result<()> {
        let current = match self.api.get_template(&stack.name).await {
            Ok(body) => body,
            Err(source) if source.is_does_not_exist() => return self.create(stack).await,
            Err(source) => {
                return Err(StackformError::operation("upsert", &stack.name, source))
            }
        };

        let got = parse_template(&current, &stack.name)?;
        let want = parse_template(&stack.template_body, &stack.name)?;

        if got == want {
            info!("skipping upsert: template unchanged for stack, {}", stack.name);
            return Ok(());
        }

        self.update(stack).await
    }

    /// Lists all deployed stack summaries matching the configured prefix,
    /// paginating to exhaustion. An empty prefix matches everything.
    ///
    /// # Errors
    ///
    /// Returns an error if a list call fails.
    pub async fn list(&self) -> Result<Vec<StackSummary>> {
        let begin = Instant::now();

        let mut summaries = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let (page, next) = self
                .api
                .list_stacks(token.as_deref())
                .await
                .map_err(|source| StackformError::list("stacks", source))?;
            summaries.extend(page.into_iter().filter(|s| self.matches_prefix(&s.name)));

            match next {
                Some(t) => token = Some(t),
                None => break,
            }
        }

        info!(
            "retrieved {} stack summaries (prefix: {:?}, {:?})",
            summaries.len(),
            self.options.prefix(),
            begin.elapsed()
        );

        Ok(summaries)
    }

    /// Lists all exports, paginating to exhaustion, unfiltered.
    ///
    /// # Errors
    ///
    /// Returns an error if a list call fails.
    pub async fn exports(&self) -> Result<Vec<Export>> {
        let mut exports = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let (page, next) = self
                .api
                .list_exports(token.as_deref())
                .await
                .map_err(|source| StackformError::list("exports", source))?;
            exports.extend(page);

            match next {
                Some(t) => token = Some(t),
                None => break,
            }
        }

        Ok(exports)
    }

    /// Returns true if the stack name matches the configured prefix.
    fn matches_prefix(&self, name: &str) -> bool {
        let prefix = self.options.prefix();
        prefix.is_empty() || name.starts_with(prefix)
    }

    /// Merges option tags with stack tags; stack tags win on key clashes.
    fn merged_tags(&self, stack: &Stack) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.options.tags().to_vec();

        for tag in &stack.tags {
            if let Some(existing) = tags.iter_mut().find(|t| t.key == tag.key) {
                existing.value = tag.value.clone();
            } else {
                tags.push(tag.clone());
            }
        }

        tags
    }
}

/// Selects the configured parameter values the template actually declares,
/// in template declaration order.
fn select_parameters(
    template_body: &str,
    available: &BTreeMap<String, String>,
    stack_name: &str,
) -> Result<Vec<Parameter>> {
    if available.is_empty() {
        return Ok(Vec::new());
    }

    let template = parse_template(template_body, stack_name)?;

    let Some(serde_yaml::Value::Mapping(declared)) = template.get("Parameters") else {
        return Ok(Vec::new());
    };

    let mut parameters = Vec::new();
    for key in declared.keys() {
        if let serde_yaml::Value::String(key) = key {
            if let Some(value) = available.get(key) {
                parameters.push(Parameter::new(key.clone(), value.clone()));
            }
        }
    }

    Ok(parameters)
}

/// Parses a template body; CloudFormation templates are YAML or JSON, and
/// YAML parsing covers both.
fn parse_template(body: &str, stack_name: &str) -> Result<serde_yaml::Value> {
    serde_yaml::from_str(body).map_err(|err| {
        StackformError::Template(TemplateError::Parse {
            stack_name: stack_name.to_string(),
            message: err.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::fake::FakeApi;
    use crate::cloud::{ResourceStatus, StackEvent, StackStatus};
    use crate::error::CloudError;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects log output for assertions.
    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl LogCapture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogCapture {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn stack(name: &str, template_body: &str) -> Stack {
        Stack {
            name: name.to_string(),
            tags: Vec::new(),
            template_body: template_body.to_string(),
        }
    }

    fn manager(api: FakeApi, options: Options) -> Manager<FakeApi> {
        Manager::new(api, options)
    }

    fn mutating_calls(api: &FakeApi) -> Vec<String> {
        api.recorded()
            .into_iter()
            .filter(|c| {
                c.starts_with("create") || c.starts_with("update") || c.starts_with("delete ")
            })
            .collect()
    }

    #[tokio::test]
    async fn test_dry_run_suppresses_all_mutating_calls() {
        let m = manager(FakeApi::default(), Options::builder().dry_run(true).build());

        let changes = vec![
            Change {
                operation: Operation::Insert,
                stack: stack("a", "{}"),
            },
            Change {
                operation: Operation::Update,
                stack: stack("b", "{}"),
            },
            Change {
                operation: Operation::Delete,
                stack: Stack::named("c"),
            },
        ];

        m.apply(&changes).await.unwrap();
        assert!(m.api.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_create_issues_call_then_waits() {
        let m = manager(FakeApi::default(), Options::default());
        m.create(&stack("app-web", "{}")).await.unwrap();

        let calls = m.api.recorded();
        assert!(calls.contains(&String::from("create app-web")));
        assert!(calls.contains(&String::from("wait_create app-web")));
    }

    #[tokio::test]
    async fn test_create_error_is_wrapped_with_stack_name() {
        let api = FakeApi::default();
        *api.create_error.lock().unwrap() =
            Some(CloudError::api("AlreadyExistsException", "Stack exists"));
        let m = manager(api, Options::default());

        let err = m.create(&stack("app-web", "{}")).await.unwrap_err();
        assert!(err.to_string().contains("app-web"));
        assert!(m.api.recorded_with_prefix("wait_create").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_unblocks_when_observer_sees_completion() {
        let api = FakeApi {
            wait_delay: Duration::from_secs(3600),
            ..FakeApi::default()
        };
        {
            let mut pages = api.event_pages.lock().unwrap();
            pages.push_back(Ok((vec![], None)));
            pages.push_back(Ok((
                vec![StackEvent {
                    id: String::from("e1"),
                    timestamp: Utc::now(),
                    logical_resource_id: String::from("app-web"),
                    resource_type: String::from("AWS::CloudFormation::Stack"),
                    status: ResourceStatus::CreateComplete,
                    reason: None,
                }],
                None,
            )));
        }
        let m = manager(api, Options::default());

        // The waiter would block for an hour; the observer ends the wait.
        m.create(&stack("app-web", "{}")).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_no_changes_is_success() {
        let api = FakeApi::default();
        *api.update_error.lock().unwrap() =
            Some(CloudError::validation("No updates are to be performed."));
        let m = manager(api, Options::default());

        m.update(&stack("app-web", "{}")).await.unwrap();
        assert!(m.api.recorded_with_prefix("wait_update").is_empty());
    }

    #[tokio::test]
    async fn test_delete_tolerates_resource_not_ready() {
        let api = FakeApi::default();
        *api.wait_delete_error.lock().unwrap() = Some(CloudError::ResourceNotReady {
            message: String::from("already gone"),
        });
        let m = manager(api, Options::default());

        m.delete("app-web").await.unwrap();
    }

    #[tokio::test]
    async fn test_apply_orders_deletes_first_in_reverse() {
        let m = manager(FakeApi::default(), Options::default());

        let changes = vec![
            Change {
                operation: Operation::Insert,
                stack: stack("a", "{}"),
            },
            Change {
                operation: Operation::Delete,
                stack: Stack::named("c"),
            },
            Change {
                operation: Operation::Update,
                stack: stack("b", "{}"),
            },
            Change {
                operation: Operation::Delete,
                stack: Stack::named("d"),
            },
        ];

        m.apply(&changes).await.unwrap();

        assert_eq!(
            mutating_calls(&m.api),
            vec!["delete d", "delete c", "create a", "update b"]
        );
    }

    #[tokio::test]
    async fn test_apply_aborts_on_first_failure() {
        let api = FakeApi::default();
        *api.delete_error.lock().unwrap() = Some(CloudError::transport("connection reset"));
        let m = manager(api, Options::default());

        let changes = vec![
            Change {
                operation: Operation::Insert,
                stack: stack("a", "{}"),
            },
            Change {
                operation: Operation::Delete,
                stack: Stack::named("c"),
            },
        ];

        let err = m.apply(&changes).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("failed to apply changes"));
        assert!(
            text.contains("delete stack, c"),
            "abort error should name the failing operation and stack: {text}"
        );
        assert!(m.api.recorded_with_prefix("create").is_empty());
    }

    #[tokio::test]
    async fn test_apply_logs_summary_when_aborting() {
        let api = FakeApi::default();
        *api.delete_error.lock().unwrap() = Some(CloudError::transport("connection reset"));
        let m = manager(api, Options::default());

        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let changes = vec![Change {
            operation: Operation::Delete,
            stack: Stack::named("c"),
        }];
        m.apply(&changes).await.unwrap_err();

        let output = capture.contents();
        assert!(
            output.contains("applied 1 changes"),
            "summary line missing from: {output}"
        );
        assert!(output.contains("delete stack, c"));
    }

    #[tokio::test]
    async fn test_list_failure_names_the_collection() {
        let api = FakeApi::default();
        *api.list_stacks_error.lock().unwrap() = Some(CloudError::transport("connection reset"));
        let m = manager(api, Options::default());

        let err = m.list().await.unwrap_err();
        assert!(err.to_string().contains("failed to list stacks"));
    }

    #[tokio::test]
    async fn test_exports_failure_names_the_collection() {
        let api = FakeApi::default();
        *api.list_exports_error.lock().unwrap() = Some(CloudError::transport("connection reset"));
        let m = manager(api, Options::default());

        let err = m.exports().await.unwrap_err();
        assert!(err.to_string().contains("failed to list exports"));
    }

    #[tokio::test]
    async fn test_upsert_creates_missing_stack() {
        let api = FakeApi::default();
        *api.template.lock().unwrap() = Some(Err(CloudError::validation(
            "Stack with id app-web does not exist",
        )));
        let m = manager(api, Options::default());

        m.upsert(&stack("app-web", "Resources: {}")).await.unwrap();
        assert_eq!(mutating_calls(&m.api), vec!["create app-web"]);
    }

    #[tokio::test]
    async fn test_upsert_skips_semantically_equal_templates() {
        let api = FakeApi::default();
        *api.template.lock().unwrap() =
            Some(Ok(String::from("Resources:\n  B: 2\n  A: 1\n")));
        let m = manager(api, Options::default());

        m.upsert(&stack("app-web", "Resources:\n  A: 1\n  B: 2\n"))
            .await
            .unwrap();

        assert!(mutating_calls(&m.api).is_empty());
    }

    #[tokio::test]
    async fn test_upsert_updates_on_template_drift() {
        let api = FakeApi::default();
        *api.template.lock().unwrap() = Some(Ok(String::from("Resources:\n  A: 1\n")));
        let m = manager(api, Options::default());

        m.upsert(&stack("app-web", "Resources:\n  A: 2\n"))
            .await
            .unwrap();

        assert_eq!(mutating_calls(&m.api), vec!["update app-web"]);
    }

    #[tokio::test]
    async fn test_list_paginates_and_filters_by_prefix() {
        let api = FakeApi::default();
        {
            let mut pages = api.stack_pages.lock().unwrap();
            pages.push_back((
                vec![
                    StackSummary::new("prod-web", StackStatus::CreateComplete),
                    StackSummary::new("staging-web", StackStatus::CreateComplete),
                ],
                Some(String::from("page-2")),
            ));
            pages.push_back((
                vec![StackSummary::new("prod-db", StackStatus::UpdateComplete)],
                None,
            ));
        }
        let m = manager(api, Options::builder().prefix("prod").build());

        let summaries = m.list().await.unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["prod-web", "prod-db"]);
        assert_eq!(m.api.recorded_with_prefix("list_stacks").len(), 2);
    }

    #[tokio::test]
    async fn test_exports_paginates_to_exhaustion() {
        let api = FakeApi::default();
        {
            let mut pages = api.export_pages.lock().unwrap();
            pages.push_back((
                vec![Export {
                    name: String::from("VpcId"),
                    value: String::from("vpc-123"),
                    exporting_stack_id: None,
                }],
                Some(String::from("page-2")),
            ));
            pages.push_back((
                vec![Export {
                    name: String::from("SubnetId"),
                    value: String::from("subnet-456"),
                    exporting_stack_id: None,
                }],
                None,
            ));
        }
        let m = manager(api, Options::default());

        let exports = m.exports().await.unwrap();
        assert_eq!(exports.len(), 2);
    }

    #[test]
    fn test_select_parameters_without_declarations() {
        let available = BTreeMap::from([(String::from("Env"), String::from("dev"))]);
        let parameters = select_parameters("Resources: {}", &available, "app").unwrap();
        assert!(parameters.is_empty());
    }

    #[test]
    fn test_select_parameters_keeps_only_declared() {
        let template = "\
Parameters:
  Env:
    Type: String
  Version:
    Type: String
Resources: {}
";
        let available = BTreeMap::from([
            (String::from("Env"), String::from("prod")),
            (String::from("Unrelated"), String::from("x")),
        ]);

        let parameters = select_parameters(template, &available, "app").unwrap();
        assert_eq!(parameters, vec![Parameter::new("Env", "prod")]);
    }
}
