//! Reconciliation options.
//!
//! Options are accumulated through [`OptionsBuilder`] and immutable once
//! built; the manager takes them by value at construction.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cloud::Tag;

/// Maps a raw stack name (template file stem) to its final form.
pub type NameFormatter = dyn Fn(&str) -> String + Send + Sync;

/// Default budget handed to the remote wait-until-complete primitive.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Immutable configuration for a reconciliation pass.
#[derive(Clone)]
pub struct Options {
    dry_run: bool,
    prefix: String,
    parameters: BTreeMap<String, String>,
    tags: Vec<Tag>,
    name_formatter: Arc<NameFormatter>,
    wait_timeout: Duration,
}

/// Accumulates option values for [`Options`].
#[derive(Clone)]
pub struct OptionsBuilder {
    dry_run: bool,
    prefix: String,
    parameters: BTreeMap<String, String>,
    tags: Vec<Tag>,
    name_formatter: Arc<NameFormatter>,
    wait_timeout: Duration,
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self {
            dry_run: false,
            prefix: String::new(),
            parameters: BTreeMap::new(),
            tags: Vec::new(),
            name_formatter: Arc::new(|name: &str| name.to_string()),
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl OptionsBuilder {
    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the stack name prefix; a single trailing `-` is enforced.
    ///
    /// An empty prefix leaves names untouched and matches every stack
    /// when listing.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() {
            prefix
        } else {
            format!("{}-", prefix.trim_end_matches('-'))
        };
        self
    }

    /// Merges the given parameter values into the configured set.
    #[must_use]
    pub fn parameters(mut self, parameters: impl IntoIterator<Item = (String, String)>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Adds a single parameter value.
    #[must_use]
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Appends tags applied to every managed stack.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Appends a single tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    /// Sets the stack name formatter applied before prefixing.
    #[must_use]
    pub fn name_formatter(mut self, formatter: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.name_formatter = Arc::new(formatter);
        self
    }

    /// Sets the wait budget for remote completion waiters.
    #[must_use]
    pub const fn wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    /// Builds the immutable options value.
    #[must_use]
    pub fn build(self) -> Options {
        Options {
            dry_run: self.dry_run,
            prefix: self.prefix,
            parameters: self.parameters,
            tags: self.tags,
            name_formatter: self.name_formatter,
            wait_timeout: self.wait_timeout,
        }
    }
}

impl Options {
    /// Starts accumulating options.
    #[must_use]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Returns true if mutating calls are suppressed.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the configured stack name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the configured parameter values.
    #[must_use]
    pub const fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Returns the tags applied to every managed stack.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns the wait budget for remote completion waiters.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// Applies the configured name formatter to a raw stack name.
    #[must_use]
    pub fn format_name(&self, name: &str) -> String {
        (self.name_formatter)(name)
    }

    /// Returns the final stack name: formatter output plus prefix.
    #[must_use]
    pub fn qualify_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, self.format_name(name))
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("dry_run", &self.dry_run)
            .field("prefix", &self.prefix)
            .field("parameters", &self.parameters)
            .field("tags", &self.tags)
            .field("wait_timeout", &self.wait_timeout)
            .finish_non_exhaustive()
    }
}
