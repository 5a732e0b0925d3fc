//! Stack model and template loader.
//!
//! A [`Stack`] is the desired form of one deployable unit: its final name,
//! the tags to attach, and the opaque template body. Stacks are built by
//! the loader from `*.template` files and consumed by the manager.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cloud::Tag;
use crate::error::{Result, StackformError, TemplateError};
use crate::options::Options;

/// File suffix recognized by the directory loader.
const TEMPLATE_SUFFIX: &str = ".template";

/// The kind of change needed to converge one stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// The stack must be created.
    Insert,
    /// The stack must be updated.
    Update,
    /// The stack must be deleted.
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

/// A desired deployable unit: name, tags, and template body.
///
/// Immutable once constructed. The name is final (formatter and prefix
/// already applied) and unique within one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    /// Final stack name.
    pub name: String,
    /// Tags attached to the stack.
    pub tags: Vec<Tag>,
    /// Opaque serialized template definition.
    pub template_body: String,
}

impl Stack {
    /// Creates a stack carrying only a name, as delete changes do.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Loads a stack from a template body.
    ///
    /// The stack name is the file stem of `filename`, passed through the
    /// configured name formatter and prefixed.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be read.
    pub fn load(filename: &Path, body: &mut impl Read, options: &Options) -> Result<Self> {
        let name = stack_name(filename);

        let mut template_body = String::new();
        body.read_to_string(&mut template_body)
            .map_err(|source| TemplateError::Read {
                path: filename.to_path_buf(),
                source,
            })?;

        Ok(Self {
            name: options.qualify_name(&name),
            tags: options.tags().to_vec(),
            template_body,
        })
    }

    /// Loads a stack from a template file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn load_file(path: impl AsRef<Path>, options: &Options) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::load(path, &mut file, options)
    }
}

/// Derives the raw stack name from a template filename.
fn stack_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Loads all `*.template` files under the given directory, recursively,
/// in sorted path order. A missing directory yields an empty list.
///
/// # Errors
///
/// Returns an error if the directory cannot be traversed or a template
/// cannot be read.
pub fn load_all(dir: impl AsRef<Path>, options: &Options) -> Result<Vec<Stack>> {
    let dir = dir.as_ref();

    let mut paths = Vec::new();
    match collect_templates(dir, &mut paths) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StackformError::Template(TemplateError::ReadDir {
                path: dir.to_path_buf(),
                source,
            }))
        }
    }
    paths.sort();

    debug!("loading {} templates from {}", paths.len(), dir.display());

    paths
        .iter()
        .map(|path| Stack::load_file(path, options))
        .collect()
}

/// Recursively collects template file paths under `dir`.
fn collect_templates(dir: &Path, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_templates(&path, found)?;
        } else if path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(TEMPLATE_SUFFIX))
        {
            found.push(path);
        }
    }
    Ok(())
}

/// One pending change produced by a reconciliation pass.
///
/// For [`Operation::Delete`] only the stack name is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// The kind of change.
    pub operation: Operation,
    /// The stack the change applies to.
    pub stack: Stack,
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.operation, self.stack.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn test_load_applies_prefix_and_tags() {
        let options = Options::builder()
            .prefix("prod")
            .tag("Project", "stackform")
            .build();

        let mut body = "Resources: {}".as_bytes();
        let stack = Stack::load(Path::new("templates/web.template"), &mut body, &options).unwrap();

        assert_eq!(stack.name, "prod-web");
        assert_eq!(stack.template_body, "Resources: {}");
        assert_eq!(stack.tags, vec![Tag::new("Project", "stackform")]);
    }

    #[test]
    fn test_load_applies_name_formatter() {
        let options = Options::builder()
            .name_formatter(|name| format!("{name}-svc"))
            .build();

        let mut body = "{}".as_bytes();
        let stack = Stack::load(Path::new("api.template"), &mut body, &options).unwrap();

        assert_eq!(stack.name, "api-svc");
    }

    #[test]
    fn test_load_all_picks_only_templates_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.template"), "b").unwrap();
        std::fs::write(dir.path().join("a.template"), "a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("c.template"), "c").unwrap();

        let stacks = load_all(dir.path(), &Options::default()).unwrap();
        let names: Vec<&str> = stacks.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_all_missing_dir_is_empty() {
        let stacks = load_all("/does/not/exist", &Options::default()).unwrap();
        assert!(stacks.is_empty());
    }

    #[test]
    fn test_change_display() {
        let change = Change {
            operation: Operation::Delete,
            stack: Stack::named("prod-web"),
        };
        assert_eq!(change.to_string(), "delete prod-web");
    }
}
