//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Stackform - Declarative `CloudFormation` stack deployment.
#[derive(Parser, Debug)]
#[command(name = "stackform")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile deployed stacks against a template directory.
    Deploy {
        /// Directory containing `*.template` files.
        #[arg(short, long, default_value = ".", env = "STACKFORM_DIR")]
        dir: PathBuf,

        /// Stack name prefix scoping the reconciliation.
        #[arg(short, long, default_value = "", env = "STACKFORM_PREFIX")]
        prefix: String,

        /// Log changes without applying them.
        #[arg(long)]
        dry_run: bool,

        /// Template parameter as KEY=VALUE (repeatable).
        #[arg(long = "parameter", value_name = "KEY=VALUE")]
        parameters: Vec<String>,

        /// Stack tag as KEY=VALUE (repeatable).
        #[arg(long = "tag", value_name = "KEY=VALUE")]
        tags: Vec<String>,
    },

    /// Show the changes a deploy would apply.
    Plan {
        /// Directory containing `*.template` files.
        #[arg(short, long, default_value = ".", env = "STACKFORM_DIR")]
        dir: PathBuf,

        /// Stack name prefix scoping the reconciliation.
        #[arg(short, long, default_value = "", env = "STACKFORM_PREFIX")]
        prefix: String,
    },

    /// List deployed stacks.
    List {
        /// Stack name prefix to filter by.
        #[arg(short, long, default_value = "", env = "STACKFORM_PREFIX")]
        prefix: String,
    },

    /// List exported output values across all stacks.
    Exports,
}

/// Parses a `KEY=VALUE` argument into its parts.
#[must_use]
pub fn parse_key_value(raw: &str) -> Option<(String, String)> {
    let (key, value) = raw.split_once('=')?;
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_arguments_are_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("Env=prod"),
            Some((String::from("Env"), String::from("prod")))
        );
        assert_eq!(
            parse_key_value("Url=https://example.com?a=b"),
            Some((String::from("Url"), String::from("https://example.com?a=b")))
        );
        assert_eq!(parse_key_value("Empty="), Some((String::from("Empty"), String::new())));
        assert_eq!(parse_key_value("=value"), None);
        assert_eq!(parse_key_value("no-separator"), None);
    }

    #[test]
    fn test_deploy_parses_repeated_key_values() {
        let cli = Cli::parse_from([
            "stackform",
            "deploy",
            "--dir",
            "templates",
            "--prefix",
            "prod",
            "--parameter",
            "Env=prod",
            "--tag",
            "team=platform",
            "--dry-run",
        ]);

        match cli.command {
            Commands::Deploy {
                dir,
                prefix,
                dry_run,
                parameters,
                tags,
            } => {
                assert_eq!(dir, PathBuf::from("templates"));
                assert_eq!(prefix, "prod");
                assert!(dry_run);
                assert_eq!(parameters, vec!["Env=prod"]);
                assert_eq!(tags, vec!["team=platform"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
