//! Stackform CLI entrypoint.
//!
//! This is the main entrypoint for the stackform command-line tool.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use stackform::cli::{Cli, Commands};
use stackform::error::{Result, StackformError};
use stackform::{calculate_changes, load_all, AwsCloudFormation, Manager, Options};

/// Main entrypoint.
fn main() -> ExitCode {
    // Load .env if present; AWS credentials and region often live there.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Deploy {
            dir,
            prefix,
            dry_run,
            parameters,
            tags,
        } => cmd_deploy(&dir, &prefix, dry_run, &parameters, &tags).await,
        Commands::Plan { dir, prefix } => cmd_plan(&dir, &prefix).await,
        Commands::List { prefix } => cmd_list(&prefix).await,
        Commands::Exports => cmd_exports().await,
    }
}

/// Reconciles the deployed stacks against the template directory.
async fn cmd_deploy(
    dir: &Path,
    prefix: &str,
    dry_run: bool,
    parameters: &[String],
    tags: &[String],
) -> Result<()> {
    let mut builder = Options::builder().prefix(prefix).dry_run(dry_run);

    for raw in parameters {
        let (key, value) = parse_argument(raw)?;
        builder = builder.parameter(key, value);
    }
    for raw in tags {
        let (key, value) = parse_argument(raw)?;
        builder = builder.tag(key, value);
    }

    let options = builder.build();
    let api = AwsCloudFormation::from_env(options.wait_timeout()).await;

    // Cross-stack exports feed template parameters; explicit --parameter
    // values take precedence over exported values.
    let probe = Manager::new(api.clone(), Options::default());
    let exports = probe.exports().await?;
    debug!("retrieved {} exports", exports.len());

    let mut merged = Options::builder().prefix(prefix).dry_run(dry_run);
    for export in &exports {
        merged = merged.parameter(export.name.clone(), export.value.clone());
    }
    let options = merged
        .parameters(options.parameters().clone())
        .tags(options.tags().to_vec())
        .build();

    let manager = Manager::new(api, options);
    let desired = load_all(dir, manager.options())?;
    let observed = manager.list().await?;

    let changes = calculate_changes(&observed, &desired);
    if changes.is_empty() {
        info!("no changes to apply");
        return Ok(());
    }

    print_changes(&changes);
    manager.apply(&changes).await
}

/// Shows the changes a deploy would apply, without applying them.
async fn cmd_plan(dir: &Path, prefix: &str) -> Result<()> {
    let options = Options::builder().prefix(prefix).build();
    let api = AwsCloudFormation::from_env(options.wait_timeout()).await;
    let manager = Manager::new(api, options);

    let desired = load_all(dir, manager.options())?;
    let observed = manager.list().await?;

    let changes = calculate_changes(&observed, &desired);
    if changes.is_empty() {
        println!("no changes");
        return Ok(());
    }

    print_changes(&changes);
    Ok(())
}

/// Lists deployed stacks matching the prefix.
async fn cmd_list(prefix: &str) -> Result<()> {
    let options = Options::builder().prefix(prefix).build();
    let api = AwsCloudFormation::from_env(options.wait_timeout()).await;
    let manager = Manager::new(api, options);

    for summary in manager.list().await? {
        println!("{:<40} {}", summary.name, summary.status);
    }

    Ok(())
}

/// Lists exported output values across all stacks.
async fn cmd_exports() -> Result<()> {
    let options = Options::default();
    let api = AwsCloudFormation::from_env(options.wait_timeout()).await;
    let manager = Manager::new(api, options);

    for export in manager.exports().await? {
        println!("{:<40} {}", export.name, export.value);
    }

    Ok(())
}

/// Prints the pending changes, one per line.
fn print_changes(changes: &[stackform::Change]) {
    println!("{}", "pending changes:".bold());
    for change in changes {
        println!("  {change}");
    }
}

/// Parses a `KEY=VALUE` CLI argument.
fn parse_argument(raw: &str) -> Result<(String, String)> {
    stackform::cli::parse_key_value(raw)
        .ok_or_else(|| StackformError::internal(format!("expected KEY=VALUE, got {raw:?}")))
}
