//! CLI module for the stackform deployment tool.
//!
//! This module provides the command-line interface for reconciling
//! `CloudFormation` stacks against a template directory.

mod commands;

pub use commands::{parse_key_value, Cli, Commands};
