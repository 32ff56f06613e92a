//! Tooling & Integration Layer
//!
//! Command-line entry points over the library: argument parsing, command
//! execution and text formatting of status output.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
