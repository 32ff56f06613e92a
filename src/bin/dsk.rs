//! dsk CLI Binary
//!
//! Command-line interface for browsing and watching a design documentation tree.

use anyhow::Context;
use clap::Parser;
use dsk::logging::init_logging;
use dsk::tooling::cli::{load_config, resolve_root, Cli, CliContext};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let root = resolve_root(cli.root.as_deref())?;
    let mut config = load_config(&root, cli.config.as_deref())?;
    cli.apply_logging_overrides(&mut config.logging);
    init_logging(Some(&config.logging)).context("Failed to initialize logging")?;

    let context = CliContext::with_config(root.clone(), config)
        .with_context(|| format!("Failed to build tree at {}", root.display()))?;
    let output = context.execute(&cli.command)?;
    println!("{}", output);
    Ok(())
}
