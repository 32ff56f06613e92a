//! CLI Tooling
//!
//! Command-line interface over one tree root: JSON views of the API shapes,
//! a human-readable status summary and a watch mode that rebuilds on change
//! and streams broker messages.

use crate::api::{ApiHello, ApiMessage, ApiNode, ApiNodeTree, ApiSearchResults};
use crate::broker::{forward, Message, MessageBroker, MessageSink};
use crate::config::{ConfigLoader, DskConfig};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::render::PlainRenderer;
use crate::tooling::format::{format_tree_status_text, TreeStatus};
use crate::tree::{TreeBuilder, TreeHandle};
use crate::watch::WatchDaemon;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// dsk - design documentation tree
#[derive(Parser, Debug)]
#[command(name = "dsk", version)]
#[command(about = "Browse, search and watch a design documentation tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Tree root directory (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold logging flags into the loaded configuration.
    pub fn apply_logging_overrides(&self, logging: &mut LoggingConfig) {
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the API greeting
    Hello,
    /// Print the tree summary as JSON
    Tree,
    /// Print a single node as JSON
    Node {
        /// Node URL relative to the tree root; omit for the root
        url: Option<String>,
    },
    /// Fuzzy search the tree
    Search {
        query: String,
        /// Maximum number of URLs to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show tree status
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Include top-level node breakdown
        #[arg(long)]
        breakdown: bool,
    },
    /// Rebuild on change and print each notification as a JSON line
    Watch {
        /// Debounce window in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
        /// Batch window in milliseconds
        #[arg(long)]
        batch_window_ms: Option<u64>,
    },
}

/// Resolve the tree root from an explicit path or the current directory.
pub fn resolve_root(given: Option<&Path>) -> Result<PathBuf, ApiError> {
    let here = match given {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?,
    };
    dunce::canonicalize(&here).map_err(|e| {
        ApiError::ConfigError(format!("Failed to resolve tree root {}: {}", here.display(), e))
    })
}

/// Explicit file if given, else the layered sources for `root`.
pub fn load_config(root: &Path, config_path: Option<&Path>) -> Result<DskConfig, ApiError> {
    match config_path {
        Some(path) => ConfigLoader::load_from_file(path).map_err(|e| {
            ApiError::ConfigError(format!("Failed to load config from {}: {}", path.display(), e))
        }),
        None => ConfigLoader::load(root),
    }
}

/// Everything a command needs: configuration and the live tree.
pub struct CliContext {
    config: DskConfig,
    handle: Arc<TreeHandle>,
}

impl CliContext {
    pub fn new(root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = load_config(&root, config_path.as_deref())?;
        Self::with_config(root, config)
    }

    /// Build the initial tree with an already loaded configuration.
    pub fn with_config(root: PathBuf, config: DskConfig) -> Result<Self, ApiError> {
        let builder = TreeBuilder::new(root)
            .with_ignore_pattern(&config.tree.ignore_pattern)?
            .with_search_config(config.search);
        let broker = Arc::new(MessageBroker::new(config.broker));
        let handle = Arc::new(TreeHandle::open(builder, broker)?);
        Ok(Self { config, handle })
    }

    pub fn handle(&self) -> &Arc<TreeHandle> {
        &self.handle
    }

    /// Execute a CLI command and return its output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        // One snapshot per command.
        let tree = self.handle.current();
        match command {
            Commands::Hello => to_json(&ApiHello::new(&tree)),
            Commands::Tree => to_json(&ApiNodeTree::new(&tree)),
            Commands::Node { url } => to_json(&ApiNode::lookup(
                &tree,
                url.as_deref().unwrap_or_default(),
                &PlainRenderer,
            )?),
            Commands::Search { query, limit } => {
                to_json(&ApiSearchResults::new(&tree, query, *limit, &self.config.search))
            }
            Commands::Status { format, breakdown } => {
                let status = TreeStatus::new(&tree);
                match format.as_str() {
                    "json" => to_json(&status),
                    "text" => Ok(format_tree_status_text(&status, *breakdown)),
                    other => Err(ApiError::ConfigError(format!(
                        "Invalid status format: {} (must be 'text' or 'json')",
                        other
                    ))),
                }
            }
            Commands::Watch {
                debounce_ms,
                batch_window_ms,
            } => self.handle_watch(*debounce_ms, *batch_window_ms),
        }
    }

    fn handle_watch(
        &self,
        debounce_ms: Option<u64>,
        batch_window_ms: Option<u64>,
    ) -> Result<String, ApiError> {
        let mut watch_config = self.config.watch.clone();
        if let Some(ms) = debounce_ms {
            watch_config.debounce_ms = ms;
        }
        if let Some(ms) = batch_window_ms {
            watch_config.batch_window_ms = ms.max(watch_config.debounce_ms);
        }
        if !watch_config.enabled {
            return Err(ApiError::ConfigError(
                "Watching is disabled (watch.enabled = false)".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let daemon = Arc::new(WatchDaemon::new(Arc::clone(&self.handle), watch_config));
        let handle = Arc::clone(&self.handle);

        runtime.block_on(async move {
            let printer = tokio::spawn(forward(
                Arc::clone(handle.broker()),
                JsonLinesSink::new(std::io::stdout()),
            ));

            let stopper = daemon.stopper();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, stopping");
                    stopper.stop();
                }
            });

            info!("Starting watch mode daemon");
            let watched = {
                let daemon = Arc::clone(&daemon);
                tokio::task::spawn_blocking(move || daemon.run()).await
            };
            handle.shutdown();
            if let Ok(end) = printer.await {
                debug!(?end, "Message printer stopped");
            }

            match watched {
                Ok(result) => result,
                Err(e) => Err(ApiError::ConfigError(format!("Watch task failed: {}", e))),
            }
        })?;

        Ok("Watch daemon stopped".to_string())
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize output: {}", e)))
}

/// Writes each message as one JSON line.
pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> MessageSink for JsonLinesSink<W> {
    type Error = std::io::Error;

    async fn send(&mut self, message: &Message) -> Result<(), std::io::Error> {
        serde_json::to_writer(&mut self.out, &ApiMessage::from(message))?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}
