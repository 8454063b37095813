//! CLI command definitions for theme-pipeline
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::pipeline::Task;
use crate::watcher::WatcherConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Build skin and container assets and distribute them to installed sites
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the base configuration file (default: config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the local override file (default: config-local.json)
    #[arg(long, global = true)]
    pub local_config: Option<PathBuf>,

    /// Project root that relative paths are resolved against
    #[arg(long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clean staging and build every artifact into it
    Build,

    /// Replace the theme in every target path with the staged build
    Sync,

    /// Build, then sync (default if no subcommand given)
    Distribute,

    /// Remove the staging tree and the theme from every target path
    Clean,

    /// Extract vendor files from installed packages
    Vendors,

    /// Extract vendor files, then build
    Refresh,

    /// Rebuild and redistribute on source changes
    Watch(WatchArgs),

    /// Distribute, then watch
    Init(WatchArgs),

    /// Print the merged configuration as JSON
    Config,
}

/// Options for watch mode.
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Debounce window for coalescing rapid changes, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub debounce_ms: u64,

    /// Run triggered rebuilds one at a time instead of letting them overlap
    #[arg(long)]
    pub serialize: bool,
}

impl WatchArgs {
    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            debounce_duration: Duration::from_millis(self.debounce_ms),
            serialize: self.serialize,
        }
    }
}

impl Command {
    /// The pipeline task this command runs, if any.
    pub fn task(&self) -> Option<Task> {
        match self {
            Command::Build => Some(Task::Build),
            Command::Sync => Some(Task::Sync),
            Command::Distribute => Some(Task::Distribute),
            Command::Clean => Some(Task::Clean),
            Command::Vendors => Some(Task::Vendors),
            Command::Refresh => Some(Task::Refresh),
            Command::Watch(_) => Some(Task::Watch),
            Command::Init(_) => Some(Task::Init),
            Command::Config => None,
        }
    }

    /// Watch options, for the commands that watch.
    pub fn watch_args(&self) -> Option<&WatchArgs> {
        match self {
            Command::Watch(args) | Command::Init(args) => Some(args),
            _ => None,
        }
    }
}
