//! Theme Pipeline
//!
//! Builds skin and container assets into a staging tree and distributes them to
//! every configured site.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use theme_pipeline::cli::{Cli, Command};
use theme_pipeline::config::{ConfigLoader, ConfigPaths};
use theme_pipeline::pipeline::{Pipeline, RunReport, Task};
use theme_pipeline::watcher::{WatcherConfig, run_watch};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// `-v` sets the default level; `RUST_LOG` directives refine it.
fn env_filter(verbose: bool) -> EnvFilter {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

fn init_logging(cli: &Cli) -> Result<()> {
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(cli.verbose))
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(cli.verbose))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(cli.verbose))
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

/// Resolve config file paths: CLI flags, then environment, then defaults.
fn config_paths(cli: &Cli) -> ConfigPaths {
    let mut paths = ConfigPaths::discover(&cli.root);
    if let Some(base) = &cli.config {
        paths.base = cli.root.join(base);
    }
    if let Some(local) = &cli.local_config {
        paths.local = cli.root.join(local);
    }
    paths
}

fn print_summary(task: Task, report: &RunReport) {
    let issues: Vec<_> = report.issues().collect();
    if issues.is_empty() {
        println!("{} complete ({} steps)", task, report.steps.len());
    } else {
        println!(
            "{} complete ({} steps, {} issues)",
            task,
            report.steps.len(),
            issues.len()
        );
        for issue in issues {
            println!("  - {}", issue);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Configuration errors abort before any task runs
    let loader = ConfigLoader::load_with_paths(config_paths(&cli))?;

    let command = cli.command.unwrap_or(Command::Distribute);
    let Some(task) = command.task() else {
        println!("{}", serde_json::to_string_pretty(loader.document())?);
        return Ok(());
    };

    let pipeline = Pipeline::new(loader.into_config(), cli.root.clone())?;

    let steps = task.steps();
    if !steps.is_empty() {
        let worker = pipeline.clone();
        let report = tokio::task::spawn_blocking(move || worker.run_task(task)).await??;
        print_summary(task, &report);
    }

    if task.watches() {
        let watcher_config = command
            .watch_args()
            .map(|args| args.watcher_config())
            .unwrap_or_else(WatcherConfig::default);
        run_watch(pipeline, watcher_config).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Warning: failed to initialise logging: {}", e);
    }
    info!(version = env!("CARGO_PKG_VERSION"), "theme-pipeline starting");

    if let Err(e) = run(cli).await {
        warn!(error = %format!("{:#}", e), "Pipeline failed");
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}
