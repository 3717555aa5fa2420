//! dirbatch command line
//!
//! `dirbatch run` processes a batch described by a layout file;
//! `dirbatch check` round-trips sample names through one directory map.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dirbatch_core::{Batch, BatchConfig, LayoutFile};
use dirbatch_parser::ParserCheck;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(
    name = "dirbatch",
    version,
    about = "Parameter records from nested experiment directories"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Crawl, validate and reconcile a batch, then write its outputs
    Run {
        /// Layout file (TOML)
        #[arg(long)]
        layout: PathBuf,
        /// Override the root directory
        #[arg(long)]
        root: Option<PathBuf>,
        /// Override the external table
        #[arg(long)]
        table: Option<PathBuf>,
        /// Override the run name
        #[arg(long)]
        name: Option<String>,
    },
    /// Check sample names against one directory map
    Check {
        /// Layout file (TOML)
        #[arg(long)]
        layout: PathBuf,
        /// Directory map name
        #[arg(long)]
        level: String,
        /// Sample directory names
        #[arg(required = true)]
        samples: Vec<String>,
    },
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file '{}'", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn load(layout: &Path) -> Result<BatchConfig> {
    let base = layout.parent().unwrap_or_else(|| Path::new("."));
    let config = LayoutFile::from_path(layout)?.into_config(base)?;
    Ok(config)
}

fn run(
    layout: &Path,
    root: Option<PathBuf>,
    table: Option<PathBuf>,
    name: Option<String>,
) -> Result<()> {
    let mut config = load(layout)?;
    if let Some(root) = root {
        config.root = root;
    }
    if let Some(table) = table {
        config.table = Some(table);
    }
    if let Some(name) = name {
        config.name = name;
    }
    config.validate()?;

    let logs = config.logs_dir();
    fs::create_dir_all(&logs).with_context(|| format!("cannot create '{}'", logs.display()))?;
    init_logging(Some(&config.log_file()))?;
    tracing::info!("dirbatch {} starting run '{}'", dirbatch_core::VERSION, config.name);

    let batch = match Batch::open(config) {
        Ok(batch) => batch,
        Err(err) => {
            if err.is_config_error() {
                tracing::error!("Configuration error, aborting run: {}", err);
            } else {
                tracing::error!("Run failed: {}", err);
            }
            return Err(err.into());
        }
    };

    let summary = batch.summary();
    println!(
        "{} records ({} valid) from {} tree nodes after {} stages",
        summary.records, summary.valid, summary.nodes, summary.stages
    );
    if let Some(sync) = batch.reconciliation() {
        println!(
            "matched {}, directory only {}, table only {} ({} synthesized)",
            sync.matched.len(),
            sync.directory_only.len(),
            sync.table_only.len(),
            sync.created
        );
    }
    println!("output: {}", batch.config().aggregate_path().display());
    Ok(())
}

fn check(layout: &Path, level: &str, samples: &[String]) -> Result<()> {
    init_logging(None)?;
    let config = load(layout)?;
    let checks = config.check(level, samples)?;

    let mut failed = 0;
    for (sample, check) in samples.iter().zip(&checks) {
        match check {
            ParserCheck::Ignored => println!("{sample}: ignored"),
            ParserCheck::Success(attrs) => {
                let fields: Vec<String> = attrs.iter().map(|(k, v)| format!("{k}={v}")).collect();
                println!("{sample}: ok ({})", fields.join(", "));
            }
            ParserCheck::Mismatch { input, output } => {
                failed += 1;
                println!("{sample}: mismatch, '{input}' restores as '{output}'");
            }
            ParserCheck::SuffixNotAllowed(_) => {
                failed += 1;
                println!("{sample}: suffix only allowed on the last directory map");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} samples failed the round trip", samples.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            layout,
            root,
            table,
            name,
        } => run(&layout, root, table, name),
        Command::Check {
            layout,
            level,
            samples,
        } => check(&layout, &level, &samples),
    }
}
