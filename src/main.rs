//! Resource Reconciler CLI
//!
//! Usage:
//!   resource-reconciler --project <FILE> [OPTIONS] <COMMAND>
//!
//! Commands:
//!   families [NAMES]...   Load missing families from the catalog directory
//!   styles [NAMES]...     Create missing line styles
//!   sync                  Run families then styles from the configuration
//!   list-styles           List line styles under the configured category
//!
//! Options:
//!   -p, --project <FILE>  Project file (TOML) to reconcile
//!   -c, --config <FILE>   Reconciliation settings (TOML format)
//!       --catalog <DIR>   Override the family catalog directory
//!       --pattern <NAME>  Override the line pattern for new styles
//!   -s, --save            Write the updated project back to its file
//!   -v, --verbose         Increase log output (repeatable)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use resource_reconciler::catalog::line_styles;
use resource_reconciler::logging::setup_tracing;
use resource_reconciler::{
    sync, sync_families, sync_line_styles, Document, InMemoryDocument, ReconcileConfig,
};

#[derive(Parser)]
#[command(name = "resource-reconciler")]
#[command(about = "Create missing families and line styles in a project")]
struct Cli {
    /// Project file (TOML) to reconcile
    #[arg(short, long)]
    project: PathBuf,

    /// Reconciliation settings (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the family catalog directory
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Override the line pattern new styles reference
    #[arg(long)]
    pattern: Option<String>,

    /// Write the updated project back to its file
    #[arg(short, long)]
    save: bool,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load missing families from the catalog directory
    Families {
        /// Family names (defaults to the configured list)
        names: Vec<String>,
    },
    /// Create missing line styles
    Styles {
        /// Line style names (defaults to the configured list)
        names: Vec<String>,
    },
    /// Run families then line styles from the configuration
    Sync,
    /// List line styles under the configured category
    ListStyles,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    // Load settings
    let mut config = match &cli.config {
        Some(path) => match ReconcileConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ReconcileConfig::default(),
    };
    if let Some(dir) = &cli.catalog {
        config = config.with_catalog_dir(dir);
    }
    if let Some(pattern) = &cli.pattern {
        config = config.with_pattern(pattern);
    }

    // Load project
    let mut doc = match InMemoryDocument::from_file(&cli.project) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error loading project '{}': {}", cli.project.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let report = match cli.command {
        Command::Families { names } => {
            if !names.is_empty() {
                config = config.with_families(names);
            }
            sync_families(&mut doc, &config)
        }
        Command::Styles { names } => {
            if !names.is_empty() {
                config = config.with_line_styles(names);
            }
            sync_line_styles(&mut doc, &config)
        }
        Command::Sync => sync(&mut doc, &config),
        Command::ListStyles => {
            let category = &config.line_styles.category;
            let Some(id) = doc.category(category) else {
                eprintln!("Error: category '{}' not found", category);
                return ExitCode::FAILURE;
            };
            for entry in line_styles(&doc, id) {
                println!("{}\t{}", entry.id, entry.name);
            }
            return ExitCode::SUCCESS;
        }
    };

    println!("{}", report);

    if cli.save {
        if let Err(e) = doc.save(&cli.project) {
            eprintln!("Error saving project '{}': {}", cli.project.display(), e);
            return ExitCode::FAILURE;
        }
    }

    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
