//! PDB-REDO archive command-line driver.
//!
//! Rebuilds the schema, rescans the archive tree, and runs queries or
//! downloads against a local archive without the HTTP layer.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdb_archive::config::QueryConfig;
use pdb_archive::{ArchiveApi, ArchiveApiBuilder, ArchiveConfig, FileKind};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pdb-archive")]
#[command(about = "Import, query and package the PDB-REDO result archive")]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root of the sharded archive tree
    #[arg(long)]
    archive_root: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// JSON Schema of data.json
    #[arg(long)]
    schema: PathBuf,

    /// JSON pointer to the property definitions in the schema
    #[arg(long)]
    schema_pointer: Option<String>,

    /// Owner recorded when the schema is reset
    #[arg(long)]
    owner: Option<String>,

    /// Parallel import workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop and recreate the database schema
    Reset,

    /// Import every snapshot under the archive root
    Rescan {
        /// Reset the schema first
        #[arg(long)]
        reset: bool,
    },

    /// Count matching entries
    Count {
        /// Query as JSON, or @path to a JSON file
        #[arg(short, long)]
        query: Option<String>,

        /// Only the newest snapshot of each identifier
        #[arg(long)]
        latest: bool,
    },

    /// List matching entries
    Query {
        /// Query as JSON, or @path to a JSON file
        #[arg(short, long)]
        query: Option<String>,

        /// Only the newest snapshot of each identifier
        #[arg(long)]
        latest: bool,

        /// Zero-based page number
        #[arg(long, default_value = "0")]
        page: i64,

        /// Entries per page
        #[arg(long, default_value_t = QueryConfig::DEFAULT_PAGE_SIZE)]
        page_size: i64,

        /// Return every match instead of one page
        #[arg(long, conflicts_with_all = ["page", "page_size"])]
        all: bool,
    },

    /// List software with known versions
    Software,

    /// List property definitions and their types
    Properties,

    /// Look up the identifier of a version hash
    Lookup { hash: String },

    /// Write one file or the zip bundle of a snapshot
    Fetch {
        identifier: String,
        hash: String,

        /// cif, mtz, data, versions or zip
        kind: FileKind,

        /// Output file (defaults to the suggested download name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Merge the optional config file with command-line flags.
fn resolve_config(args: &Args) -> Result<ArchiveConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str::<ArchiveConfig>(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => {
            let root = args
                .archive_root
                .clone()
                .context("--archive-root is required without --config")?;
            let database = args
                .database
                .clone()
                .context("--database is required without --config")?;
            ArchiveConfig::new(root, database)
        }
    };

    if let Some(root) = &args.archive_root {
        config.archive_root = root.clone();
    }
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }
    if let Some(pointer) = &args.schema_pointer {
        config.schema_pointer = pointer.clone();
    }
    if args.owner.is_some() {
        config.owner = args.owner.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Command::Rescan { reset: true } = args.command {
        config.reset_before_rescan = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = resolve_config(&args)?;
    info!(
        "Archive root: {}, database: {}",
        config.archive_root.display(),
        config.database_path.display()
    );

    let api: ArchiveApi = ArchiveApiBuilder::from_config(config)
        .schema_path(&args.schema)
        .build()
        .context("Failed to initialize archive")?;

    commands::run(&api, args.command).await
}
