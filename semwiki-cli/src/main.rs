//! # semwiki CLI
//!
//! Administration tool for a semwiki store: schema installation, statement
//! import, property listings and usage statistics.

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "semwiki")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "semwiki.yml")]
    config: PathBuf,

    /// Path to the SQLite database
    #[arg(long, env = "SEMWIKI_DB", default_value = "semwiki.db")]
    db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and install the schema
    Init,

    /// Import statements from a JSON file
    Import {
        /// One subject's data or an array of them
        file: PathBuf,
    },

    /// Show semantic statistics
    Stats {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List properties with their usage counts
    Properties(ListArgs),

    /// List used but undeclared properties
    Wanted(ListArgs),

    /// List declared properties without uses
    Unused(ListArgs),

    /// Resolve entity IDs
    Entity {
        /// IDs to resolve
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Recount property usage from the stored statements
    RebuildStats {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Paging and filtering shared by the listing commands
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Maximum number of results (0 for all)
    #[arg(long, default_value_t = 0)]
    limit: u64,

    /// Results to skip; only applies with --limit
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Only titles starting with this text
    #[arg(long)]
    prefix: Option<String>,

    /// Only titles containing this text
    #[arg(long)]
    contains: Option<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so that --json output stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::Init => commands::init_store(&cli.config, &cli.db),
        Commands::Import { file } => commands::import_file(&cli.config, &cli.db, file),
        Commands::Stats { json } => commands::show_statistics(&cli.config, &cli.db, *json),
        Commands::Properties(args) => {
            commands::list(&cli.config, &cli.db, commands::Listing::Properties, args)
        }
        Commands::Wanted(args) => {
            commands::list(&cli.config, &cli.db, commands::Listing::Wanted, args)
        }
        Commands::Unused(args) => {
            commands::list(&cli.config, &cli.db, commands::Listing::Unused, args)
        }
        Commands::Entity { ids, json } => {
            commands::resolve_entities(&cli.config, &cli.db, ids, *json)
        }
        Commands::RebuildStats { json } => {
            commands::rebuild_statistics(&cli.config, &cli.db, *json)
        }
    }
}
