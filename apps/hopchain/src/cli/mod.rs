//! # hopchain CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show solve store status
//! - `edges` - Replay a hop history offline and print the open edges
//! - `show` - Print one committed solve
//! - `list` - List committed solves matching a filter
//! - `init` - Initialize a new solve database

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use hopchain_core::{ChainError, SolveQuery};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// hopchain - word chain solve service
///
/// Tracks open edges of word-association chain puzzles and records each
/// distinct solved path exactly once.
#[derive(Parser, Debug)]
#[command(name = "hopchain")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the solve database
    #[arg(short = 'D', long, global = true, default_value = "hopchain.redb")]
    pub database: PathBuf,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum, default_value_t = Backend::Redb)]
    pub backend: Backend,

    /// Optional TOML config file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Solve store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// ACID database file (redb)
    Redb,
    /// Volatile, lost on exit
    Memory,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show solve store status
    Status,

    /// Replay `{"words": [...], "hops": [...]}` and print the open edges
    Edges {
        /// Path to the replay file (JSON)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print a committed solve
    Show {
        /// Solve id (equal to the attempt id)
        id: String,
    },

    /// List committed solves
    List {
        /// Only solves of this owner
        #[arg(long)]
        owner: Option<String>,

        /// Only solves of this puzzle
        #[arg(long)]
        puzzle: Option<String>,

        /// Only solves whose associations key contains this text
        #[arg(long)]
        associations: Option<String>,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), ChainError> {
    let backend = cli.backend;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&cli.database, backend, cli.config.as_deref(), &host, port).await
        }
        Some(Commands::Status) => cmd_status(&cli.database, backend, json_mode),
        Some(Commands::Edges { file }) => cmd_edges(&file, json_mode),
        Some(Commands::Show { id }) => cmd_show(&cli.database, backend, json_mode, &id),
        Some(Commands::List {
            owner,
            puzzle,
            associations,
        }) => {
            let query = SolveQuery {
                owner_id: owner,
                puzzle_id: puzzle,
                associations_key: associations,
            };
            cmd_list(&cli.database, backend, json_mode, &query)
        }
        Some(Commands::Init { force }) => cmd_init(&cli.database, backend, force),
        None => cmd_status(&cli.database, backend, json_mode),
    }
}
