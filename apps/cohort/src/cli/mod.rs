//! # Cohort CLI Module
//!
//! ## Available Commands
//!
//! - `partition` - Group a roster
//! - `validate` - Check a roster without grouping it
//! - `template` - Write a demo roster and matching config
//! - `palette` - Print group colours
//! - `server` - Start the HTTP server

mod commands;

use crate::error::AppError;
use clap::{Parser, Subcommand, ValueEnum};
use cohort_core::FairnessMode;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Cohort - preference-graph group partitioning
///
/// Splits each population of a roster into groups of fixed sizes so that as
/// many stated preferences as possible land inside a group.
#[derive(Parser, Debug)]
#[command(name = "cohort")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Fairness objective as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Maximize satisfied preferences only
    Primary,
    /// Re-run with the smallest groups' preferences boosted
    MinorityBoost,
    /// Re-run with the least-chosen people's preferences boosted
    IsolationBoost,
}

impl From<ModeArg> for FairnessMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Primary => Self::Primary,
            ModeArg::MinorityBoost => Self::MinorityBoost,
            ModeArg::IsolationBoost => Self::IsolationBoost,
        }
    }
}

/// Roster and population arguments shared by `partition` and `validate`.
#[derive(clap::Args, Debug, Clone)]
pub struct RosterArgs {
    /// Roster file (.json, .xlsx, .xlsm, .xls, .ods)
    #[arg(short, long)]
    pub roster: PathBuf,

    /// Config file with populations and defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Population as NAME=START-END:SIZES (repeatable, replaces the config's populations)
    #[arg(short, long = "population", value_name = "NAME=START-END:SIZES")]
    pub populations: Vec<String>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Group a roster
    Partition {
        #[command(flatten)]
        roster: RosterArgs,

        /// Fairness mode (defaults to the config's, then primary)
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Check a roster against its populations
    Validate {
        #[command(flatten)]
        roster: RosterArgs,
    },

    /// Write a seeded demo roster and a config that groups it
    Template {
        /// Roster output path (JSON)
        #[arg(short, long, default_value = "roster.json")]
        output: PathBuf,

        /// Config output path (TOML)
        #[arg(long, default_value = "cohort.toml")]
        config_output: PathBuf,

        /// Random seed
        #[arg(short, long, default_value = "46")]
        seed: u64,
    },

    /// Print group colours
    Palette {
        /// Number of colours
        #[arg(short = 'n', long, default_value = "22")]
        count: usize,
    },

    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Config file with the default mode and search timeout
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let json = cli.json;

    match cli.command {
        Commands::Partition { roster, mode } => cmd_partition(&roster, mode, json),
        Commands::Validate { roster } => cmd_validate(&roster, json),
        Commands::Template {
            output,
            config_output,
            seed,
        } => cmd_template(&output, &config_output, seed, json),
        Commands::Palette { count } => cmd_palette(count, json),
        Commands::Server { host, port, config } => {
            cmd_server(&host, port, config.as_deref()).await
        }
    }
}
