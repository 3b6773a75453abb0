//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve: run the account server
//! - connect: open the interactive client

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Balance checker - remote account balances over TCP
#[derive(Parser, Debug)]
#[command(name = "balance-checker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the account server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding one ledger file per user
        #[arg(short, long)]
        users_dir: Option<PathBuf>,
    },

    /// Connect to a server with the interactive client
    Connect {
        /// Server host
        host: Option<String>,

        /// Server port
        port: Option<String>,
    },
}
