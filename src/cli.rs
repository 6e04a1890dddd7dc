//! Command-line interface for gridtac.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::db::GameId;

/// Gridtac - N×N tic-tac-toe server with a minimax opponent
#[derive(Parser, Debug)]
#[command(name = "gridtac")]
#[command(about = "N×N tic-tac-toe server with a minimax opponent", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "gridtac.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Print stored games and the win summary
    History,

    /// Print a stored game move by move
    Replay {
        /// Identifier of the stored game
        game_id: GameId,
    },

    /// Delete every stored game
    ClearHistory,

    /// Apply pending database migrations
    Migrate,
}
