//! Gridtac - unified CLI
//!
//! Serves the game over HTTP and inspects the stored history.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use gridtac::cli::{Cli, Command};
use gridtac::{GameId, GameRepository, GameStore, GridtacConfig, PlaySettings, SessionManager};
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gridtac=debug")),
        )
        .init();

    let cli = Cli::parse();
    let config = GridtacConfig::load(&cli.config)?;

    match cli.command {
        Command::Serve { port, host } => run_http_server(config, host, port).await,
        Command::History => print_history(&config),
        Command::Replay { game_id } => print_replay(&config, game_id),
        Command::ClearHistory => clear_history(&config),
        Command::Migrate => migrate(&config),
    }
}

fn open_manager(config: &GridtacConfig) -> Result<SessionManager> {
    let repository = GameRepository::open(config.database_url().clone())?;
    let store: Arc<dyn GameStore> = Arc::new(repository);
    Ok(SessionManager::new(store, PlaySettings::from(config)))
}

/// Run the HTTP game server
#[instrument(skip(config))]
async fn run_http_server(config: GridtacConfig, host: String, port: u16) -> Result<()> {
    let manager = open_manager(&config)?;
    let app = gridtac::router(manager);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!(
        address = %listener.local_addr()?,
        database = %config.database_url(),
        depth = config.search_depth(),
        heuristic = %config.heuristic(),
        "Server ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[instrument(skip(config))]
fn print_history(config: &GridtacConfig) -> Result<()> {
    let history = open_manager(config)?.history()?;
    let summary = history.summary;
    println!(
        "{} games ({} completed): X {} | O {} | draws {}",
        summary.total_games(),
        summary.completed(),
        summary.x_wins(),
        summary.o_wins(),
        summary.draws()
    );
    for game in &history.games {
        let winner = game
            .winner()
            .map_or_else(|| "in progress".to_string(), |outcome| outcome.to_string());
        println!(
            "#{:<5} {}x{}  {:>2} moves  {:<11}  {}",
            game.id(),
            game.size(),
            game.size(),
            game.moves().len(),
            winner,
            game.created_at()
        );
    }
    Ok(())
}

#[instrument(skip(config))]
fn print_replay(config: &GridtacConfig, game_id: GameId) -> Result<()> {
    let replay = open_manager(config)?.replay(game_id)?;
    for (mv, frame) in replay.moves.iter().zip(replay.frames.iter().skip(1)) {
        println!("{}", mv);
        for row in frame {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| cell.map_or_else(|| ".".to_string(), |mark| mark.to_string()))
                .collect();
            println!("  {}", cells.join(" "));
        }
    }
    match replay.winner {
        Some(outcome) => println!("Result: {}", outcome),
        None => println!("Result: in progress"),
    }
    Ok(())
}

#[instrument(skip(config))]
fn clear_history(config: &GridtacConfig) -> Result<()> {
    open_manager(config)?.clear_history()?;
    println!("History cleared");
    Ok(())
}

#[instrument(skip(config))]
fn migrate(config: &GridtacConfig) -> Result<()> {
    let repository = GameRepository::new(config.database_url().clone())?;
    let applied = repository.run_migrations()?;
    println!("Applied {} migration(s) to {}", applied, repository.db_path());
    Ok(())
}
