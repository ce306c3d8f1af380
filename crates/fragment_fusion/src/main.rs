//! Fragment Fusion - command-line swap puzzle.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use fragment_fusion::{
    AppConfig, DirectoryImages, LevelProgressStore, ProfileService, PuzzleSession,
    PuzzleSetRepository, RecordStore, SessionError,
};
use fragment_puzzle::{Clock, GridSize, ImageProvider, PuzzleEngine};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(db_path = %config.db_path(), "Starting Fragment Fusion");

    let repository = PuzzleSetRepository::open(config.db_path())?;
    let progress = Arc::new(LevelProgressStore::new(repository));
    progress.seed_if_empty();

    match cli.command {
        Command::Levels => {
            print_levels(progress.as_ref());
            Ok(())
        }
        Command::Stats => {
            print_stats(&profile(&progress, &config));
            Ok(())
        }
        Command::Play { level } => run_level(progress, &config, level).await,
        Command::Custom { image, grid } => {
            let grid = match grid {
                Some(side) => GridSize::new(side)?,
                None => config.custom_grid()?,
            };
            let bytes = std::fs::read(&image)
                .with_context(|| format!("Failed to read {}", image.display()))?;
            run_custom(progress, &config, &bytes, grid).await
        }
        Command::Reset => {
            let levels = profile(&progress, &config).reset_progress();
            println!("Progress reset ({} levels).", levels.len());
            Ok(())
        }
        Command::DeleteAccount => {
            let removed = profile(&progress, &config).delete_account();
            println!(
                "Account deleted{}.",
                if removed { " and profile image removed" } else { "" }
            );
            Ok(())
        }
    }
}

/// Loads the config file and applies command-line overrides.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(&cli.config)?;
    if let Some(db_path) = &cli.db_path {
        config = config.with_db_path(db_path.clone());
    }
    if let Some(assets_dir) = &cli.assets_dir {
        config = config.with_assets_dir(assets_dir.clone());
    }
    config.validate()?;
    Ok(config)
}

fn profile<S: RecordStore>(
    progress: &Arc<LevelProgressStore<S>>,
    config: &AppConfig,
) -> ProfileService<S> {
    ProfileService::new(Arc::clone(progress), config.profile_image_path().clone())
}

fn print_levels<S: RecordStore>(progress: &LevelProgressStore<S>) {
    for row in progress.summaries() {
        println!(
            "{:>2}. {:<6} {:>2} pieces  best {:<6} {}",
            row.number(),
            row.difficulty(),
            row.pieces(),
            row.best_time().as_deref().unwrap_or("--:--"),
            if *row.playable() { "" } else { "(locked)" }
        );
    }
}

fn print_stats<S: RecordStore>(profile: &ProfileService<S>) {
    let summary = profile.summary();
    println!("Score:             {}", summary.score());
    println!("Completed levels:  {}", summary.completed());
    println!("Average best time: {}", summary.average_best_time());
}

#[instrument(skip(progress, config))]
async fn run_level<S: RecordStore>(
    progress: Arc<LevelProgressStore<S>>,
    config: &AppConfig,
    number: usize,
) -> Result<()> {
    let images = DirectoryImages::new(config.assets_dir());
    let mut session = PuzzleSession::new(progress, images, config.session_config()?);
    let level = session.open_level(number)?;
    println!(
        "Level {} ({}, {}x{}). Enter a tile index, 'r' to reset the timer, 'q' to quit.",
        number,
        level.difficulty(),
        level.cell_count(),
        level.cell_count()
    );
    play(&mut session).await
}

#[instrument(skip(progress, config, bytes))]
async fn run_custom<S: RecordStore>(
    progress: Arc<LevelProgressStore<S>>,
    config: &AppConfig,
    bytes: &[u8],
    grid: GridSize,
) -> Result<()> {
    let images = DirectoryImages::new(config.assets_dir());
    let mut session = PuzzleSession::new(progress, images, config.session_config()?);
    session.open_custom(bytes, grid)?;
    println!("Custom puzzle {grid}. Enter a tile index, 'r' to reset the timer, 'q' to quit.");
    play(&mut session).await
}

/// Reads commands from stdin until the puzzle is solved or the player quits.
async fn play<S, P, C>(session: &mut PuzzleSession<S, P, C>) -> Result<()>
where
    S: RecordStore,
    P: ImageProvider,
    C: Clock + Clone + 'static,
{
    print_board(session.engine());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "q" => {
                session.exit();
                println!("Bye.");
                return Ok(());
            }
            "r" => {
                session.reset_timer();
                println!("Timer reset.");
            }
            _ => {
                let Ok(index) = input.parse::<usize>() else {
                    warn!(input, "Not a tile index");
                    println!("Enter a tile index, 'r' or 'q'.");
                    continue;
                };
                match session.tap(index) {
                    Ok(report) if *report.solved() => {
                        print_board(session.engine());
                        println!("Solved in {}!", session.elapsed_formatted());
                        if let Some(update) = report.completion() {
                            println!(
                                "Best time: {}s. Unlocked {}.",
                                update.best_time(),
                                update.unlocked()
                            );
                        }
                        return Ok(());
                    }
                    Ok(report) => debug!(effect = ?report.effect(), "Tap applied"),
                    Err(SessionError::Tap(e)) => println!("{e}"),
                    Err(e) => return Err(e.into()),
                }
            }
        }
        print_board(session.engine());
        println!("Time: {}", session.elapsed_formatted());
    }

    session.exit();
    Ok(())
}

/// Prints each tile as its reference index; the selected tile is bracketed.
fn print_board<C: Clock>(engine: &PuzzleEngine<C>) {
    let Some(grid) = engine.grid() else {
        return;
    };
    let side = grid.side() as usize;
    for (row, tiles) in engine.tiles().chunks(side).enumerate() {
        let line: Vec<String> = tiles
            .iter()
            .enumerate()
            .map(|(col, tile)| {
                let reference = grid.index_of(tile.origin()).unwrap_or_default();
                if engine.selected() == Some(row * side + col) {
                    format!("[{reference:>2}]")
                } else {
                    format!(" {reference:>2} ")
                }
            })
            .collect();
        println!("{}", line.join(""));
    }
}
