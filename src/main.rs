use anyhow::Result;
use clap::Parser;
use gambit::board::Color;
use gambit::console::Console;
use gambit::search::{Difficulty, Search};
use std::io;
use tracing_subscriber::EnvFilter;

/// Play chess against a minimax opponent from the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Engine strength: 1 (easy), 2 (medium) or 3 (hard).
    #[arg(short, long, default_value = "2")]
    difficulty: Difficulty,

    /// The color you play.
    #[arg(short, long, default_value = "white")]
    color: Color,

    /// Seed for the engine's random choices.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Let the engine play both sides and print the game.
    #[arg(long, default_value = "false")]
    self_play: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let search = match args.seed {
        Some(seed) => Search::seeded(args.difficulty, seed),
        None => Search::new(args.difficulty),
    };
    let mut console = Console::new(search, args.color);

    if args.self_play {
        console.play_out(&mut io::stdout())
    } else {
        console.run()
    }
}
