use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use std::io::{stdin, stdout, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use quarto_solver::{
    database::PositionDatabase,
    piece::Piece,
    record::Record,
    solver::{decode_line, Ply, Solver, DRAW, LOSS, WIN},
};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Exhaustive solver for the board game Quarto", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a single position and print its optimal line
    Solve {
        /// Position hash, as stored in position files
        hash: Record,
        /// Piece already handed to the player to move
        #[clap(short, long)]
        select: Option<u8>,
    },
    /// Solve every position of a position file
    Batch {
        input: PathBuf,
        output: PathBuf,
        /// Number of lines to skip
        #[clap(short, long, default_value_t = 0)]
        offset: usize,
        /// Maximum number of positions to solve
        #[clap(short, long)]
        count: Option<usize>,
    },
    /// Write every canonical board with the given number of pieces placed
    Explore { depth: usize, output: PathBuf },
    /// Print the canonical form of a position
    Canon {
        hash: Record,
        /// Also normalize the order of the piece attributes
        #[clap(short, long)]
        feature_swaps: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Solve { hash, select } => {
            let mut game = hash.game();
            if let Some(id) = select {
                let piece = Piece::from_id(id as usize)
                    .ok_or_else(|| anyhow!("Invalid piece {}, pieces must be between 0 and 15", id))?;
                if !game.available().contains(&piece) {
                    return Err(anyhow!("Piece {} is already on the board", piece));
                }
                game.select(piece);
            }
            game.display()?;
            println!();

            let placing = game.num_selected() > 0;
            let mut solver = Solver::new(game);
            let start = Instant::now();
            let solution = solver.solve();
            let elapsed = Instant::now() - start;

            if solution.is_malformed() {
                println!("Position is malformed, no solution: {}", solution.line);
                return Ok(());
            }
            match solution.score {
                WIN => println!("The player to move can force a win."),
                DRAW => println!("The player to move can at best force a draw."),
                LOSS => println!("The player to move loses against perfect play."),
                _ => {}
            }
            println!("Solution: {}", solution.line);
            for ply in decode_line(&solution.line, placing)? {
                match ply {
                    Ply::Select(piece) => println!("  select {}", piece),
                    Ply::Place(cell) => println!("  place on cell {}", cell),
                    Ply::Score(score) => println!("  line ends with score {}", score),
                }
            }
            println!(
                "Searched {} positions in {:.3}s",
                solver.node_count,
                elapsed.as_secs_f64()
            );
        }
        Command::Batch {
            input,
            output,
            offset,
            count,
        } => {
            println!("Loading games");
            let mut database = PositionDatabase::load(&input, offset, count)?;
            println!("Loaded {} games!", database.len());
            if !confirm_overwrite(&output)? {
                return Ok(());
            }
            database.solve()?;
            database.save(&output)?;
        }
        Command::Explore { depth, output } => {
            if !confirm_overwrite(&output)? {
                return Ok(());
            }
            let database = PositionDatabase::explore_depth(depth);
            database.save(&output)?;
        }
        Command::Canon {
            hash,
            feature_swaps,
        } => {
            let mut game = hash.game();
            let pivot = game.canonicalize();
            if feature_swaps {
                game.apply_feature_swaps();
            }
            game.display()?;
            match pivot {
                Some(pivot) => println!("Pivot: {}", pivot),
                None => println!("Pivot: none"),
            }
            println!("Canonical hash: {}", Record::from_board(game.board()));
        }
    }
    Ok(())
}

fn confirm_overwrite(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    let stdin = stdin();
    loop {
        let mut buffer = String::new();
        print!("{} already exists, overwrite it? y/n: ", path.display());
        stdout().flush().expect("failed to flush to stdout!");
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some(_letter @ 'y') => return Ok(true),
            Some(_letter @ 'n') => return Ok(false),
            _ => println!("Unknown answer given"),
        }
    }
}
