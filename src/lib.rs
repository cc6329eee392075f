//! An exhaustive solver for the board game 'Quarto'
//!
//! This agent walks the complete game tree of a position, alternating
//! between handing a piece to the opponent and placing the piece it was
//! handed, to find the game-theoretic outcome and an optimal line of play.
//! Positions are collapsed under the 32 board symmetries and piece
//! relabelings before they are stored, which keeps position databases small.
//!
//! # Basic Usage
//!
//! ```
//! use quarto_solver::{game::GameState, piece::Piece, solver::Solver};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let mut game = GameState::new();
//! // three tall pieces on the top row, a fourth tall piece in hand
//! for (cell, piece) in [(0, 8), (1, 9), (2, 10)].iter() {
//!     game.select(Piece::new(*piece));
//!     game.place_checked(Piece::new(*piece), *cell)?;
//! }
//! game.select(Piece::new(11));
//!
//! let solution = Solver::new(game).solve();
//! assert_eq!(solution.score, 1);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod piece;

pub mod game;

pub mod record;

pub mod canonical;

pub mod solver;

pub mod database;

pub mod display;

mod test;

/// The number of cells on the board
pub const BOARD_SIZE: usize = 16;

/// The number of distinct pieces
pub const NUM_PIECES: usize = 16;

/// The number of bytes in an encoded position
pub const RECORD_SIZE: usize = 10;

/// The number of bytes reserved for one solution at the batch boundary,
/// including the NUL terminator
pub const SOLUTION_SIZE: usize = 24;

/// The longest possible solution line: one symbol per ply from an empty
/// board (a selection and a placement per piece) plus the score symbol
pub const MAX_LINE: usize = 2 * BOARD_SIZE + 1;

/// Offset added to cell and piece symbols in a solution line
pub const SYMBOL_BASE: u8 = 64;

/// Offset added to the score symbol in a solution line
pub const SCORE_BASE: u8 = 49;

// every piece id is a 4-bit attribute vector
const_assert!(NUM_PIECES == 1 << 4);
// one piece for every cell
const_assert_eq!(BOARD_SIZE, NUM_PIECES);
// nibble-packed pieces and a 16 bit occupancy mask
const_assert!(RECORD_SIZE * 8 == NUM_PIECES * 4 + BOARD_SIZE);
// symbols must stay printable and never collide with the score range
const_assert!(SCORE_BASE as usize + 1 < SYMBOL_BASE as usize);
const_assert!(SYMBOL_BASE as usize + BOARD_SIZE < 127);
