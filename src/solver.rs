//! An agent to exhaustively solve Quarto positions

use anyhow::{anyhow, Result};

use crate::{game::*, piece::Piece, BOARD_SIZE, MAX_LINE, SCORE_BASE, SYMBOL_BASE};

/// The score of a position from the point of view of the player to move
pub type Score = i32;

/// The player to move can force a win
pub const WIN: Score = 1;
/// Neither player can force a win
pub const DRAW: Score = 0;
/// The opponent can force a win
pub const LOSS: Score = -1;
/// The position could not be searched, see [`Solution::is_malformed`]
///
/// [`Solution::is_malformed`]: struct.Solution.html#method.is_malformed
pub const MALFORMED: Score = -2;

/// The line written in place of a solution for a malformed position
pub const MALFORMED_LINE: &str = "XxX";

/// Maps a cell index to the column-major index used in solution lines
///
/// The mapping is its own inverse.
pub const fn transpose_cell(cell: usize) -> usize {
    ((cell % 4) << 2) + (cell / 4)
}

/// The result of a solve
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Solution {
    pub score: Score,
    /// One symbol per ply of the optimal line followed by the score symbol
    pub line: String,
}

impl Solution {
    /// True if the search found no legal continuation, which only happens
    /// for impossible positions
    pub fn is_malformed(&self) -> bool {
        self.score == MALFORMED
    }
}

/// A single step of a solution line
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Ply {
    /// Hand a piece to the opponent
    Select(Piece),
    /// Place the piece in hand on a cell
    Place(usize),
    /// The final score of the line
    Score(Score),
}

/// Decodes a solution line into its plies
///
/// `placing` tells whether the line starts by placing a piece (a piece was
/// selected in the solved position) or by selecting one.
pub fn decode_line(line: &str, mut placing: bool) -> Result<Vec<Ply>> {
    if line == MALFORMED_LINE {
        return Err(anyhow!("the position was malformed and has no solution"));
    }
    let bytes = line.as_bytes();
    let (&score, symbols) = bytes
        .split_last()
        .ok_or_else(|| anyhow!("empty solution line"))?;

    let mut plies = Vec::with_capacity(bytes.len());
    for &symbol in symbols {
        let value = symbol
            .checked_sub(SYMBOL_BASE)
            .map(|value| value as usize)
            .filter(|&value| value < BOARD_SIZE)
            .ok_or_else(|| anyhow!("invalid symbol '{}' in line '{}'", symbol as char, line))?;
        plies.push(if placing {
            Ply::Place(transpose_cell(value))
        } else {
            Ply::Select(Piece::new(value as u8))
        });
        placing = !placing;
    }

    match score as i32 - SCORE_BASE as i32 {
        score @ LOSS..=WIN => plies.push(Ply::Score(score)),
        _ => return Err(anyhow!("invalid score symbol '{}' in line '{}'", score as char, line)),
    }
    Ok(plies)
}

/// An agent to solve Quarto positions
///
/// # Notes
/// The search alternates between two phases. When placing, every empty cell
/// is tried for the piece in hand; when selecting, every available piece is
/// handed to the opponent. There is no pruning beyond stopping at the first
/// move proven to win, so the search is exhaustive and its result exact.
///
/// # Position Scoring
/// A line that ends in a Quarto scores 1 for the player who completed it,
/// a full board without a Quarto scores 0. Placing a piece keeps the point
/// of view, handing a piece over negates the score of the opponent's reply.
///
/// # Solution Lines
/// Every ply writes one symbol at its depth: a placement writes the
/// [transposed](fn.transpose_cell.html) cell plus 64, a selection writes
/// the piece id plus 64. The final symbol is the score plus 49.
#[derive(Clone)]
pub struct Solver {
    game: GameState,

    /// The number of nodes searched by this `Solver` so far (for diagnostics only)
    pub node_count: usize,
    line: [u8; MAX_LINE],
}

impl Solver {
    /// Creates a new `Solver` for a game
    pub fn new(game: GameState) -> Self {
        Self {
            game,
            node_count: 0,
            line: [0; MAX_LINE],
        }
    }

    /// Solves the position, starting with a placement if a piece is selected
    pub fn solve(&mut self) -> Solution {
        let placing = self.game.num_selected() > 0;
        let (score, end) = self.negamax(0, placing);

        let line = if score == MALFORMED {
            MALFORMED_LINE.to_string()
        } else {
            self.line[..end].iter().map(|&symbol| symbol as char).collect()
        };
        Solution { score, line }
    }

    /// Performs game tree search, writing the best line from `depth` onwards
    ///
    /// Returns the score of the position and the end of the written line
    fn negamax(&mut self, depth: usize, placing: bool) -> (Score, usize) {
        self.node_count += 1;

        // the player who just moved completed a line
        if self.game.check_win() {
            self.line[depth] = (WIN + SCORE_BASE as i32) as u8;
            return (WIN, depth + 1);
        }
        // full board without a winner
        if self.game.num_placed() >= BOARD_SIZE {
            self.line[depth] = (DRAW + SCORE_BASE as i32) as u8;
            return (DRAW, depth + 1);
        }

        if placing {
            self.place_piece(depth)
        } else {
            self.select_piece(depth)
        }
    }

    fn place_piece(&mut self, depth: usize) -> (Score, usize) {
        let piece = match self.game.selected.first() {
            Some(piece) => piece,
            None => return (MALFORMED, depth),
        };

        let mut cells = [0; BOARD_SIZE];
        let mut num_cells = 0;
        for cell in self.game.empty_cells() {
            cells[num_cells] = cell;
            num_cells += 1;
        }

        let mut best = Continuation::new();
        for &cell in cells[..num_cells].iter() {
            self.game.place(piece, cell);
            let (score, end) = self.negamax(depth + 1, false);
            self.game.remove(piece, cell);

            if score == MALFORMED {
                return (MALFORMED, depth);
            }
            if score > best.score {
                best.update(score, transpose_cell(cell), &self.line[depth + 1..end]);
            }
            // nothing beats a forced win
            if best.score == WIN {
                break;
            }
        }

        best.write(&mut self.line, depth)
    }

    fn select_piece(&mut self, depth: usize) -> (Score, usize) {
        // select and deselect reorder the available pieces
        let candidates = self.game.available;

        let mut best = Continuation::new();
        for &piece in candidates.iter() {
            self.game.select(piece);
            let (score, end) = self.negamax(depth + 1, true);
            self.game.deselect(piece);

            if score == MALFORMED {
                return (MALFORMED, depth);
            }
            // the opponent places the piece we hand over
            let score = -score;
            if score > best.score {
                best.update(score, piece.index(), &self.line[depth + 1..end]);
            }
            if best.score == WIN {
                break;
            }
        }

        best.write(&mut self.line, depth)
    }
}

/// The best move seen at one node and the line that follows it
struct Continuation {
    score: Score,
    symbol: usize,
    line: [u8; MAX_LINE],
    len: usize,
}

impl Continuation {
    fn new() -> Self {
        Self {
            score: MALFORMED,
            symbol: 0,
            line: [0; MAX_LINE],
            len: 0,
        }
    }

    fn update(&mut self, score: Score, symbol: usize, line: &[u8]) {
        self.score = score;
        self.symbol = symbol;
        self.len = line.len();
        self.line[..line.len()].copy_from_slice(line);
    }

    /// Splices the move and its line into `line` at `depth`
    fn write(&self, line: &mut [u8; MAX_LINE], depth: usize) -> (Score, usize) {
        // no candidate at all, only possible for impossible positions
        if self.score < LOSS {
            return (MALFORMED, depth);
        }
        line[depth] = SYMBOL_BASE + self.symbol as u8;
        line[depth + 1..depth + 1 + self.len].copy_from_slice(&self.line[..self.len]);
        (self.score, depth + 1 + self.len)
    }
}

impl std::ops::Deref for Solver {
    type Target = GameState;

    fn deref(&self) -> &Self::Target {
        &self.game
    }
}
