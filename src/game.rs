use anyhow::{anyhow, Result};

use crate::piece::{line_wins, Piece};
use crate::{BOARD_SIZE, NUM_PIECES};

/// The 16 cells of the board, stored row-major
pub type Board = [Option<Piece>; BOARD_SIZE];

/// The cells of the 10 winning lines: 4 rows, 4 columns and both diagonals
pub const LINES: [[usize; 4]; 10] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [8, 9, 10, 11],
    [12, 13, 14, 15],
    [0, 4, 8, 12],
    [1, 5, 9, 13],
    [2, 6, 10, 14],
    [3, 7, 11, 15],
    [0, 5, 10, 15],
    [3, 6, 9, 12],
];

/// An ordered list of at most 16 pieces that never allocates
#[derive(Copy, Clone, Debug)]
pub struct PieceList {
    pieces: [Piece; NUM_PIECES],
    len: usize,
}

impl PieceList {
    pub fn new() -> Self {
        Self {
            pieces: [Piece::new(0); NUM_PIECES],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Piece] {
        &self.pieces[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Piece> {
        self.as_slice().iter()
    }

    pub fn contains(&self, piece: Piece) -> bool {
        self.as_slice().contains(&piece)
    }

    pub fn first(&self) -> Option<Piece> {
        self.as_slice().first().copied()
    }

    pub fn push(&mut self, piece: Piece) {
        self.pieces[self.len] = piece;
        self.len += 1;
    }

    /// Removes `piece`, shifting the pieces behind it forward
    ///
    /// Returns false if the piece was not in the list
    pub fn remove(&mut self, piece: Piece) -> bool {
        match self.as_slice().iter().position(|&p| p == piece) {
            Some(index) => {
                self.pieces.copy_within(index + 1..self.len, index);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Applies `f` to every piece in place
    pub fn map_in_place<F: Fn(Piece) -> Piece>(&mut self, f: F) {
        for piece in self.pieces[..self.len].iter_mut() {
            *piece = f(*piece);
        }
    }
}

impl PartialEq for PieceList {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for PieceList {}

impl Default for PieceList {
    fn default() -> Self {
        Self::new()
    }
}

/// The full state of a Quarto game
///
/// Every piece lives in exactly one of three places: on the board, in the
/// `selected` list (handed over and waiting to be placed) or in the
/// `available` list. The mutators come in inverse pairs, `select`/`deselect`
/// and `place`/`remove`, so a search can walk the game tree in place and
/// restore the state on the way back up.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) selected: PieceList,
    pub(crate) available: PieceList,
    num_placed: usize,
}

impl GameState {
    /// Creates an empty board with every piece available
    pub fn new() -> Self {
        let mut available = PieceList::new();
        for &piece in Piece::ALL.iter() {
            available.push(piece);
        }
        Self {
            board: [None; BOARD_SIZE],
            selected: PieceList::new(),
            available,
            num_placed: 0,
        }
    }

    /// Creates a game from a board, nothing selected and every piece not on
    /// the board available
    pub fn from_board(board: Board) -> Self {
        let mut on_board = [false; NUM_PIECES];
        let mut num_placed = 0;
        for piece in board.iter().flatten() {
            on_board[piece.index()] = true;
            num_placed += 1;
        }

        let mut available = PieceList::new();
        for &piece in Piece::ALL.iter() {
            if !on_board[piece.index()] {
                available.push(piece);
            }
        }

        Self {
            board,
            selected: PieceList::new(),
            available,
            num_placed,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn selected(&self) -> &[Piece] {
        self.selected.as_slice()
    }

    pub fn available(&self) -> &[Piece] {
        self.available.as_slice()
    }

    pub fn num_placed(&self) -> usize {
        self.num_placed
    }

    pub fn num_selected(&self) -> usize {
        self.selected.len()
    }

    pub fn num_available(&self) -> usize {
        self.available.len()
    }

    /// The empty cells in index order
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.board
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
    }

    /// Moves `piece` from the available pieces to the end of the selected pieces
    ///
    /// The piece must be available.
    pub fn select(&mut self, piece: Piece) {
        let removed = self.available.remove(piece);
        debug_assert!(removed, "selected piece {} is not available", piece);
        if removed {
            self.selected.push(piece);
        }
    }

    /// Returns a selected piece to the available pieces
    pub fn deselect(&mut self, piece: Piece) {
        let removed = self.selected.remove(piece);
        debug_assert!(removed, "deselected piece {} is not selected", piece);
        if removed {
            self.available.push(piece);
        }
    }

    /// Places a selected piece on an empty cell
    ///
    /// The cell must be empty, see [`place_checked`] for a checked version.
    ///
    /// [`place_checked`]: #method.place_checked
    pub fn place(&mut self, piece: Piece, cell: usize) {
        debug_assert!(self.board[cell].is_none(), "cell {} is occupied", cell);
        self.board[cell] = Some(piece);
        self.selected.remove(piece);
        self.num_placed += 1;
    }

    /// Places a selected piece, rejecting the move and leaving the game
    /// untouched if the cell is taken or the piece was never selected
    pub fn place_checked(&mut self, piece: Piece, cell: usize) -> Result<()> {
        if cell >= BOARD_SIZE {
            return Err(anyhow!(
                "Invalid cell {}, cells must be between 0 and {}",
                cell,
                BOARD_SIZE - 1
            ));
        }
        if let Some(occupant) = self.board[cell] {
            return Err(anyhow!(
                "Cannot place piece {} on cell {}, already holding {}",
                piece,
                cell,
                occupant
            ));
        }
        if !self.selected.contains(piece) {
            return Err(anyhow!("Cannot place piece {}, it is not selected", piece));
        }
        self.place(piece, cell);
        Ok(())
    }

    /// Takes a piece back off the board into the selected pieces, undoing [`place`]
    ///
    /// [`place`]: #method.place
    pub fn remove(&mut self, piece: Piece, cell: usize) {
        self.board[cell] = None;
        self.selected.push(piece);
        self.num_placed -= 1;
    }

    /// Checks all 10 lines for a Quarto
    pub fn check_win(&self) -> bool {
        LINES.iter().any(|line| {
            line_wins([
                self.board[line[0]],
                self.board[line[1]],
                self.board[line[2]],
                self.board[line[3]],
            ])
        })
    }

    /// Relabels the selected and available pieces by XOR with `pivot`
    ///
    /// The board is left alone; pair this with a board that was normalized
    /// by the same pivot.
    pub fn xor_pieces(&mut self, pivot: Piece) {
        self.selected.map_in_place(|piece| piece.xor(pivot));
        self.available.map_in_place(|piece| piece.xor(pivot));
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
