//! Symmetry canonicalization of boards and games
//!
//! Quarto has 32 geometric symmetries: the 8 symmetries of the square
//! combined with 4 "base structures" that reshuffle rows and columns while
//! keeping every winning line a winning line. Piece labels are symmetric too,
//! since XOR-ing every piece with a constant or exchanging two attribute
//! positions on every piece keeps uniform attributes uniform.

use crate::game::{Board, GameState};
use crate::piece::Piece;
use crate::BOARD_SIZE;

mod static_transforms {
    use crate::BOARD_SIZE;

    pub type Permutation = [u8; BOARD_SIZE];

    const fn swap(mut cells: Permutation, a: &[usize], b: &[usize]) -> Permutation {
        let mut i = 0;
        while i < a.len() {
            let temp = cells[a[i]];
            cells[a[i]] = cells[b[i]];
            cells[b[i]] = temp;
            i += 1;
        }
        cells
    }

    // swaps rows 0<->1 and 2<->3, then columns 0<->1 and 2<->3
    const fn box_rotate(cells: Permutation) -> Permutation {
        swap(
            cells,
            &[0, 1, 2, 3, 8, 9, 10, 11],
            &[5, 4, 7, 6, 13, 12, 15, 14],
        )
    }

    // swaps row 1<->2 and column 1<->2
    const fn inner_rotate(cells: Permutation) -> Permutation {
        swap(cells, &[1, 4, 7, 13, 5, 9], &[2, 8, 11, 14, 10, 6])
    }

    // a quarter turn
    const fn rotate(mut cells: Permutation) -> Permutation {
        let chains = [[0, 12, 15, 3], [4, 13, 11, 2], [8, 14, 7, 1], [5, 9, 10, 6]];
        let mut n = 0;
        while n < chains.len() {
            let chain = chains[n];
            let temp = cells[chain[0]];
            cells[chain[0]] = cells[chain[1]];
            cells[chain[1]] = cells[chain[2]];
            cells[chain[2]] = cells[chain[3]];
            cells[chain[3]] = temp;
            n += 1;
        }
        cells
    }

    const fn vertical_flip(cells: Permutation) -> Permutation {
        swap(
            cells,
            &[0, 1, 2, 3, 4, 5, 6, 7],
            &[12, 13, 14, 15, 8, 9, 10, 11],
        )
    }

    const fn horizontal_flip(cells: Permutation) -> Permutation {
        swap(
            cells,
            &[0, 1, 4, 5, 8, 9, 12, 13],
            &[3, 2, 7, 6, 11, 10, 15, 14],
        )
    }

    const fn transpose(cells: Permutation) -> Permutation {
        swap(cells, &[1, 2, 3, 6, 7, 11], &[4, 8, 12, 9, 13, 14])
    }

    const fn transform(index: usize) -> Permutation {
        let mut cells = [0; BOARD_SIZE];
        let mut i = 0;
        while i < BOARD_SIZE {
            cells[i] = i as u8;
            i += 1;
        }

        cells = match index & 3 {
            1 => box_rotate(cells),
            2 => inner_rotate(cells),
            3 => inner_rotate(box_rotate(cells)),
            _ => cells,
        };
        match index >> 2 {
            1 => rotate(rotate(rotate(cells))),
            2 => rotate(rotate(cells)),
            3 => rotate(cells),
            4 => vertical_flip(cells),
            5 => horizontal_flip(cells),
            6 => transpose(cells),
            7 => vertical_flip(horizontal_flip(transpose(cells))),
            _ => cells,
        }
    }

    /// For every transform, the source cell of each destination cell
    pub const fn transforms() -> [Permutation; 32] {
        let mut all = [[0; BOARD_SIZE]; 32];
        let mut i = 0;
        while i < 32 {
            all[i] = transform(i);
            i += 1;
        }
        all
    }
}

const TRANSFORMS: [static_transforms::Permutation; 32] = static_transforms::transforms();

/// One of the 32 geometric symmetries of the board
///
/// The low two bits of the index pick the base structure (identity,
/// box rotation, inner rotation, or both), the upper three bits pick the
/// dihedral element (identity, three rotations, vertical flip, horizontal
/// flip, transpose, anti-transpose).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Transform(usize);

impl Transform {
    pub const COUNT: usize = 32;

    pub fn new(index: usize) -> Self {
        Self(index % Self::COUNT)
    }

    pub fn all() -> impl Iterator<Item = Transform> {
        (0..Self::COUNT).map(Transform)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn base_structure(self) -> usize {
        self.0 & 3
    }

    pub fn dihedral(self) -> usize {
        self.0 >> 2
    }

    /// Returns the transformed copy of `board`
    pub fn apply(self, board: &Board) -> Board {
        let permutation = &TRANSFORMS[self.0];
        let mut out = [None; BOARD_SIZE];
        for (cell, &source) in out.iter_mut().zip(permutation.iter()) {
            *cell = board[source as usize];
        }
        out
    }
}

// a pivot on cell 0 always beats a pivot on cell 1
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
enum Candidate {
    PivotOnFirstCell,
    PivotOnSecondCell,
}

fn candidate(board: &Board) -> Option<(Candidate, Piece)> {
    match (board[0], board[1]) {
        (Some(pivot), _) => Some((Candidate::PivotOnFirstCell, pivot)),
        (None, Some(pivot)) => Some((Candidate::PivotOnSecondCell, pivot)),
        (None, None) => None,
    }
}

/// XORs every piece on the board with `pivot`
pub fn board_xor(board: &mut Board, pivot: Piece) {
    for piece in board.iter_mut().flatten() {
        *piece = piece.xor(pivot);
    }
}

/// Packs cells 1..16 into nibbles, cell 1 in the lowest nibble
///
/// Cell 0 is skipped as it holds the pivot after normalization. Empty cells
/// count as zero, which is unambiguous on a normalized board since the only
/// zero piece is the pivot itself.
pub fn canonical_hash(board: &Board) -> u64 {
    board
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(cell, piece)| piece.map(|piece| (piece.id() as u64) << (4 * (cell - 1))))
        .sum()
}

/// Rewrites `board` as the canonical representative of its symmetry class
///
/// Every transform that puts a piece on cell 0 (or, failing that, on cell 1)
/// is normalized by XOR with that pivot piece, and the normalized board with
/// the smallest [`canonical_hash`] wins, earliest transform first on ties.
/// Returns the pivot, or `None` when the board is empty and left untouched.
pub fn canonicalize(board: &mut Board) -> Option<Piece> {
    let mut best: Option<(Candidate, u64, Piece, Board)> = None;

    for transform in Transform::all() {
        let mut scratch = transform.apply(board);
        let (kind, pivot) = match candidate(&scratch) {
            Some(candidate) => candidate,
            None => continue,
        };
        if let Some((best_kind, ..)) = best {
            if kind > best_kind {
                continue;
            }
        }

        board_xor(&mut scratch, pivot);
        let hash = canonical_hash(&scratch);

        let better = match best {
            None => true,
            Some((best_kind, best_hash, ..)) => (kind, hash) < (best_kind, best_hash),
        };
        if better {
            best = Some((kind, hash, pivot, scratch));
        }
    }

    best.map(|(_, _, pivot, canonical)| {
        *board = canonical;
        pivot
    })
}

impl GameState {
    /// Canonicalizes the board and relabels the selected and available
    /// pieces with the same pivot, keeping the game equivalent
    pub fn canonicalize(&mut self) -> Option<Piece> {
        let pivot = canonicalize(&mut self.board);
        if let Some(pivot) = pivot {
            self.xor_pieces(pivot);
        }
        pivot
    }

    /// Exchanges attribute positions `a` and `b` on every piece in the game
    pub fn swap_attributes(&mut self, a: usize, b: usize) {
        for piece in self.board.iter_mut().flatten() {
            *piece = piece.swap_attributes(a, b);
        }
        self.selected.map_in_place(|piece| piece.swap_attributes(a, b));
        self.available.map_in_place(|piece| piece.swap_attributes(a, b));
    }

    /// Moves an attribute into position `bit_pos`
    ///
    /// The first piece on the board (in cell order) with exactly `thresh`
    /// attributes at positions `bit_pos` and above decides the swap: its
    /// lowest such attribute is exchanged with `bit_pos` everywhere. Returns
    /// false if no piece qualifies, true if the piece was found, whether or
    /// not a swap was needed.
    pub fn feature_bit_swap(&mut self, bit_pos: usize, thresh: u32) -> bool {
        let position_mask: u8 = (0xF << bit_pos) & 0xF;
        let distinguishing = self
            .board
            .iter()
            .flatten()
            .map(|piece| piece.attributes() & position_mask)
            .find(|&masked| masked != 0 && masked.count_ones() == thresh);

        match distinguishing {
            None => false,
            Some(masked) => {
                let lowest = masked.trailing_zeros() as usize;
                if lowest != bit_pos {
                    self.swap_attributes(lowest, bit_pos);
                }
                true
            }
        }
    }

    /// Normalizes the order of attribute positions with a fixed cascade of
    /// [`feature_bit_swap`] calls
    ///
    /// The order of the cascade decides which representative is produced,
    /// so it has to stay stable for stored positions to remain comparable.
    ///
    /// [`feature_bit_swap`]: #method.feature_bit_swap
    pub fn apply_feature_swaps(&mut self) {
        if self.feature_bit_swap(0, 1) {
            if self.feature_bit_swap(1, 1) {
                self.feature_bit_swap(2, 1);
            } else if self.feature_bit_swap(1, 2) {
                self.feature_bit_swap(2, 3);
            }
        } else if self.feature_bit_swap(0, 2) || self.feature_bit_swap(0, 3) {
            self.feature_bit_swap(1, 2);
            self.feature_bit_swap(2, 1);
        }
    }
}

