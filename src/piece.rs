use std::fmt;

use crate::NUM_PIECES;

/// The number of binary attributes carried by every piece
pub const NUM_ATTRIBUTES: usize = 4;

const ALL_ATTRIBUTES: u8 = (1 << NUM_ATTRIBUTES) - 1;

/// A Quarto piece
///
/// The id of a piece is its attribute vector: bit `n` set means the piece
/// carries attribute `n` (tall, dark, square, hollow or whatever labels the
/// physical set uses). Every id in `0..16` names exactly one piece.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Piece(u8);

impl Piece {
    /// Every piece in id order
    pub const ALL: [Piece; NUM_PIECES] = {
        let mut all = [Piece(0); NUM_PIECES];
        let mut i = 0;
        while i < NUM_PIECES {
            all[i] = Piece(i as u8);
            i += 1;
        }
        all
    };

    pub const fn new(id: u8) -> Self {
        Self(id & ALL_ATTRIBUTES)
    }

    pub fn from_id(id: usize) -> Option<Self> {
        if id < NUM_PIECES {
            Some(Self(id as u8))
        } else {
            None
        }
    }

    pub const fn id(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn attributes(self) -> u8 {
        self.0
    }

    pub const fn has(self, attribute: usize) -> bool {
        self.0 & (1 << attribute) != 0
    }

    /// Relabels the piece by flipping every attribute set in `pivot`
    pub const fn xor(self, pivot: Piece) -> Self {
        Self(self.0 ^ pivot.0)
    }

    /// Exchanges the meaning of two attribute positions
    pub const fn swap_attributes(self, a: usize, b: usize) -> Self {
        let mask = (1 << a) | (1 << b);
        let masked = self.0 & mask;
        if masked == 0 || masked == mask {
            self
        } else {
            Self(self.0 ^ mask)
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.0)
    }
}

/// Checks a line of four cells for a Quarto
///
/// A full line wins when at least one attribute is uniform across all four
/// pieces, either set on every piece or set on none of them.
#[inline]
pub fn line_wins(line: [Option<Piece>; 4]) -> bool {
    let mut and = ALL_ATTRIBUTES;
    let mut or = 0;
    for cell in line.iter() {
        match cell {
            Some(piece) => {
                and &= piece.0;
                or |= piece.0;
            }
            None => return false,
        }
    }
    and != 0 || or != ALL_ATTRIBUTES
}
