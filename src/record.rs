//! Fixed-size position records and the `hash,solution` line format

use anyhow::{anyhow, Context, Result};
use byteorder::{BigEndian, ByteOrder};

use std::fmt;
use std::str::FromStr;

use crate::game::{Board, GameState};
use crate::piece::Piece;
use crate::{BOARD_SIZE, RECORD_SIZE};

const PIECES_BYTES: usize = 8;

/// A board packed into 10 bytes
///
/// Bytes `0..8` hold the pieces of the occupied cells as a big-endian
/// integer of 4 bit nibbles, lowest occupied cell most significant. Bytes
/// `8..10` hold the big-endian occupancy mask, where bit `15 - i` is set when
/// cell `i` holds a piece.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Record([u8; RECORD_SIZE]);

impl Record {
    pub fn from_bytes(bytes: [u8; RECORD_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; RECORD_SIZE] {
        &self.0
    }

    /// Packs the decimal `hash` of a record file line, most significant byte first
    pub fn from_hash(hash: u128) -> Result<Self> {
        if hash >> (8 * RECORD_SIZE) != 0 {
            return Err(anyhow!("hash {} does not fit in {} bytes", hash, RECORD_SIZE));
        }
        let mut bytes = [0; RECORD_SIZE];
        bytes.copy_from_slice(&hash.to_be_bytes()[16 - RECORD_SIZE..]);
        Ok(Self(bytes))
    }

    pub fn hash(&self) -> u128 {
        let mut bytes = [0; 16];
        bytes[16 - RECORD_SIZE..].copy_from_slice(&self.0);
        u128::from_be_bytes(bytes)
    }

    pub fn from_board(board: &Board) -> Self {
        let mut pieces = 0u64;
        let mut occupied = 0u16;
        for (cell, piece) in board.iter().enumerate() {
            if let Some(piece) = piece {
                pieces = (pieces << 4) | piece.id() as u64;
                occupied |= 1 << (BOARD_SIZE - 1 - cell);
            }
        }

        let mut bytes = [0; RECORD_SIZE];
        BigEndian::write_u64(&mut bytes[..PIECES_BYTES], pieces);
        BigEndian::write_u16(&mut bytes[PIECES_BYTES..], occupied);
        Self(bytes)
    }

    /// Unpacks the board, walking the cells from 15 down to 0 and taking one
    /// nibble from the low end of the piece bytes for every occupied cell
    pub fn board(&self) -> Board {
        let mut pieces = BigEndian::read_u64(&self.0[..PIECES_BYTES]);
        let occupied = self.occupancy();

        let mut board = [None; BOARD_SIZE];
        for cell in (0..BOARD_SIZE).rev() {
            if occupied & (1 << (BOARD_SIZE - 1 - cell)) != 0 {
                board[cell] = Some(Piece::new((pieces & 0xF) as u8));
                pieces >>= 4;
            }
        }
        board
    }

    pub fn occupancy(&self) -> u16 {
        BigEndian::read_u16(&self.0[PIECES_BYTES..])
    }

    pub fn num_placed(&self) -> usize {
        self.occupancy().count_ones() as usize
    }

    /// Loads the game for a solve, with no piece selected
    pub fn game(&self) -> GameState {
        GameState::from_board(self.board())
    }
}

impl From<&Board> for Record {
    fn from(board: &Board) -> Self {
        Self::from_board(board)
    }
}

impl FromStr for Record {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let hash = s
            .trim()
            .parse::<u128>()
            .with_context(|| format!("could not parse '{}' as a position hash", s))?;
        Self::from_hash(hash)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash())
    }
}

/// One line of a position file: `<hash>,<solution>` or `<hash>,-`
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Entry {
    pub record: Record,
    pub solution: Option<String>,
}

impl Entry {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            solution: None,
        }
    }
}

impl FromStr for Entry {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut fields = line.trim().splitn(2, ',');
        let record = fields
            .next()
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| anyhow!("invalid position line: '{}'", line))?
            .parse::<Record>()?;
        let solution = match fields.next().map(str::trim) {
            None | Some("") | Some("-") => None,
            Some(solution) => Some(solution.to_string()),
        };
        Ok(Self { record, solution })
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.solution {
            Some(solution) => write!(f, "{},{}", self.record, solution),
            None => write!(f, "{},-", self.record),
        }
    }
}
