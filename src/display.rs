use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::fmt;
use std::io::{stdout, Write};

use crate::game::GameState;
use crate::piece::Piece;

const ROW_SEPARATOR: &str = "----|----|----|----";

fn write_pieces(f: &mut fmt::Formatter<'_>, label: &str, pieces: &[Piece]) -> fmt::Result {
    let pieces: Vec<String> = pieces.iter().map(|piece| piece.to_string()).collect();
    writeln!(f, "{}: {}", label, pieces.join(", "))
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.board.chunks(4).enumerate() {
            if row > 0 {
                writeln!(f, "{}", ROW_SEPARATOR)?;
            }
            let cells: Vec<String> = cells
                .iter()
                .map(|cell| match cell {
                    Some(piece) => piece.to_string(),
                    None => "    ".to_string(),
                })
                .collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        write_pieces(f, "Selected", self.selected())?;
        write_pieces(f, "Available", self.available())
    }
}

impl GameState {
    /// Draws the board to stdout, highlighting the attributes set on each piece
    pub fn display(&self) -> Result<()> {
        let mut stdout = stdout();

        for (idx, cell) in self.board.iter().enumerate() {
            if idx > 0 && idx % 4 == 0 {
                stdout.queue(PrintStyledContent(style(format!("\n{}\n", ROW_SEPARATOR))))?;
            } else if idx % 4 != 0 {
                stdout.queue(PrintStyledContent(style("|".to_string())))?;
            }

            match cell {
                Some(piece) => {
                    for attribute in (0..4).rev() {
                        let bit = if piece.has(attribute) { "1" } else { "0" };
                        stdout.queue(PrintStyledContent(
                            style(bit.to_string())
                                .attribute(Attribute::Bold)
                                .with(if piece.has(attribute) {
                                    Color::Yellow
                                } else {
                                    Color::DarkBlue
                                }),
                        ))?;
                    }
                }
                None => {
                    stdout.queue(PrintStyledContent(style("    ".to_string())))?;
                }
            }
        }
        stdout.queue(PrintStyledContent(style("\n".to_string())))?;

        for (label, pieces) in [("Selected", self.selected()), ("Available", self.available())].iter() {
            let pieces: Vec<String> = pieces.iter().map(|piece| piece.to_string()).collect();
            stdout.queue(PrintStyledContent(
                style(format!("{}: ", label)).attribute(Attribute::Bold),
            ))?;
            stdout.queue(PrintStyledContent(style(pieces.join(", ") + "\n")))?;
        }
        stdout.flush()?;
        Ok(())
    }
}
