use anyhow::{Context, Result};
use indicatif::*;
use rayon::prelude::*;

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::*;
use std::thread;
use std::time::*;

use crate::record::{Entry, Record};
use crate::solver::{Solution, Solver};
use crate::{game::GameState, piece::Piece, SOLUTION_SIZE};

/// A fixed-size solution slot, as handed back by a batch solve
///
/// A solution is only usable if it is NUL terminated within the slot, longer
/// lines are truncated and read back as missing.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SolutionBuffer([u8; SOLUTION_SIZE]);

impl SolutionBuffer {
    pub fn new() -> Self {
        Self([0; SOLUTION_SIZE])
    }

    pub fn from_bytes(bytes: [u8; SOLUTION_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; SOLUTION_SIZE] {
        &self.0
    }

    pub fn as_str(&self) -> Option<&str> {
        let end = self.0.iter().position(|&byte| byte == 0)?;
        std::str::from_utf8(&self.0[..end]).ok()
    }
}

impl Default for SolutionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Solution> for SolutionBuffer {
    fn from(solution: &Solution) -> Self {
        let line = solution.line.as_bytes();
        let mut buffer = [0; SOLUTION_SIZE];
        // without room for the terminator the slot is filled and left unterminated
        let len = line.len().min(SOLUTION_SIZE);
        buffer[..len].copy_from_slice(&line[..len]);
        Self(buffer)
    }
}

/// Solves every record independently, one output slot per record
pub fn solve_records(records: &[Record]) -> Vec<SolutionBuffer> {
    records
        .par_iter()
        .map(|record| SolutionBuffer::from(&Solver::new(record.game()).solve()))
        .collect()
}

/// A list of positions and their solutions, stored one `hash,solution` line
/// per position
#[derive(Clone, Default, Debug)]
pub struct PositionDatabase {
    pub entries: Vec<Entry>,
}

impl PositionDatabase {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Loads up to `count` positions after skipping the first `offset` lines
    pub fn load<P: AsRef<Path>>(path: P, offset: usize, count: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let file = BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        );

        let mut entries = Vec::new();
        for (number, line) in file
            .lines()
            .enumerate()
            .skip(offset)
            .take(count.unwrap_or(usize::MAX))
        {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = line
                .parse::<Entry>()
                .with_context(|| format!("{}:{}", path.display(), number + 1))?;
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = BufWriter::new(
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        );

        for entry in self.entries.iter() {
            writeln!(file, "{}", entry)?;
        }
        file.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> Vec<Record> {
        self.entries.iter().map(|entry| entry.record).collect()
    }

    /// Solves every position in parallel, reporting progress on stdout
    ///
    /// Positions whose line does not fit a solution slot are stored without
    /// a solution.
    pub fn solve(&mut self) -> Result<()> {
        let start = Instant::now();
        let mut next_time = start;

        enum Message {
            Value((usize, SolutionBuffer)),
            Finish,
        }
        let (tx, rx) = channel();

        let progress = ProgressBar::new(self.entries.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("Solving positions: {bar:40.cyan/blue} {msg} ~{eta} remaining")
                .progress_chars("█▓▒░  "),
        );

        let records: Vec<(usize, Record)> = self.records().into_iter().enumerate().collect();
        thread::spawn(move || {
            records
                .par_iter()
                .for_each_with(tx.clone(), |tx, (index, record)| {
                    let solution = Solver::new(record.game()).solve();
                    tx.send(Message::Value((*index, SolutionBuffer::from(&solution))))
                        .unwrap();
                });
            tx.send(Message::Finish).unwrap();
        });

        let mut running = true;
        let mut delta = 0;
        while running {
            match rx.recv()? {
                Message::Finish => running = false,
                Message::Value((index, buffer)) => {
                    self.entries[index].solution = buffer.as_str().map(String::from);
                    delta += 1;
                }
            }
            if Instant::now() > next_time {
                progress.inc(delta);
                delta = 0;
                progress.set_message(&format!(
                    "({} / {})",
                    progress.position(),
                    progress.length()
                ));
                next_time += Duration::from_millis(100);
            }
        }
        progress.inc(delta);
        progress.finish();

        println!(
            "Solved {} positions in {}",
            self.entries.len(),
            HumanDuration(Instant::now() - start)
        );
        Ok(())
    }

    /// Collects every distinct canonical board with `depth` pieces placed
    /// that can be reached from the empty board without a Quarto
    pub fn explore_depth(depth: usize) -> Self {
        let start = Instant::now();

        let mut explorer = Explorer::new(depth);
        explorer.explore(&mut GameState::new(), 0, false);
        explorer.progress.finish_and_clear();

        let mut entries: Vec<Entry> = explorer.found.into_iter().map(Entry::new).collect();
        entries.sort_unstable_by_key(|entry| entry.record);

        println!(
            "Found {} boards with {} pieces on them in {:.3}s",
            entries.len(),
            depth,
            (Instant::now() - start).as_secs_f64()
        );
        Self { entries }
    }
}

struct Explorer {
    depth: usize,
    // boards already expanded, with the piece in hand when placing
    memo: HashSet<(Record, Option<Piece>)>,
    found: HashSet<Record>,
    progress: ProgressBar,
}

impl Explorer {
    fn new(depth: usize) -> Self {
        let progress = ProgressBar::new_spinner();
        progress.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}"));
        Self {
            depth,
            memo: HashSet::new(),
            found: HashSet::new(),
            progress,
        }
    }

    fn explore(&mut self, game: &mut GameState, depth: usize, placing: bool) {
        if self.memo.len() % 10_000 == 0 {
            self.progress
                .set_message(&format!("Found a total of {}", self.found.len()));
        }

        if placing {
            let piece = match game.selected().first() {
                Some(&piece) => piece,
                None => return,
            };
            if !self.memo.insert((Record::from_board(game.board()), Some(piece))) {
                return;
            }

            let empty: Vec<usize> = game.empty_cells().collect();
            for cell in empty {
                game.place(piece, cell);
                self.explore(game, depth + 1, false);
                game.remove(piece, cell);
            }
        } else {
            let mut game = *game;
            game.canonicalize();

            let record = Record::from_board(game.board());
            if !self.memo.insert((record, None)) {
                return;
            }
            if game.check_win() {
                return;
            }
            if depth == self.depth {
                self.found.insert(record);
                return;
            }

            let available: Vec<Piece> = game.available().to_vec();
            for piece in available {
                game.select(piece);
                self.explore(&mut game, depth, true);
                game.deselect(piece);
            }
        }
    }
}
