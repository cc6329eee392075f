#[cfg(test)]
pub mod test {
    use anyhow::{anyhow, Result};
    use rand::{rngs::SmallRng, Rng, SeedableRng};
    use std::fs::File;
    use std::io::{BufRead, BufReader};
    use std::time::{Duration, Instant};

    use crate::canonical::{canonical_hash, canonicalize, Transform};
    use crate::database::{solve_records, PositionDatabase, SolutionBuffer};
    use crate::game::{Board, GameState, LINES};
    use crate::piece::{line_wins, Piece};
    use crate::record::{Entry, Record};
    use crate::solver::*;
    use crate::{BOARD_SIZE, SOLUTION_SIZE};

    fn board_from(cells: &[Option<u8>]) -> Board {
        let mut board = [None; BOARD_SIZE];
        for (cell, piece) in board.iter_mut().zip(cells.iter()) {
            *cell = piece.map(Piece::new);
        }
        board
    }

    fn random_board(rng: &mut SmallRng, num_pieces: usize) -> Board {
        let mut cells: Vec<usize> = (0..BOARD_SIZE).collect();
        let mut pieces: Vec<Piece> = Piece::ALL.to_vec();
        let mut board = [None; BOARD_SIZE];
        for _ in 0..num_pieces {
            let cell = cells.swap_remove(rng.gen_range(0..cells.len()));
            let piece = pieces.swap_remove(rng.gen_range(0..pieces.len()));
            board[cell] = Some(piece);
        }
        board
    }

    // each piece appears exactly once across the board, selected and available pieces
    fn assert_partition(game: &GameState) {
        let mut seen = [0; 16];
        for piece in game
            .board()
            .iter()
            .flatten()
            .chain(game.selected().iter())
            .chain(game.available().iter())
        {
            seen[piece.index()] += 1;
        }
        assert_eq!(seen, [1; 16]);
        assert_eq!(
            game.num_placed() + game.num_selected() + game.num_available(),
            16
        );
    }

    #[test]
    pub fn record_coding() -> Result<()> {
        let mut cells = [None; BOARD_SIZE];
        cells[0] = Some(3);
        cells[15] = Some(12);
        let board = board_from(&cells);

        let record = Record::from_board(&board);
        assert_eq!(record.bytes(), &[0, 0, 0, 0, 0, 0, 0, 0x3C, 0x80, 0x01]);
        assert_eq!(record.hash(), 3964929);
        assert_eq!(record.board(), board);
        assert_eq!("3964929".parse::<Record>()?, record);
        Ok(())
    }

    #[test]
    pub fn empty_record() -> Result<()> {
        let record = Record::from_bytes([0; 10]);
        let game = record.game();

        assert!(game.board().iter().all(Option::is_none));
        assert_eq!(game.num_placed(), 0);
        assert_eq!(game.num_selected(), 0);
        assert_eq!(game.num_available(), 16);
        Ok(())
    }

    #[test]
    pub fn record_round_trip() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        for num_pieces in 0..=BOARD_SIZE {
            let board = random_board(&mut rng, num_pieces);
            let record = Record::from_board(&board);
            assert_eq!(record.num_placed(), num_pieces);
            assert_eq!(record.board(), board);
            assert_eq!(Record::from_hash(record.hash())?, record);
        }
        assert!(Record::from_hash(1 << 80).is_err());
        assert!("not a hash".parse::<Record>().is_err());
        Ok(())
    }

    #[test]
    pub fn entry_lines() -> Result<()> {
        let entry = "73042788817004981727,@LKIBJ1".parse::<Entry>()?;
        assert_eq!(entry.record.num_placed(), 13);
        assert_eq!(entry.solution.as_deref(), Some("@LKIBJ1"));
        assert_eq!(entry.to_string(), "73042788817004981727,@LKIBJ1");

        let entry = "3964929,-".parse::<Entry>()?;
        assert_eq!(entry.solution, None);
        assert_eq!(entry.to_string(), "3964929,-");

        assert!(",-".parse::<Entry>().is_err());
        Ok(())
    }

    #[test]
    pub fn line_wins_all_quadruples() -> Result<()> {
        let uniform = |pieces: &[Piece]| {
            (0..4).any(|attribute| {
                pieces.iter().all(|piece| piece.has(attribute))
                    || pieces.iter().all(|piece| !piece.has(attribute))
            })
        };

        for a in 0..16 {
            for b in a + 1..16 {
                for c in b + 1..16 {
                    for d in c + 1..16 {
                        let pieces = [a, b, c, d].map(Piece::new);
                        for line in LINES.iter() {
                            let mut game = GameState::new();
                            for (&cell, &piece) in line.iter().zip(pieces.iter()) {
                                game.select(piece);
                                game.place(piece, cell);
                            }
                            assert_eq!(game.check_win(), uniform(&pieces));
                        }
                    }
                }
            }
        }

        // a gap in the line never wins
        let same = Piece::new(0);
        assert!(!line_wins([Some(same), Some(same), None, Some(same)]));
        Ok(())
    }

    #[test]
    pub fn partition_invariant() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let mut game = GameState::new();
            let mut moves = vec![];
            for _ in 0..rng.gen_range(0..=BOARD_SIZE) {
                let piece = game.available()[rng.gen_range(0..game.num_available())];
                let empty: Vec<usize> = game.empty_cells().collect();
                let cell = empty[rng.gen_range(0..empty.len())];

                let before = game;
                game.select(piece);
                assert_partition(&game);
                game.deselect(piece);
                assert_eq!(game.board(), before.board());
                assert_eq!(game.num_available(), before.num_available());

                game.select(piece);
                let selected = game;
                game.place(piece, cell);
                assert_partition(&game);
                game.remove(piece, cell);
                assert_eq!(game, selected);

                game.place(piece, cell);
                moves.push((piece, cell));
            }
            assert_partition(&game);

            for &(piece, cell) in moves.iter().rev() {
                game.remove(piece, cell);
                game.deselect(piece);
                assert_partition(&game);
            }
            assert_eq!(game.num_placed(), 0);
        }
        Ok(())
    }

    #[test]
    pub fn place_checked_rejects_occupied() -> Result<()> {
        let mut game = GameState::new();
        game.select(Piece::new(3));
        game.place_checked(Piece::new(3), 5)?;
        game.select(Piece::new(7));

        let before = game;
        assert!(game.place_checked(Piece::new(7), 5).is_err());
        assert_eq!(game, before);
        assert!(game.place_checked(Piece::new(7), 16).is_err());
        assert!(game.place_checked(Piece::new(8), 6).is_err());
        assert_eq!(game, before);
        Ok(())
    }

    #[test]
    pub fn transforms_are_symmetries() -> Result<()> {
        let mut identity = [None; BOARD_SIZE];
        for (cell, piece) in identity.iter_mut().zip(Piece::ALL.iter()) {
            *cell = Some(*piece);
        }
        let images: Vec<Board> = Transform::all().map(|t| t.apply(&identity)).collect();

        for (i, a) in images.iter().enumerate() {
            // all distinct
            assert!(images[i + 1..].iter().all(|b| b != a));
            // closed under composition
            for transform in Transform::all() {
                assert!(images.contains(&transform.apply(a)));
            }
            // every line maps onto a line
            for line in LINES.iter() {
                let mut image: Vec<usize> = line
                    .iter()
                    .map(|&cell| a.iter().position(|&p| p == Some(Piece::new(cell as u8))))
                    .collect::<Option<_>>()
                    .ok_or_else(|| anyhow!("cell lost by transform {}", i))?;
                image.sort_unstable();
                assert!(LINES.iter().any(|l| l[..] == image[..]));
            }
        }
        Ok(())
    }

    #[test]
    pub fn canonical_examples() -> Result<()> {
        for &(hash, canonical, pivot) in [
            (1092376730789838297u128, 41531835118050292u128, 6u8),
            (4497362188005207415, 1134031218475858782, 1),
            (36437588359231695, 2209203345739636, 11),
            (5857280, 811008, 5),
        ]
        .iter()
        {
            let mut board = Record::from_hash(hash)?.board();
            assert_eq!(canonicalize(&mut board), Some(Piece::new(pivot)));
            assert_eq!(Record::from_board(&board).hash(), canonical);
        }

        let mut board = [None; BOARD_SIZE];
        assert_eq!(canonicalize(&mut board), None);
        assert_eq!(board, [None; BOARD_SIZE]);
        Ok(())
    }

    #[test]
    pub fn canonical_invariance() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..300 {
            let num_pieces = rng.gen_range(1..=BOARD_SIZE);
            let board = random_board(&mut rng, num_pieces);
            let mut canonical = board;
            canonicalize(&mut canonical);

            // the pivot always ends up as piece 0
            assert!(canonical[0] == Some(Piece::new(0)) || canonical[1] == Some(Piece::new(0)));

            let mut again = canonical;
            canonicalize(&mut again);
            assert_eq!(again, canonical);

            for transform in Transform::all() {
                let mut transformed = transform.apply(&board);
                canonicalize(&mut transformed);
                assert_eq!(transformed, canonical);
                assert_eq!(canonical_hash(&transformed), canonical_hash(&canonical));
            }

            let relabel = Piece::new(rng.gen_range(0..16));
            let mut relabeled = board;
            for piece in relabeled.iter_mut().flatten() {
                *piece = piece.xor(relabel);
            }
            canonicalize(&mut relabeled);
            assert_eq!(relabeled, canonical);
        }
        Ok(())
    }

    #[test]
    pub fn game_canonicalization() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..100 {
            let num_pieces = rng.gen_range(0..12);
            let mut game = GameState::from_board(random_board(&mut rng, num_pieces));
            let piece = game.available()[0];
            game.select(piece);
            let won = game.check_win();

            let pivot = game.canonicalize();
            assert_partition(&game);
            assert_eq!(game.check_win(), won);
            if let Some(pivot) = pivot {
                assert_eq!(game.selected(), &[piece.xor(pivot)]);
            }

            game.apply_feature_swaps();
            assert_partition(&game);
            assert_eq!(game.check_win(), won);
        }
        Ok(())
    }

    #[test]
    pub fn feature_swaps() -> Result<()> {
        let mut game = GameState::from_board(board_from(&[Some(0b0110), Some(0b1100)]));
        game.apply_feature_swaps();
        assert_eq!(game.board()[..2], [Some(Piece::new(3)), Some(Piece::new(6))]);
        let available: Vec<u8> = game.available().iter().map(|p| p.id()).collect();
        assert_eq!(
            available,
            vec![0, 8, 1, 9, 2, 10, 11, 4, 12, 5, 13, 14, 7, 15]
        );

        let mut game = Record::from_hash(4497362188005207415)?.game();
        game.canonicalize();
        assert_eq!(Record::from_board(game.board()).hash(), 1134031218475858782);
        game.apply_feature_swaps();
        assert_eq!(Record::from_board(game.board()).hash(), 1115999428658395998);
        let available: Vec<u8> = game.available().iter().map(|p| p.id()).collect();
        assert_eq!(available, vec![2, 6, 5, 14]);

        // a single low attribute moves to position 0
        let mut game = GameState::from_board(board_from(&[Some(0b0010)]));
        assert!(game.feature_bit_swap(0, 1));
        assert_eq!(game.board()[0], Some(Piece::new(0b0001)));
        assert_eq!(game.available()[0..3], [0, 2, 3].map(Piece::new));

        // no piece with the right attribute count
        let mut game = GameState::from_board(board_from(&[Some(0b0011)]));
        assert!(!game.feature_bit_swap(0, 1));
        Ok(())
    }

    #[test]
    pub fn forced_win() -> Result<()> {
        let mut game = Record::from_hash(62966240412595063)?.game();
        assert_eq!(
            game.empty_cells().collect::<Vec<_>>(),
            vec![0, 4, 5, 8, 12]
        );
        game.select(Piece::new(9));

        let mut solver = Solver::new(game);
        let solution = solver.solve();
        assert_eq!(solution.score, WIN);
        assert_eq!(solution.line, "C2");
        assert_eq!(
            decode_line(&solution.line, true)?,
            vec![Ply::Place(12), Ply::Score(WIN)]
        );
        // the search puts every piece back where it found it
        assert_eq!(solver.board(), game.board());
        assert_eq!(solver.selected(), game.selected());
        assert_eq!(solver.num_available(), game.num_available());
        Ok(())
    }

    #[test]
    pub fn full_board_draw() -> Result<()> {
        let board = board_from(
            &[4, 2, 0, 13, 3, 11, 14, 9, 15, 8, 1, 7, 5, 12, 6, 10]
                .iter()
                .map(|&p| Some(p))
                .collect::<Vec<_>>(),
        );
        let solution = Solver::new(GameState::from_board(board)).solve();
        assert_eq!(solution.score, DRAW);
        assert_eq!(solution.line, "1");
        Ok(())
    }

    #[test]
    pub fn malformed_position() -> Result<()> {
        let mut game = GameState::new();
        for &piece in Piece::ALL.iter() {
            game.select(piece);
        }
        let solution = Solver::new(game).solve();
        assert!(solution.is_malformed());
        assert_eq!(solution.line, MALFORMED_LINE);
        assert!(decode_line(&solution.line, true).is_err());
        Ok(())
    }

    #[test]
    pub fn decoding() -> Result<()> {
        assert_eq!(
            decode_line("@@CJ2", false)?,
            vec![
                Ply::Select(Piece::new(0)),
                Ply::Place(0),
                Ply::Select(Piece::new(3)),
                Ply::Place(10),
                Ply::Score(WIN),
            ]
        );
        assert!(decode_line("", false).is_err());
        assert!(decode_line("@z1", false).is_err());
        assert!(decode_line("@@9", false).is_err());
        for cell in 0..BOARD_SIZE {
            assert_eq!(transpose_cell(transpose_cell(cell)), cell);
        }
        Ok(())
    }

    #[test]
    pub fn solution_buffers() -> Result<()> {
        let fits = Solution {
            score: DRAW,
            line: "A".repeat(SOLUTION_SIZE - 1),
        };
        assert_eq!(SolutionBuffer::from(&fits).as_str(), Some(&fits.line[..]));

        let truncated = Solution {
            score: DRAW,
            line: "A".repeat(SOLUTION_SIZE),
        };
        assert_eq!(SolutionBuffer::from(&truncated).as_str(), None);
        assert_eq!(SolutionBuffer::new().as_str(), Some(""));
        Ok(())
    }

    #[test]
    pub fn endgames() -> Result<()> {
        let file = BufReader::new(File::open("test_data/endgames")?);

        let mut times = vec![];
        let mut posis = vec![];

        for line in file.split(b'\n') {
            let buf = String::from_utf8(line?)?;
            if buf.trim().is_empty() {
                continue;
            }
            let mut test_data = buf.split_whitespace();
            let record = test_data
                .next()
                .ok_or_else(|| anyhow!("invalid test data: {}", buf))?
                .parse::<Record>()?;
            let score = test_data
                .next()
                .ok_or_else(|| anyhow!("invalid test data: {}", buf))?
                .parse::<Score>()?;
            let expected = test_data
                .next()
                .ok_or_else(|| anyhow!("invalid test data: {}", buf))?;

            let mut solver = Solver::new(record.game());
            let start_time = Instant::now();
            let solution = solver.solve();
            let finish_time = Instant::now();
            assert_eq!(solution.score, score);
            assert_eq!(solution.line, expected);
            assert!(decode_line(&solution.line, false).is_ok());

            // solving again gives the same answer
            assert_eq!(Solver::new(record.game()).solve(), solution);

            times.push(finish_time - start_time);
            posis.push(solver.node_count);
        }

        println!(
            "Endgames:\nMean time: {:.6}ms, Mean no. of positions: {}",
            (times.iter().sum::<Duration>() / times.len() as u32).as_secs_f64() * 1000.0,
            posis.iter().sum::<usize>() as f64 / posis.len() as f64,
        );
        Ok(())
    }

    #[test]
    pub fn batch_solve() -> Result<()> {
        let mut database = PositionDatabase::load("test_data/positions.txt", 1, Some(3))?;
        assert_eq!(database.len(), 3);
        assert!(database.entries.iter().all(|entry| entry.solution.is_none()));

        let buffers = solve_records(&database.records());
        for (entry, buffer) in database.entries.iter().zip(buffers.iter()) {
            let solution = Solver::new(entry.record.game()).solve();
            assert_eq!(buffer.as_str(), Some(&solution.line[..]));
        }

        database.solve()?;
        let solutions: Vec<Option<&str>> = database
            .entries
            .iter()
            .map(|entry| entry.solution.as_deref())
            .collect();
        assert_eq!(
            solutions,
            vec![Some("@J2"), Some("@LKIBJ1"), Some("HDLMJHBOE@@C1")]
        );

        let path = std::env::temp_dir().join("quarto_batch_solve.txt");
        database.save(&path)?;
        let reloaded = PositionDatabase::load(&path, 0, None)?;
        assert_eq!(reloaded.entries, database.entries);
        std::fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    pub fn explore_small_depths() -> Result<()> {
        let hashes = |depth: usize| -> Vec<u128> {
            PositionDatabase::explore_depth(depth)
                .entries
                .iter()
                .map(|entry| entry.record.hash())
                .collect()
        };

        assert_eq!(hashes(0), vec![0]);
        assert_eq!(hashes(1), vec![16384, 32768]);
        let depth_two = hashes(2);
        assert_eq!(depth_two.len(), 150);
        assert_eq!(depth_two[..5], [81922, 82176, 83968, 90112, 98305]);
        Ok(())
    }

    #[test]
    #[ignore]
    pub fn full_search() -> Result<()> {
        let mut game = GameState::new();
        game.select(Piece::new(0));
        let mut solver = Solver::new(game);
        let start_time = Instant::now();
        let solution = solver.solve();
        let time = Instant::now() - start_time;

        println!(
            "Full game search\n Time: {:.6}s, No. of positions: {}",
            time.as_secs_f64(),
            solver.node_count,
        );
        assert_eq!(solution.score, DRAW);
        Ok(())
    }
}
