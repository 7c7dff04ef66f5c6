//! Clock stripping, move parsing and replay against a real Chess.com PGN.

mod common;

use chess_core::clock::extract_clock_times;
use chess_core::pgn::{extract_moves, parse_history};
use chess_core::replay::{classify_move, MoveCategory, Replay, Seat};
use chess_core::Side;

#[test]
fn stripping_clocks_keeps_every_move() {
    let extraction = extract_clock_times(common::TRAP_PGN);

    assert_eq!(
        extract_moves(common::TRAP_PGN).len(),
        extract_moves(&extraction.stripped_pgn).len()
    );
    assert_eq!(extraction.clock_times.len(), 14);
    assert_eq!(extraction.clock_times[0], "0:09:58.9");
    assert_eq!(extraction.clock_times[13], "0:09:05");
    assert!(!extraction.stripped_pgn.contains('{'));
    assert!(extraction.stripped_pgn.contains("[Termination \"patzer_pal won by checkmate\"]"));
    assert!(extraction
        .stripped_pgn
        .lines()
        .all(|line| line == line.trim_end()));
}

#[test]
fn strips_inline_clock_comments() {
    let extraction = extract_clock_times("1. e4 {[%clk 0:05:00]} e5 {[%clk 0:04:58]}");
    assert_eq!(extraction.stripped_pgn, "1. e4 e5");
    assert_eq!(extraction.clock_times, vec!["0:05:00", "0:04:58"]);
}

#[test]
fn every_move_of_the_trap_classifies() {
    let history = parse_history(common::TRAP_PGN).unwrap();
    let categories: Vec<MoveCategory> = history.sans.iter().map(|s| classify_move(s)).collect();

    assert_eq!(categories[6], MoveCategory::Capture); // Nxe5
    assert_eq!(categories[11], MoveCategory::Check); // Qxe4+
    assert_eq!(categories[13], MoveCategory::Check); // Nf3#
    assert_eq!(categories[0], MoveCategory::Move);
}

#[test]
fn replay_walks_the_whole_game() {
    let extraction = extract_clock_times(common::TRAP_PGN);
    let history = parse_history(&extraction.stripped_pgn).unwrap();
    let mut replay = Replay::new(history, extraction.clock_times, Side::White);

    let mut fens = vec![replay.fen()];
    while replay.next().is_some() {
        fens.push(replay.fen());
    }
    assert_eq!(fens.len(), 14);
    assert!(replay.is_checkmate());

    // Walking back visits the same positions.
    for expected in fens.iter().rev().skip(1) {
        replay.previous();
        assert_eq!(&replay.fen(), expected);
    }
    assert_eq!(replay.current_move_index(), 0);
    assert_eq!(replay.clock_time(Seat::Bottom), "0:09:58.9");
    assert_eq!(replay.clock_time(Seat::Top), "0:09:57.1");
}
