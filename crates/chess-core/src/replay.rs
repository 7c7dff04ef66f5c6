//! Move-by-move replay of a fetched game.
//!
//! The displayed position is never advanced in place: every read replays
//! `history[0..=index]` from the standard start, so the index and the board
//! cannot drift apart.

use serde::{Deserialize, Serialize};
use shakmaty::{fen::Fen, Chess, EnPassantMode, Move, Position};

use crate::clock::EMPTY_CLOCK;
use crate::game::{Game, Side};
use crate::pgn::{parse_history, MoveHistory, PgnError};

/// Where a player sits relative to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    Top,
    Bottom,
}

/// Category of a move, used to pick a sound cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Check,
    Promotion,
    Capture,
    Castle,
    Move,
}

/// Classify a SAN move. First match wins: check/mate, promotion, capture,
/// castle, plain move.
pub fn classify_move(san: &str) -> MoveCategory {
    if san.contains('+') || san.contains('#') {
        MoveCategory::Check
    } else if san.contains('=') {
        MoveCategory::Promotion
    } else if san.contains('x') {
        MoveCategory::Capture
    } else if san.starts_with("O-O") {
        MoveCategory::Castle
    } else {
        MoveCategory::Move
    }
}

/// Position after playing `moves` from the standard start.
pub fn replay(moves: &[Move]) -> Chess {
    let mut pos = Chess::default();
    for mv in moves {
        pos.play_unchecked(mv.clone());
    }
    pos
}

#[derive(Debug, Clone)]
pub struct Replay {
    history: MoveHistory,
    clock_times: Vec<String>,
    index: usize,
    orientation: Side,
}

impl Replay {
    pub fn new(history: MoveHistory, clock_times: Vec<String>, orientation: Side) -> Self {
        Self {
            history,
            clock_times,
            index: 0,
            orientation,
        }
    }

    /// Replay of `game`, oriented towards the community member's side.
    pub fn from_game(game: &Game) -> Result<Self, PgnError> {
        let history = parse_history(&game.stripped_pgn)?;
        Ok(Self::new(history, game.clock_times.clone(), game.bm_side()))
    }

    pub fn current_move_index(&self) -> usize {
        self.index
    }

    pub fn total_moves(&self) -> usize {
        self.history.len()
    }

    pub fn orientation(&self) -> Side {
        self.orientation
    }

    fn last_index(&self) -> usize {
        self.total_moves().saturating_sub(1)
    }

    /// Jump to `index`, clamped to the game. Returns the category of the
    /// entered move when the index actually changed.
    pub fn go_to_move(&mut self, index: usize) -> Option<MoveCategory> {
        let target = index.min(self.last_index());
        if target == self.index {
            return None;
        }
        self.index = target;
        self.current_san().map(classify_move)
    }

    pub fn next(&mut self) -> Option<MoveCategory> {
        self.go_to_move(self.index.saturating_add(1))
    }

    pub fn previous(&mut self) -> Option<MoveCategory> {
        self.go_to_move(self.index.saturating_sub(1))
    }

    pub fn first(&mut self) -> Option<MoveCategory> {
        self.go_to_move(0)
    }

    pub fn last(&mut self) -> Option<MoveCategory> {
        self.go_to_move(self.last_index())
    }

    pub fn flip_orientation(&mut self) {
        self.orientation = self.orientation.flip();
    }

    pub fn position(&self) -> Chess {
        let end = if self.history.is_empty() { 0 } else { self.index + 1 };
        replay(&self.history.moves[..end])
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position(), EnPassantMode::Legal).to_string()
    }

    pub fn is_checkmate(&self) -> bool {
        self.position().is_checkmate()
    }

    pub fn current_san(&self) -> Option<&str> {
        self.history.sans.get(self.index).map(String::as_str)
    }

    pub fn sans(&self) -> &[String] {
        &self.history.sans
    }

    /// Colour sitting in `seat` under the current orientation.
    pub fn seat_side(&self, seat: Seat) -> Side {
        match seat {
            Seat::Bottom => self.orientation,
            Seat::Top => self.orientation.flip(),
        }
    }

    /// Clock reading shown for `seat` at the current move.
    pub fn clock_time(&self, seat: Seat) -> &str {
        let parity = match self.seat_side(seat) {
            Side::White => 0,
            Side::Black => 1,
        };
        let clock_index = self.index / 2;
        self.clock_times
            .get(clock_index * 2 + parity)
            .map(String::as_str)
            .unwrap_or(EMPTY_CLOCK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVES: &str = "1. e4 e5 2. Nf3 Nc6 3. Bc4 Nd4 4. Nxe5 Qg5 5. Nxf7 Qxg2 6. Rf1 Qxe4+ 7. Be2 Nf3#";

    fn replay_of(moves: &str, clocks: usize) -> Replay {
        let history = parse_history(moves).unwrap();
        let clock_times = (0..clocks).map(|i| format!("0:09:{:02}", 59 - i)).collect();
        Replay::new(history, clock_times, Side::White)
    }

    #[test]
    fn test_classification_priority() {
        assert_eq!(classify_move("Qxf7+"), MoveCategory::Check);
        assert_eq!(classify_move("e8=Q+"), MoveCategory::Check);
        assert_eq!(classify_move("exd8=Q"), MoveCategory::Promotion);
        assert_eq!(classify_move("Nxe5"), MoveCategory::Capture);
        assert_eq!(classify_move("O-O-O"), MoveCategory::Castle);
        assert_eq!(classify_move("O-O#"), MoveCategory::Check);
        assert_eq!(classify_move("Nf3"), MoveCategory::Move);
    }

    #[test]
    fn test_starts_on_first_move() {
        let r = replay_of(MOVES, 14);
        assert_eq!(r.current_move_index(), 0);
        assert_eq!(r.total_moves(), 14);
        assert_eq!(r.current_san(), Some("e4"));
        assert_eq!(r.fen(), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
    }

    #[test]
    fn test_navigation_clamps() {
        let mut r = replay_of(MOVES, 14);
        assert_eq!(r.previous(), None);
        assert_eq!(r.current_move_index(), 0);

        assert_eq!(r.last(), Some(MoveCategory::Check));
        assert_eq!(r.current_move_index(), 13);
        assert!(r.is_checkmate());
        assert_eq!(r.next(), None);
        assert_eq!(r.current_move_index(), 13);

        assert_eq!(r.go_to_move(500), None);
        assert_eq!(r.current_move_index(), 13);
    }

    #[test]
    fn test_go_to_move_reports_entered_move() {
        let mut r = replay_of(MOVES, 14);
        assert_eq!(r.go_to_move(6), Some(MoveCategory::Capture)); // Nxe5
        assert_eq!(r.go_to_move(11), Some(MoveCategory::Check)); // Qxe4+
        assert_eq!(r.previous(), Some(MoveCategory::Move)); // Rf1
        assert_eq!(r.go_to_move(10), None);
    }

    #[test]
    fn test_board_is_deterministic() {
        let mut r = replay_of(MOVES, 14);
        for i in 0..14 {
            r.go_to_move(i);
            let first = r.fen();
            r.go_to_move(i);
            assert_eq!(first, r.fen());
            let fresh = replay(&parse_history(MOVES).unwrap().moves[..=i]);
            assert_eq!(first, Fen::from_position(&fresh, EnPassantMode::Legal).to_string());
        }
    }

    #[test]
    fn test_flip_keeps_index() {
        let mut r = replay_of(MOVES, 14);
        r.go_to_move(4);
        r.flip_orientation();
        assert_eq!(r.orientation(), Side::Black);
        assert_eq!(r.current_move_index(), 4);
        assert_eq!(r.seat_side(Seat::Bottom), Side::Black);
        assert_eq!(r.seat_side(Seat::Top), Side::White);
    }

    #[test]
    fn test_clock_lookup() {
        let mut r = replay_of(MOVES, 14);
        r.go_to_move(3);
        // full move 2: white clock at ply 2, black clock at ply 3
        assert_eq!(r.clock_time(Seat::Bottom), "0:09:57");
        assert_eq!(r.clock_time(Seat::Top), "0:09:56");

        r.flip_orientation();
        assert_eq!(r.clock_time(Seat::Bottom), "0:09:56");
        assert_eq!(r.clock_time(Seat::Top), "0:09:57");

        r.flip_orientation();
        r.last();
        assert_eq!(r.clock_time(Seat::Bottom), "0:09:47");
        assert_eq!(r.clock_time(Seat::Top), "0:09:46");
    }

    #[test]
    fn test_clock_lookup_before_black_replies() {
        let mut r = replay_of(MOVES.trim_end_matches(" Nf3#"), 13);
        assert_eq!(r.total_moves(), 13);
        r.last();
        // white's 7th move has no black reply yet
        assert_eq!(r.clock_time(Seat::Bottom), "0:09:47");
        assert_eq!(r.clock_time(Seat::Top), EMPTY_CLOCK);
    }

    #[test]
    fn test_missing_clocks() {
        let r = replay_of(MOVES, 0);
        assert_eq!(r.clock_time(Seat::Bottom), EMPTY_CLOCK);
    }
}
