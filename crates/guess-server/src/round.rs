//! The guess/reveal state machine for a single round.
//!
//! `Initial -> Guessing -> Revealed -> Guessing -> ...`. Every transition
//! validates first and only then mutates, so a rejected transition leaves
//! the round exactly as it was.

use std::sync::Arc;

use chess_core::pgn::PgnError;
use chess_core::{Game, Replay, Seat, Side};
use serde::{Deserialize, Serialize};

pub const MIN_GUESS: i32 = 100;
pub const MAX_GUESS: i32 = 3100;
pub const GUESS_STEP: i32 = 25;

/// Guesses within this many points count as close.
pub const CLOSE_GUESS_THRESHOLD: i32 = 100;

pub const BM_MEMBER_LABEL: &str = "BM Member";
pub const RANDOM_PLAYER_LABEL: &str = "Random Player";
pub const RANDOM_NOOB_LABEL: &str = "Random Noob";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Initial,
    Guessing,
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Positive,
    Encouragement,
}

impl Verdict {
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Positive => "Great guess! You really know your ratings.",
            Verdict::Encouragement => "Not quite. Keep watching games and you'll get sharper!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessOutcome {
    pub guessed_elo: i32,
    pub actual_elo: i32,
    pub difference: i32,
    pub verdict: Verdict,
}

pub fn score_guess(guessed_elo: i32, actual_elo: i32) -> GuessOutcome {
    let difference = (guessed_elo - actual_elo).abs();
    let verdict = if difference <= CLOSE_GUESS_THRESHOLD {
        Verdict::Positive
    } else {
        Verdict::Encouragement
    };
    GuessOutcome {
        guessed_elo,
        actual_elo,
        difference,
        verdict,
    }
}

/// Snap a slider value onto the guess grid.
pub fn snap_guess(value: i32) -> i32 {
    let clamped = value.clamp(MIN_GUESS, MAX_GUESS);
    let steps = ((clamped - MIN_GUESS) as f64 / GUESS_STEP as f64).round() as i32;
    MIN_GUESS + steps * GUESS_STEP
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("Cannot {action} while {phase:?}")]
    InvalidState { action: &'static str, phase: Phase },

    #[error("Guess {0} is outside 100..=3100")]
    GuessOutOfRange(i32),

    #[error("Game cannot be replayed: {0}")]
    Replay(#[from] PgnError),
}

#[derive(Debug, Clone)]
pub struct LoadedGame {
    pub game: Arc<Game>,
    pub replay: Replay,
}

#[derive(Debug, Clone, Default)]
pub enum RoundState {
    #[default]
    Initial,
    Guessing(LoadedGame),
    Revealed {
        loaded: LoadedGame,
        outcome: GuessOutcome,
    },
}

impl RoundState {
    pub fn phase(&self) -> Phase {
        match self {
            RoundState::Initial => Phase::Initial,
            RoundState::Guessing(_) => Phase::Guessing,
            RoundState::Revealed { .. } => Phase::Revealed,
        }
    }

    /// `Initial -> Guessing` with a freshly fetched game.
    pub fn start_guessing(&mut self, game: Arc<Game>) -> Result<(), RoundError> {
        self.require(Phase::Initial, "start guessing")?;
        self.enter_guessing(game)
    }

    /// `Revealed -> Guessing` with the next game.
    pub fn next_game(&mut self, game: Arc<Game>) -> Result<(), RoundError> {
        self.require(Phase::Revealed, "load the next game")?;
        self.enter_guessing(game)
    }

    /// `Guessing -> Revealed`.
    pub fn submit_guess(&mut self, guessed_elo: i32) -> Result<GuessOutcome, RoundError> {
        self.require(Phase::Guessing, "submit a guess")?;
        if !(MIN_GUESS..=MAX_GUESS).contains(&guessed_elo) {
            return Err(RoundError::GuessOutOfRange(guessed_elo));
        }

        if let RoundState::Guessing(loaded) = std::mem::take(self) {
            let outcome = score_guess(guessed_elo, loaded.game.average_elo());
            *self = RoundState::Revealed { loaded, outcome };
            return Ok(outcome);
        }
        Err(RoundError::InvalidState {
            action: "submit a guess",
            phase: Phase::Initial,
        })
    }

    fn require(&self, phase: Phase, action: &'static str) -> Result<(), RoundError> {
        if self.phase() == phase {
            Ok(())
        } else {
            Err(RoundError::InvalidState {
                action,
                phase: self.phase(),
            })
        }
    }

    fn enter_guessing(&mut self, game: Arc<Game>) -> Result<(), RoundError> {
        // Default orientation puts the member at the bottom.
        let replay = Replay::from_game(&game)?;
        *self = RoundState::Guessing(LoadedGame { game, replay });
        Ok(())
    }

    fn loaded(&self) -> Option<&LoadedGame> {
        match self {
            RoundState::Initial => None,
            RoundState::Guessing(loaded) | RoundState::Revealed { loaded, .. } => Some(loaded),
        }
    }

    pub fn game(&self) -> Option<&Arc<Game>> {
        self.loaded().map(|l| &l.game)
    }

    pub fn replay(&self) -> Option<&Replay> {
        self.loaded().map(|l| &l.replay)
    }

    pub fn replay_mut(&mut self) -> Option<&mut Replay> {
        match self {
            RoundState::Initial => None,
            RoundState::Guessing(loaded) | RoundState::Revealed { loaded, .. } => {
                Some(&mut loaded.replay)
            }
        }
    }

    pub fn outcome(&self) -> Option<&GuessOutcome> {
        match self {
            RoundState::Revealed { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// Colour in `seat`; before any game the member's seat is the bottom, as white.
    pub fn seat_side(&self, seat: Seat) -> Side {
        match self.replay() {
            Some(replay) => replay.seat_side(seat),
            None => match seat {
                Seat::Bottom => Side::White,
                Seat::Top => Side::Black,
            },
        }
    }

    /// Name shown for `seat`. Identities stay hidden until the reveal, and
    /// the member label follows the member's colour, not the seat.
    pub fn seat_label(&self, seat: Seat) -> String {
        let side = self.seat_side(seat);
        match self {
            RoundState::Initial => match seat {
                Seat::Bottom => BM_MEMBER_LABEL.to_string(),
                Seat::Top => RANDOM_PLAYER_LABEL.to_string(),
            },
            RoundState::Guessing(loaded) => {
                if side == loaded.game.bm_side() {
                    BM_MEMBER_LABEL.to_string()
                } else {
                    RANDOM_NOOB_LABEL.to_string()
                }
            }
            RoundState::Revealed { loaded, .. } => loaded.game.player(side).username.clone(),
        }
    }
}
