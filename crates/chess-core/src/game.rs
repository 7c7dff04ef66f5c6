use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::clock::extract_clock_times;
use crate::pgn::{parse_headers, parse_history, MoveHistory, PgnError};

/// Games shorter than this many half-moves are not worth guessing.
pub const MIN_HALF_MOVES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn flip(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub username: String,
    pub rating: i32,
    #[serde(rename = "isBMMember")]
    pub is_bm_member: bool,
}

/// One fetched game, used for a single guessing round. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub pgn: String,
    pub stripped_pgn: String,
    pub clock_times: Vec<String>,
    pub white_player: PlayerInfo,
    pub black_player: PlayerInfo,
    pub game_link: String,
    pub result: String,
    pub date: String,
    pub start_time: String,
    pub time_control: String,
    pub termination_message: String,
}

/// Raw inputs for [`Game::assemble`], as delivered by the archive API.
#[derive(Debug, Clone)]
pub struct GameSourceData<'a> {
    pub pgn: &'a str,
    pub white: (&'a str, i32),
    pub black: (&'a str, i32),
    pub game_link: &'a str,
    /// Username of the community member the game was fetched for.
    pub member: &'a str,
}

impl Game {
    /// Build a game record from a raw archive entry.
    ///
    /// Rejects PGNs the rules engine cannot replay and games shorter than
    /// [`MIN_HALF_MOVES`].
    pub fn assemble(data: GameSourceData<'_>) -> Result<(Game, MoveHistory), GameBuildError> {
        let history = parse_history(data.pgn)?;
        if history.len() < MIN_HALF_MOVES {
            return Err(GameBuildError::TooShort(history.len()));
        }

        let extraction = extract_clock_times(data.pgn);
        if !extraction.clock_times.is_empty() && extraction.clock_times.len() != history.len() {
            tracing::warn!(
                clocks = extraction.clock_times.len(),
                plies = history.len(),
                "Clock annotations do not cover every half-move"
            );
        }

        let headers = parse_headers(data.pgn);
        let white_is_member = data.white.0.eq_ignore_ascii_case(data.member);

        let game = Game {
            pgn: data.pgn.to_string(),
            stripped_pgn: extraction.stripped_pgn,
            clock_times: extraction.clock_times,
            white_player: PlayerInfo {
                username: data.white.0.to_string(),
                rating: data.white.1,
                is_bm_member: white_is_member,
            },
            black_player: PlayerInfo {
                username: data.black.0.to_string(),
                rating: data.black.1,
                is_bm_member: !white_is_member,
            },
            game_link: if data.game_link.is_empty() { headers.link } else { data.game_link.to_string() },
            result: headers.result,
            date: headers.date,
            start_time: headers.start_time,
            time_control: headers.time_control,
            termination_message: headers.termination,
        };

        Ok((game, history))
    }

    /// The side the community member played.
    pub fn bm_side(&self) -> Side {
        if self.white_player.is_bm_member { Side::White } else { Side::Black }
    }

    pub fn player(&self, side: Side) -> &PlayerInfo {
        match side {
            Side::White => &self.white_player,
            Side::Black => &self.black_player,
        }
    }

    /// Average of both ratings, rounded half away from zero.
    pub fn average_elo(&self) -> i32 {
        average_elo(self.white_player.rating, self.black_player.rating)
    }
}

pub fn average_elo(white: i32, black: i32) -> i32 {
    ((white + black) as f64 / 2.0).round() as i32
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameBuildError {
    #[error("Malformed PGN: {0}")]
    MalformedPgn(#[from] PgnError),

    #[error("Game too short: {0} half-moves")]
    TooShort(usize),
}
