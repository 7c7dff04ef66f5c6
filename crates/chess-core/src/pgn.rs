//! PGN parsing utilities. A lightweight regex-based parser, with move
//! legality checked by replaying through shakmaty.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use shakmaty::{san::SanPlus, Chess, Move, Position};

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).unwrap());
static HEADER_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}").unwrap());
static VARIATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?").unwrap()
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PgnError {
    #[error("PGN contains no moves")]
    Empty,

    #[error("Invalid SAN '{san}' at ply {ply}")]
    InvalidSan { san: String, ply: usize },

    #[error("Illegal move '{san}' at ply {ply}")]
    IllegalMove { san: String, ply: usize },
}

/// The header fields the game view reads. Missing headers are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgnHeaders {
    pub white: String,
    pub black: String,
    pub date: String,
    pub start_time: String,
    pub time_control: String,
    pub result: String,
    pub termination: String,
    pub link: String,
}

/// Read the fixed header schema from a PGN.
pub fn parse_headers(pgn: &str) -> PgnHeaders {
    let mut headers = PgnHeaders::default();

    for cap in HEADER_RE.captures_iter(pgn) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => headers.white = value,
            "Black" => headers.black = value,
            "Date" => headers.date = value,
            "StartTime" => headers.start_time = value,
            "TimeControl" => headers.time_control = value,
            "Result" => headers.result = value,
            "Termination" => headers.termination = value,
            "Link" => headers.link = value,
            _ => {}
        }
    }

    headers
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
pub fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_LINE_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");
    let no_variations = VARIATION_RE.replace_all(&no_comments, "");

    MOVE_RE
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A validated move list: the SAN text as written in the PGN and the
/// corresponding legal moves from the standard starting position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    pub sans: Vec<String>,
    pub moves: Vec<Move>,
}

impl MoveHistory {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Parse the move text of `pgn` and check every move is legal.
pub fn parse_history(pgn: &str) -> Result<MoveHistory, PgnError> {
    let sans = extract_moves(pgn);
    if sans.is_empty() {
        return Err(PgnError::Empty);
    }

    let mut pos = Chess::default();
    let mut moves = Vec::with_capacity(sans.len());

    for (ply, san_str) in sans.iter().enumerate() {
        let san: SanPlus = san_str.parse().map_err(|_| PgnError::InvalidSan {
            san: san_str.clone(),
            ply,
        })?;

        let mv = san.san.to_move(&pos).map_err(|_| PgnError::IllegalMove {
            san: san_str.clone(),
            ply,
        })?;

        pos.play_unchecked(mv.clone());
        moves.push(mv);
    }

    Ok(MoveHistory { sans, moves })
}
