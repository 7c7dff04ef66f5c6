//! Shared fixtures: a rapid game with clock annotations and an in-memory
//! game source that never touches the network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use guess_server::clients::backend::{RandomPlayer, Ratings};
use guess_server::clients::chess_com::{ArchivedGame, ArchivedPlayer};
use guess_server::config::FetchSettings;
use guess_server::fetcher::{FetchError, GameSource};

pub const MEMBER: &str = "KnightRiderBM";
pub const OPPONENT: &str = "patzer_pal";

/// Blackburne Shilling trap, 14 half-moves, every one with a clock.
pub const TRAP_PGN: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[Date "2023.03.18"]
[White "knightriderbm"]
[Black "patzer_pal"]
[Result "0-1"]
[TimeControl "600"]
[StartTime "19:44:02"]
[Termination "patzer_pal won by checkmate"]

1. e4 {[%clk 0:09:58.9]} 1... e5 {[%clk 0:09:57.1]} 2. Nf3 {[%clk 0:09:55]} 2... Nc6 {[%clk 0:09:52]}
3. Bc4 {[%clk 0:09:50]} 3... Nd4 {[%clk 0:09:41]} 4. Nxe5 {[%clk 0:09:33]} 4... Qg5 {[%clk 0:09:30]}
5. Nxf7 {[%clk 0:09:12]} 5... Qxg2 {[%clk 0:09:20]} 6. Rf1 {[%clk 0:09:01]} 6... Qxe4+ {[%clk 0:09:10]}
7. Be2 {[%clk 0:08:40]} 7... Nf3# {[%clk 0:09:05]} 0-1"#;

pub const ARCHIVES: [&str; 3] = [
    "https://api.chess.com/pub/player/knightriderbm/games/2021/05",
    "https://api.chess.com/pub/player/knightriderbm/games/2022/01",
    "https://api.chess.com/pub/player/knightriderbm/games/2023/03",
];

pub fn archived(pgn: &str, time_class: &str) -> ArchivedGame {
    ArchivedGame {
        rules: "chess".to_string(),
        time_class: time_class.to_string(),
        pgn: pgn.to_string(),
        white: ArchivedPlayer {
            username: "knightriderbm".to_string(),
            rating: 1210,
        },
        black: ArchivedPlayer {
            username: OPPONENT.to_string(),
            rating: 1290,
        },
        url: "https://www.chess.com/game/live/73510".to_string(),
    }
}

/// Always hands out the same member. Every in-range month holds a rapid
/// copy of the trap game, so a fetch can never come up empty.
pub struct MemorySource {
    pub months: HashMap<String, Vec<ArchivedGame>>,
    pub player_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        let months = HashMap::from([
            (ARCHIVES[0].to_string(), vec![archived(TRAP_PGN, "rapid")]),
            (
                ARCHIVES[1].to_string(),
                vec![archived(TRAP_PGN, "blitz"), archived(TRAP_PGN, "rapid")],
            ),
            (ARCHIVES[2].to_string(), vec![archived(TRAP_PGN, "rapid")]),
        ]);
        Self {
            months,
            player_calls: AtomicUsize::new(0),
        }
    }

    pub fn player_calls(&self) -> usize {
        self.player_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameSource for MemorySource {
    async fn random_player(&self) -> Result<RandomPlayer, FetchError> {
        self.player_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RandomPlayer {
            chess_username: MEMBER.to_string(),
            ratings: Ratings { rapid: Some(1210) },
        })
    }

    async fn archives(&self, _username: &str) -> Result<Vec<String>, FetchError> {
        Ok(ARCHIVES.iter().map(|s| s.to_string()).collect())
    }

    async fn month_games(&self, archive_url: &str) -> Result<Vec<ArchivedGame>, FetchError> {
        Ok(self.months.get(archive_url).cloned().unwrap_or_default())
    }
}

/// Always ask the backend, so runs do not depend on the frequent-user roll.
pub fn settings() -> FetchSettings {
    FetchSettings {
        frequent_user_probability: 0.0,
        ..Default::default()
    }
}
