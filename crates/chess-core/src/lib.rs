pub mod clock;
pub mod game;
pub mod pgn;
pub mod replay;

pub use game::{Game, PlayerInfo, Side};
pub use replay::{classify_move, MoveCategory, Replay, Seat};
