//! Core Connect Four game logic: a configurable gravity board with
//! incremental win detection, seated players, and the game state machine.

mod board;
mod player;
mod state;

pub use board::{Board, BoardConfig, Cell, Move, MoveError, CONNECT, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use player::{OnlineId, Player, PlayerId, PlayerRole, UNASSIGNED_ONLINE_ID};
pub use state::{Game, GameError, GameOutcome, GameStatus};
