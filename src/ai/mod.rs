//! Bot move generation: the strategy seam, difficulty levels, and the
//! negamax searcher with its positional heuristic.

mod negamax;
mod position;
mod strategy;

pub use negamax::{Heuristic, NegamaxBot, WindowHeuristic};
pub use position::{center_order, Position, OPPONENT, OWN};
pub use strategy::{BotConfig, BotLevel, BotProfile, BotStrategy, ParseLevelError};
