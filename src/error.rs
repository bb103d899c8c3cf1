use std::path::PathBuf;

use crate::game::{GameError, GameStatus};

/// Failures reported by the matchmaking/move-relay service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("remote fault: {0}")]
    Fault(String),

    #[error("communication failure: {0}")]
    Communication(String),
}

/// A service failure tagged with the orchestrator operation that hit it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("game server request failed during {operation}: {source}")]
pub struct GameServerError {
    pub operation: &'static str,
    #[source]
    pub source: ServiceError,
}

impl GameServerError {
    pub fn new(operation: &'static str, source: ServiceError) -> Self {
        GameServerError { operation, source }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.source, ServiceError::Timeout(_))
    }
}

/// An orchestrator operation was invoked while its precondition was false.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("no game is active")]
    NoActiveGame,

    #[error("game is not running (status: {0:?})")]
    GameNotRunning(GameStatus),

    #[error("no move subscriber is registered")]
    NoSubscriber,

    #[error("game could not be set up: {0}")]
    InvalidSetup(GameError),

    #[error("a bot seat is due to move but the game has no bot strategy")]
    BotNotConfigured,

    #[error("bot search failed: {0}")]
    BotFailed(String),

    #[error("online play requires a game service")]
    ServiceNotConfigured,

    #[error("the game has no local human seat")]
    NoLocalPlayer,
}

/// Everything the match orchestrator can return to its caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("invalid move: {0}")]
    InvalidMove(#[from] GameError),

    #[error("invalid operation: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    GameServer(#[from] GameServerError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
