use std::fmt;
use std::sync::Arc;

use super::board::{Board, Move, MoveError};
use super::player::{Player, PlayerId, PlayerRole};
use crate::ai::BotStrategy;

/// Lifecycle of a game. Transitions only move forward; `Finished` and
/// `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    NotStarted,
    Running,
    Finished,
    Aborted,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Finished | GameStatus::Aborted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(PlayerId),
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("game is not running (status: {0:?})")]
    NotRunning(GameStatus),

    #[error("it is not player {player}'s turn (player {expected} moves next)")]
    NotYourTurn { player: PlayerId, expected: PlayerId },

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("a game needs exactly two players, got {0}")]
    PlayerCount(usize),

    #[error("player id {0} is seated twice")]
    DuplicatePlayer(PlayerId),

    #[error("board must be at least 1x1, got {width}x{height}")]
    BoardSize { width: usize, height: usize },
}

/// One match: a board, two seated players in turn order, and an optional bot.
#[derive(Clone)]
pub struct Game {
    board: Board,
    players: [Player; 2],
    current: usize,
    status: GameStatus,
    outcome: Option<GameOutcome>,
    bot: Option<Arc<dyn BotStrategy>>,
}

impl Game {
    /// Seat `players` in the given order. The first player moves first and
    /// the game is running as soon as it exists.
    pub fn new(
        board: Board,
        players: Vec<Player>,
        bot: Option<Arc<dyn BotStrategy>>,
    ) -> Result<Self, GameError> {
        let players: [Player; 2] = players
            .try_into()
            .map_err(|rejected: Vec<Player>| GameError::PlayerCount(rejected.len()))?;
        if players[0].id() == players[1].id() {
            return Err(GameError::DuplicatePlayer(players[0].id()));
        }

        Ok(Game {
            board,
            players,
            current: 0,
            status: GameStatus::Running,
            outcome: None,
            bot,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Running
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome {
            Some(GameOutcome::Winner(id)) => Some(id),
            _ => None,
        }
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    /// The first human seat; in an online game this is the local player.
    pub fn local_human(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.role() == PlayerRole::Human)
    }

    /// The player about to move. On a finished or aborted game this is
    /// whatever was set last, so callers check [`Game::status`] first.
    pub fn next_player(&self) -> &Player {
        &self.players[self.current]
    }

    pub fn current_player_index(&self) -> usize {
        self.current
    }

    pub fn bot(&self) -> Option<&Arc<dyn BotStrategy>> {
        self.bot.as_ref()
    }

    pub fn move_count(&self) -> usize {
        self.board.move_count()
    }

    /// Apply `player_id`'s drop into `column`. A rejected move changes nothing.
    pub fn make_move(&mut self, player_id: PlayerId, column: usize) -> Result<Move, GameError> {
        if self.status != GameStatus::Running {
            return Err(GameError::NotRunning(self.status));
        }
        let expected = self.next_player().id();
        if player_id != expected {
            return Err(GameError::NotYourTurn {
                player: player_id,
                expected,
            });
        }

        let mv = self.board.place(column, player_id)?;
        self.current = 1 - self.current;

        if mv.is_connected {
            self.outcome = Some(GameOutcome::Winner(player_id));
            self.status = GameStatus::Finished;
        } else if mv.is_tie {
            self.outcome = Some(GameOutcome::Draw);
            self.status = GameStatus::Finished;
        }

        Ok(mv)
    }

    /// Force the game into `Aborted`. Has no effect on a game that already ended.
    pub fn abort(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = GameStatus::Aborted;
        true
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("board", &self.board)
            .field("players", &self.players)
            .field("current", &self.current)
            .field("status", &self.status)
            .field("outcome", &self.outcome)
            .field("bot", &self.bot.as_ref().map(|b| b.name()))
            .finish()
    }
}
