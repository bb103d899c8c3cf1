//! Construction-only collaborators used by the orchestrator to build boards,
//! players and games.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::ai::{BotConfig, BotLevel, BotStrategy, NegamaxBot};
use crate::game::{Board, BoardConfig, Game, GameError, OnlineId, Player, PlayerId, PlayerRole};

pub trait BoardFactory: Send + Sync {
    fn create(&self, width: usize, height: usize) -> Result<Board, GameError>;
}

pub trait PlayerFactory: Send + Sync {
    fn create(&self, role: PlayerRole, online_id: OnlineId) -> Player;
}

pub trait GameFactory: Send + Sync {
    /// Build a running game for `players`, seated in order. `level` only
    /// matters when one of the seats is a bot.
    fn create(&self, players: Vec<Player>, level: Option<BotLevel>) -> Result<Game, GameError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBoardFactory;

impl BoardFactory for StandardBoardFactory {
    fn create(&self, width: usize, height: usize) -> Result<Board, GameError> {
        if width == 0 || height == 0 {
            return Err(GameError::BoardSize { width, height });
        }
        Ok(Board::new(width, height))
    }
}

/// Hands out player ids 1, 2, 3, ... for the lifetime of the factory.
#[derive(Debug)]
pub struct SequentialPlayerFactory {
    next_id: AtomicU32,
}

impl SequentialPlayerFactory {
    pub fn new() -> Self {
        SequentialPlayerFactory {
            next_id: AtomicU32::new(1),
        }
    }
}

impl Default for SequentialPlayerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerFactory for SequentialPlayerFactory {
    fn create(&self, role: PlayerRole, online_id: OnlineId) -> Player {
        let id = PlayerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        Player::new(id, role, online_id)
    }
}

/// Builds games on a configured board size, attaching a [`NegamaxBot`] for
/// the requested level when a bot is seated.
pub struct StandardGameFactory {
    boards: Arc<dyn BoardFactory>,
    board: BoardConfig,
    bots: BotConfig,
}

impl StandardGameFactory {
    pub fn new(board: BoardConfig, bots: BotConfig) -> Self {
        Self::with_board_factory(Arc::new(StandardBoardFactory), board, bots)
    }

    pub fn with_board_factory(
        boards: Arc<dyn BoardFactory>,
        board: BoardConfig,
        bots: BotConfig,
    ) -> Self {
        StandardGameFactory {
            boards,
            board,
            bots,
        }
    }
}

impl Default for StandardGameFactory {
    fn default() -> Self {
        Self::new(BoardConfig::default(), BotConfig::default())
    }
}

impl GameFactory for StandardGameFactory {
    fn create(&self, players: Vec<Player>, level: Option<BotLevel>) -> Result<Game, GameError> {
        let board = self.boards.create(self.board.width, self.board.height)?;
        let bot = if players.iter().any(|p| p.role() == PlayerRole::Bot) {
            let level = level.unwrap_or_default();
            let strategy: Arc<dyn BotStrategy> = Arc::new(NegamaxBot::for_level(&self.bots, level));
            Some(strategy)
        } else {
            None
        };
        Game::new(board, players, bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::UNASSIGNED_ONLINE_ID;

    #[test]
    fn test_player_ids_are_sequential() {
        let factory = SequentialPlayerFactory::new();
        let a = factory.create(PlayerRole::Human, UNASSIGNED_ONLINE_ID);
        let b = factory.create(PlayerRole::Remote, 7);
        assert_eq!(a.id(), PlayerId(1));
        assert_eq!(b.id(), PlayerId(2));
        assert_eq!(b.online_id(), 7);
        assert_eq!(b.role(), PlayerRole::Remote);
    }

    #[test]
    fn test_board_factory_uses_requested_size() {
        let board = StandardBoardFactory.create(9, 8).unwrap();
        assert_eq!((board.width(), board.height()), (9, 8));
    }

    #[test]
    fn test_board_factory_rejects_empty_dimensions() {
        assert_eq!(
            StandardBoardFactory.create(0, 6).unwrap_err(),
            GameError::BoardSize {
                width: 0,
                height: 6
            }
        );
        assert!(StandardBoardFactory.create(7, 0).is_err());
    }

    #[test]
    fn test_game_factory_reports_zero_sized_board() {
        let factory = StandardGameFactory::new(
            BoardConfig {
                width: 0,
                height: 6,
            },
            BotConfig::default(),
        );
        let players = SequentialPlayerFactory::new();
        let err = factory
            .create(
                vec![
                    players.create(PlayerRole::Human, 0),
                    players.create(PlayerRole::Bot, 0),
                ],
                None,
            )
            .unwrap_err();
        assert_eq!(
            err,
            GameError::BoardSize {
                width: 0,
                height: 6
            }
        );
    }

    #[test]
    fn test_game_factory_attaches_bot_only_with_bot_seat() {
        let players = SequentialPlayerFactory::new();
        let factory = StandardGameFactory::default();

        let humans = vec![
            players.create(PlayerRole::Human, 0),
            players.create(PlayerRole::Human, 0),
        ];
        let game = factory.create(humans, Some(BotLevel::Hard)).unwrap();
        assert!(game.bot().is_none());

        let vs_bot = vec![
            players.create(PlayerRole::Human, 0),
            players.create(PlayerRole::Bot, 0),
        ];
        let game = factory.create(vs_bot, None).unwrap();
        assert!(game.bot().is_some());
        assert!(game.is_running());
    }

    #[test]
    fn test_game_factory_uses_board_config() {
        let factory = StandardGameFactory::new(
            BoardConfig {
                width: 5,
                height: 4,
            },
            BotConfig::default(),
        );
        let players = SequentialPlayerFactory::new();
        let game = factory
            .create(
                vec![
                    players.create(PlayerRole::Human, 0),
                    players.create(PlayerRole::Human, 0),
                ],
                None,
            )
            .unwrap();
        assert_eq!(game.board().width(), 5);
        assert_eq!(game.board().height(), 4);
    }

    #[test]
    fn test_game_factory_rejects_single_player() {
        let players = SequentialPlayerFactory::new();
        let err = StandardGameFactory::default()
            .create(vec![players.create(PlayerRole::Human, 0)], None)
            .unwrap_err();
        assert_eq!(err, GameError::PlayerCount(1));
    }
}
