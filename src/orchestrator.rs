//! Runs one match at a time: builds the game for the requested mode, applies
//! local moves, drives the bot seat, relays moves to the online opponent and
//! publishes every applied move to the subscriber.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};

use crate::ai::BotLevel;
use crate::config::AppConfig;
use crate::error::{GameServerError, MatchError, ServiceError, StateError};
use crate::factory::{GameFactory, PlayerFactory, SequentialPlayerFactory, StandardGameFactory};
use crate::game::{
    Game, Move, OnlineId, Player, PlayerId, PlayerRole, UNASSIGNED_ONLINE_ID,
};
use crate::net::{GameService, RelayedMove};

const START_GAME: &str = "start_game";
const REQUEST_FIRST_MOVE: &str = "request_first_move";
const NEXT_MOVE: &str = "next_move";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    /// Local human against the bot.
    SinglePlayer,
    /// Two humans sharing one board.
    TwoPlayers,
    /// Local human against a remote opponent found through matchmaking.
    Online,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::SinglePlayer, GameMode::TwoPlayers, GameMode::Online];

    pub fn name(self) -> &'static str {
        match self {
            GameMode::SinglePlayer => "SinglePlayer",
            GameMode::TwoPlayers => "TwoPlayers",
            GameMode::Online => "Online",
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            GameMode::SinglePlayer => "single",
            GameMode::TwoPlayers => "two",
            GameMode::Online => "online",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game mode '{0}' (expected single, two or online)")]
pub struct ParseModeError(pub String);

impl FromStr for GameMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect();
        GameMode::ALL
            .into_iter()
            .find(|mode| {
                mode.name().eq_ignore_ascii_case(&wanted)
                    || mode.short_name().eq_ignore_ascii_case(&wanted)
            })
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}

/// Settings for the online mode, the `[online]` table of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OnlineConfig {
    /// Per-request limit in milliseconds. 0 waits indefinitely.
    pub request_timeout_ms: u64,
    /// Matchmaking polls before giving up. 0 polls until matched.
    pub max_matchmaking_rounds: usize,
}

impl Default for OnlineConfig {
    fn default() -> Self {
        OnlineConfig {
            request_timeout_ms: 30_000,
            max_matchmaking_rounds: 0,
        }
    }
}

impl OnlineConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

/// An applied move, as delivered to the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    pub player_id: PlayerId,
    pub row: usize,
    pub column: usize,
    pub is_connected: bool,
    pub is_tie: bool,
}

impl MoveEvent {
    pub fn is_terminal(&self) -> bool {
        self.is_connected || self.is_tie
    }
}

impl From<Move> for MoveEvent {
    fn from(mv: Move) -> Self {
        MoveEvent {
            player_id: mv.player_id,
            row: mv.row,
            column: mv.column,
            is_connected: mv.is_connected,
            is_tie: mv.is_tie,
        }
    }
}

pub type MoveReceiver = mpsc::UnboundedReceiver<MoveEvent>;

#[derive(Default)]
struct CloseSignal {
    closed: AtomicBool,
    notify: Notify,
}

/// Closes a [`MatchOrchestrator`] from outside the task driving it. A
/// request the orchestrator is waiting on fails as soon as the handle closes.
///
/// The handle aborts the service that was attached when it was taken.
#[derive(Clone)]
pub struct CloseHandle {
    signal: Arc<CloseSignal>,
    service: Option<Arc<dyn GameService>>,
}

impl CloseHandle {
    /// Abort the server connection. Safe to call more than once.
    pub fn close(&self) {
        if self.signal.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("closing match orchestrator, server connection will be aborted");
        if let Some(service) = &self.service {
            service.abort();
        }
        self.signal.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.signal.closed.load(Ordering::SeqCst)
    }
}

/// Owns the active [`Game`] and everything needed to advance it.
///
/// `start_game` and `next_move` take `&mut self`, so a second call cannot
/// begin while one is still awaiting the bot or the network. Use
/// [`MatchOrchestrator::close_handle`] to close while such a call is pending.
pub struct MatchOrchestrator {
    game_factory: Arc<dyn GameFactory>,
    player_factory: Arc<dyn PlayerFactory>,
    service: Option<Arc<dyn GameService>>,
    online: OnlineConfig,
    game: Option<Game>,
    subscriber: Option<mpsc::UnboundedSender<MoveEvent>>,
    close: Arc<CloseSignal>,
}

impl MatchOrchestrator {
    pub fn new(game_factory: Arc<dyn GameFactory>, player_factory: Arc<dyn PlayerFactory>) -> Self {
        MatchOrchestrator {
            game_factory,
            player_factory,
            service: None,
            online: OnlineConfig::default(),
            game: None,
            subscriber: None,
            close: Arc::default(),
        }
    }

    /// Standard factories built from the `[board]` and `[bot]` tables.
    pub fn from_config(config: &AppConfig) -> Self {
        let games = StandardGameFactory::new(config.board, config.bot.clone());
        Self::new(Arc::new(games), Arc::new(SequentialPlayerFactory::new()))
            .with_online_config(config.online)
    }

    pub fn with_service(mut self, service: Arc<dyn GameService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_online_config(mut self, online: OnlineConfig) -> Self {
        self.online = online;
        self
    }

    /// Register the move subscriber, replacing any earlier one.
    pub fn subscribe(&mut self) -> MoveReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.subscriber.replace(tx).is_some() {
            tracing::debug!("replaced move subscriber");
        }
        rx
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.close.closed.load(Ordering::SeqCst)
    }

    /// Handle for closing from another task. Take it after the service is
    /// attached.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            signal: Arc::clone(&self.close),
            service: self.service.clone(),
        }
    }

    /// Discard the current game and start a new one in `mode`.
    ///
    /// In online mode this runs matchmaking first and, when the opponent
    /// opens, applies and publishes its first move before returning.
    pub async fn start_game(
        &mut self,
        mode: GameMode,
        level: Option<BotLevel>,
    ) -> Result<(), MatchError> {
        self.ensure_subscribed()?;
        self.game = None;

        let (players, opening_from) = match mode {
            GameMode::SinglePlayer => (
                vec![
                    self.player_factory.create(PlayerRole::Human, UNASSIGNED_ONLINE_ID),
                    self.player_factory.create(PlayerRole::Bot, UNASSIGNED_ONLINE_ID),
                ],
                None,
            ),
            GameMode::TwoPlayers => (
                vec![
                    self.player_factory.create(PlayerRole::Human, UNASSIGNED_ONLINE_ID),
                    self.player_factory.create(PlayerRole::Human, UNASSIGNED_ONLINE_ID),
                ],
                None,
            ),
            GameMode::Online => self.matchmake().await?,
        };

        let game = self
            .game_factory
            .create(players, level)
            .map_err(|e| invalid(StateError::InvalidSetup(e)))?;
        tracing::info!(
            mode = mode.name(),
            level = ?level,
            first = %game.next_player().id(),
            "game started"
        );
        self.game = Some(game);

        if let Some(assigned_id) = opening_from {
            self.fetch_first_move(assigned_id).await?;
        }
        Ok(())
    }

    /// Apply `column` for `player_id`, publish it, then let the next seat
    /// respond if it is the bot or the remote opponent.
    pub async fn next_move(&mut self, player_id: PlayerId, column: usize) -> Result<(), MatchError> {
        self.ensure_subscribed()?;

        let (mv, next) = {
            let game = self
                .game
                .as_mut()
                .ok_or_else(|| invalid(StateError::NoActiveGame))?;
            if !game.is_running() {
                return Err(invalid(StateError::GameNotRunning(game.status())));
            }
            let mv = game.make_move(player_id, column)?;
            (mv, *game.next_player())
        };
        self.publish(mv)?;
        if mv.is_terminal() {
            return Ok(());
        }

        match next.role() {
            PlayerRole::Human => Ok(()),
            PlayerRole::Bot => self.play_bot_turn(next.id()).await,
            PlayerRole::Remote => self.relay_move(&next, column).await,
        }
    }

    /// Force the active game into `Aborted`. Returns false when there is no
    /// game or it had already ended.
    pub fn abort_game(&mut self) -> bool {
        let aborted = self.game.as_mut().is_some_and(Game::abort);
        if aborted {
            tracing::info!("game aborted");
        }
        aborted
    }

    /// Abort the server connection. Safe to call more than once.
    pub fn close(&self) {
        self.close_handle().close();
    }

    fn ensure_subscribed(&self) -> Result<(), MatchError> {
        match &self.subscriber {
            Some(tx) if !tx.is_closed() => Ok(()),
            _ => Err(invalid(StateError::NoSubscriber)),
        }
    }

    fn publish(&self, mv: Move) -> Result<(), MatchError> {
        let tx = self
            .subscriber
            .as_ref()
            .ok_or_else(|| invalid(StateError::NoSubscriber))?;
        tx.send(MoveEvent::from(mv))
            .map_err(|_| invalid(StateError::NoSubscriber))
    }

    fn service(&self) -> Result<Arc<dyn GameService>, MatchError> {
        self.service
            .clone()
            .ok_or_else(|| invalid(StateError::ServiceNotConfigured))
    }

    fn active_game(&self) -> Result<&Game, MatchError> {
        self.game
            .as_ref()
            .ok_or_else(|| invalid(StateError::NoActiveGame))
    }

    fn active_game_mut(&mut self) -> Result<&mut Game, MatchError> {
        self.game
            .as_mut()
            .ok_or_else(|| invalid(StateError::NoActiveGame))
    }

    /// Await one service request under the configured timeout and tag any
    /// failure with `operation`. Closing the orchestrator cuts the wait short.
    async fn call<T>(
        &self,
        operation: &'static str,
        request: impl Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, MatchError> {
        // Registered before the flag is read so a close in between still wakes us.
        let closed = self.close.notify.notified();
        tokio::pin!(closed);
        closed.as_mut().enable();

        let result = if self.is_closed() {
            Err(ServiceError::Communication("connection was closed".into()))
        } else {
            let response = async {
                match self.online.request_timeout() {
                    Some(limit) => tokio::time::timeout(limit, request)
                        .await
                        .unwrap_or_else(|_| {
                            Err(ServiceError::Timeout(format!(
                                "no response within {} ms",
                                limit.as_millis()
                            )))
                        }),
                    None => request.await,
                }
            };
            tokio::select! {
                result = response => result,
                () = closed => Err(ServiceError::Communication(
                    "connection closed while waiting for a response".into(),
                )),
            }
        };
        result.map_err(|source| server_error(operation, source))
    }

    /// Poll until an opponent is confirmed. Returns the seats in turn order
    /// and, when the opponent opens, the id to fetch its first move with.
    async fn matchmake(&self) -> Result<(Vec<Player>, Option<OnlineId>), MatchError> {
        let service = self.service()?;
        let limit = self.online.max_matchmaking_rounds;
        let mut local_id = UNASSIGNED_ONLINE_ID;
        let mut rounds = 0;

        loop {
            if limit > 0 && rounds == limit {
                return Err(server_error(
                    START_GAME,
                    ServiceError::Timeout(format!("no opponent after {limit} matchmaking rounds")),
                ));
            }
            rounds += 1;

            let poll = self.call(START_GAME, service.request_match(local_id)).await?;
            local_id = poll.assigned_id;
            if !poll.is_ready {
                tracing::debug!(local_id, "waiting for an opponent");
                continue;
            }

            let confirm = self.call(START_GAME, service.confirm_match(local_id)).await?;
            if !confirm.is_confirmed {
                tracing::debug!(local_id, "match declined, polling again");
                continue;
            }

            tracing::info!(local_id, local_turn = confirm.is_local_turn, "match confirmed");
            let human = self.player_factory.create(PlayerRole::Human, local_id);
            let remote = self.player_factory.create(PlayerRole::Remote, UNASSIGNED_ONLINE_ID);
            return Ok(if confirm.is_local_turn {
                (vec![human, remote], None)
            } else {
                (vec![remote, human], Some(local_id))
            });
        }
    }

    async fn fetch_first_move(&mut self, assigned_id: OnlineId) -> Result<(), MatchError> {
        let service = self.service()?;
        let response = self
            .call(REQUEST_FIRST_MOVE, service.request_first_move(assigned_id))
            .await?;
        match response.relayed {
            Some(relayed) => self.apply_relayed(REQUEST_FIRST_MOVE, relayed),
            None => Ok(()),
        }
    }

    async fn play_bot_turn(&mut self, bot_id: PlayerId) -> Result<(), MatchError> {
        let (strategy, board) = {
            let game = self.active_game()?;
            let strategy = game
                .bot()
                .cloned()
                .ok_or_else(|| invalid(StateError::BotNotConfigured))?;
            (strategy, game.board().clone())
        };

        let column = tokio::task::spawn_blocking(move || strategy.generate_move(&board, bot_id))
            .await
            .map_err(|e| invalid(StateError::BotFailed(e.to_string())))?
            .ok_or_else(|| invalid(StateError::BotFailed("no legal column".into())))?;

        let mv = self.active_game_mut()?.make_move(bot_id, column)?;
        self.publish(mv)
    }

    async fn relay_move(&mut self, remote: &Player, column: usize) -> Result<(), MatchError> {
        let service = self.service()?;
        let local_id = self
            .active_game()?
            .local_human()
            .map(Player::online_id)
            .ok_or_else(|| invalid(StateError::NoLocalPlayer))?;

        let response = self
            .call(NEXT_MOVE, service.submit_move(local_id, remote.online_id(), column))
            .await?;
        match response.relayed {
            Some(relayed) => self.apply_relayed(NEXT_MOVE, relayed),
            None => Ok(()),
        }
    }

    /// Apply a move received from the service on behalf of the remote seat.
    /// A move the local game cannot accept is a fault of the remote side.
    fn apply_relayed(&mut self, operation: &'static str, relayed: RelayedMove) -> Result<(), MatchError> {
        let game = self.active_game_mut()?;
        let next = *game.next_player();
        if next.role() != PlayerRole::Remote {
            return Err(server_error(
                operation,
                ServiceError::Fault(format!("move relayed while {} is to move", next.id())),
            ));
        }
        let mv = game.make_move(next.id(), relayed.column).map_err(|e| {
            server_error(operation, ServiceError::Fault(format!("relayed move rejected: {e}")))
        })?;
        self.publish(mv)
    }
}

fn invalid(err: StateError) -> MatchError {
    tracing::error!(error = %err, "invalid operation");
    MatchError::State(err)
}

fn server_error(operation: &'static str, source: ServiceError) -> MatchError {
    tracing::error!(operation, error = %source, "game server request failed");
    GameServerError::new(operation, source).into()
}
