use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ConfirmResponse, GameService, MatchResponse, MoveResponse};
use crate::ai::{BotConfig, BotProfile, BotStrategy, NegamaxBot};
use crate::error::ServiceError;
use crate::game::{Board, BoardConfig, OnlineId, PlayerId, UNASSIGNED_ONLINE_ID};

const LOCAL_SEAT: PlayerId = PlayerId(1);
const REMOTE_SEAT: PlayerId = PlayerId(2);

/// How the loopback relay behaves during matchmaking and play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopbackSettings {
    pub board: BoardConfig,
    /// Profile of the bot playing the remote seat.
    pub opponent: BotProfile,
    /// Polls answered with "not ready" before an opponent shows up.
    pub polls_before_ready: usize,
    /// Confirmations declined before one is accepted.
    pub declines: usize,
    pub local_moves_first: bool,
    /// First id handed out to a new player.
    pub first_assigned_id: OnlineId,
}

impl Default for LoopbackSettings {
    fn default() -> Self {
        LoopbackSettings {
            board: BoardConfig::default(),
            opponent: BotConfig::default().easy,
            polls_before_ready: 0,
            declines: 0,
            local_moves_first: true,
            first_assigned_id: 1,
        }
    }
}

struct Session {
    local_id: OnlineId,
    board: Board,
}

struct RelayState {
    next_id: OnlineId,
    polls_left: usize,
    declines_left: usize,
    closed: bool,
    session: Option<Session>,
}

/// In-process [`GameService`] whose remote opponent is a bot. It keeps its
/// own copy of the board, so it rejects illegal submissions the way a real
/// relay would.
pub struct LoopbackRelay {
    settings: LoopbackSettings,
    opponent: NegamaxBot,
    state: Mutex<RelayState>,
}

impl LoopbackRelay {
    pub fn new(settings: LoopbackSettings) -> Self {
        LoopbackRelay {
            opponent: NegamaxBot::new(settings.opponent),
            state: Mutex::new(RelayState {
                next_id: settings.first_assigned_id.max(1),
                polls_left: settings.polls_before_ready,
                declines_left: settings.declines,
                closed: false,
                session: None,
            }),
            settings,
        }
    }

    fn with_open_state<T>(
        &self,
        f: impl FnOnce(&mut RelayState) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(ServiceError::Communication("relay connection closed".into()));
        }
        f(&mut state)
    }

    fn session_for(state: &mut RelayState, id: OnlineId) -> Result<&mut Session, ServiceError> {
        match state.session.as_mut() {
            Some(session) if session.local_id == id => Ok(session),
            _ => Err(ServiceError::Fault(format!("no confirmed match for player {id}"))),
        }
    }

    /// Search the opponent's reply on a blocking worker, then record it on
    /// the session board. The lock is not held during the search.
    async fn reply(&self, local_id: OnlineId, board: Board) -> Result<MoveResponse, ServiceError> {
        let opponent = self.opponent.clone();
        let column = tokio::task::spawn_blocking(move || opponent.generate_move(&board, REMOTE_SEAT))
            .await
            .map_err(|e| ServiceError::Fault(format!("opponent search failed: {e}")))?
            .ok_or_else(|| ServiceError::Fault("opponent has no legal move".into()))?;

        self.with_open_state(|state| {
            Self::session_for(state, local_id)?
                .board
                .place(column, REMOTE_SEAT)
                .map_err(|e| ServiceError::Fault(e.to_string()))
        })?;
        tracing::debug!(column, "loopback opponent moved");
        Ok(MoveResponse::with_column(column))
    }
}

#[async_trait]
impl GameService for LoopbackRelay {
    async fn request_match(&self, local_id: OnlineId) -> Result<MatchResponse, ServiceError> {
        self.with_open_state(|state| {
            let assigned_id = if local_id == UNASSIGNED_ONLINE_ID {
                let id = state.next_id;
                state.next_id += 1;
                id
            } else {
                local_id
            };
            let is_ready = if state.polls_left > 0 {
                state.polls_left -= 1;
                false
            } else {
                true
            };
            Ok(MatchResponse {
                assigned_id,
                is_ready,
            })
        })
    }

    async fn confirm_match(&self, assigned_id: OnlineId) -> Result<ConfirmResponse, ServiceError> {
        self.with_open_state(|state| {
            if state.declines_left > 0 {
                state.declines_left -= 1;
                return Ok(ConfirmResponse {
                    is_confirmed: false,
                    is_local_turn: false,
                });
            }
            let BoardConfig { width, height } = self.settings.board;
            if width == 0 || height == 0 {
                return Err(ServiceError::Fault(format!(
                    "relay board must be at least 1x1, got {width}x{height}"
                )));
            }
            state.session = Some(Session {
                local_id: assigned_id,
                board: Board::new(width, height),
            });
            Ok(ConfirmResponse {
                is_confirmed: true,
                is_local_turn: self.settings.local_moves_first,
            })
        })
    }

    async fn request_first_move(&self, assigned_id: OnlineId) -> Result<MoveResponse, ServiceError> {
        let opening = self.with_open_state(|state| {
            let session = Self::session_for(state, assigned_id)?;
            let opens = !self.settings.local_moves_first && session.board.move_count() == 0;
            Ok(opens.then(|| session.board.clone()))
        })?;
        match opening {
            Some(board) => self.reply(assigned_id, board).await,
            None => Ok(MoveResponse::empty()),
        }
    }

    async fn submit_move(
        &self,
        local_id: OnlineId,
        _opponent_id: OnlineId,
        column: usize,
    ) -> Result<MoveResponse, ServiceError> {
        let pending = self.with_open_state(|state| {
            let session = Self::session_for(state, local_id)?;
            let mv = session
                .board
                .place(column, LOCAL_SEAT)
                .map_err(|e| ServiceError::Fault(format!("rejected move: {e}")))?;
            Ok((!mv.is_terminal()).then(|| session.board.clone()))
        })?;
        match pending {
            Some(board) => self.reply(local_id, board).await,
            None => Ok(MoveResponse::empty()),
        }
    }

    fn abort(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Cell;

    fn relay(settings: LoopbackSettings) -> LoopbackRelay {
        LoopbackRelay::new(settings)
    }

    #[tokio::test]
    async fn assigns_id_then_reports_ready_after_polls() {
        let relay = relay(LoopbackSettings {
            polls_before_ready: 2,
            first_assigned_id: 5,
            ..Default::default()
        });
        let first = relay.request_match(UNASSIGNED_ONLINE_ID).await.unwrap();
        assert_eq!(first.assigned_id, 5);
        assert!(!first.is_ready);
        assert!(!relay.request_match(5).await.unwrap().is_ready);
        let third = relay.request_match(5).await.unwrap();
        assert_eq!(third.assigned_id, 5);
        assert!(third.is_ready);
    }

    #[tokio::test]
    async fn declines_before_confirming() {
        let relay = relay(LoopbackSettings {
            declines: 1,
            local_moves_first: false,
            ..Default::default()
        });
        assert!(!relay.confirm_match(1).await.unwrap().is_confirmed);
        let confirmed = relay.confirm_match(1).await.unwrap();
        assert!(confirmed.is_confirmed);
        assert!(!confirmed.is_local_turn);
    }

    #[tokio::test]
    async fn opponent_opens_when_it_moves_first() {
        let relay = relay(LoopbackSettings {
            local_moves_first: false,
            ..Default::default()
        });
        relay.confirm_match(1).await.unwrap();
        let opening = relay.request_first_move(1).await.unwrap();
        assert!(opening.relayed.is_some());
        // A second request does not produce another opening.
        assert_eq!(relay.request_first_move(1).await.unwrap(), MoveResponse::empty());
    }

    #[tokio::test]
    async fn replies_to_submitted_moves() {
        let relay = relay(LoopbackSettings::default());
        relay.confirm_match(1).await.unwrap();
        let reply = relay.submit_move(1, 0, 3).await.unwrap();
        let column = reply.relayed.unwrap().column;
        assert!(column < 7);
    }

    #[tokio::test]
    async fn replies_are_recorded_on_the_relay_board() {
        let relay = relay(LoopbackSettings {
            local_moves_first: false,
            opponent: BotConfig::default().hard,
            ..Default::default()
        });
        relay.confirm_match(1).await.unwrap();
        let opening = relay.request_first_move(1).await.unwrap().relayed.unwrap();
        let local = (opening.column + 1) % 7;
        let reply = relay.submit_move(1, 0, local).await.unwrap().relayed.unwrap();

        let state = relay.state.lock();
        let board = &state.session.as_ref().unwrap().board;
        assert_eq!(board.move_count(), 3);
        assert_eq!(board.get(opening.column, 0), Cell::Owned(REMOTE_SEAT));
        let top = board.column_height(reply.column) - 1;
        assert_eq!(board.get(reply.column, top), Cell::Owned(REMOTE_SEAT));
    }

    #[tokio::test]
    async fn zero_sized_board_is_a_fault() {
        let relay = relay(LoopbackSettings {
            board: BoardConfig {
                width: 0,
                height: 6,
            },
            ..Default::default()
        });
        assert!(matches!(
            relay.confirm_match(1).await,
            Err(ServiceError::Fault(_))
        ));
    }

    #[tokio::test]
    async fn rejects_moves_without_a_match() {
        let relay = relay(LoopbackSettings::default());
        assert!(matches!(
            relay.submit_move(1, 0, 3).await,
            Err(ServiceError::Fault(_))
        ));
    }

    #[tokio::test]
    async fn rejects_illegal_column() {
        let relay = relay(LoopbackSettings::default());
        relay.confirm_match(1).await.unwrap();
        assert!(matches!(
            relay.submit_move(1, 0, 42).await,
            Err(ServiceError::Fault(_))
        ));
    }

    #[tokio::test]
    async fn closed_relay_refuses_requests() {
        let relay = relay(LoopbackSettings::default());
        relay.abort();
        assert!(matches!(
            relay.request_match(0).await,
            Err(ServiceError::Communication(_))
        ));
    }
}
