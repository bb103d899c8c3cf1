//! Contract of the external matchmaking/move-relay service, plus two
//! in-process implementations: a bot-backed loopback relay and a scripted
//! double for tests.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::game::OnlineId;

mod loopback;
mod scripted;

pub use loopback::{LoopbackRelay, LoopbackSettings};
pub use scripted::{ScriptedService, ServiceCall};

/// Reply to a matchmaking poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResponse {
    pub assigned_id: OnlineId,
    pub is_ready: bool,
}

/// Reply to a match confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmResponse {
    pub is_confirmed: bool,
    pub is_local_turn: bool,
}

/// A move made by the remote opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayedMove {
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveResponse {
    pub relayed: Option<RelayedMove>,
}

impl MoveResponse {
    pub fn with_column(column: usize) -> Self {
        MoveResponse {
            relayed: Some(RelayedMove { column }),
        }
    }

    pub fn empty() -> Self {
        MoveResponse::default()
    }
}

/// Matchmaking and move relay. The transport behind it is opaque; every
/// call may fail with any [`ServiceError`].
#[async_trait]
pub trait GameService: Send + Sync {
    /// Poll for an opponent. `local_id` is the id assigned by an earlier poll,
    /// or [`crate::game::UNASSIGNED_ONLINE_ID`] on the first one.
    async fn request_match(&self, local_id: OnlineId) -> Result<MatchResponse, ServiceError>;

    /// Accept the pairing offered by a ready poll.
    async fn confirm_match(&self, assigned_id: OnlineId) -> Result<ConfirmResponse, ServiceError>;

    /// Fetch the opponent's opening move when the opponent moves first.
    async fn request_first_move(&self, assigned_id: OnlineId) -> Result<MoveResponse, ServiceError>;

    /// Send the local move and wait for the opponent's reply.
    async fn submit_move(
        &self,
        local_id: OnlineId,
        opponent_id: OnlineId,
        column: usize,
    ) -> Result<MoveResponse, ServiceError>;

    /// Tear down the connection. Requests made afterwards fail.
    fn abort(&self);
}
