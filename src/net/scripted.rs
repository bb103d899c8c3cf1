use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ConfirmResponse, GameService, MatchResponse, MoveResponse};
use crate::error::ServiceError;
use crate::game::OnlineId;

/// A request received by [`ScriptedService`], in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCall {
    RequestMatch {
        local_id: OnlineId,
    },
    ConfirmMatch {
        assigned_id: OnlineId,
    },
    RequestFirstMove {
        assigned_id: OnlineId,
    },
    SubmitMove {
        local_id: OnlineId,
        opponent_id: OnlineId,
        column: usize,
    },
    Abort,
}

#[derive(Default)]
struct Script {
    matches: VecDeque<Result<MatchResponse, ServiceError>>,
    confirms: VecDeque<Result<ConfirmResponse, ServiceError>>,
    first_moves: VecDeque<Result<MoveResponse, ServiceError>>,
    submits: VecDeque<Result<MoveResponse, ServiceError>>,
    calls: Vec<ServiceCall>,
    aborted: bool,
}

/// Service double that answers from per-operation queues and records every
/// call. An exhausted queue answers with a [`ServiceError::Fault`]; after
/// [`GameService::abort`] every request fails with a communication error.
#[derive(Default)]
pub struct ScriptedService {
    script: Mutex<Script>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_match(&self, response: Result<MatchResponse, ServiceError>) -> &Self {
        self.script.lock().matches.push_back(response);
        self
    }

    pub fn push_confirm(&self, response: Result<ConfirmResponse, ServiceError>) -> &Self {
        self.script.lock().confirms.push_back(response);
        self
    }

    pub fn push_first_move(&self, response: Result<MoveResponse, ServiceError>) -> &Self {
        self.script.lock().first_moves.push_back(response);
        self
    }

    pub fn push_submit(&self, response: Result<MoveResponse, ServiceError>) -> &Self {
        self.script.lock().submits.push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.script.lock().calls.clone()
    }

    pub fn is_aborted(&self) -> bool {
        self.script.lock().aborted
    }

    fn answer<T>(
        &self,
        call: ServiceCall,
        operation: &str,
        queue: impl FnOnce(&mut Script) -> Option<Result<T, ServiceError>>,
    ) -> Result<T, ServiceError> {
        let mut script = self.script.lock();
        script.calls.push(call);
        if script.aborted {
            return Err(ServiceError::Communication("connection aborted".into()));
        }
        queue(&mut script)
            .unwrap_or_else(|| Err(ServiceError::Fault(format!("no scripted response for {operation}"))))
    }
}

#[async_trait]
impl GameService for ScriptedService {
    async fn request_match(&self, local_id: OnlineId) -> Result<MatchResponse, ServiceError> {
        self.answer(ServiceCall::RequestMatch { local_id }, "request_match", |s| {
            s.matches.pop_front()
        })
    }

    async fn confirm_match(&self, assigned_id: OnlineId) -> Result<ConfirmResponse, ServiceError> {
        self.answer(ServiceCall::ConfirmMatch { assigned_id }, "confirm_match", |s| {
            s.confirms.pop_front()
        })
    }

    async fn request_first_move(&self, assigned_id: OnlineId) -> Result<MoveResponse, ServiceError> {
        self.answer(
            ServiceCall::RequestFirstMove { assigned_id },
            "request_first_move",
            |s| s.first_moves.pop_front(),
        )
    }

    async fn submit_move(
        &self,
        local_id: OnlineId,
        opponent_id: OnlineId,
        column: usize,
    ) -> Result<MoveResponse, ServiceError> {
        self.answer(
            ServiceCall::SubmitMove {
                local_id,
                opponent_id,
                column,
            },
            "submit_move",
            |s| s.submits.pop_front(),
        )
    }

    fn abort(&self) {
        let mut script = self.script.lock();
        script.calls.push(ServiceCall::Abort);
        script.aborted = true;
    }
}
