use std::fmt;

/// Identifier the matchmaking service assigns to a connected player.
pub type OnlineId = u32;

/// Online id used before the matchmaking service has assigned one.
pub const UNASSIGNED_ONLINE_ID: OnlineId = 0;

/// Seat identity of a player within one game; this is what board cells record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who is behind a seat, and therefore how the turn pipeline obtains its moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerRole {
    Human,
    Bot,
    Remote,
}

impl PlayerRole {
    /// Get role name for display
    pub fn name(self) -> &'static str {
        match self {
            PlayerRole::Human => "Human",
            PlayerRole::Bot => "Bot",
            PlayerRole::Remote => "Remote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    role: PlayerRole,
    online_id: OnlineId,
}

impl Player {
    pub fn new(id: PlayerId, role: PlayerRole, online_id: OnlineId) -> Self {
        Player {
            id,
            role,
            online_id,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn role(&self) -> PlayerRole {
        self.role
    }

    /// Only meaningful for remote players and the local human of an online game.
    pub fn online_id(&self) -> OnlineId {
        self.online_id
    }

    pub fn is_human(&self) -> bool {
        self.role == PlayerRole::Human
    }
}
