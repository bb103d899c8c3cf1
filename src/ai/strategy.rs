use std::fmt;
use std::str::FromStr;

use crate::game::{Board, PlayerId};

/// Move generation for a bot seat.
///
/// Implementations are pure: the chosen column depends only on the board,
/// the bot's own id and its configuration, never on earlier calls.
pub trait BotStrategy: Send + Sync {
    /// Choose a column for `own` to play. Returns `None` only when no column
    /// is legal.
    fn generate_move(&self, board: &Board, own: PlayerId) -> Option<usize>;

    /// Return the strategy's display name.
    fn name(&self) -> &str;
}

/// Named difficulty, bound to a [`BotProfile`] through [`BotConfig`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BotLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl BotLevel {
    pub const ALL: [BotLevel; 3] = [BotLevel::Easy, BotLevel::Medium, BotLevel::Hard];

    pub fn name(self) -> &'static str {
        match self {
            BotLevel::Easy => "Easy",
            BotLevel::Medium => "Medium",
            BotLevel::Hard => "Hard",
        }
    }

    /// Parse a level that may be left blank. Blank yields `None`, which
    /// game factories treat as the default level.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, ParseLevelError> {
        if s.trim().is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }
}

impl fmt::Display for BotLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bot level '{0}' (expected easy, medium or hard)")]
pub struct ParseLevelError(pub String);

impl FromStr for BotLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BotLevel::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

/// Search settings for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BotProfile {
    /// Plies searched below each candidate move.
    pub depth: usize,
    /// Candidates scoring within this margin of the best are picked at random.
    /// Zero means always play the best-scoring, most central column.
    pub tolerance: f64,
    /// Fixed seed for the random pick; combined with the board so the choice
    /// stays a function of the position.
    pub seed: Option<u64>,
}

impl Default for BotProfile {
    fn default() -> Self {
        BotProfile {
            depth: 4,
            tolerance: 0.0,
            seed: None,
        }
    }
}

/// Per-level profiles, loadable from the `[bot.*]` tables of the config file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub easy: BotProfile,
    pub medium: BotProfile,
    pub hard: BotProfile,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            easy: BotProfile {
                depth: 2,
                tolerance: 20.0,
                seed: None,
            },
            medium: BotProfile {
                depth: 4,
                tolerance: 5.0,
                seed: None,
            },
            hard: BotProfile {
                depth: 6,
                tolerance: 0.0,
                seed: None,
            },
        }
    }
}

impl BotConfig {
    pub fn profile(&self, level: BotLevel) -> BotProfile {
        match level {
            BotLevel::Easy => self.easy,
            BotLevel::Medium => self.medium,
            BotLevel::Hard => self.hard,
        }
    }
}
