//! Narrative history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{CharacterId, GameId, TurnId};

/// Who produced a narrative turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// A player's free-form action text.
    Player,
    /// The generated narration.
    Narrator,
    /// An engine-produced annotation (level-up banner, loot notice).
    System,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Narrator => "narrator",
            Self::System => "system",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a game's append-only narrative history.
///
/// Never mutated after creation; ordering is by `created_at` with the id
/// as a tiebreaker left to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    id: TurnId,
    game_id: GameId,
    role: TurnRole,
    content: String,
    /// The acting character, when the turn is attributable to one.
    character_id: Option<CharacterId>,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        game_id: GameId,
        role: TurnRole,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TurnId::new(),
            game_id,
            role,
            content: content.into(),
            character_id: None,
            created_at,
        }
    }

    pub fn with_character(mut self, character_id: Option<CharacterId>) -> Self {
        self.character_id = character_id;
        self
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn character_id(&self) -> Option<CharacterId> {
        self.character_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
