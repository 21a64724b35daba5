//! Game entity and backend selection label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::ids::GameId;

/// Which generation backend narrates a game.
///
/// A closed set: adding a backend means adding one variant here and one
/// client in the engine's gateway, not touching calling code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Grok,
    ChatGpt,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grok => "grok",
            Self::ChatGpt => "chatgpt",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grok" => Ok(Self::Grok),
            "chatgpt" => Ok(Self::ChatGpt),
            "ollama" => Ok(Self::Ollama),
            other => Err(DomainError::validation(format!(
                "Unknown provider: {other}"
            ))),
        }
    }
}

/// A running game: name, world setting, and the backend that narrates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    id: GameId,
    name: String,
    setting: String,
    provider: ProviderKind,
}

impl Game {
    pub fn new(name: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            id: GameId::new(),
            name: name.into(),
            setting: String::new(),
            provider,
        }
    }

    pub fn with_id(mut self, id: GameId) -> Self {
        self.id = id;
        self
    }

    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = setting.into();
        self
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn setting(&self) -> &str {
        &self.setting
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }
}
