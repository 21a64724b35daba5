//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Ports exist for:
//! - Durable storage (games, party members, turns, items) - owned by an
//!   external collaborator; the in-memory adapter stands in for it here
//! - Generation backend calls (could swap Grok -> OpenAI -> Ollama)

mod error;
mod external;
mod repos;

pub use error::{LlmError, RepoError};
pub use external::{ChatMessage, LlmPort, LlmRequest, LlmResponse, MessageRole};
pub use repos::{GameRepo, ItemRepo, NewTurn, PartyRepo, StatWrite, TurnRepo};

#[cfg(test)]
pub use repos::{MockGameRepo, MockItemRepo, MockPartyRepo, MockTurnRepo};
