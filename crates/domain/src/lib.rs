//! Lorekeeper Domain - core types shared by the engine.
//!
//! Pure data and invariants only: no I/O, no async, no clock access beyond
//! timestamps passed in by callers.

pub mod error;
pub mod game;
pub mod ids;
pub mod item;
pub mod party;
pub mod turn;

pub use error::DomainError;
pub use game::{Game, ProviderKind};
pub use ids::{CharacterId, GameId, ItemId, PartyMemberId, TurnId};
pub use item::{InventoryEntry, Item, ItemEffect, ItemName, Rarity, PLACEHOLDER_DESCRIPTION};
pub use party::{
    level_for_xp, CharacterName, PartyMember, StatusEffects, LEVEL_UP_HP_BONUS, LEVEL_UP_MP_BONUS,
};
pub use turn::{Turn, TurnRole};
