//! Repository port traits for the durable store.
//!
//! The store itself is an external collaborator; these traits are its
//! consumed surface. HP/MP/XP writes are increment-style so that two
//! concurrent updates to the same character are commutative and lossless.

use async_trait::async_trait;
use lorekeeper_domain::{
    CharacterId, Game, GameId, InventoryEntry, Item, ItemId, ItemName, PartyMember, PartyMemberId,
    StatusEffects, Turn, TurnRole,
};

use super::error::RepoError;

// =============================================================================
// Games
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameRepo: Send + Sync {
    async fn get(&self, id: GameId) -> Result<Option<Game>, RepoError>;
    async fn save(&self, game: &Game) -> Result<(), RepoError>;
}

// =============================================================================
// Party state
// =============================================================================

/// One atomic per-character stat mutation.
///
/// Current/max HP and MP and XP are increments; level is a set (monotonic,
/// computed by the caller); status effects replace the whole set. A single
/// `apply_stat_write` covers one character's full update so partial states
/// are never visible under concurrent requests. The store clamps current
/// HP/MP to their maxima inside the same atomic write: a clamp computed
/// from a caller's snapshot would race with concurrent writes to the same
/// character and leave current above max.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatWrite {
    pub hp_delta: i64,
    pub max_hp_delta: i64,
    pub mp_delta: i64,
    pub max_mp_delta: i64,
    pub xp_delta: i64,
    pub set_level: Option<u32>,
    pub set_status_effects: Option<StatusEffects>,
}

impl StatWrite {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PartyRepo: Send + Sync {
    /// Current roster for a game, in join order.
    async fn roster(&self, game_id: GameId) -> Result<Vec<PartyMember>, RepoError>;
    async fn get(&self, id: PartyMemberId) -> Result<Option<PartyMember>, RepoError>;
    async fn save(&self, member: &PartyMember) -> Result<(), RepoError>;

    /// Apply one character's stat mutation as a single atomic write,
    /// ending with a clamp of current HP/MP to their maxima.
    async fn apply_stat_write(
        &self,
        id: PartyMemberId,
        write: StatWrite,
    ) -> Result<(), RepoError>;
}

// =============================================================================
// Narrative history
// =============================================================================

/// A turn to append; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub game_id: GameId,
    pub role: TurnRole,
    pub content: String,
    pub character_id: Option<CharacterId>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TurnRepo: Send + Sync {
    /// Append a turn to the game's history.
    async fn append(&self, turn: NewTurn) -> Result<Turn, RepoError>;

    /// The most recent `limit` turns, chronological (oldest first).
    async fn recent(&self, game_id: GameId, limit: usize) -> Result<Vec<Turn>, RepoError>;
}

// =============================================================================
// Item catalog and inventories
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepo: Send + Sync {
    /// Exact-name catalog lookup; names are the deduplication key.
    async fn get_by_name(&self, name: &ItemName) -> Result<Option<Item>, RepoError>;
    async fn get(&self, id: ItemId) -> Result<Option<Item>, RepoError>;
    async fn save(&self, item: &Item) -> Result<(), RepoError>;

    /// Increment an existing (member, item) stack or create it.
    async fn upsert_inventory(
        &self,
        member_id: PartyMemberId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<InventoryEntry, RepoError>;

    /// One (member, item) stack, if held.
    async fn inventory_entry(
        &self,
        member_id: PartyMemberId,
        item_id: ItemId,
    ) -> Result<Option<InventoryEntry>, RepoError>;

    /// Decrement a stack, deleting the entry when it reaches zero.
    /// Returns the remaining quantity. Consuming more than is held is a
    /// constraint violation.
    async fn consume_inventory(
        &self,
        member_id: PartyMemberId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<u32, RepoError>;
}
