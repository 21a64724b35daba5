//! In-memory store adapter.
//!
//! Stands in for the durable store behind the repo ports. DashMap entry
//! locking makes each per-record mutation atomic, so concurrent
//! increment-style stat writes against the same character are lossless.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use lorekeeper_domain::{
    Game, GameId, InventoryEntry, Item, ItemId, ItemName, PartyMember, PartyMemberId, Turn,
};

use crate::infrastructure::ports::{
    GameRepo, ItemRepo, NewTurn, PartyRepo, RepoError, StatWrite, TurnRepo,
};

/// All game state in one process-local store.
#[derive(Default)]
pub struct InMemoryStore {
    games: DashMap<GameId, Game>,
    members: DashMap<PartyMemberId, PartyMember>,
    rosters: DashMap<GameId, Vec<PartyMemberId>>,
    turns: DashMap<GameId, Vec<Turn>>,
    items: DashMap<ItemId, Item>,
    item_names: DashMap<String, ItemId>,
    inventories: DashMap<(PartyMemberId, ItemId), InventoryEntry>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameRepo for InMemoryStore {
    async fn get(&self, id: GameId) -> Result<Option<Game>, RepoError> {
        Ok(self.games.get(&id).map(|g| g.clone()))
    }

    async fn save(&self, game: &Game) -> Result<(), RepoError> {
        self.games.insert(game.id(), game.clone());
        Ok(())
    }
}

#[async_trait]
impl PartyRepo for InMemoryStore {
    async fn roster(&self, game_id: GameId) -> Result<Vec<PartyMember>, RepoError> {
        let ids = self
            .rosters
            .get(&game_id)
            .map(|r| r.clone())
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| self.members.get(id).map(|m| m.clone()))
            .collect())
    }

    async fn get(&self, id: PartyMemberId) -> Result<Option<PartyMember>, RepoError> {
        Ok(self.members.get(&id).map(|m| m.clone()))
    }

    async fn save(&self, member: &PartyMember) -> Result<(), RepoError> {
        let mut roster = self.rosters.entry(member.game_id()).or_default();
        if !roster.contains(&member.id()) {
            roster.push(member.id());
        }
        self.members.insert(member.id(), member.clone());
        Ok(())
    }

    async fn apply_stat_write(
        &self,
        id: PartyMemberId,
        write: StatWrite,
    ) -> Result<(), RepoError> {
        // get_mut holds the shard lock for the duration of the mutation,
        // making the whole write atomic per member.
        let mut member = self
            .members
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("PartyMember", id))?;

        member.adjust_hp(write.hp_delta, write.max_hp_delta);
        member.adjust_mp(write.mp_delta, write.max_mp_delta);
        member.add_xp(write.xp_delta);
        if let Some(level) = write.set_level {
            member.raise_level(level);
        }
        if let Some(effects) = write.set_status_effects {
            member.set_status_effects(effects);
        }
        // Clamp under the same entry lock. Clamping from a caller's
        // snapshot races with concurrent writes to the same member.
        member.clamp_to_maxima();
        Ok(())
    }
}

#[async_trait]
impl TurnRepo for InMemoryStore {
    async fn append(&self, turn: NewTurn) -> Result<Turn, RepoError> {
        let record = Turn::new(turn.game_id, turn.role, turn.content, Utc::now())
            .with_character(turn.character_id);
        self.turns
            .entry(turn.game_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn recent(&self, game_id: GameId, limit: usize) -> Result<Vec<Turn>, RepoError> {
        let turns = self
            .turns
            .get(&game_id)
            .map(|t| t.clone())
            .unwrap_or_default();
        let skip = turns.len().saturating_sub(limit);
        Ok(turns.into_iter().skip(skip).collect())
    }
}

#[async_trait]
impl ItemRepo for InMemoryStore {
    async fn get_by_name(&self, name: &ItemName) -> Result<Option<Item>, RepoError> {
        let Some(id) = self.item_names.get(name.as_str()).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.items.get(&id).map(|i| i.clone()))
    }

    async fn save(&self, item: &Item) -> Result<(), RepoError> {
        self.item_names
            .insert(item.name().as_str().to_string(), item.id());
        self.items.insert(item.id(), item.clone());
        Ok(())
    }

    async fn upsert_inventory(
        &self,
        member_id: PartyMemberId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<InventoryEntry, RepoError> {
        let entry = self
            .inventories
            .entry((member_id, item_id))
            .and_modify(|e| e.add_quantity(quantity))
            .or_try_insert_with(|| {
                InventoryEntry::new(member_id, item_id, quantity).map_err(RepoError::from)
            })?;
        Ok(entry.value().clone())
    }

    async fn get(&self, id: ItemId) -> Result<Option<Item>, RepoError> {
        Ok(self.items.get(&id).map(|i| i.clone()))
    }

    async fn inventory_entry(
        &self,
        member_id: PartyMemberId,
        item_id: ItemId,
    ) -> Result<Option<InventoryEntry>, RepoError> {
        Ok(self
            .inventories
            .get(&(member_id, item_id))
            .map(|e| e.clone()))
    }

    async fn consume_inventory(
        &self,
        member_id: PartyMemberId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<u32, RepoError> {
        let key = (member_id, item_id);
        let remaining = {
            let mut entry = self
                .inventories
                .get_mut(&key)
                .ok_or_else(|| RepoError::not_found("InventoryEntry", item_id))?;
            if entry.quantity() < quantity {
                return Err(RepoError::constraint(format!(
                    "Cannot consume {} of an item held {} times",
                    quantity,
                    entry.quantity()
                )));
            }
            entry.remove_quantity(quantity);
            entry.quantity()
        };
        // Entries never persist at zero
        self.inventories.remove_if(&key, |_, e| e.quantity() == 0);
        Ok(remaining)
    }
}
