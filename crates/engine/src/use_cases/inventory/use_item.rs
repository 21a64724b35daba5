//! Use-item use case.
//!
//! Consumes one unit of a held item and applies its effect metadata to the
//! holder: HP/MP restores go through the same atomic stat write as
//! narration updates (the store clamps current to max), and a granted
//! status effect is added to the set. The stack is decremented afterwards
//! and deleted by the store when it reaches zero.

use std::sync::Arc;

use lorekeeper_domain::{ItemId, ItemName, PartyMemberId};

use crate::infrastructure::ports::{ItemRepo, PartyRepo, StatWrite};

use super::error::InventoryError;

/// Result of consuming one unit of an item.
#[derive(Debug, Clone)]
pub struct ItemUseOutcome {
    pub item_name: ItemName,
    /// Units left in the stack after consumption.
    pub remaining: u32,
}

pub struct UseItem {
    party_repo: Arc<dyn PartyRepo>,
    item_repo: Arc<dyn ItemRepo>,
}

impl UseItem {
    pub fn new(party_repo: Arc<dyn PartyRepo>, item_repo: Arc<dyn ItemRepo>) -> Self {
        Self {
            party_repo,
            item_repo,
        }
    }

    /// Consume one unit of `item_id` held by `member_id`.
    ///
    /// # Errors
    ///
    /// Fails when the member or item does not exist, the member does not
    /// hold the item, or the item carries no effect metadata. An item
    /// whose effect is already fully in place (a granted status the
    /// member has, no restores) is still consumed.
    pub async fn execute(
        &self,
        member_id: PartyMemberId,
        item_id: ItemId,
    ) -> Result<ItemUseOutcome, InventoryError> {
        let member = self
            .party_repo
            .get(member_id)
            .await?
            .ok_or(InventoryError::MemberNotFound(member_id))?;
        let item = self
            .item_repo
            .get(item_id)
            .await?
            .ok_or(InventoryError::ItemNotFound(item_id))?;
        self.item_repo
            .inventory_entry(member_id, item_id)
            .await?
            .ok_or(InventoryError::NotHeld)?;

        let effect = item
            .effect()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| InventoryError::NotUsable(item.name().to_string()))?;

        let mut write = StatWrite {
            hp_delta: effect.hp_restore.unwrap_or(0),
            mp_delta: effect.mp_restore.unwrap_or(0),
            ..Default::default()
        };
        if let Some(label) = &effect.grants_effect {
            let mut effects = member.status_effects().clone();
            if effects.add(label) {
                write.set_status_effects = Some(effects);
            }
        }

        if !write.is_empty() {
            self.party_repo.apply_stat_write(member_id, write).await?;
        }

        let remaining = self.item_repo.consume_inventory(member_id, item_id, 1).await?;

        tracing::info!(
            member = %member.name(),
            item = %item.name(),
            remaining,
            "Item consumed"
        );

        Ok(ItemUseOutcome {
            item_name: item.name().clone(),
            remaining,
        })
    }
}
