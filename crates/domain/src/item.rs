//! Item catalog and inventory types.
//!
//! Item names act as natural deduplication keys: the narrator references
//! items by name, and loot resolution reuses an existing definition or
//! creates one on first reference.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::ids::{ItemId, PartyMemberId};

const MAX_ITEM_NAME_LENGTH: usize = 200;

/// Description used when the narrator invents an item without one.
pub const PLACEHOLDER_DESCRIPTION: &str = "A mysterious item of unknown provenance.";

// ============================================================================
// ItemName
// ============================================================================

/// A validated item name (non-empty, <=200 chars, trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    /// Create a new validated item name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is empty after
    /// trimming or exceeds 200 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Item name cannot be empty"));
        }
        if trimmed.len() > MAX_ITEM_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Item name cannot exceed {} characters",
                MAX_ITEM_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ItemName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ItemName> for String {
    fn from(name: ItemName) -> String {
        name.0
    }
}

// ============================================================================
// Rarity
// ============================================================================

/// Rarity label for an item definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ItemEffect
// ============================================================================

/// Structured effect metadata for usable items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEffect {
    /// HP restored to current (clamped to max) when used.
    pub hp_restore: Option<i64>,
    /// MP restored to current (clamped to max) when used.
    pub mp_restore: Option<i64>,
    /// Status effect granted when used.
    pub grants_effect: Option<String>,
}

impl ItemEffect {
    pub fn is_empty(&self) -> bool {
        self.hp_restore.is_none() && self.mp_restore.is_none() && self.grants_effect.is_none()
    }
}

// ============================================================================
// Item
// ============================================================================

/// An item definition in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: ItemName,
    description: String,
    rarity: Rarity,
    effect: Option<ItemEffect>,
}

impl Item {
    pub fn new(name: ItemName) -> Self {
        Self {
            id: ItemId::new(),
            name,
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            rarity: Rarity::default(),
            effect: None,
        }
    }

    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_effect(mut self, effect: ItemEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &ItemName {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    pub fn effect(&self) -> Option<&ItemEffect> {
        self.effect.as_ref()
    }
}

// ============================================================================
// InventoryEntry
// ============================================================================

/// A stack of one item held by one party member.
///
/// Quantity is always positive; an entry reduced to zero is deleted by the
/// owning store, never retained at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    member_id: PartyMemberId,
    item_id: ItemId,
    quantity: u32,
}

impl InventoryEntry {
    /// Create an entry with a positive quantity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Constraint` if `quantity` is zero.
    pub fn new(
        member_id: PartyMemberId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::constraint(
                "Inventory quantity must be a positive integer",
            ));
        }
        Ok(Self {
            member_id,
            item_id,
            quantity,
        })
    }

    pub fn member_id(&self) -> PartyMemberId {
        self.member_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Adds to the stack, saturating rather than overflowing.
    pub fn add_quantity(&mut self, amount: u32) {
        self.quantity = self.quantity.saturating_add(amount);
    }

    /// Removes from the stack, saturating at zero. An entry left at zero
    /// is transient: the owning store deletes it in the same operation.
    pub fn remove_quantity(&mut self, amount: u32) {
        self.quantity = self.quantity.saturating_sub(amount);
    }
}
