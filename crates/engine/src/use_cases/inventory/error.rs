//! Errors for the inventory use cases.

use lorekeeper_domain::{ItemId, PartyMemberId};
use thiserror::Error;

use crate::infrastructure::ports::RepoError;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Party member not found: {0}")]
    MemberNotFound(PartyMemberId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("The character does not hold this item")]
    NotHeld,

    #[error("{0} has no usable effect")]
    NotUsable(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}
